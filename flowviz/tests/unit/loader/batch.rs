use std::cell::Cell;
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::executor::block_on;
use futures::future::{self, FutureExt as _, LocalBoxFuture};

use super::*;

/// Completes after being polled `n` extra times.
struct YieldTimes(usize);

impl Future for YieldTimes {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 == 0 {
            return Poll::Ready(());
        }
        self.0 -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

enum Script {
    Ok { bytes: Vec<u8>, yields: usize },
    Err { yields: usize },
    Hang,
}

#[derive(Default)]
struct ScriptedSource {
    scripts: HashMap<String, Script>,
    dropped: Rc<Cell<usize>>,
    fetched: Rc<Cell<usize>>,
}

impl ScriptedSource {
    fn with(mut self, path: &str, script: Script) -> Self {
        self.scripts.insert(path.to_owned(), script);
        self
    }
}

impl ResourceSource for ScriptedSource {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, FlowvizResult<Vec<u8>>> {
        self.fetched.set(self.fetched.get() + 1);
        let guard = DropCounter(Rc::clone(&self.dropped));
        let path = path.to_owned();
        match self.scripts.get(&path) {
            Some(Script::Ok { bytes, yields }) => {
                let bytes = bytes.clone();
                let yields = *yields;
                async move {
                    YieldTimes(yields).await;
                    std::mem::forget(guard);
                    Ok(bytes)
                }
                .boxed_local()
            }
            Some(Script::Err { yields }) => {
                let yields = *yields;
                async move {
                    YieldTimes(yields).await;
                    std::mem::forget(guard);
                    Err(FlowvizError::load(path, "connection reset"))
                }
                .boxed_local()
            }
            Some(Script::Hang) => async move {
                let _guard = guard;
                future::pending::<FlowvizResult<Vec<u8>>>().await
            }
            .boxed_local(),
            None => {
                std::mem::forget(guard);
                future::ready(Err(FlowvizError::load(path, "not found"))).boxed_local()
            }
        }
    }
}

fn first_byte(bytes: &[u8]) -> FlowvizResult<u8> {
    bytes
        .first()
        .copied()
        .ok_or_else(|| FlowvizError::vector_format("empty body"))
}

fn paths(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn ready_items_follow_input_order_not_completion_order() {
    let n = 6usize;
    let mut source = ScriptedSource::default();
    let mut names = Vec::new();
    for i in 0..n {
        let name = format!("r{i}");
        // Later paths finish first.
        source = source.with(
            &name,
            Script::Ok {
                bytes: vec![i as u8],
                yields: (n - i) * 2,
            },
        );
        names.push(name);
    }

    let completion = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&completion);
    let loader = BatchLoader::<u8>::new("test");
    block_on(loader.load(names, Rc::new(source), move |bytes| {
        let b = first_byte(bytes)?;
        seen.borrow_mut().push(b);
        Ok(b)
    }));

    assert_eq!(*completion.borrow(), vec![5, 4, 3, 2, 1, 0]);
    let items = loader.items().expect("ready");
    assert_eq!(*items, vec![0, 1, 2, 3, 4, 5]);
    assert!(loader.error().is_none());
}

#[test]
fn single_failure_fails_batch_and_cancels_siblings() {
    let source = ScriptedSource::default()
        .with("a", Script::Hang)
        .with("b", Script::Err { yields: 1 })
        .with("c", Script::Hang)
        .with("d", Script::Ok { bytes: vec![1], yields: 0 });
    let dropped = Rc::clone(&source.dropped);

    let loader = BatchLoader::<u8>::new("test");
    block_on(loader.load(paths(&["a", "b", "c", "d"]), Rc::new(source), first_byte));

    let state = loader.state();
    assert!(state.is_failed());
    assert!(!state.is_ready());
    let Some(FlowvizError::Load { path, .. }) = state.error() else {
        panic!("expected load error, got {:?}", state.error());
    };
    assert_eq!(path, "b");
    // Both hanging retrievals were dropped.
    assert_eq!(dropped.get(), 2);
}

#[test]
fn decode_failure_carries_path() {
    let source = ScriptedSource::default()
        .with("ok", Script::Ok { bytes: vec![7], yields: 0 })
        .with("empty", Script::Ok { bytes: vec![], yields: 0 });

    let loader = BatchLoader::<u8>::new("test");
    block_on(loader.load(paths(&["ok", "empty"]), Rc::new(source), first_byte));

    let err = loader.error().expect("failed");
    let FlowvizError::VectorFormat { path, .. } = err else {
        panic!("expected vector format error");
    };
    assert_eq!(path.as_deref(), Some("empty"));
    assert!(loader.items().is_none());
}

#[test]
fn empty_batch_is_immediately_ready() {
    let loader = BatchLoader::<u8>::new("test");
    block_on(loader.load(Vec::new(), Rc::new(ScriptedSource::default()), first_byte));
    assert_eq!(loader.items().map(|v| v.len()), Some(0));
}

#[test]
fn cancel_in_flight_batch_fails_without_decoding() {
    let source = ScriptedSource::default()
        .with("a", Script::Hang)
        .with("b", Script::Hang);
    let dropped = Rc::clone(&source.dropped);
    let decoded = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&decoded);

    let loader = BatchLoader::<u8>::new("test");
    let run = loader.load(paths(&["a", "b"]), Rc::new(source), move |bytes| {
        counter.set(counter.get() + 1);
        first_byte(bytes)
    });
    block_on(future::join(run, async {
        assert!(loader.state().is_pending());
        loader.cancel();
    }));

    assert!(matches!(
        loader.state().error(),
        Some(FlowvizError::Cancelled)
    ));
    assert_eq!(decoded.get(), 0);
    assert_eq!(dropped.get(), 2);

    // Cancelling a settled batch changes nothing.
    loader.cancel();
    assert!(loader.state().error().is_some_and(FlowvizError::is_cancelled));
}

#[test]
fn cancel_after_ready_is_noop() {
    let source = ScriptedSource::default().with("a", Script::Ok { bytes: vec![3], yields: 1 });
    let loader = BatchLoader::<u8>::new("test");
    block_on(loader.load(paths(&["a"]), Rc::new(source), first_byte));
    loader.cancel();
    assert_eq!(loader.items().as_deref(), Some(&vec![3]));
}

#[test]
fn reload_cancels_previous_batch_before_it_can_be_ready() {
    let first = ScriptedSource::default()
        .with("old0", Script::Ok { bytes: vec![100], yields: 0 })
        .with("old1", Script::Hang);
    let first_fetched = Rc::clone(&first.fetched);
    let second = ScriptedSource::default()
        .with("new0", Script::Ok { bytes: vec![1], yields: 3 })
        .with("new1", Script::Ok { bytes: vec![2], yields: 1 });

    let old_decodes = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&old_decodes);

    let loader = BatchLoader::<u8>::new("test");
    let old = loader.load(paths(&["old0", "old1"]), Rc::new(first), move |bytes| {
        counter.set(counter.get() + 1);
        first_byte(bytes)
    });
    let new = loader.load(paths(&["new0", "new1"]), Rc::new(second), first_byte);
    block_on(future::join(old, new));

    assert_eq!(loader.items().as_deref(), Some(&vec![1, 2]));
    assert_eq!(old_decodes.get(), 0);
    assert_eq!(first_fetched.get(), 0);
}
