use std::cell::{Ref, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable, Aborted};
use futures::stream::{FuturesUnordered, StreamExt as _};
use tracing::Instrument as _;

use crate::foundation::error::{FlowvizError, FlowvizResult};
use crate::loader::source::ResourceSource;

/// Observable state of one batch.
///
/// `Ready` is only reached when every member decoded; partial results are never exposed.
#[derive(Debug)]
pub enum LoadState<T> {
    Pending,
    Ready(Rc<Vec<T>>),
    Failed(FlowvizError),
}

impl<T> LoadState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn items(&self) -> Option<&Rc<Vec<T>>> {
        match self {
            Self::Ready(items) => Some(items),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FlowvizError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

struct Batch<T> {
    state: LoadState<T>,
    in_flight: Option<AbortHandle>,
    generation: u64,
}

/// Loads an ordered list of resources concurrently and exposes an all-or-nothing result.
///
/// Retrieval and decoding of different paths interleave on the polling task with no ordering
/// guarantee; the ready sequence is always rebuilt in input-path order. The first failure wins:
/// remaining in-flight retrievals are dropped (the transport's cancellation request) and the batch
/// ends in `Failed`. Starting a new load cancels the previous in-flight batch of the same loader.
pub struct BatchLoader<T> {
    label: &'static str,
    batch: Rc<RefCell<Batch<T>>>,
}

impl<T: 'static> BatchLoader<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            batch: Rc::new(RefCell::new(Batch {
                state: LoadState::Pending,
                in_flight: None,
                generation: 0,
            })),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Start loading `paths`, decoding each body with `decode`.
    ///
    /// The returned future drives the batch and resolves once it settled or was superseded; the
    /// outcome is observed through [`BatchLoader::state`].
    pub fn load<D>(
        &self,
        paths: Vec<String>,
        source: Rc<dyn ResourceSource>,
        decode: D,
    ) -> impl Future<Output = ()> + 'static
    where
        D: Fn(&[u8]) -> FlowvizResult<T> + 'static,
    {
        let (generation, registration) = {
            let mut batch = self.batch.borrow_mut();
            if let Some(previous) = batch.in_flight.take() {
                previous.abort();
                tracing::debug!(batch = self.label, "cancelled previous in-flight batch");
            }
            batch.generation += 1;
            batch.state = LoadState::Pending;
            let (handle, registration) = AbortHandle::new_pair();
            batch.in_flight = Some(handle);
            (batch.generation, registration)
        };

        let span = tracing::debug_span!("batch_load", batch = self.label, count = paths.len());
        let shared = Rc::clone(&self.batch);
        let label = self.label;
        let work = Abortable::new(fetch_all(paths, source, decode), registration);

        async move {
            let outcome = work.await;
            let mut batch = shared.borrow_mut();
            if batch.generation != generation {
                return;
            }
            batch.in_flight = None;
            match outcome {
                // `cancel` already recorded the terminal state.
                Err(Aborted) => {}
                Ok(Ok(items)) => {
                    tracing::debug!(batch = label, count = items.len(), "batch ready");
                    batch.state = LoadState::Ready(Rc::new(items));
                }
                Ok(Err(err)) => {
                    tracing::warn!(batch = label, error = %err, "batch failed");
                    batch.state = LoadState::Failed(err);
                }
            }
        }
        .instrument(span)
    }

    /// Request cancellation of the in-flight batch. No-op once the batch is ready or failed.
    pub fn cancel(&self) {
        let mut batch = self.batch.borrow_mut();
        let Some(handle) = batch.in_flight.take() else {
            return;
        };
        handle.abort();
        if batch.state.is_pending() {
            tracing::debug!(batch = self.label, "batch cancelled");
            batch.state = LoadState::Failed(FlowvizError::Cancelled);
        }
    }

    pub fn state(&self) -> Ref<'_, LoadState<T>> {
        Ref::map(self.batch.borrow(), |b| &b.state)
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Decoded items, once ready.
    pub fn items(&self) -> Option<Rc<Vec<T>>> {
        self.state().items().cloned()
    }

    /// Terminal error, once failed.
    pub fn error(&self) -> Option<FlowvizError> {
        self.state().error().cloned()
    }
}

impl<T> Drop for BatchLoader<T> {
    fn drop(&mut self) {
        if let Ok(mut batch) = self.batch.try_borrow_mut()
            && let Some(handle) = batch.in_flight.take()
        {
            handle.abort();
        }
    }
}

async fn fetch_all<T, D>(
    paths: Vec<String>,
    source: Rc<dyn ResourceSource>,
    decode: D,
) -> FlowvizResult<Vec<T>>
where
    D: Fn(&[u8]) -> FlowvizResult<T>,
{
    let decode = &decode;
    let mut in_flight: FuturesUnordered<_> = paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let fetch = source.fetch(path);
            async move {
                let bytes = fetch.await?;
                let item = decode(&bytes).map_err(|e| e.with_path(path))?;
                Ok::<_, FlowvizError>((i, item))
            }
        })
        .collect();

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(paths.len()).collect();
    while let Some(result) = in_flight.next().await {
        match result {
            Ok((i, item)) => slots[i] = Some(item),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    cancelled = in_flight.len(),
                    "batch member failed, cancelling siblings"
                );
                drop(in_flight);
                return Err(err);
            }
        }
    }

    slots
        .into_iter()
        .zip(&paths)
        .map(|(slot, path)| slot.ok_or_else(|| FlowvizError::load(path.as_str(), "no result")))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/loader/batch.rs"]
mod tests;
