use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Callback run at the next display-refresh opportunity.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Identifies one scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Display-refresh capability: a time source plus one-shot "next refresh" callbacks.
pub trait FrameClock {
    /// Monotonic time in milliseconds.
    fn now_ms(&self) -> f64;
    /// Run `callback` at the next refresh.
    fn schedule_next(&self, callback: FrameCallback) -> FrameToken;
    /// Drop a scheduled callback. Unknown or already-run tokens are ignored.
    fn cancel(&self, token: FrameToken);
}

#[derive(Default)]
struct FrameQueue {
    next_token: Cell<u64>,
    pending: RefCell<Vec<(FrameToken, FrameCallback)>>,
}

impl FrameQueue {
    fn push(&self, callback: FrameCallback) -> FrameToken {
        let token = FrameToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.pending.borrow_mut().push((token, callback));
        token
    }

    fn remove(&self, token: FrameToken) {
        self.pending.borrow_mut().retain(|(t, _)| *t != token);
    }

    fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Run everything queued so far. Callbacks scheduled while running wait for the next call.
    fn run_pending(&self) -> usize {
        let due = std::mem::take(&mut *self.pending.borrow_mut());
        let n = due.len();
        for (_, callback) in due {
            callback();
        }
        n
    }
}

/// Deterministic clock driven by the caller: set the time, then fire a refresh.
#[derive(Default)]
pub struct ManualFrameClock {
    now_ms: Cell<f64>,
    queue: FrameQueue,
}

impl ManualFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, ms: f64) {
        self.now_ms.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    /// Run every callback scheduled before this call; returns how many ran.
    pub fn fire(&self) -> usize {
        self.queue.run_pending()
    }

    /// Advance by `ms`, then fire.
    pub fn step(&self, ms: f64) -> usize {
        self.advance(ms);
        self.fire()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl FrameClock for ManualFrameClock {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }

    fn schedule_next(&self, callback: FrameCallback) -> FrameToken {
        self.queue.push(callback)
    }

    fn cancel(&self, token: FrameToken) {
        self.queue.remove(token);
    }
}

/// Wall-clock refresh loop at a fixed rate, run on the calling thread.
pub struct RefreshClock {
    origin: Instant,
    interval: Duration,
    queue: FrameQueue,
}

impl RefreshClock {
    /// `refresh_hz` is clamped to at least 1.
    pub fn new(refresh_hz: u32) -> Self {
        let hz = refresh_hz.max(1);
        Self {
            origin: Instant::now(),
            interval: Duration::from_secs_f64(1.0 / f64::from(hz)),
            queue: FrameQueue::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next refresh boundary and run the due callbacks.
    pub fn wait_and_fire(&self) -> usize {
        let elapsed = self.origin.elapsed();
        let ticks = elapsed.as_nanos() / self.interval.as_nanos().max(1) + 1;
        let next = self.interval.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX));
        if let Some(wait) = next.checked_sub(elapsed) {
            std::thread::sleep(wait);
        }
        self.queue.run_pending()
    }

    /// Drive refreshes until nothing is scheduled any more.
    pub fn run_until_idle(&self) -> u64 {
        let mut refreshes = 0u64;
        while !self.queue.is_empty() {
            self.wait_and_fire();
            refreshes += 1;
        }
        refreshes
    }
}

impl FrameClock for RefreshClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn schedule_next(&self, callback: FrameCallback) -> FrameToken {
        self.queue.push(callback)
    }

    fn cancel(&self, token: FrameToken) {
        self.queue.remove(token);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/frame_clock.rs"]
mod tests;
