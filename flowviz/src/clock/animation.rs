use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::clock::frame_clock::{FrameClock, FrameToken};
use crate::foundation::core::FrameIndex;

/// Maps elapsed wall-clock time to a progress value in `[0, 1]`, once per display refresh.
pub struct AnimationClock {
    clock: Rc<dyn FrameClock>,
}

impl AnimationClock {
    pub fn new(clock: Rc<dyn FrameClock>) -> Self {
        Self { clock }
    }

    /// Start a run of `duration_ms`.
    ///
    /// Each refresh delivers `(now - start) / duration` to `on_tick`; once that exceeds 1 the
    /// run delivers exactly `1.0` and stops. Delivered values never decrease. A non-positive
    /// duration delivers nothing and returns an inert handle.
    pub fn start(&self, duration_ms: i64, on_tick: impl FnMut(f64) + 'static) -> ClockHandle {
        if duration_ms <= 0 {
            return ClockHandle::inert();
        }

        let run = Rc::new(Run {
            clock: Rc::clone(&self.clock),
            start_ms: self.clock.now_ms(),
            duration_ms: duration_ms as f64,
            on_tick: RefCell::new(Box::new(on_tick)),
            pending: Cell::new(None),
            cancelled: Cell::new(false),
            finished: Cell::new(false),
            last_progress: Cell::new(0.0),
        });
        run.schedule();
        ClockHandle { run: Some(run) }
    }
}

struct Run {
    clock: Rc<dyn FrameClock>,
    start_ms: f64,
    duration_ms: f64,
    on_tick: RefCell<Box<dyn FnMut(f64)>>,
    pending: Cell<Option<FrameToken>>,
    cancelled: Cell<bool>,
    finished: Cell<bool>,
    last_progress: Cell<f64>,
}

impl Run {
    fn schedule(self: &Rc<Self>) {
        let run = Rc::clone(self);
        let token = self.clock.schedule_next(Box::new(move || run.tick()));
        self.pending.set(Some(token));
    }

    fn tick(self: &Rc<Self>) {
        self.pending.set(None);
        if self.cancelled.get() {
            return;
        }

        let t = (self.clock.now_ms() - self.start_ms) / self.duration_ms;
        if t > 1.0 {
            self.finished.set(true);
            self.emit(1.0);
            return;
        }

        self.emit(t.max(self.last_progress.get()));
        if !self.cancelled.get() {
            self.schedule();
        }
    }

    fn emit(&self, progress: f64) {
        self.last_progress.set(progress);
        match self.on_tick.try_borrow_mut() {
            Ok(mut on_tick) => on_tick(progress),
            Err(_) => tracing::warn!(progress, "re-entrant animation tick dropped"),
        }
    }

    fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(token) = self.pending.take() {
            self.clock.cancel(token);
        }
    }
}

/// Cancellation handle of one animation run. Dropping it cancels the run.
#[must_use = "dropping the handle cancels the animation"]
pub struct ClockHandle {
    run: Option<Rc<Run>>,
}

impl ClockHandle {
    /// Handle that controls nothing.
    pub fn inert() -> Self {
        Self { run: None }
    }

    pub fn is_inert(&self) -> bool {
        self.run.is_none()
    }

    /// Stop the run. Idempotent; a tick that is already scheduled never runs its callback.
    pub fn cancel(&self) {
        if let Some(run) = &self.run {
            run.cancel();
        }
    }

    /// `true` while ticks are still expected.
    pub fn is_active(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.cancelled.get() && !run.finished.get())
    }

    /// Last progress value delivered, `0.0` before the first tick.
    pub fn progress(&self) -> f64 {
        self.run
            .as_ref()
            .map_or(0.0, |run| run.last_progress.get())
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ClockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockHandle")
            .field("inert", &self.is_inert())
            .field("active", &self.is_active())
            .field("progress", &self.progress())
            .finish()
    }
}

/// `floor(progress * (frame_count - 1))`, clamped to the valid index range.
pub fn frame_index(progress: f64, frame_count: u32) -> FrameIndex {
    let max = u64::from(frame_count.saturating_sub(1));
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    FrameIndex(((p * max as f64).floor() as u64).min(max))
}

/// `frame NNN`, zero-padded to the digit count of `frame_count`.
pub fn frame_label(index: FrameIndex, frame_count: u32) -> String {
    let width = frame_count.to_string().len();
    format!("frame {:0width$}", index.0)
}

#[cfg(test)]
#[path = "../../tests/unit/clock/animation.rs"]
mod tests;
