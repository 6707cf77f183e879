//! Display-refresh scheduling and time-normalized animation progress.

/// Progress runs and frame selection.
pub mod animation;
/// Refresh sources.
pub mod frame_clock;
