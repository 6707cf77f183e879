use std::cell::{Ref, RefCell};
use std::rc::Rc;

use futures::FutureExt as _;

use crate::assets::raster::{RasterImage, decode_ppm};
use crate::assets::vectors::{VectorSample, decode_vector_samples};
use crate::clock::animation::{AnimationClock, ClockHandle, frame_index, frame_label};
use crate::clock::frame_clock::FrameClock;
use crate::config::VisualizerConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlowvizError, FlowvizResult};
use crate::loader::batch::BatchLoader;
use crate::loader::source::ResourceSource;
use crate::render::field::{RenderStats, VectorFieldRenderer, max_squared_displacement};
use crate::render::surface::DrawingSurface;

/// Lifecycle of a [`Session`].
///
/// `Loading → Ready → Animating`, or `Loading → Failed`. A failed session never animates; only a
/// new [`Session::load`] leaves `Failed`.
#[derive(Clone, Debug)]
pub enum SessionState {
    Loading,
    Ready,
    Animating,
    Failed(FlowvizError),
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Animating => "animating",
            Self::Failed(_) => "failed",
        }
    }
}

/// What was drawn for one displayed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub index: FrameIndex,
    pub frame_count: u32,
    pub progress: f64,
    pub stats: RenderStats,
    /// `frame NNN`.
    pub label: String,
}

/// Receives every newly drawn frame, with read access to both layers.
pub trait FramePresenter<S> {
    fn present(&mut self, report: &FrameReport, renderer: &VectorFieldRenderer<S>);
}

impl<S, F> FramePresenter<S> for F
where
    F: FnMut(&FrameReport, &VectorFieldRenderer<S>),
{
    fn present(&mut self, report: &FrameReport, renderer: &VectorFieldRenderer<S>) {
        self(report, renderer)
    }
}

struct Playback<S> {
    renderer: VectorFieldRenderer<S>,
    frames: Rc<Vec<RasterImage>>,
    vectors: Rc<Vec<Vec<VectorSample>>>,
    frame_count: u32,
    shown: Option<FrameIndex>,
    last_error: Option<FlowvizError>,
    presenter: Box<dyn FramePresenter<S>>,
}

impl<S: DrawingSurface> Playback<S> {
    fn advance(&mut self, progress: f64) {
        let index = frame_index(progress, self.frame_count);
        if self.shown == Some(index) {
            return;
        }
        let i = index.as_usize();
        let (Some(frame), Some(vectors)) = (self.frames.get(i), self.vectors.get(i)) else {
            tracing::warn!(index = i, "frame index out of range");
            return;
        };

        match self.renderer.render(frame, vectors) {
            Ok(stats) => {
                self.shown = Some(index);
                let report = FrameReport {
                    index,
                    frame_count: self.frame_count,
                    progress,
                    stats,
                    label: frame_label(index, self.frame_count),
                };
                tracing::debug!(
                    frame = i,
                    progress,
                    vectors = stats.vectors,
                    still = stats.still,
                    "rendered frame"
                );
                self.presenter.present(&report, &self.renderer);
            }
            Err(err) => {
                tracing::warn!(frame = i, error = %err, "render failed");
                self.last_error = Some(err);
            }
        }
    }
}

/// Composition root: loads a dataset, then plays it back against a frame clock.
///
/// Frames and vectors load as two independent batches joined before playback. When one batch
/// fails the other is cancelled; the session then reports the first non-cancellation error.
pub struct Session<S: DrawingSurface + 'static> {
    config: VisualizerConfig,
    frames: BatchLoader<RasterImage>,
    vectors: BatchLoader<Vec<VectorSample>>,
    state: SessionState,
    playback: Option<Rc<RefCell<Playback<S>>>>,
    clock: Option<ClockHandle>,
}

impl<S: DrawingSurface + 'static> Session<S> {
    pub fn new(config: VisualizerConfig) -> FlowvizResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frames: BatchLoader::new("frames"),
            vectors: BatchLoader::new("vectors"),
            state: SessionState::Loading,
            playback: None,
            clock: None,
        })
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn frames(&self) -> &BatchLoader<RasterImage> {
        &self.frames
    }

    pub fn vectors(&self) -> &BatchLoader<Vec<VectorSample>> {
        &self.vectors
    }

    /// Load every frame and vector file of the configured dataset from `source`.
    ///
    /// Stops a running animation first and restarts both batches, so this is also how a failed
    /// session is retried.
    #[tracing::instrument(skip_all, fields(dataset = %self.config.dataset))]
    pub async fn load(&mut self, source: Rc<dyn ResourceSource>) -> FlowvizResult<()> {
        self.stop();
        self.playback = None;
        self.set_state(SessionState::Loading);

        let layout = self.config.layout();
        let frames = self
            .frames
            .load(layout.frame_paths(), Rc::clone(&source), decode_ppm);
        let vectors = self
            .vectors
            .load(layout.vector_paths(), source, decode_vector_samples);

        let (frames_loader, vectors_loader) = (&self.frames, &self.vectors);
        futures::join!(
            frames.map(|()| {
                if !frames_loader.is_ready() {
                    vectors_loader.cancel();
                }
            }),
            vectors.map(|()| {
                if !vectors_loader.is_ready() {
                    frames_loader.cancel();
                }
            }),
        );

        match self.batch_error() {
            Some(err) => {
                self.set_state(SessionState::Failed(err.clone()));
                Err(err)
            }
            None => {
                self.set_state(SessionState::Ready);
                Ok(())
            }
        }
    }

    /// Start playback: size both layers to the first frame, then redraw on every tick that lands
    /// on a new frame index.
    ///
    /// `make_layer` builds the image layer first, then the vector layer.
    pub fn start<F, P>(
        &mut self,
        clock: Rc<dyn FrameClock>,
        mut make_layer: F,
        presenter: P,
    ) -> FlowvizResult<()>
    where
        F: FnMut(u32, u32) -> FlowvizResult<S>,
        P: FramePresenter<S> + 'static,
    {
        if !matches!(self.state, SessionState::Ready) {
            return Err(FlowvizError::validation(format!(
                "session cannot start while {}",
                self.state.name()
            )));
        }

        let (Some(frames), Some(vectors)) = (self.frames.items(), self.vectors.items()) else {
            return Err(FlowvizError::validation("session data is not loaded"));
        };
        if frames.len() != vectors.len() {
            return Err(FlowvizError::validation(format!(
                "frame count {} does not match vector file count {}",
                frames.len(),
                vectors.len()
            )));
        }
        let first = frames
            .first()
            .ok_or_else(|| FlowvizError::validation("dataset has no frames"))?;
        let (width, height) = (first.width(), first.height());

        let max_distance = max_squared_displacement(&vectors);
        let renderer = VectorFieldRenderer::new(
            self.config.options,
            max_distance,
            make_layer(width, height)?,
            make_layer(width, height)?,
        );
        tracing::info!(width, height, max_distance, "starting playback");

        let playback = Rc::new(RefCell::new(Playback {
            renderer,
            frames,
            vectors,
            frame_count: self.config.meta.frame_count,
            shown: None,
            last_error: None,
            presenter: Box::new(presenter),
        }));

        let duration_ms = i64::try_from(self.config.meta.video_duration_ms).unwrap_or(i64::MAX);
        let ticking = Rc::clone(&playback);
        let handle = AnimationClock::new(clock).start(duration_ms, move |progress| {
            match ticking.try_borrow_mut() {
                Ok(mut playback) => playback.advance(progress),
                Err(_) => tracing::warn!(progress, "render still in progress, tick dropped"),
            }
        });

        self.playback = Some(playback);
        self.clock = Some(handle);
        self.set_state(SessionState::Animating);
        Ok(())
    }

    /// Stop playback and release the clock handle. Drawn layers stay inspectable.
    pub fn stop(&mut self) {
        if let Some(handle) = self.clock.take() {
            handle.cancel();
            if matches!(self.state, SessionState::Animating) {
                self.set_state(SessionState::Ready);
            }
        }
    }

    /// `true` while the animation still expects ticks.
    pub fn is_playing(&self) -> bool {
        self.clock.as_ref().is_some_and(ClockHandle::is_active)
    }

    /// Last progress value delivered by the animation clock.
    pub fn progress(&self) -> f64 {
        self.clock.as_ref().map_or(0.0, ClockHandle::progress)
    }

    /// Index of the frame currently on screen.
    pub fn current_frame(&self) -> Option<FrameIndex> {
        self.playback.as_ref()?.try_borrow().ok()?.shown
    }

    /// Most recent drawing failure, if any.
    pub fn render_error(&self) -> Option<FlowvizError> {
        self.playback
            .as_ref()?
            .try_borrow()
            .ok()?
            .last_error
            .clone()
    }

    /// The renderer and its layers, once playback started.
    pub fn renderer(&self) -> Option<Ref<'_, VectorFieldRenderer<S>>> {
        let playback = self.playback.as_ref()?.try_borrow().ok()?;
        Some(Ref::map(playback, |p| &p.renderer))
    }

    fn batch_error(&self) -> Option<FlowvizError> {
        let errors = [self.frames.error(), self.vectors.error()];
        let mut errors = errors.into_iter().flatten();
        match errors.next() {
            Some(first) if first.is_cancelled() => {
                Some(errors.find(|e| !e.is_cancelled()).unwrap_or(first))
            }
            Some(first) => Some(first),
            None if self.frames.is_ready() && self.vectors.is_ready() => None,
            // Superseded before settling.
            None => Some(FlowvizError::Cancelled),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        match &state {
            SessionState::Failed(err) => {
                tracing::error!(dataset = %self.config.dataset, error = %err, "session failed");
            }
            other => {
                tracing::info!(dataset = %self.config.dataset, state = other.name(), "session state");
            }
        }
        self.state = state;
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
