//! Flowviz plays back pre-extracted video frames and draws each frame's motion vectors on top.
//!
//! A [`Session`] loads every frame raster and vector file of a dataset up front through a
//! [`ResourceSource`], then maps wall-clock time onto frame indices with an [`AnimationClock`]
//! and redraws through a [`VectorFieldRenderer`] on two [`DrawingSurface`] layers.
//!
//! Everything runs on one thread. Loading is a future (drive it with any executor, e.g.
//! `futures::executor::block_on`); playback is driven by a [`FrameClock`].
#![forbid(unsafe_code)]

pub mod assets;
pub mod clock;
pub mod config;
pub mod foundation;
pub mod loader;
pub mod render;
pub mod session;

pub use crate::assets::dataset::{DatasetLayout, DatasetMeta, DatasetRegistry, DEFAULT_DATASET};
pub use crate::assets::raster::{RasterImage, decode_ppm};
pub use crate::assets::vectors::{VectorSample, decode_vector_samples};
pub use crate::clock::animation::{AnimationClock, ClockHandle, frame_index, frame_label};
pub use crate::clock::frame_clock::{FrameClock, FrameToken, ManualFrameClock, RefreshClock};
pub use crate::config::{RenderOptions, VisualizerConfig};
pub use crate::foundation::core::{Affine, BezPath, FrameIndex, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{FlowvizError, FlowvizResult};
pub use crate::loader::batch::{BatchLoader, LoadState};
pub use crate::loader::source::{FsSource, MemorySource, ResourceSource};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::field::{RenderStats, VectorFieldRenderer, max_squared_displacement};
pub use crate::render::surface::DrawingSurface;
pub use crate::session::{FramePresenter, FrameReport, Session, SessionState};
