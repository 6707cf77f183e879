use crate::assets::dataset::{DEFAULT_DATASET, DatasetLayout, DatasetMeta, DatasetRegistry};
use crate::foundation::error::{FlowvizError, FlowvizResult};

/// Default raster file extension of pre-extracted frames.
pub const DEFAULT_FRAME_EXTENSION: &str = "ppm";

/// Switches that change how vectors are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Fixed stroke color plus a source → destination ground-truth overlay.
    pub debug: bool,
    /// Arrow with head, anchored at the cell center, instead of a plain segment.
    pub arrows: bool,
    /// Clear the vector layer every frame instead of fading previous strokes.
    pub stacked: bool,
}

/// Everything a session needs, resolved once by the caller.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VisualizerConfig {
    pub dataset: String,
    pub meta: DatasetMeta,
    #[serde(default)]
    pub options: RenderOptions,
    #[serde(default = "default_frame_extension")]
    pub frame_extension: String,
}

fn default_frame_extension() -> String {
    DEFAULT_FRAME_EXTENSION.to_owned()
}

impl VisualizerConfig {
    /// Resolve `dataset` against `registry`.
    pub fn from_registry(
        registry: &DatasetRegistry,
        dataset: &str,
        options: RenderOptions,
    ) -> FlowvizResult<Self> {
        let meta = registry.get(dataset)?;
        let cfg = Self {
            dataset: dataset.to_owned(),
            meta,
            options,
            frame_extension: default_frame_extension(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FlowvizResult<()> {
        if self.dataset.trim().is_empty() {
            return Err(FlowvizError::validation("dataset name must be non-empty"));
        }
        if self.frame_extension.is_empty() || self.frame_extension.contains(['/', '\\', '.']) {
            return Err(FlowvizError::validation(format!(
                "invalid frame extension '{}'",
                self.frame_extension
            )));
        }
        self.meta.validate()
    }

    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout {
            dataset: self.dataset.clone(),
            frame_count: self.meta.frame_count,
            frame_extension: self.frame_extension.clone(),
        }
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        // The built-in registry always carries the default dataset.
        let meta = DatasetRegistry::builtin()
            .get(DEFAULT_DATASET)
            .unwrap_or(DatasetMeta {
                frame_count: 659,
                video_duration_ms: 21_000,
            });
        Self {
            dataset: DEFAULT_DATASET.to_owned(),
            meta,
            options: RenderOptions::default(),
            frame_extension: default_frame_extension(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
