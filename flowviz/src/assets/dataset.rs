use std::collections::BTreeMap;

use crate::foundation::error::{FlowvizError, FlowvizResult};

/// Dataset used when none is requested.
pub const DEFAULT_DATASET: &str = "black-hole";

/// Static facts about a pre-extracted dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatasetMeta {
    #[serde(alias = "FRAME_COUNT")]
    pub frame_count: u32,
    #[serde(alias = "VIDEO_DURATION_MS")]
    pub video_duration_ms: u64,
}

impl DatasetMeta {
    pub fn new(frame_count: u32, video_duration_ms: u64) -> FlowvizResult<Self> {
        let meta = Self {
            frame_count,
            video_duration_ms,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn validate(&self) -> FlowvizResult<()> {
        if self.frame_count == 0 {
            return Err(FlowvizError::validation("dataset frame_count must be > 0"));
        }
        if self.video_duration_ms == 0 {
            return Err(FlowvizError::validation(
                "dataset video_duration_ms must be > 0",
            ));
        }
        Ok(())
    }
}

/// Name → metadata lookup for the datasets the visualizer knows about.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, DatasetMeta>,
}

impl DatasetRegistry {
    /// Registry with the datasets shipped alongside the tool.
    pub fn builtin() -> Self {
        let mut datasets = BTreeMap::new();
        datasets.insert(
            "bird".to_owned(),
            DatasetMeta {
                frame_count: 248,
                video_duration_ms: 9 * 1000,
            },
        );
        datasets.insert(
            "black-hole".to_owned(),
            DatasetMeta {
                frame_count: 659,
                video_duration_ms: 21 * 1000,
            },
        );
        Self { datasets }
    }

    /// Parse a JSON object of `name -> { frame_count, video_duration_ms }`.
    pub fn from_json(bytes: &[u8]) -> FlowvizResult<Self> {
        let registry: Self = serde_json::from_slice(bytes)
            .map_err(|e| FlowvizError::validation(format!("dataset registry: {e}")))?;
        for (name, meta) in &registry.datasets {
            meta.validate()
                .map_err(|e| FlowvizError::validation(format!("dataset '{name}': {e}")))?;
        }
        Ok(registry)
    }

    /// Add or replace every entry of `other`.
    pub fn extend(&mut self, other: DatasetRegistry) {
        self.datasets.extend(other.datasets);
    }

    pub fn insert(&mut self, name: impl Into<String>, meta: DatasetMeta) -> FlowvizResult<()> {
        meta.validate()?;
        self.datasets.insert(name.into(), meta);
        Ok(())
    }

    pub fn get(&self, name: &str) -> FlowvizResult<DatasetMeta> {
        self.datasets.get(name).copied().ok_or_else(|| {
            FlowvizError::validation(format!(
                "unknown dataset '{name}' (known: {})",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }
}

/// On-disk naming convention of a dataset.
///
/// Frame `i` (1-based on disk) lives at `{dataset}/frames/frame{i}.{ext}` and its vectors at
/// `{dataset}/mv/{i}.json`. Path lists are returned 0-based: element `i - 1` is disk index `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLayout {
    pub dataset: String,
    pub frame_count: u32,
    pub frame_extension: String,
}

impl DatasetLayout {
    pub fn frame_path(&self, disk_index: u32) -> String {
        format!(
            "{}/frames/frame{disk_index}.{}",
            self.dataset, self.frame_extension
        )
    }

    pub fn vector_path(&self, disk_index: u32) -> String {
        format!("{}/mv/{disk_index}.json", self.dataset)
    }

    pub fn frame_paths(&self) -> Vec<String> {
        (1..=self.frame_count).map(|i| self.frame_path(i)).collect()
    }

    pub fn vector_paths(&self) -> Vec<String> {
        (1..=self.frame_count).map(|i| self.vector_path(i)).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/dataset.rs"]
mod tests;
