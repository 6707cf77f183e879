use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use futures::future::{self, FutureExt as _, LocalBoxFuture};

use crate::foundation::error::{FlowvizError, FlowvizResult};

/// Transport that retrieves a named resource as raw bytes.
///
/// Dropping a returned future is the cancellation request: implementations must not rely on it
/// being polled to completion.
pub trait ResourceSource {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, FlowvizResult<Vec<u8>>>;
}

/// Reads resources relative to a root directory with non-blocking file IO.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for FsSource {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, FlowvizResult<Vec<u8>>> {
        let rel = match normalize_rel_path(path) {
            Ok(rel) => rel,
            Err(e) => {
                return future::ready(Err(FlowvizError::load(path, e.to_string()))).boxed_local();
            }
        };
        let full = self.root.join(rel);
        let path = path.to_owned();
        async move {
            async_fs::read(&full)
                .await
                .with_context(|| format!("read '{}'", full.display()))
                .map_err(|e| FlowvizError::load(path, format!("{e:#}")))
        }
        .boxed_local()
    }
}

/// Resources held in memory, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), bytes.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceSource for MemorySource {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, FlowvizResult<Vec<u8>>> {
        let result = self
            .entries
            .get(path)
            .cloned()
            .ok_or_else(|| FlowvizError::load(path, "not found"));
        future::ready(result).boxed_local()
    }
}

/// Normalize and validate root-relative resource paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> FlowvizResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(FlowvizError::validation("resource paths must be relative"));
    }
    if s.is_empty() {
        return Err(FlowvizError::validation("resource path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(FlowvizError::validation(
                "resource paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(FlowvizError::validation(
            "resource path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/loader/source.rs"]
mod tests;
