use std::sync::Arc;

/// Result alias used across the crate.
pub type FlowvizResult<T> = Result<T, FlowvizError>;

/// Closed set of failures the visualizer can surface.
///
/// The type is `Clone` so a batch's terminal failure can be held by the loader and handed to the
/// session at the same time.
#[derive(thiserror::Error, Debug, Clone)]
pub enum FlowvizError {
    /// Raster decoding failed (unsupported bit depth, bad header, short raster).
    #[error("image format error in {}: {message} (byte offset {offset})", display_path(.path))]
    ImageFormat {
        /// Offending resource, when known.
        path: Option<String>,
        /// Byte offset into the buffer where decoding stopped.
        offset: usize,
        /// Human readable cause.
        message: String,
    },

    /// Vector-sample data could not be parsed.
    #[error("vector format error in {}: {message}", display_path(.path))]
    VectorFormat {
        /// Offending resource, when known.
        path: Option<String>,
        /// Human readable cause.
        message: String,
    },

    /// Retrieval of a resource failed.
    #[error("load error for '{path}': {message}")]
    Load {
        /// Resource path as requested from the source.
        path: String,
        /// Human readable cause.
        message: String,
    },

    /// The batch was cancelled before it became ready.
    #[error("load cancelled")]
    Cancelled,

    /// Invalid configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// A drawing surface could not complete an operation.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped foreign error.
    #[error("{0:#}")]
    Other(Arc<anyhow::Error>),
}

fn display_path(path: &Option<String>) -> &str {
    path.as_deref().unwrap_or("<buffer>")
}

impl From<anyhow::Error> for FlowvizError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(Arc::new(err))
    }
}

impl FlowvizError {
    /// Raster decoding failure at `offset`.
    pub fn image_format(offset: usize, msg: impl Into<String>) -> Self {
        Self::ImageFormat {
            path: None,
            offset,
            message: msg.into(),
        }
    }

    /// Vector-sample decoding failure.
    pub fn vector_format(msg: impl Into<String>) -> Self {
        Self::VectorFormat {
            path: None,
            message: msg.into(),
        }
    }

    /// Retrieval failure for `path`.
    pub fn load(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Invalid configuration.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Drawing surface failure.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Attach the resource path to a decode error that does not carry one yet.
    pub fn with_path(self, resource: &str) -> Self {
        match self {
            Self::ImageFormat {
                path: None,
                offset,
                message,
            } => Self::ImageFormat {
                path: Some(resource.to_owned()),
                offset,
                message,
            },
            Self::VectorFormat {
                path: None,
                message,
            } => Self::VectorFormat {
                path: Some(resource.to_owned()),
                message,
            },
            other => other,
        }
    }

    /// `true` for [`FlowvizError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
