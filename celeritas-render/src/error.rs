//! Error types for celeritas-render.

use std::path::PathBuf;

use thiserror::Error;

/// All errors a render call can return.
///
/// `UnknownEngine` and `ViewNotFound` are raised before anything is written
/// to the sink; `ExecutionFailed` may follow partial output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested engine name matches no registered adapter.
    #[error("unknown rendering engine '{name}'")]
    UnknownEngine { name: String },

    /// The view resource does not exist where the naming convention puts it.
    #[error("view '{view}' not found at {path}")]
    ViewNotFound { view: String, path: PathBuf },

    /// The engine failed to compile, bind or execute the view.
    #[error("failed to render view '{view}': {source}")]
    ExecutionFailed {
        view: String,
        #[source]
        source: EngineError,
    },
}

/// Underlying cause of [`RenderError::ExecutionFailed`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tera: {0}")]
    Tera(#[from] tera::Error),

    #[error("minijinja: {0}")]
    Jinja(#[from] minijinja::Error),

    /// Template data could not be turned into an engine context.
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("view io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn execution_failed(view: &str, source: impl Into<EngineError>) -> RenderError {
    RenderError::ExecutionFailed {
        view: view.to_string(),
        source: source.into(),
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
