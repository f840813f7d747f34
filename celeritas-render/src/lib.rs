//! # celeritas-render
//!
//! Engine-agnostic page rendering: pick an engine by name, merge
//! request-derived [`TemplateData`] (authentication from the session, server
//! identity, transport security) and write the rendered view to a sink.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use celeritas_render::{RenderConfig, Renderer};
//! use celeritas_session::{SessionConfig, SessionManager};
//!
//! fn serve(request: &http::Request<()>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
//!     let session = Arc::new(SessionManager::build(&SessionConfig::from_env())?);
//!     let renderer = Renderer::new(RenderConfig::from_env("."), session);
//!     let mut body = Vec::new();
//!     renderer.page(&mut body, request, "home", None, None)?;
//!     Ok(body)
//! }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod renderer;

pub use config::RenderConfig;
pub use context::{build_context, TemplateData, VarMap, AUTH_SESSION_KEY};
pub use engine::{EngineKind, JetAdapter, PageAdapter, ViewAdapter};
pub use error::{EngineError, RenderError};
pub use renderer::Renderer;
