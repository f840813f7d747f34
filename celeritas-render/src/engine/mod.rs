//! Engine adapters and the [`EngineKind`] registry.
//!
//! # View naming
//!
//! | Engine | Kind       | Backend   | View resource                     |
//! |--------|------------|-----------|-----------------------------------|
//! | `go`   | structural | Tera      | `<root>/views/<view>.page.tmpl`   |
//! | `jet`  | expression | MiniJinja | `<view>.jet` under `<root>/views` |

mod expression;
mod structural;

use std::io::Write;
use std::path::PathBuf;

use crate::context::{TemplateData, VarMap};
use crate::error::RenderError;

pub use expression::JetAdapter;
pub use structural::PageAdapter;

/// Extension of structural views (`home` → `home.page.tmpl`).
pub const PAGE_EXTENSION: &str = "page.tmpl";

/// Extension of expression views (`home` → `home.jet`).
pub const JET_EXTENSION: &str = "jet";

// ---------------------------------------------------------------------------
// EngineKind
// ---------------------------------------------------------------------------

/// All supported rendering engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Structural templates resolved to a file path per view.
    Go,
    /// Expression templates resolved from a named set.
    Jet,
}

impl EngineKind {
    /// All engine variants in a stable order.
    pub fn all() -> &'static [EngineKind] {
        &[EngineKind::Go, EngineKind::Jet]
    }

    /// Case-insensitive lookup; `None` for unregistered names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Go => "go",
            EngineKind::Jet => "jet",
        }
    }

    /// File name a view resolves to for this engine.
    pub fn view_file(&self, view: &str) -> String {
        match self {
            EngineKind::Go => format!("{view}.{PAGE_EXTENSION}"),
            EngineKind::Jet => format!("{view}.{JET_EXTENSION}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ViewAdapter
// ---------------------------------------------------------------------------

/// The capability every engine adapter provides.
///
/// Adapters are stateless per call and shared read-only across threads.
pub trait ViewAdapter: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Resolve `view` to its resource, or [`RenderError::ViewNotFound`].
    fn locate(&self, view: &str) -> Result<PathBuf, RenderError>;

    /// Render `view` straight into `out`. Output already written when a
    /// failure occurs is left in place.
    fn execute(
        &self,
        view: &str,
        variables: Option<&VarMap>,
        data: &TemplateData,
        out: &mut dyn Write,
    ) -> Result<(), RenderError>;
}

pub(crate) fn locate_file(
    views_dir: &std::path::Path,
    kind: EngineKind,
    view: &str,
) -> Result<PathBuf, RenderError> {
    let path = views_dir.join(kind.view_file(view));
    if path.is_file() {
        Ok(path)
    } else {
        Err(RenderError::ViewNotFound {
            view: view.to_string(),
            path,
        })
    }
}
