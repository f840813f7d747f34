//! Structural adapter — one Tera instance per view file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tera::Tera;

use super::{locate_file, EngineKind, ViewAdapter};
use crate::cache::ViewCache;
use crate::config::views_dir;
use crate::context::{TemplateData, VarMap};
use crate::error::{execution_failed, EngineError, RenderError};

/// Renders `<root>/views/<view>.page.tmpl` with Tera.
///
/// Compiles on every call unless built with a cache, in which case the
/// compiled view is reused until its file changes.
pub struct PageAdapter {
    views_dir: PathBuf,
    cache: Option<ViewCache<Tera>>,
}

impl PageAdapter {
    pub fn new(root_path: &Path, cache_views: bool) -> Self {
        Self {
            views_dir: views_dir(root_path),
            cache: cache_views.then(ViewCache::new),
        }
    }

    fn compiled(&self, view: &str, path: &Path) -> Result<Arc<Tera>, EngineError> {
        match &self.cache {
            Some(cache) => cache.get_or_load(view, path, |p| compile(view, p)),
            None => compile(view, path).map(Arc::new),
        }
    }
}

fn compile(view: &str, path: &Path) -> Result<Tera, EngineError> {
    let mut tera = Tera::default();
    // Every view is markup; escape regardless of the registered name.
    tera.autoescape_on(vec![""]);
    tera.add_template_file(path, Some(view))?;
    Ok(tera)
}

impl ViewAdapter for PageAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Go
    }

    fn locate(&self, view: &str) -> Result<PathBuf, RenderError> {
        locate_file(&self.views_dir, EngineKind::Go, view)
    }

    /// Engine variables are not part of the structural scope.
    fn execute(
        &self,
        view: &str,
        _variables: Option<&VarMap>,
        data: &TemplateData,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let path = self.locate(view)?;
        let tera = self
            .compiled(view, &path)
            .map_err(|e| execution_failed(view, e))?;
        let ctx = data.to_tera_context(view)?;
        tera.render_to(view, &ctx, out)
            .map_err(|e| execution_failed(view, e))
    }
}
