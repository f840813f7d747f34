//! [`Renderer`] — routes a render call to exactly one engine adapter.

use std::io::Write;
use std::sync::Arc;

use http::Request;

use celeritas_session::SessionManager;

use crate::config::RenderConfig;
use crate::context::{build_context, TemplateData, VarMap};
use crate::engine::{EngineKind, JetAdapter, PageAdapter, ViewAdapter};
use crate::error::RenderError;

/// Rendering dispatcher.
///
/// Create once at startup with [`Renderer::new`] and share it across request
/// handlers; every method takes `&self`.
pub struct Renderer {
    config: RenderConfig,
    session: Arc<SessionManager>,
    page: PageAdapter,
    jet: JetAdapter,
}

impl Renderer {
    pub fn new(config: RenderConfig, session: Arc<SessionManager>) -> Self {
        let page = PageAdapter::new(&config.root_path, config.cache_views);
        let jet = JetAdapter::new(&config.root_path, config.reload_views);
        Renderer {
            config,
            session,
            page,
            jet,
        }
    }

    pub fn adapter(&self, kind: EngineKind) -> &dyn ViewAdapter {
        match kind {
            EngineKind::Go => &self.page,
            EngineKind::Jet => &self.jet,
        }
    }

    /// Request-derived context merged over `base`.
    pub fn default_data<B>(&self, base: Option<TemplateData>, request: &Request<B>) -> TemplateData {
        build_context(base, &self.config, &self.session, request)
    }

    /// Render `view` with the configured engine. Entry point for route
    /// handlers.
    pub fn page<B>(
        &self,
        out: &mut dyn Write,
        request: &Request<B>,
        view: &str,
        variables: Option<&VarMap>,
        data: Option<TemplateData>,
    ) -> Result<(), RenderError> {
        self.render(out, request, &self.config.engine, view, variables, data)
    }

    /// Render `view` with the engine named `engine`.
    ///
    /// Unknown engines fail before any view lookup. The selected adapter's
    /// error is returned unchanged; there is no fallback engine.
    pub fn render<B>(
        &self,
        out: &mut dyn Write,
        request: &Request<B>,
        engine: &str,
        view: &str,
        variables: Option<&VarMap>,
        data: Option<TemplateData>,
    ) -> Result<(), RenderError> {
        let kind = EngineKind::from_name(engine).ok_or_else(|| RenderError::UnknownEngine {
            name: engine.to_string(),
        })?;
        let td = self.default_data(data, request);
        tracing::debug!(
            engine = kind.name(),
            view,
            authenticated = td.is_authenticated,
            "rendering view"
        );
        self.adapter(kind).execute(view, variables, &td, out)
    }

    /// [`Renderer::page`] into a `String`.
    pub fn page_to_string<B>(
        &self,
        request: &Request<B>,
        view: &str,
        variables: Option<&VarMap>,
        data: Option<TemplateData>,
    ) -> Result<String, RenderError> {
        let mut buf = Vec::new();
        self.page(&mut buf, request, view, variables, data)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
