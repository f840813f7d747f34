//! `celeritas render <view>` — render one view to stdout.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use http::{header, Request};
use serde_json::Value;

use celeritas_render::{Renderer, VarMap, AUTH_SESSION_KEY};
use celeritas_session::SessionManager;

use crate::settings;

/// Arguments for `celeritas render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// View name, e.g. `home` for `views/home.page.tmpl` or `views/home.jet`.
    pub view: String,

    /// Application root containing `views/` and `.env`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Engine override (`go` or `jet`); defaults to RENDERER.
    #[arg(long, short = 'e')]
    pub engine: Option<String>,

    /// Engine variable; the value is parsed as JSON when possible.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, Value)>,

    /// Render as this user: seeds a session holding `userID` and sends its cookie.
    #[arg(long)]
    pub user: Option<String>,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let mut settings = settings::load(&self.root)?;
        if let Some(engine) = self.engine {
            settings.render.engine = engine;
        }

        let session = SessionManager::build(&settings.session)
            .context("failed to initialise session store")?;
        let session = Arc::new(session);

        let mut request = Request::builder().uri(format!("/{}", self.view));
        if let Some(user) = self.user {
            let token = session
                .put(None, AUTH_SESSION_KEY, user)
                .context("failed to seed session")?;
            let cookie = session.session_cookie(&token);
            request = request.header(header::COOKIE, format!("{}={}", cookie.name(), cookie.value()));
        }
        let request = request.body(()).context("failed to build request")?;

        let vars: VarMap = self.vars.into_iter().collect();
        let renderer = Renderer::new(settings.render, session);

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        renderer
            .page(&mut out, &request, &self.view, Some(&vars), None)
            .with_context(|| format!("failed to render view '{}'", self.view))?;
        out.flush().context("failed to flush output")?;
        Ok(())
    }
}

fn parse_var(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
