//! Static renderer configuration.

use std::path::{Path, PathBuf};

use celeritas_session::parse_flag;
use serde::Serialize;

/// Settings fixed at startup and copied into every [`TemplateData`].
///
/// [`TemplateData`]: crate::TemplateData
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderConfig {
    /// Engine used by [`Renderer::page`](crate::Renderer::page).
    pub engine: String,
    /// Application root; views live under `<root_path>/views`.
    pub root_path: PathBuf,
    pub port: String,
    pub server_name: String,
    pub secure: bool,
    /// Cache compiled structural views, invalidated by file modification time.
    pub cache_views: bool,
    /// Re-read expression views on every call (development mode).
    pub reload_views: bool,
}

impl RenderConfig {
    pub fn new(engine: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Read `RENDERER`, `PORT`, `SERVER_NAME`, `SECURE`, `CACHE_VIEWS` and
    /// `DEBUG` from the process environment.
    pub fn from_env(root_path: impl Into<PathBuf>) -> Self {
        Self::from_lookup(root_path, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(root_path: impl Into<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            engine: get("RENDERER"),
            root_path: root_path.into(),
            port: get("PORT"),
            server_name: get("SERVER_NAME"),
            secure: parse_flag(&get("SECURE")),
            cache_views: parse_flag(&get("CACHE_VIEWS")),
            reload_views: parse_flag(&get("DEBUG")),
        }
    }

    pub fn views_dir(&self) -> PathBuf {
        views_dir(&self.root_path)
    }
}

pub(crate) fn views_dir(root: &Path) -> PathBuf {
    root.join("views")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_fills_every_field() {
        let cfg = RenderConfig::from_lookup("/srv/app", |key| {
            match key {
                "RENDERER" => Some("jet"),
                "PORT" => Some("4000"),
                "SERVER_NAME" => Some("localhost"),
                "SECURE" => Some("True"),
                "CACHE_VIEWS" => Some("true"),
                "DEBUG" => Some("false"),
                _ => None,
            }
            .map(str::to_string)
        });
        assert_eq!(cfg.engine, "jet");
        assert_eq!(cfg.port, "4000");
        assert_eq!(cfg.server_name, "localhost");
        assert!(cfg.secure);
        assert!(cfg.cache_views);
        assert!(!cfg.reload_views);
        assert_eq!(cfg.views_dir(), PathBuf::from("/srv/app/views"));
    }
}
