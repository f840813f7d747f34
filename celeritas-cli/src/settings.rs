//! Assemble renderer and session configuration for an application root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use celeritas_render::RenderConfig;
use celeritas_session::SessionConfig;

/// Everything the bootstrap layer hands to the rendering subsystem.
#[derive(Debug, Clone)]
pub struct Settings {
    pub render: RenderConfig,
    pub session: SessionConfig,
}

pub fn env_file(root: &Path) -> PathBuf {
    root.join(".env")
}

/// Load `<root>/.env` (when present) into the process environment, then read
/// both configurations from it.
pub fn load(root: &Path) -> Result<Settings> {
    let path = env_file(root);
    if path.is_file() {
        dotenvy::from_path(&path)
            .with_context(|| format!("failed to load environment file '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    Ok(Settings {
        render: RenderConfig::from_env(root),
        session: SessionConfig::from_env(),
    })
}
