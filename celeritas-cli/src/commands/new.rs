//! `celeritas new <path>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::settings::env_file;

/// Folders every application root carries.
pub const APP_FOLDERS: &[&str] = &[
    "handlers",
    "migrations",
    "views",
    "data",
    "public",
    "tmp",
    "logs",
    "middleware",
];

/// Create the application folder layout.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Application root directory (created if missing).
    pub path: PathBuf,
}

impl NewArgs {
    /// Idempotent: existing folders and an existing `.env` are left alone.
    pub fn run(self) -> Result<()> {
        let mut created = Vec::new();
        for folder in APP_FOLDERS {
            let dir = self.path.join(folder);
            if dir.is_dir() {
                continue;
            }
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("cannot create '{}'", dir.display()))?;
            created.push(*folder);
        }

        let env = env_file(&self.path);
        if !env.exists() {
            std::fs::write(&env, "")
                .with_context(|| format!("cannot create '{}'", env.display()))?;
            created.push(".env");
        }

        println!(
            "{} Application skeleton ready at '{}'",
            "✓".green().bold(),
            self.path.display()
        );
        for folder in APP_FOLDERS.iter().copied().chain(std::iter::once(".env")) {
            let marker = if created.contains(&folder) { "+" } else { "·" };
            println!("  {marker}  {folder}");
        }
        Ok(())
    }
}
