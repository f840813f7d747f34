//! `celeritas config` — show the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use celeritas_render::{EngineKind, RenderConfig};
use celeritas_session::StoreType;

use crate::settings::{self, Settings};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Application root containing `.env`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SessionReport {
    store: StoreType,
    cookie_name: String,
    cookie_domain: Option<String>,
    lifetime_minutes: u64,
    persist: bool,
    secure: bool,
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    renderer: &'a RenderConfig,
    engine_known: bool,
    session: SessionReport,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let settings = settings::load(&self.root)?;
        let report = report(&settings);

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .context("failed to serialize configuration")?;
            println!("{json}");
            return Ok(());
        }

        println!("\n{}", "Celeritas configuration".bold());
        let table = Table::new(rows(&report)).with(Style::rounded()).to_string();
        println!("{table}");
        if !report.engine_known {
            println!(
                "{} RENDERER '{}' is not a known engine (expected go or jet)",
                "!".yellow().bold(),
                report.renderer.engine
            );
        }
        Ok(())
    }
}

fn report(settings: &Settings) -> ConfigReport<'_> {
    let policy = settings.session.cookie_policy();
    ConfigReport {
        renderer: &settings.render,
        engine_known: EngineKind::from_name(&settings.render.engine).is_some(),
        session: SessionReport {
            store: settings.session.store_type(),
            cookie_name: policy.name,
            cookie_domain: policy.domain,
            lifetime_minutes: policy.lifetime.as_secs() / 60,
            persist: policy.persist,
            secure: policy.secure,
        },
    }
}

fn rows(report: &ConfigReport<'_>) -> Vec<SettingRow> {
    let render = report.renderer;
    let session = &report.session;
    let engine = if render.engine.is_empty() {
        "(unset)".to_string()
    } else {
        render.engine.clone()
    };
    vec![
        SettingRow { key: "renderer", value: engine },
        SettingRow { key: "views", value: render.views_dir().display().to_string() },
        SettingRow { key: "server_name", value: render.server_name.clone() },
        SettingRow { key: "port", value: render.port.clone() },
        SettingRow { key: "secure", value: render.secure.to_string() },
        SettingRow { key: "cache_views", value: render.cache_views.to_string() },
        SettingRow { key: "reload_views", value: render.reload_views.to_string() },
        SettingRow { key: "session.store", value: session.store.to_string() },
        SettingRow { key: "session.cookie", value: session.cookie_name.clone() },
        SettingRow {
            key: "session.domain",
            value: session.cookie_domain.clone().unwrap_or_default(),
        },
        SettingRow { key: "session.lifetime_min", value: session.lifetime_minutes.to_string() },
        SettingRow { key: "session.persist", value: session.persist.to_string() },
        SettingRow { key: "session.secure", value: session.secure.to_string() },
    ]
}
