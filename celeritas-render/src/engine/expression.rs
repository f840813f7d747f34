//! Expression adapter — MiniJinja environment over the views directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind};

use super::{locate_file, EngineKind, ViewAdapter};
use crate::config::views_dir;
use crate::context::{TemplateData, VarMap};
use crate::error::{execution_failed, RenderError};

/// Renders `<view>.jet` from a loader-backed template set rooted at
/// `<root>/views`, so views can extend and include one another by name.
///
/// Engine variables and [`TemplateData`] share one scope; on a name clash
/// the template data wins.
pub struct JetAdapter {
    views_dir: PathBuf,
    reload: bool,
    env: Environment<'static>,
}

impl JetAdapter {
    pub fn new(root_path: &Path, reload: bool) -> Self {
        let views_dir = views_dir(root_path);
        let env = environment(&views_dir);
        Self {
            views_dir,
            reload,
            env,
        }
    }
}

fn environment(views_dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader(views_dir.to_path_buf()));
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
}

fn scope(variables: Option<&VarMap>, data: &TemplateData) -> Result<VarMap, serde_json::Error> {
    let mut scope = variables.cloned().unwrap_or_default();
    if let serde_json::Value::Object(fields) = serde_json::to_value(data)? {
        scope.extend(fields);
    }
    Ok(scope)
}

impl ViewAdapter for JetAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Jet
    }

    fn locate(&self, view: &str) -> Result<PathBuf, RenderError> {
        locate_file(&self.views_dir, EngineKind::Jet, view)
    }

    fn execute(
        &self,
        view: &str,
        variables: Option<&VarMap>,
        data: &TemplateData,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let path = self.locate(view)?;
        let name = EngineKind::Jet.view_file(view);

        let fresh;
        let env = if self.reload {
            fresh = environment(&self.views_dir);
            &fresh
        } else {
            &self.env
        };

        let template = env.get_template(&name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => RenderError::ViewNotFound {
                view: view.to_string(),
                path: path.clone(),
            },
            _ => execution_failed(view, e),
        })?;
        let scope = scope(variables, data).map_err(|e| execution_failed(view, e))?;
        template
            .render_to_write(&scope, out)
            .map(|_| ())
            .map_err(|e| execution_failed(view, e))
    }
}
