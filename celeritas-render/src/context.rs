//! Template data — the engine-agnostic payload merged into every render.

use std::collections::BTreeMap;

use http::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use celeritas_session::SessionManager;

use crate::config::RenderConfig;
use crate::error::{execution_failed, RenderError};

/// Session key whose presence marks a request as authenticated.
pub const AUTH_SESSION_KEY: &str = "userID";

/// Engine-native variables for the expression engine, kept apart from
/// [`TemplateData`].
pub type VarMap = serde_json::Map<String, Value>;

/// Generic rendering payload.
///
/// Callers may fill any subset; the rest defaults to zero values. `port`,
/// `server_name`, `secure` and `is_authenticated` are always overwritten by
/// [`build_context`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateData {
    pub is_authenticated: bool,
    pub int_map: BTreeMap<String, i64>,
    pub string_map: BTreeMap<String, String>,
    pub float_map: BTreeMap<String, f32>,
    pub data: BTreeMap<String, Value>,
    /// Placeholder until CSRF middleware fills it.
    pub csrf_token: String,
    pub port: String,
    pub server_name: String,
    pub secure: bool,
}

impl TemplateData {
    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self, view: &str) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(|e| execution_failed(view, e))
    }
}

/// Merge request-derived context into `base`.
///
/// Infallible. The authentication flag comes only from the session: a
/// caller-supplied `is_authenticated` is discarded.
pub fn build_context<B>(
    base: Option<TemplateData>,
    config: &RenderConfig,
    session: &SessionManager,
    request: &Request<B>,
) -> TemplateData {
    let mut td = base.unwrap_or_default();
    td.secure = config.secure;
    td.server_name = config.server_name.clone();
    td.port = config.port.clone();
    td.is_authenticated = session.exists(request, AUTH_SESSION_KEY);
    td
}

#[cfg(test)]
mod tests {
    use super::*;
    use celeritas_session::{CookiePolicy, SessionConfig};
    use http::header;

    fn config() -> RenderConfig {
        RenderConfig {
            port: "4000".into(),
            server_name: "celeritas.test".into(),
            secure: true,
            ..RenderConfig::new("go", "./testdata")
        }
    }

    fn session() -> SessionManager {
        SessionManager::build(&SessionConfig::default()).expect("memory session")
    }

    fn request(cookie: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/url");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn absent_base_starts_from_defaults() {
        let td = build_context(None, &config(), &session(), &request(None));
        assert_eq!(td.port, "4000");
        assert_eq!(td.server_name, "celeritas.test");
        assert!(td.secure);
        assert!(!td.is_authenticated);
        assert!(td.string_map.is_empty());
        assert!(td.csrf_token.is_empty());
    }

    #[test]
    fn static_fields_overwrite_caller_values() {
        let base = TemplateData {
            port: "1".into(),
            server_name: "spoofed".into(),
            secure: false,
            is_authenticated: true,
            string_map: BTreeMap::from([("title".to_string(), "Hi".to_string())]),
            ..TemplateData::default()
        };
        let td = build_context(Some(base), &config(), &session(), &request(None));
        assert_eq!(td.port, "4000");
        assert_eq!(td.server_name, "celeritas.test");
        assert!(td.secure);
        assert!(!td.is_authenticated, "caller-supplied auth flag must be ignored");
        assert_eq!(td.string_map["title"], "Hi");
    }

    #[test]
    fn user_id_in_session_authenticates() {
        let mgr = session();
        let token = mgr.put(None, AUTH_SESSION_KEY, 7).unwrap();
        let cookie = format!("{}={token}", CookiePolicy::default().name);
        let td = build_context(None, &config(), &mgr, &request(Some(&cookie)));
        assert!(td.is_authenticated);

        let anon = build_context(None, &config(), &mgr, &request(Some("session=unknown")));
        assert!(!anon.is_authenticated);
    }

    #[test]
    fn building_twice_is_identical() {
        let mgr = session();
        let token = mgr.put(None, AUTH_SESSION_KEY, "u-1").unwrap();
        let req = request(Some(&format!("session={token}")));
        let base = TemplateData {
            int_map: BTreeMap::from([("n".to_string(), 3)]),
            ..TemplateData::default()
        };
        let first = build_context(Some(base.clone()), &config(), &mgr, &req);
        let second = build_context(Some(base), &config(), &mgr, &req);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn to_tera_context_succeeds() {
        let td = build_context(None, &config(), &session(), &request(None));
        let ctx = td.to_tera_context("home").expect("context conversion");
        assert!(ctx.contains_key("server_name"));
    }
}
