//! Session configuration as assembled by the bootstrap layer.
//!
//! Values arrive as raw strings (straight from the environment) and are
//! resolved into a [`CookiePolicy`] and a [`StoreType`] with forgiving
//! defaults: an unparsable lifetime becomes 60 minutes, any flag other than a
//! case-insensitive `"true"` is `false`, and an unknown store name selects the
//! in-memory store.

use std::fmt;
use std::time::Duration;

use cookie::SameSite;
use serde::Serialize;

/// Lifetime applied when `COOKIE_LIFETIME` is missing or not a positive integer.
pub const DEFAULT_LIFETIME_MINUTES: u64 = 60;

/// Cookie name used when `COOKIE_NAME` is empty.
pub const DEFAULT_COOKIE_NAME: &str = "session";

/// Timeout for the single connection attempt made while building a manager.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// StoreType
// ---------------------------------------------------------------------------

/// Session store backends known to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    #[default]
    Memory,
    Redis,
    /// MySQL and MariaDB share one adapter.
    Mysql,
    Postgres,
}

impl StoreType {
    /// Resolve a declared store name. Matching is case-insensitive and
    /// unrecognised names fall back to [`StoreType::Memory`].
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "redis" => StoreType::Redis,
            "mysql" | "mariadb" => StoreType::Mysql,
            "postgres" | "postgresql" => StoreType::Postgres,
            _ => StoreType::Memory,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Memory => "memory",
            StoreType::Redis => "redis",
            StoreType::Mysql => "mysql",
            StoreType::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Raw configuration
// ---------------------------------------------------------------------------

/// Connection parameters for the external backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreParams {
    pub redis_url: Option<String>,
    pub mysql_url: Option<String>,
    pub postgres_url: Option<String>,
    pub connect_timeout: Duration,
}

impl Default for StoreParams {
    fn default() -> Self {
        Self {
            redis_url: None,
            mysql_url: None,
            postgres_url: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Session settings exactly as declared by the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Minutes, as a string.
    pub cookie_lifetime: String,
    pub cookie_persist: String,
    pub cookie_name: String,
    pub cookie_domain: String,
    pub cookie_secure: String,
    pub session_type: String,
    pub store: StoreParams,
}

impl SessionConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Keys: `COOKIE_LIFETIME`, `COOKIE_PERSISTS`, `COOKIE_NAME`,
    /// `COOKIE_DOMAIN`, `COOKIE_SECURE`, `SESSION_TYPE`, `REDIS_URL`,
    /// `MYSQL_URL`, `POSTGRES_URL`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        let url = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            cookie_lifetime: get("COOKIE_LIFETIME"),
            cookie_persist: get("COOKIE_PERSISTS"),
            cookie_name: get("COOKIE_NAME"),
            cookie_domain: get("COOKIE_DOMAIN"),
            cookie_secure: get("COOKIE_SECURE"),
            session_type: get("SESSION_TYPE"),
            store: StoreParams {
                redis_url: url("REDIS_URL"),
                mysql_url: url("MYSQL_URL"),
                postgres_url: url("POSTGRES_URL"),
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            },
        }
    }

    pub fn store_type(&self) -> StoreType {
        StoreType::parse(&self.session_type)
    }

    /// Resolve the cookie policy the session manager will enforce.
    pub fn cookie_policy(&self) -> CookiePolicy {
        let name = if self.cookie_name.is_empty() {
            DEFAULT_COOKIE_NAME.to_string()
        } else {
            self.cookie_name.clone()
        };
        let domain = Some(self.cookie_domain.clone()).filter(|d| !d.is_empty());

        CookiePolicy {
            lifetime: Duration::from_secs(parse_lifetime_minutes(&self.cookie_lifetime) * 60),
            persist: parse_flag(&self.cookie_persist),
            name,
            domain,
            secure: parse_flag(&self.cookie_secure),
            same_site: SameSite::Lax,
        }
    }
}

/// Resolved, immutable cookie policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub lifetime: Duration,
    pub persist: bool,
    pub name: String,
    pub domain: Option<String>,
    pub secure: bool,
    /// Always `Lax`.
    pub same_site: SameSite,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        SessionConfig::default().cookie_policy()
    }
}

/// `true` only for a case-insensitive `"true"`.
pub fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

fn parse_lifetime_minutes(raw: &str) -> u64 {
    match raw.parse::<u64>() {
        Ok(minutes) if minutes > 0 => minutes,
        _ => DEFAULT_LIFETIME_MINUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> SessionConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SessionConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[rstest]
    #[case("redis", StoreType::Redis)]
    #[case("REDIS", StoreType::Redis)]
    #[case("mysql", StoreType::Mysql)]
    #[case("MariaDB", StoreType::Mysql)]
    #[case("postgres", StoreType::Postgres)]
    #[case("PostgreSQL", StoreType::Postgres)]
    #[case("memory", StoreType::Memory)]
    #[case("", StoreType::Memory)]
    #[case("mongodb", StoreType::Memory)]
    #[case(" redis", StoreType::Memory)]
    fn store_type_resolution(#[case] raw: &str, #[case] expected: StoreType) {
        assert_eq!(StoreType::parse(raw), expected);
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("True", true)]
    #[case("tRuE", true)]
    #[case("", false)]
    #[case("yes", false)]
    #[case("1", false)]
    #[case("true ", false)]
    #[case("false", false)]
    fn flag_parsing(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_flag(raw), expected);
    }

    #[rstest]
    #[case("", 60)]
    #[case("abc", 60)]
    #[case("12.5", 60)]
    #[case("-5", 60)]
    #[case("0", 60)]
    #[case("30", 30)]
    #[case("1440", 1440)]
    fn lifetime_parsing(#[case] raw: &str, #[case] minutes: u64) {
        let cfg = config_with(&[("COOKIE_LIFETIME", raw)]);
        assert_eq!(cfg.cookie_policy().lifetime, Duration::from_secs(minutes * 60));
    }

    #[test]
    fn policy_reads_environment_keys() {
        let cfg = config_with(&[
            ("COOKIE_NAME", "celeritas"),
            ("COOKIE_DOMAIN", "example.test"),
            ("COOKIE_PERSISTS", "True"),
            ("COOKIE_SECURE", "false"),
            ("SESSION_TYPE", "postgresql"),
            ("POSTGRES_URL", "postgres://app@db/app"),
        ]);
        let policy = cfg.cookie_policy();
        assert_eq!(policy.name, "celeritas");
        assert_eq!(policy.domain.as_deref(), Some("example.test"));
        assert!(policy.persist);
        assert!(!policy.secure);
        assert_eq!(policy.same_site, SameSite::Lax);
        assert_eq!(cfg.store_type(), StoreType::Postgres);
        assert_eq!(cfg.store.postgres_url.as_deref(), Some("postgres://app@db/app"));
        assert!(cfg.store.redis_url.is_none());
    }

    #[test]
    fn empty_name_and_domain_use_defaults() {
        let policy = config_with(&[]).cookie_policy();
        assert_eq!(policy.name, DEFAULT_COOKIE_NAME);
        assert!(policy.domain.is_none());
        assert_eq!(policy.lifetime, Duration::from_secs(60 * 60));
    }

    #[test]
    fn blank_urls_are_treated_as_missing() {
        let cfg = config_with(&[("REDIS_URL", "  ")]);
        assert!(cfg.store.redis_url.is_none());
    }
}
