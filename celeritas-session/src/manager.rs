//! [`SessionManager`] — cookie policy plus the selected store.
//!
//! Built once at startup from a [`SessionConfig`] and shared (by `Arc` or
//! reference) with every component that needs request-scoped session state.
//! Nothing on the manager is mutable after construction; the store backend
//! owns its own synchronisation.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use cookie::Cookie;
use http::{header, Request};
use rand::RngCore;
use serde_json::Value;

use crate::config::{CookiePolicy, SessionConfig, StoreType};
use crate::error::{SessionError, StoreError};
use crate::store::{self, Deadline, SessionRecord, SessionStore};

const TOKEN_BYTES: usize = 32;

/// Process-wide session manager.
#[derive(Debug)]
pub struct SessionManager {
    policy: CookiePolicy,
    store_type: StoreType,
    store: Box<dyn SessionStore>,
}

impl SessionManager {
    /// Resolve the store named by `config` and build the manager.
    ///
    /// The memory store performs no I/O. External stores make one connection
    /// attempt; failure yields [`SessionError::StoreUnavailable`] and no
    /// manager is produced.
    pub fn build(config: &SessionConfig) -> Result<Self, SessionError> {
        let policy = config.cookie_policy();
        let store_type = config.store_type();
        let connect = store::connector_for(store_type);
        let store = connect(&config.store)
            .map_err(|source| SessionError::StoreUnavailable { store: store_type, source })?;

        tracing::debug!(
            store = %store_type,
            cookie = %policy.name,
            lifetime_minutes = policy.lifetime.as_secs() / 60,
            "session manager ready"
        );
        Ok(Self {
            policy,
            store_type,
            store,
        })
    }

    /// Build a manager around an already-connected store.
    pub fn with_store(policy: CookiePolicy, store: Box<dyn SessionStore>) -> Self {
        Self {
            policy,
            store_type: store.kind(),
            store,
        }
    }

    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }

    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    pub fn lifetime(&self) -> Duration {
        self.policy.lifetime
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Session token carried by the request's cookie, if any.
    pub fn token<B>(&self, request: &Request<B>) -> Option<String> {
        request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| Cookie::split_parse(raw))
            .filter_map(Result::ok)
            .find(|c| c.name() == self.policy.name)
            .map(|c| c.value().to_string())
    }

    /// Whether the request's session holds `key`.
    ///
    /// Never fails: a missing cookie, an unknown token, an expired record or
    /// a store failure all read as "absent". A [`Deadline`] request extension
    /// is forwarded to the store.
    pub fn exists<B>(&self, request: &Request<B>, key: &str) -> bool {
        let Some(token) = self.token(request) else {
            return false;
        };
        let deadline = request.extensions().get::<Deadline>().copied();
        match self.find(&token, deadline) {
            Ok(Some(record)) => record.contains(key),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    store = %self.store_type,
                    "session lookup failed; treating request as anonymous"
                );
                false
            }
        }
    }

    /// Fetch the live record for `token`.
    pub fn load(&self, token: &str) -> Result<Option<SessionRecord>, SessionError> {
        Ok(self.find(token, None)?)
    }

    pub fn get(&self, token: &str, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self
            .load(token)?
            .and_then(|mut record| record.values.remove(key)))
    }

    fn find(
        &self,
        token: &str,
        deadline: Option<Deadline>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let now = Utc::now();
        Ok(self
            .store
            .find(token, deadline)?
            .filter(|record| !record.is_expired(now)))
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Store `value` under `key`, creating a session when `token` is `None`
    /// or no longer live. Returns the token the value was written under.
    ///
    /// A new session's deadline is `now + lifetime`; updates keep it.
    pub fn put(
        &self,
        token: Option<&str>,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<String, SessionError> {
        let existing = match token {
            Some(t) => self.load(t)?.map(|record| (t.to_string(), record)),
            None => None,
        };
        let (token, mut record) = existing.unwrap_or_else(|| (generate_token(), self.fresh_record()));
        record.values.insert(key.to_string(), value.into());
        self.store.commit(&token, &record)?;
        Ok(token)
    }

    /// Drop `key` from a live session. Unknown tokens are ignored.
    pub fn remove(&self, token: &str, key: &str) -> Result<(), SessionError> {
        if let Some(mut record) = self.load(token)? {
            if record.values.remove(key).is_some() {
                self.store.commit(token, &record)?;
            }
        }
        Ok(())
    }

    /// Delete the whole session.
    pub fn destroy(&self, token: &str) -> Result<(), SessionError> {
        self.store.delete(token)?;
        Ok(())
    }

    /// The `Set-Cookie` value carrying `token` under this manager's policy.
    ///
    /// Non-persistent sessions get a browser-session cookie (no `Max-Age`).
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((self.policy.name.clone(), token.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.policy.secure)
            .same_site(self.policy.same_site);
        if let Some(domain) = &self.policy.domain {
            builder = builder.domain(domain.clone());
        }
        if self.policy.persist {
            let seconds = i64::try_from(self.policy.lifetime.as_secs()).unwrap_or(i64::MAX);
            builder = builder.max_age(cookie::time::Duration::seconds(seconds));
        }
        builder.build()
    }

    fn fresh_record(&self) -> SessionRecord {
        let lifetime = chrono::Duration::from_std(self.policy.lifetime)
            .unwrap_or_else(|_| chrono::Duration::minutes(60));
        SessionRecord::new(Utc::now() + lifetime)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
