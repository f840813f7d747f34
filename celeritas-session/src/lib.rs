//! Celeritas session layer — cookie policy, store selection, session manager.
//!
//! Public API surface:
//! - [`config`] — [`SessionConfig`], [`StoreType`], [`CookiePolicy`]
//! - [`store`] — the [`SessionStore`] capability and its backends
//! - [`manager`] — [`SessionManager`], built once per application instance
//! - [`error`] — [`SessionError`], [`StoreError`]

pub mod config;
pub mod error;
pub mod manager;
pub mod store;

pub use config::{parse_flag, CookiePolicy, SessionConfig, StoreParams, StoreType};
pub use error::{SessionError, StoreError};
pub use manager::SessionManager;
pub use store::{Deadline, SessionRecord, SessionStore};
