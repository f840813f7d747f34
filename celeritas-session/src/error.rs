//! Error types for celeritas-session.

use thiserror::Error;

use crate::config::StoreType;

/// Failures raised by an individual store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A non-memory backend was selected without its connection URL.
    #[error("missing connection parameter {0}")]
    MissingParam(&'static str),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("mysql error: {0}")]
    Mysql(#[from] mysql::Error),

    #[error("invalid mysql url: {0}")]
    MysqlUrl(#[from] mysql::UrlError),

    /// No pooled connection became available in time.
    #[error("session store pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Stored session payload could not be encoded or decoded.
    #[error("session record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The request deadline elapsed before the store was queried.
    #[error("request deadline exceeded before store access")]
    DeadlineExceeded,

    #[error("session store lock poisoned")]
    Poisoned,
}

/// All errors surfaced by the session manager.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The selected backend could not be reached while building the manager.
    /// Fatal at startup; never downgraded to the memory store.
    #[error("session store '{store}' is unavailable: {source}")]
    StoreUnavailable {
        store: StoreType,
        #[source]
        source: StoreError,
    },

    /// A read or write against an already-built store failed.
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}
