use std::fmt;
use std::time::Duration;

use chrono::Utc;
use r2d2::{ManageConnection, Pool, PooledConnection};
use redis::{Client, Connection, ConnectionLike, RedisError, RedisResult};

use super::{time_budget, Deadline, SessionRecord, SessionStore, POOL_SIZE};
use crate::config::{StoreParams, StoreType};
use crate::error::StoreError;

const KEY_PREFIX: &str = "scs:session:";

/// A pooled connection plus a flag set when a command on it failed.
///
/// A timed-out reply may still arrive later, so a connection that saw any
/// error is never handed out again.
pub(crate) struct TrackedConnection {
    conn: Connection,
    broken: bool,
}

pub(crate) struct RedisManager {
    client: Client,
    connect_timeout: Duration,
}

impl ManageConnection for RedisManager {
    type Connection = TrackedConnection;
    type Error = RedisError;

    fn connect(&self) -> Result<TrackedConnection, RedisError> {
        let conn = self.client.get_connection_with_timeout(self.connect_timeout)?;
        Ok(TrackedConnection {
            conn,
            broken: false,
        })
    }

    fn is_valid(&self, tracked: &mut TrackedConnection) -> Result<(), RedisError> {
        redis::cmd("PING").query(&mut tracked.conn)
    }

    fn has_broken(&self, tracked: &mut TrackedConnection) -> bool {
        tracked.broken || !tracked.conn.is_open()
    }
}

/// Redis-backed store. Records expire server-side via `PX`.
pub struct RedisStore {
    pool: Pool<RedisManager>,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("connections", &self.pool.state().connections)
            .finish_non_exhaustive()
    }
}

pub(crate) fn connect(params: &StoreParams) -> Result<Box<dyn SessionStore>, StoreError> {
    let url = params
        .redis_url
        .as_deref()
        .ok_or(StoreError::MissingParam("REDIS_URL"))?;
    let manager = RedisManager {
        client: Client::open(url)?,
        connect_timeout: params.connect_timeout,
    };
    // One eager attempt so an unreachable server fails the build.
    manager.connect()?;
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .min_idle(Some(0))
        .test_on_check_out(false)
        .connection_timeout(params.connect_timeout)
        .build_unchecked(manager);
    tracing::debug!("connected to redis session store");
    Ok(Box::new(RedisStore { pool }))
}

fn key(token: &str) -> String {
    format!("{KEY_PREFIX}{token}")
}

impl RedisStore {
    fn checkout(
        &self,
        budget: Option<Duration>,
    ) -> Result<PooledConnection<RedisManager>, StoreError> {
        Ok(match budget {
            Some(budget) => self.pool.get_timeout(budget)?,
            None => self.pool.get()?,
        })
    }

    /// Run `op` on a pooled connection, retiring the connection on failure.
    fn run<T>(
        &self,
        budget: Option<Duration>,
        op: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T, StoreError> {
        let mut tracked = self.checkout(budget)?;
        let result = tracked
            .conn
            .set_read_timeout(budget)
            .and_then(|()| tracked.conn.set_write_timeout(budget))
            .and_then(|()| op(&mut tracked.conn));
        if result.is_err() {
            tracked.broken = true;
        }
        Ok(result?)
    }
}

impl SessionStore for RedisStore {
    fn kind(&self) -> StoreType {
        StoreType::Redis
    }

    fn find(
        &self,
        token: &str,
        deadline: Option<Deadline>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let budget = time_budget(deadline)?;
        let raw: Option<Vec<u8>> =
            self.run(budget, |conn| redis::cmd("GET").arg(key(token)).query(conn))?;
        raw.map(|bytes| SessionRecord::decode(&bytes)).transpose()
    }

    fn commit(&self, token: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let ttl_ms = (record.deadline - Utc::now()).num_milliseconds();
        if ttl_ms <= 0 {
            return self.delete(token);
        }
        let payload = record.encode()?;
        self.run(None, |conn| {
            redis::cmd("SET")
                .arg(key(token))
                .arg(payload)
                .arg("PX")
                .arg(ttl_ms)
                .query::<()>(conn)
        })
    }

    fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.run(None, |conn| redis::cmd("DEL").arg(key(token)).query::<()>(conn))
    }
}
