use std::fmt;
use std::time::Duration;

use postgres::{Config, NoTls};
use r2d2::{ManageConnection, Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

use super::{time_budget, Deadline, SessionRecord, SessionStore, POOL_SIZE};
use crate::config::{StoreParams, StoreType};
use crate::error::StoreError;

// Expected schema:
//   CREATE TABLE sessions (
//       token  TEXT PRIMARY KEY,
//       data   BYTEA NOT NULL,
//       expiry TIMESTAMPTZ NOT NULL
//   );
const FIND_SQL: &str = "SELECT data FROM sessions WHERE token = $1 AND current_timestamp < expiry";
const COMMIT_SQL: &str = "INSERT INTO sessions (token, data, expiry) VALUES ($1, $2, to_timestamp($3)) \
     ON CONFLICT (token) DO UPDATE SET data = EXCLUDED.data, expiry = EXCLUDED.expiry";
const DELETE_SQL: &str = "DELETE FROM sessions WHERE token = $1";

type Manager = PostgresConnectionManager<NoTls>;

/// PostgreSQL-backed store over an r2d2 pool. Closed connections are
/// dropped by the pool and replaced on the next checkout.
pub struct PostgresStore {
    pool: Pool<Manager>,
}

impl fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStore")
            .field("connections", &self.pool.state().connections)
            .finish_non_exhaustive()
    }
}

pub(crate) fn connect(params: &StoreParams) -> Result<Box<dyn SessionStore>, StoreError> {
    let url = params
        .postgres_url
        .as_deref()
        .ok_or(StoreError::MissingParam("POSTGRES_URL"))?;
    let mut config: Config = url.parse()?;
    config.connect_timeout(params.connect_timeout);
    let manager = Manager::new(config, NoTls);
    manager.connect()?;
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .min_idle(Some(0))
        .connection_timeout(params.connect_timeout)
        .build_unchecked(manager);
    tracing::debug!("connected to postgres session store");
    Ok(Box::new(PostgresStore { pool }))
}

impl PostgresStore {
    fn checkout(
        &self,
        budget: Option<Duration>,
    ) -> Result<PooledConnection<Manager>, StoreError> {
        Ok(match budget {
            Some(budget) => self.pool.get_timeout(budget)?,
            None => self.pool.get()?,
        })
    }
}

impl SessionStore for PostgresStore {
    fn kind(&self) -> StoreType {
        StoreType::Postgres
    }

    fn find(
        &self,
        token: &str,
        deadline: Option<Deadline>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        // The synchronous client has no per-query timeout; the budget only
        // bounds the wait for a pooled connection.
        let budget = time_budget(deadline)?;
        let mut client = self.checkout(budget)?;
        let Some(row) = client.query_opt(FIND_SQL, &[&token])? else {
            return Ok(None);
        };
        let data: Vec<u8> = row.try_get(0)?;
        SessionRecord::decode(&data).map(Some)
    }

    fn commit(&self, token: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let payload = record.encode()?;
        let expiry = record.deadline.timestamp_millis() as f64 / 1000.0;
        let mut client = self.checkout(None)?;
        client.execute(COMMIT_SQL, &[&token, &payload, &expiry])?;
        Ok(())
    }

    fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut client = self.checkout(None)?;
        client.execute(DELETE_SQL, &[&token])?;
        Ok(())
    }
}
