use std::fmt;

use mysql::prelude::Queryable;
use mysql::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, PooledConn};

use super::{time_budget, Deadline, SessionRecord, SessionStore, POOL_SIZE};
use crate::config::{StoreParams, StoreType};
use crate::error::StoreError;

// Expected schema:
//   CREATE TABLE sessions (
//       token  CHAR(43) PRIMARY KEY,
//       data   BLOB NOT NULL,
//       expiry TIMESTAMP(6) NOT NULL
//   );
const FIND_SQL: &str = "SELECT data FROM sessions WHERE token = ? AND CURRENT_TIMESTAMP(6) < expiry";
const COMMIT_SQL: &str = "INSERT INTO sessions (token, data, expiry) VALUES (?, ?, FROM_UNIXTIME(?)) \
     ON DUPLICATE KEY UPDATE data = VALUES(data), expiry = VALUES(expiry)";
const DELETE_SQL: &str = "DELETE FROM sessions WHERE token = ?";

/// MySQL / MariaDB-backed store over the driver's connection pool.
pub struct MysqlStore {
    pool: Pool,
}

impl fmt::Debug for MysqlStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlStore").finish_non_exhaustive()
    }
}

pub(crate) fn connect(params: &StoreParams) -> Result<Box<dyn SessionStore>, StoreError> {
    let url = params
        .mysql_url
        .as_deref()
        .ok_or(StoreError::MissingParam("MYSQL_URL"))?;
    let constraints = PoolConstraints::new(1, POOL_SIZE as usize).unwrap_or_default();
    let opts = OptsBuilder::from_opts(Opts::from_url(url)?)
        .tcp_connect_timeout(Some(params.connect_timeout))
        .pool_opts(PoolOpts::default().with_constraints(constraints));
    let pool = Pool::new(opts)?;
    // Fail the build now if the server is unreachable.
    drop(pool.get_conn()?);
    tracing::debug!("connected to mysql session store");
    Ok(Box::new(MysqlStore { pool }))
}

impl MysqlStore {
    fn checkout(&self) -> Result<PooledConn, StoreError> {
        Ok(self.pool.get_conn()?)
    }
}

impl SessionStore for MysqlStore {
    fn kind(&self) -> StoreType {
        StoreType::Mysql
    }

    fn find(
        &self,
        token: &str,
        deadline: Option<Deadline>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        time_budget(deadline)?;
        let mut conn = self.checkout()?;
        let data: Option<Vec<u8>> = conn.exec_first(FIND_SQL, (token,))?;
        data.map(|bytes| SessionRecord::decode(&bytes)).transpose()
    }

    fn commit(&self, token: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let payload = record.encode()?;
        let expiry = record.deadline.timestamp();
        let mut conn = self.checkout()?;
        conn.exec_drop(COMMIT_SQL, (token, payload, expiry))?;
        Ok(())
    }

    fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.checkout()?;
        conn.exec_drop(DELETE_SQL, (token,))?;
        Ok(())
    }
}
