//! SERIALIZABLE transaction source over a PostgreSQL pool.

use crate::map_db_error;
use bookstay_access::TransactionSource;
use bookstay_core::Result;
use sqlx::{PgPool, Postgres, Transaction};

/// Hands out SERIALIZABLE transactions from a shared connection pool.
///
/// Each unit of work holds exactly one pooled connection for its
/// lifetime. The connection returns to the pool when the
/// [`Transaction`] value is dropped, whether through commit, rollback,
/// or an early exit, so release is unconditional on every path.
#[derive(Debug, Clone)]
pub struct PgTransactionSource {
    pool: PgPool,
}

impl PgTransactionSource {
    /// Create a source over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and create a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await.map_err(map_db_error)?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl TransactionSource for PgTransactionSource {
    type Conn = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Conn> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Must be the first statement of the transaction.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        Ok(tx)
    }

    async fn commit(&self, conn: Self::Conn) -> Result<()> {
        // PostgreSQL can detect the conflict at COMMIT itself; the
        // mapping turns that into a retryable conflict too.
        conn.commit().await.map_err(map_db_error)
    }

    async fn rollback(&self, conn: Self::Conn) -> Result<()> {
        conn.rollback().await.map_err(map_db_error)
    }
}
