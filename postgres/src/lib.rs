//! PostgreSQL implementations for the Bookstay guest-access core.
//!
//! Provides [`PgTransactionSource`] (SERIALIZABLE transactions over a
//! connection pool) and [`PostgresCredentialStore`] (credential rows plus
//! booking-contact resolution) for use with the coordinator and services
//! in `bookstay-access`.
//!
//! # Example
//!
//! ```ignore
//! use bookstay_postgres::{PgTransactionSource, PostgresCredentialStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/bookstay").await?;
//!     let store = PostgresCredentialStore::new(pool.clone());
//!     store.migrate().await?;
//!     let source = PgTransactionSource::new(pool);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod source;
pub mod store;

pub use source::PgTransactionSource;
pub use store::PostgresCredentialStore;

use bookstay_core::AccessError;

/// SQLSTATE class reported by PostgreSQL for serialization failures.
const SERIALIZATION_FAILURE: &str = "40001";

/// Map a sqlx error into the access taxonomy.
///
/// Serialization failures become [`AccessError::SerializationConflict`]
/// so the coordinator can retry them; everything else is a terminal
/// database failure.
pub(crate) fn map_db_error(err: sqlx::Error) -> AccessError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE) {
            return AccessError::SerializationConflict;
        }
    }
    AccessError::Database(err.to_string())
}
