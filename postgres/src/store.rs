//! PostgreSQL credential store.
//!
//! Credential rows live in `access_credentials` (owned by this crate's
//! migration); booking-contact resolution reads the booking system's
//! `bookings` / `customers` / `guest_contacts` tables.

use crate::map_db_error;
use bookstay_access::CredentialStore;
use bookstay_core::{
    AccessCredential, AccessError, BookingContact, BookingId, ContactKind, CredentialId, Result,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

/// PostgreSQL credential store.
#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: Uuid,
    booking_id: String,
    email: String,
    token: String,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
}

impl From<CredentialRow> for AccessCredential {
    fn from(row: CredentialRow) -> Self {
        Self {
            id: CredentialId(row.id),
            booking_id: BookingId(row.booking_id),
            email: row.email,
            token: row.token,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ContactRow {
    customer_id: Option<Uuid>,
    customer_first_name: Option<String>,
    customer_last_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    customer_username: Option<String>,
    guest_first_name: Option<String>,
    guest_last_name: Option<String>,
    guest_email: Option<String>,
    guest_phone: Option<String>,
}

impl ContactRow {
    /// Build the tagged contact union from whichever side the booking's
    /// account reference selects.
    fn into_contact(self, booking_id: &BookingId) -> Option<BookingContact> {
        if self.customer_id.is_some() {
            match (
                self.customer_first_name,
                self.customer_last_name,
                self.customer_email,
            ) {
                (Some(first_name), Some(last_name), Some(email)) => {
                    Some(BookingContact::Customer {
                        first_name,
                        last_name,
                        email,
                        phone: self.customer_phone,
                        username: self.customer_username,
                    })
                }
                _ => {
                    warn!(booking_id = %booking_id, "booking references a missing customer record");
                    None
                }
            }
        } else {
            match (self.guest_first_name, self.guest_last_name, self.guest_email) {
                (Some(first_name), Some(last_name), Some(email)) => Some(BookingContact::Guest {
                    first_name,
                    last_name,
                    email,
                    phone: self.guest_phone,
                }),
                _ => {
                    warn!(booking_id = %booking_id, "booking has neither customer nor guest contact");
                    None
                }
            }
        }
    }
}

impl PostgresCredentialStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the `access_credentials` migration.
    ///
    /// # Errors
    ///
    /// Returns an error if the migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AccessError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl CredentialStore for PostgresCredentialStore {
    type Conn = Transaction<'static, Postgres>;

    async fn find_booking_contact(
        &self,
        conn: &mut Self::Conn,
        booking_id: &BookingId,
        email: &str,
    ) -> Result<Option<BookingContact>> {
        let row: Option<ContactRow> = sqlx::query_as(
            r"
            SELECT b.customer_id,
                   c.first_name AS customer_first_name,
                   c.last_name  AS customer_last_name,
                   c.email      AS customer_email,
                   c.phone      AS customer_phone,
                   c.username   AS customer_username,
                   g.first_name AS guest_first_name,
                   g.last_name  AS guest_last_name,
                   g.email      AS guest_email,
                   g.phone      AS guest_phone
            FROM bookings b
            LEFT JOIN customers c ON c.id = b.customer_id
            LEFT JOIN guest_contacts g ON g.booking_id = b.id
            WHERE b.id = $1
            ",
        )
        .bind(booking_id.as_str())
        .fetch_optional(&mut **conn)
        .await
        .map_err(map_db_error)?;

        // Case-sensitive equality on the stored value.
        Ok(row
            .and_then(|r| r.into_contact(booking_id))
            .filter(|contact| contact.email() == email))
    }

    async fn find_valid_credential(
        &self,
        conn: &mut Self::Conn,
        booking_id: &BookingId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        sqlx::query_scalar(
            r"
            SELECT token
            FROM access_credentials
            WHERE booking_id = $1
              AND email = $2
              AND used = FALSE
              AND expires_at > $3
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(booking_id.as_str())
        .bind(email)
        .bind(now)
        .fetch_optional(&mut **conn)
        .await
        .map_err(map_db_error)
    }

    async fn insert_credential(
        &self,
        conn: &mut Self::Conn,
        credential: &AccessCredential,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO access_credentials
                (id, booking_id, email, token, expires_at, used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(credential.id.0)
        .bind(credential.booking_id.as_str())
        .bind(&credential.email)
        .bind(&credential.token)
        .bind(credential.expires_at)
        .bind(credential.used)
        .bind(credential.created_at)
        .execute(&mut **conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AccessError::Database("credential token collision".to_string());
                }
            }
            map_db_error(e)
        })?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<AccessCredential>> {
        let row: Option<CredentialRow> = sqlx::query_as(
            r"
            SELECT id, booking_id, email, token, expires_at, used, created_at
            FROM access_credentials
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(AccessCredential::from))
    }

    async fn contact_kind(&self, booking_id: &BookingId) -> Result<Option<ContactKind>> {
        let is_customer: Option<bool> = sqlx::query_scalar(
            r"
            SELECT customer_id IS NOT NULL
            FROM bookings
            WHERE id = $1
            ",
        )
        .bind(booking_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(is_customer.map(|is_customer| {
            if is_customer {
                ContactKind::Customer
            } else {
                ContactKind::Guest
            }
        }))
    }

    async fn mark_used(&self, token: &str) -> Result<()> {
        // No-op when the token has no row.
        sqlx::query(
            r"
            UPDATE access_credentials
            SET used = TRUE
            WHERE token = $1
            ",
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM access_credentials
            WHERE expires_at < $1
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
