use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// Closed set of marital states accepted on the wire (`estadoCivil`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "marital_status")]
pub enum MaritalStatus {
    Solteiro,
    Casado,
    Divorciado,
    Viuvo,
}

impl Default for MaritalStatus {
    fn default() -> Self {
        Self::Solteiro
    }
}

/// Account record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Stored trimmed and lowercased; uniqueness is enforced by a unique
    /// index on lower(email) at the store level.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub marital_status: MaritalStatus,
    pub lives_on_moon: bool,
    pub registered_at: OffsetDateTime,
}

/// Write-time email normalization: trim, then lowercase. Lookups compare the
/// normalized literal value, never a pattern built from user input.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Account {
    /// Find an account by email. Case-insensitive whole-string equality: the
    /// input is normalized and compared against lower(email) as a literal.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, password_hash, marital_status, lives_on_moon, registered_at
            FROM accounts
            WHERE lower(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    /// Insert a new account. The id and registered_at are assigned by the
    /// store; a concurrent duplicate insert surfaces as `DuplicateEmail`
    /// through the unique-violation mapping.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        marital_status: MaritalStatus,
        lives_on_moon: bool,
    ) -> Result<Account, ApiError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, email, password_hash, marital_status, lives_on_moon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, marital_status, lives_on_moon, registered_at
            "#,
        )
        .bind(name)
        .bind(normalize_email(email))
        .bind(password_hash)
        .bind(marital_status)
        .bind(lives_on_moon)
        .fetch_one(db)
        .await?;
        Ok(account)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, password_hash, marital_status, lives_on_moon, registered_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    /// Replace the stored password hash. Used by password reset only.
    pub async fn update_password_hash(
        db: &PgPool,
        id: Uuid,
        new_hash: &str,
    ) -> Result<(), ApiError> {
        sqlx::query("UPDATE accounts SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(new_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Total number of accounts, for the diagnostic route.
    pub async fn count(db: &PgPool) -> Result<i64, ApiError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(db)
            .await?;
        Ok(total)
    }
}
