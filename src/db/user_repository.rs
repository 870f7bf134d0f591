// src/db/user_repository.rs
// DOCUMENTATION: Database access layer for user accounts
// PURPOSE: User CRUD plus the credential and reset-token bookkeeping

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::query::{ColumnSpec, ColumnType, QueryOptions, ResourceColumns};
use crate::errors::ApiError;
use crate::models::{Role, User};
use chrono::{DateTime, Utc};

/// Filterable/sortable user columns exposed to the query grammar
pub const USER_COLUMNS: ResourceColumns = ResourceColumns {
    columns: &[
        ColumnSpec {
            name: "name",
            column: "u.name",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "email",
            column: "u.email",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "role",
            column: "u.role",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "created_at",
            column: "u.created_at",
            kind: ColumnType::Text,
        },
    ],
    default_sort: "-created_at",
};

/// UserRepository: All database operations for users
/// Every read path filters on active = TRUE, so deactivated accounts are
/// invisible everywhere, including login and token checks
pub struct UserRepository;

impl UserRepository {
    /// Insert a new account; the unique email index surfaces as a 409
    pub async fn create_user(
        pool: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES ($1, LOWER($2), $3, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        log::info!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users u WHERE u.id = $1 AND u.active = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User".to_string()))
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users u WHERE u.email = LOWER($1) AND u.active = TRUE",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Look up the account holding an unexpired reset-token digest
    pub async fn get_by_reset_token(
        pool: &PgPool,
        token_digest: &str,
    ) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users u
            WHERE u.password_reset_token = $1
              AND u.password_reset_expires > NOW()
              AND u.active = TRUE
            "#,
        )
        .bind(token_digest)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// List accounts through the shared query grammar
    pub async fn list(pool: &PgPool, opts: &QueryOptions) -> Result<Vec<User>, ApiError> {
        let mut where_clauses = vec!["u.active = TRUE".to_string()];
        where_clauses.extend(opts.where_clauses());

        let sql = format!(
            "SELECT * FROM users u WHERE {} {} {}",
            where_clauses.join(" AND "),
            opts.order_by(),
            opts.limit_offset()
        );

        log::debug!("Executing user list query: {}", sql);

        let users = sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?;
        Ok(users)
    }

    /// Self-service profile update: name and email only
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE(LOWER($2), email),
                updated_at = NOW()
            WHERE id = $3 AND active = TRUE
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
    }

    /// Admin update: profile fields plus the role
    pub async fn admin_update(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        role: Option<Role>,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE(LOWER($2), email),
                role = COALESCE($3, role),
                updated_at = NOW()
            WHERE id = $4 AND active = TRUE
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(role.map(|r| r.as_str()))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
    }

    pub async fn update_photo(pool: &PgPool, id: Uuid, filename: &str) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET photo = $1, updated_at = NOW()
            WHERE id = $2 AND active = TRUE
            RETURNING *
            "#,
        )
        .bind(filename)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
    }

    /// Replace the password hash and stamp password_changed_at
    /// The stamp is backdated one second so a token issued immediately
    /// afterwards is not rejected by the changed-after check
    pub async fn set_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<(), ApiError> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1,
                password_changed_at = NOW() - INTERVAL '1 second',
                password_reset_token = NULL,
                password_reset_expires = NULL,
                updated_at = NOW()
            WHERE id = $2 AND active = TRUE
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound("User".to_string()));
        }
        Ok(())
    }

    /// Store the digest and expiry of a freshly issued reset token
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $1,
                password_reset_expires = $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(token_digest)
        .bind(expires_at)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Roll back an issued token (email delivery failed)
    pub async fn clear_reset_token(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = NULL,
                password_reset_expires = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Soft delete: the account disappears from every query but the row
    /// stays for possible reactivation
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let rows = sqlx::query(
            "UPDATE users SET active = FALSE, updated_at = NOW() WHERE id = $1 AND active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound("User".to_string()));
        }

        log::info!("Deactivated user: {}", id);
        Ok(())
    }

    /// Admin hard delete
    pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let rows = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound("User".to_string()));
        }

        log::info!("Deleted user: {}", id);
        Ok(())
    }
}
