//! # User Repository
//!
//! Provides database access layer for accounts.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{create_memory_pool, UserRepository};
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_memory_pool().await?;
//!
//! let user = UserRepository::create(&pool, "ada@uni.edu", "$argon2id$...").await?;
//! let found = UserRepository::find_by_email(&pool, "ada@uni.edu").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use super::models::User;
use super::DbPool;
use sqlx::{query_as, Executor, Sqlite};

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by email address. Emails are compared case-insensitively.
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new user in the database.
    ///
    /// Takes any executor so signup can run it inside the transaction that also
    /// creates the profile.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` on a UNIQUE violation when the email already exists.
    pub async fn create<'e, E>(executor: E, email: &str, password_hash: &str) -> Result<User, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        query_as::<_, User>("INSERT INTO users (email, password_hash) VALUES (?, ?) RETURNING *")
            .bind(email)
            .bind(password_hash)
            .fetch_one(executor)
            .await
    }

    /// Update the last login timestamp for a user.
    ///
    /// This method does not verify that the user exists.
    pub async fn update_last_login(pool: &DbPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
