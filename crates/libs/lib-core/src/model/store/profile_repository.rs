//! # Profile Repository
//!
//! One profile per user, created together with the account.

use super::models::{Profile, ProfileForCreate};
use super::DbPool;
use lib_utils::validation::normalize_tags;
use shared::dto::{ProfileUpdateRequest, UserRole};
use sqlx::{query_as, Executor, Sqlite};

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn create<'e, E>(executor: E, user_id: i64, profile: &ProfileForCreate) -> Result<Profile, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        query_as::<_, Profile>(
            "INSERT INTO profiles (user_id, full_name, institution, role) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(user_id)
        .bind(&profile.full_name)
        .bind(&profile.institution)
        .bind(profile.role.to_string())
        .fetch_one(executor)
        .await
    }

    pub async fn find(pool: &DbPool, user_id: i64) -> Result<Option<Profile>, sqlx::Error> {
        query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Like [`find`](Self::find) but a missing row is `RowNotFound`.
    pub async fn get(pool: &DbPool, user_id: i64) -> Result<Profile, sqlx::Error> {
        query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update. Only fields that are `Some` are written.
    ///
    /// Skill and interest lists are normalized (trimmed, deduplicated) before storing.
    pub async fn update(
        pool: &DbPool,
        user_id: i64,
        update: &ProfileUpdateRequest,
    ) -> Result<Profile, sqlx::Error> {
        let mut updates = Vec::new();
        let mut values: Vec<Option<String>> = Vec::new();

        if let Some(full_name) = &update.full_name {
            updates.push("full_name = ?");
            values.push(Some(full_name.trim().to_string()));
        }
        if let Some(institution) = &update.institution {
            updates.push("institution = ?");
            values.push(Some(institution.trim().to_string()));
        }
        if let Some(bio) = &update.bio {
            updates.push("bio = ?");
            values.push(non_empty(bio));
        }
        if let Some(skills) = &update.skills {
            updates.push("skills = ?");
            values.push(Some(tags_json(skills)));
        }
        if let Some(interests) = &update.interests {
            updates.push("interests = ?");
            values.push(Some(tags_json(interests)));
        }
        if let Some(company) = &update.company {
            updates.push("company = ?");
            values.push(non_empty(company));
        }
        if let Some(job_title) = &update.job_title {
            updates.push("job_title = ?");
            values.push(non_empty(job_title));
        }

        if updates.is_empty() {
            return Self::get(pool, user_id).await;
        }

        updates.push("updated_at = CURRENT_TIMESTAMP");
        let query_str = format!("UPDATE profiles SET {} WHERE user_id = ?", updates.join(", "));

        let mut query = sqlx::query(&query_str);
        for value in values {
            query = query.bind(value);
        }
        query.bind(user_id).execute(pool).await?;

        Self::get(pool, user_id).await
    }

    /// All profiles with the given role, except `exclude_user_id`, ordered by name.
    pub async fn list_by_role(
        pool: &DbPool,
        role: UserRole,
        exclude_user_id: i64,
    ) -> Result<Vec<Profile>, sqlx::Error> {
        query_as::<_, Profile>(
            r#"
            SELECT p.*
            FROM profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.role = ? AND p.user_id <> ? AND u.is_active = 1
            ORDER BY p.full_name ASC
            "#,
        )
        .bind(role.to_string())
        .bind(exclude_user_id)
        .fetch_all(pool)
        .await
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn tags_json(tags: &[String]) -> String {
    // Serializing a Vec<String> cannot fail.
    serde_json::to_string(&normalize_tags(tags)).unwrap_or_else(|_| "[]".to_string())
}
