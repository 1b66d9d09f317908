use chrono::{DateTime, Utc};
use lib_utils::time::format_time;
use shared::dto::{
    Attachment, ConnectionDto, ConnectionStatus, MessageDto, ProfileDto, ProfileSummary, UserInfo,
    UserRole,
};
use sqlx::FromRow;

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Profile row. `skills` and `interests` are stored as JSON arrays.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub full_name: String,
    pub institution: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub bio: Option<String>,
    pub skills: String,
    pub interests: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn skills(&self) -> Vec<String> {
        parse_tags(&self.skills)
    }

    pub fn interests(&self) -> Vec<String> {
        parse_tags(&self.interests)
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.user_id,
            full_name: self.full_name.clone(),
            institution: self.institution.clone(),
            role: self.role,
        }
    }

    pub fn to_dto(&self) -> ProfileDto {
        ProfileDto {
            id: self.user_id,
            full_name: self.full_name.clone(),
            institution: self.institution.clone(),
            role: self.role,
            bio: self.bio.clone(),
            skills: self.skills(),
            interests: self.interests(),
            company: self.company.clone(),
            job_title: self.job_title.clone(),
        }
    }

    /// Public user info returned by the auth endpoints.
    pub fn user_info(&self, user: &User) -> UserInfo {
        UserInfo {
            id: user.id,
            email: user.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            created_at: format_time(user.created_at),
        }
    }
}

fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed tag list {:?}: {}", raw, e);
        Vec::new()
    })
}

/// Data needed to create the profile that goes with a new account.
#[derive(Debug, Clone)]
pub struct ProfileForCreate {
    pub full_name: String,
    pub institution: String,
    pub role: UserRole,
}

/// Connection entity.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct Connection {
    pub id: i64,
    pub requester_id: i64,
    pub receiver_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.requester_id == user_id || self.receiver_id == user_id
    }

    pub fn to_dto(&self) -> ConnectionDto {
        ConnectionDto {
            id: self.id,
            requester_id: self.requester_id,
            receiver_id: self.receiver_id,
            status: self.status,
            created_at: format_time(self.created_at),
        }
    }
}

/// Message entity. Attachment columns are either all set or all null.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub connection_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub attachment_url: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_type: Option<String>,
    pub client_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn attachment(&self) -> Option<Attachment> {
        let url = self.attachment_url.clone()?;
        Some(Attachment {
            url,
            name: self.attachment_name.clone().unwrap_or_default(),
            mime_type: self
                .attachment_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        })
    }

    pub fn to_dto(&self) -> MessageDto {
        MessageDto {
            id: self.id,
            connection_id: self.connection_id,
            sender_id: self.sender_id,
            content: self.content.clone(),
            attachment: self.attachment(),
            created_at: format_time(self.created_at),
            read: self.read,
            client_id: self.client_id.clone(),
        }
    }
}

/// Data structure for appending a message.
#[derive(Debug, Clone)]
pub struct MessageForCreate {
    pub connection_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub attachment: Option<Attachment>,
    pub client_id: Option<String>,
}
