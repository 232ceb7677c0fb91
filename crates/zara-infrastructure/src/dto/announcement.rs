//! Announcement DTOs and migrations

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::{IntoDomain, MigratesTo, Versioned};

use zara_core::announcement::{Announcement, Comment};
use zara_core::error::{CoreError, Result};

/// Timestamps are stored as ISO strings; unreadable ones become the epoch
/// rather than failing the whole record.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .unwrap_or_default()
}

fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Announcement V1.0.0, written before records carried a version.
///
/// Early records may already hold `likes` and `comments`; they are kept.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementV1_0_0 {
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_link: Option<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<CommentDTO>,
}

/// A stored comment. Field names are snake_case, unlike the announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDTO {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub is_admin_post: bool,
    #[serde(default)]
    pub replies: Vec<CommentDTO>,
}

/// Announcement V1.1.0 with likes and threaded comments.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementV1_1_0 {
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_link: Option<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<CommentDTO>,
}

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from AnnouncementV1_0_0 to AnnouncementV1_1_0.
/// Likes and comments default to empty when absent.
impl MigratesTo<AnnouncementV1_1_0> for AnnouncementV1_0_0 {
    fn migrate(self) -> AnnouncementV1_1_0 {
        AnnouncementV1_1_0 {
            id: self.id,
            enabled: self.enabled,
            title: self.title,
            message: self.message,
            date: self.date,
            font_family: self.font_family,
            action_text: self.action_text,
            action_link: self.action_link,
            likes: self.likes,
            comments: self.comments,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<CommentDTO> for Comment {
    fn from(dto: CommentDTO) -> Self {
        Comment {
            id: dto.id,
            user_id: dto.user_id,
            username: dto.username,
            text: dto.text,
            created_at: parse_timestamp(&dto.created_at),
            is_admin_post: dto.is_admin_post,
            replies: dto
                .replies
                .into_iter()
                .map(|reply| Arc::new(reply.into()))
                .collect(),
        }
    }
}

impl From<&Comment> for CommentDTO {
    fn from(comment: &Comment) -> Self {
        CommentDTO {
            id: comment.id.clone(),
            user_id: comment.user_id.clone(),
            username: comment.username.clone(),
            text: comment.text.clone(),
            created_at: format_timestamp(&comment.created_at),
            is_admin_post: comment.is_admin_post,
            replies: comment
                .replies
                .iter()
                .map(|reply| reply.as_ref().into())
                .collect(),
        }
    }
}

impl IntoDomain<Announcement> for AnnouncementV1_1_0 {
    fn into_domain(self) -> Announcement {
        Announcement {
            id: self.id,
            enabled: self.enabled,
            title: self.title,
            message: self.message,
            date: parse_timestamp(&self.date),
            font_family: self.font_family,
            action_text: self.action_text,
            action_link: self.action_link,
            likes: self.likes.into_iter().collect(),
            comments: self
                .comments
                .into_iter()
                .map(|comment| Arc::new(comment.into()))
                .collect(),
        }
    }
}

impl From<&Announcement> for AnnouncementV1_1_0 {
    fn from(announcement: &Announcement) -> Self {
        AnnouncementV1_1_0 {
            id: announcement.id.clone(),
            enabled: announcement.enabled,
            title: announcement.title.clone(),
            message: announcement.message.clone(),
            date: format_timestamp(&announcement.date),
            font_family: announcement.font_family.clone(),
            action_text: announcement.action_text.clone(),
            action_link: announcement.action_link.clone(),
            likes: announcement.likes.iter().cloned().collect(),
            comments: announcement
                .comments
                .iter()
                .map(|comment| comment.as_ref().into())
                .collect(),
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates a Migrator for Announcement entities.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Adds `likes` and `comments`
/// - V1.1.0 → Announcement: Converts DTO to domain model
pub fn create_announcement_migrator() -> Result<version_migrate::Migrator> {
    version_migrate::migrator!("announcement" => [
        AnnouncementV1_0_0,
        AnnouncementV1_1_0,
        Announcement
    ])
    .map_err(|e| CoreError::migration(format!("Failed to create announcement migrator: {}", e)))
}
