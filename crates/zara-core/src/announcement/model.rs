//! Announcement and comment models.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level comments of an announcement. Nodes are shared so that
/// untouched subtrees survive an edit without being copied.
pub type CommentForest = Vec<Arc<Comment>>;

pub const LAUNCH_ANNOUNCEMENT_ID: &str = "feedback-launch-v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_admin_post: bool,
    /// Insertion-ordered, append-only.
    #[serde(default)]
    pub replies: CommentForest,
}

impl Comment {
    /// New leaf comment with a fresh id.
    pub fn new(author: &CommentAuthor, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: author.id.clone(),
            username: author.name.clone(),
            text: text.into(),
            created_at,
            is_admin_post: author.is_admin,
            replies: Vec::new(),
        }
    }
}

/// Who is posting, with the role captured at post time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentAuthor {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub enabled: bool,
    pub title: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub font_family: Option<String>,
    pub action_text: Option<String>,
    pub action_link: Option<String>,
    /// User ids that liked the announcement.
    pub likes: BTreeSet<String>,
    pub comments: CommentForest,
}

/// Admin-editable fields of an announcement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnouncementDraft {
    pub title: String,
    pub message: String,
    pub enabled: bool,
    pub font_family: Option<String>,
    pub action_text: Option<String>,
    pub action_link: Option<String>,
}

impl Announcement {
    pub fn from_draft(draft: AnnouncementDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            enabled: draft.enabled,
            title: draft.title,
            message: draft.message,
            date: now,
            font_family: draft.font_family,
            action_text: draft.action_text,
            action_link: draft.action_link,
            likes: BTreeSet::new(),
            comments: Vec::new(),
        }
    }

    /// Applies a draft, keeping id, date, likes and comments.
    pub fn apply_draft(&mut self, draft: AnnouncementDraft) {
        self.title = draft.title;
        self.message = draft.message;
        self.enabled = draft.enabled;
        self.font_family = draft.font_family;
        self.action_text = draft.action_text;
        self.action_link = draft.action_link;
    }

    /// The announcement a fresh install starts with.
    pub fn launch() -> Self {
        Self {
            id: LAUNCH_ANNOUNCEMENT_ID.to_string(),
            enabled: true,
            title: "Welcome to the Zara AI Hub!".to_string(),
            message: "We just launched comments and likes on announcements. \
                      Tell us what you think and what you would like to see next."
                .to_string(),
            date: DateTime::<Utc>::from_timestamp(1_719_792_000, 0).unwrap_or_default(),
            font_family: None,
            action_text: Some("Share feedback".to_string()),
            action_link: None,
            likes: BTreeSet::new(),
            comments: Vec::new(),
        }
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }
}
