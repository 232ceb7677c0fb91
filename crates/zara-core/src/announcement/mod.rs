//! Announcements and their threaded comments.

mod model;
mod repository;
pub mod tree;

pub use model::{
    Announcement, AnnouncementDraft, Comment, CommentAuthor, CommentForest, LAUNCH_ANNOUNCEMENT_ID,
};
pub use repository::AnnouncementRepository;
