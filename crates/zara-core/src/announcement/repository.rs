//! Announcement repository trait.

use async_trait::async_trait;

use super::model::Announcement;
use crate::error::Result;

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    /// All announcements, newest first. A store that has never been written
    /// yields the launch announcement.
    async fn get_all(&self) -> Result<Vec<Announcement>>;

    async fn save_all(&self, announcements: &[Announcement]) -> Result<()>;
}
