//! Announcement feed with threaded comments and likes.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use zara_core::announcement::{
    Announcement, AnnouncementDraft, AnnouncementRepository, Comment, CommentAuthor, tree,
};
use zara_core::clock::Clock;
use zara_core::error::{CoreError, Result};
use zara_core::state::StateRepository;

pub struct AnnouncementBoard {
    repository: Arc<dyn AnnouncementRepository>,
    state: Arc<dyn StateRepository>,
    clock: Arc<dyn Clock>,
    announcements: RwLock<Vec<Announcement>>,
    seen: RwLock<BTreeSet<String>>,
}

impl AnnouncementBoard {
    pub fn new(
        repository: Arc<dyn AnnouncementRepository>,
        state: Arc<dyn StateRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            state,
            clock,
            announcements: RwLock::new(Vec::new()),
            seen: RwLock::new(BTreeSet::new()),
        }
    }

    pub async fn load(&self) {
        let announcements = match self.repository.get_all().await {
            Ok(announcements) => announcements,
            Err(err) => {
                warn!(error = %err, "Failed to load announcements, using the launch announcement");
                vec![Announcement::launch()]
            }
        };
        *self.announcements.write().await = announcements;
        *self.seen.write().await = self.state.get_seen_announcements().await;
    }

    pub async fn list(&self) -> Vec<Announcement> {
        self.announcements.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Announcement> {
        self.announcements
            .read()
            .await
            .iter()
            .find(|announcement| announcement.id == id)
            .cloned()
    }

    pub async fn add_announcement(&self, draft: AnnouncementDraft) -> Result<Announcement> {
        validate_draft(&draft)?;
        let announcement = Announcement::from_draft(draft, self.clock.now());

        let mut announcements = self.announcements.write().await;
        let next: Vec<Announcement> = std::iter::once(announcement.clone())
            .chain(announcements.iter().cloned())
            .collect();
        self.persist(&next).await?;
        *announcements = next;

        info!(id = %announcement.id, "Announcement added");
        Ok(announcement)
    }

    /// Replaces the editable fields; likes and comments are kept.
    pub async fn update_announcement(
        &self,
        id: &str,
        draft: AnnouncementDraft,
    ) -> Result<Announcement> {
        validate_draft(&draft)?;
        self.mutate(id, |current| {
            let mut updated = current.clone();
            updated.apply_draft(draft);
            Ok(updated)
        })
        .await
    }

    pub async fn delete_announcement(&self, id: &str) -> Result<()> {
        let mut announcements = self.announcements.write().await;
        if !announcements.iter().any(|announcement| announcement.id == id) {
            return Err(CoreError::not_found("Announcement", id));
        }
        let next: Vec<Announcement> = announcements
            .iter()
            .filter(|announcement| announcement.id != id)
            .cloned()
            .collect();
        self.persist(&next).await?;
        *announcements = next;

        info!(id, "Announcement deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, announcement_id: &str, user_id: &str) -> Result<Announcement> {
        self.mutate(announcement_id, |current| {
            Ok(Announcement {
                likes: tree::toggle_like(&current.likes, user_id),
                ..current.clone()
            })
        })
        .await
    }

    pub async fn add_top_level_comment(
        &self,
        announcement_id: &str,
        author: &CommentAuthor,
        text: &str,
    ) -> Result<Comment> {
        let comment = Comment::new(author, validate_text(text)?, self.clock.now());
        let posted = comment.clone();
        self.mutate(announcement_id, move |current| {
            Ok(Announcement {
                comments: tree::append_comment(&current.comments, comment),
                ..current.clone()
            })
        })
        .await?;
        Ok(posted)
    }

    /// Appends a reply under the first comment with `parent_id`.
    pub async fn add_reply(
        &self,
        announcement_id: &str,
        parent_id: &str,
        author: &CommentAuthor,
        text: &str,
    ) -> Result<Comment> {
        let reply = Comment::new(author, validate_text(text)?, self.clock.now());
        let posted = reply.clone();
        self.mutate(announcement_id, move |current| {
            let comments = tree::append_reply(&current.comments, parent_id, reply).ok_or_else(|| {
                error!(
                    announcement_id = %current.id,
                    parent_id,
                    "Reply target not found in comment tree"
                );
                CoreError::ParentNotFound {
                    announcement_id: current.id.clone(),
                    parent_id: parent_id.to_string(),
                }
            })?;
            Ok(Announcement {
                comments,
                ..current.clone()
            })
        })
        .await?;
        Ok(posted)
    }

    /// True when a signed-in user has not seen every announcement yet.
    pub async fn has_new(&self, authenticated: bool) -> bool {
        if !authenticated {
            return false;
        }
        let seen = self.seen.read().await;
        self.announcements
            .read()
            .await
            .iter()
            .any(|announcement| !seen.contains(&announcement.id))
    }

    pub async fn mark_all_seen(&self) -> Result<()> {
        let all: BTreeSet<String> = self
            .announcements
            .read()
            .await
            .iter()
            .map(|announcement| announcement.id.clone())
            .collect();
        let mut seen = self.seen.write().await;
        // A failed write only means the badge comes back next session
        if let Err(err) = self.state.save_seen_announcements(&all).await {
            warn!(error = %err, "Failed to persist seen announcements");
        }
        *seen = all;
        Ok(())
    }

    /// Applies `update` to one announcement and persists the result.
    async fn mutate<F>(&self, id: &str, update: F) -> Result<Announcement>
    where
        F: FnOnce(&Announcement) -> Result<Announcement>,
    {
        let mut announcements = self.announcements.write().await;
        let index = announcements
            .iter()
            .position(|announcement| announcement.id == id)
            .ok_or_else(|| CoreError::not_found("Announcement", id))?;

        let updated = update(&announcements[index])?;
        let mut next = announcements.clone();
        next[index] = updated.clone();
        self.persist(&next).await?;
        *announcements = next;
        Ok(updated)
    }

    async fn persist(&self, next: &[Announcement]) -> Result<()> {
        self.repository.save_all(next).await.map_err(|err| {
            warn!(error = %err, "Failed to save announcements");
            CoreError::save_failed(err.to_string())
        })
    }
}

fn validate_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_input("comment text must not be empty"));
    }
    Ok(trimmed)
}

fn validate_draft(draft: &AnnouncementDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(CoreError::invalid_input("announcement title must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use zara_core::announcement::LAUNCH_ANNOUNCEMENT_ID;
    use zara_core::clock::SystemClock;
    use zara_infrastructure::{
        MemoryBackend, PersistentStore, StoreAnnouncementRepository, StoreStateRepository,
    };

    use super::*;

    fn board_with(store: PersistentStore) -> AnnouncementBoard {
        AnnouncementBoard::new(
            Arc::new(StoreAnnouncementRepository::new(store.clone()).unwrap()),
            Arc::new(StoreStateRepository::new(store)),
            Arc::new(SystemClock),
        )
    }

    async fn loaded_board() -> AnnouncementBoard {
        let board = board_with(PersistentStore::in_memory());
        board.load().await;
        board
    }

    fn bob() -> CommentAuthor {
        CommentAuthor {
            id: "u1".into(),
            name: "bob".into(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_like_toggle_parity() {
        let board = loaded_board().await;
        for round in 1..=5 {
            let announcement = board
                .toggle_like(LAUNCH_ANNOUNCEMENT_ID, "u1")
                .await
                .unwrap();
            assert_eq!(announcement.is_liked_by("u1"), round % 2 == 1);
        }
    }

    #[tokio::test]
    async fn test_replies_append_in_order() {
        let board = loaded_board().await;
        let root = board
            .add_top_level_comment(LAUNCH_ANNOUNCEMENT_ID, &bob(), "root")
            .await
            .unwrap();
        for text in ["one", "two", "three"] {
            board
                .add_reply(LAUNCH_ANNOUNCEMENT_ID, &root.id, &bob(), text)
                .await
                .unwrap();
        }

        let announcement = board.get(LAUNCH_ANNOUNCEMENT_ID).await.unwrap();
        let texts: Vec<&str> = announcement.comments[0]
            .replies
            .iter()
            .map(|reply| reply.text.as_str())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_reply_to_missing_parent() {
        let board = loaded_board().await;
        let err = board
            .add_reply(LAUNCH_ANNOUNCEMENT_ID, "ghost", &bob(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ParentNotFound { ref parent_id, .. } if parent_id == "ghost"));
    }

    #[tokio::test]
    async fn test_unknown_announcement_and_empty_text() {
        let board = loaded_board().await;
        assert!(board
            .add_top_level_comment("nope", &bob(), "hi")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            board
                .add_top_level_comment(LAUNCH_ANNOUNCEMENT_ID, &bob(), "   ")
                .await,
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_flag_stamped_at_post_time() {
        let board = loaded_board().await;
        let admin = CommentAuthor {
            is_admin: true,
            ..bob()
        };
        let comment = board
            .add_top_level_comment(LAUNCH_ANNOUNCEMENT_ID, &admin, "official")
            .await
            .unwrap();
        assert!(comment.is_admin_post);
    }

    #[tokio::test]
    async fn test_add_update_delete_announcement() {
        let store = PersistentStore::in_memory();
        let board = board_with(store.clone());
        board.load().await;

        let added = board
            .add_announcement(AnnouncementDraft {
                title: "Update".into(),
                message: "v2".into(),
                enabled: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(board.list().await[0].id, added.id);

        board.toggle_like(&added.id, "u1").await.unwrap();
        let updated = board
            .update_announcement(
                &added.id,
                AnnouncementDraft {
                    title: "Update!".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Update!");
        assert!(updated.is_liked_by("u1"));

        board.delete_announcement(LAUNCH_ANNOUNCEMENT_ID).await.unwrap();
        assert!(board.delete_announcement("missing").await.unwrap_err().is_not_found());

        let reloaded = board_with(store);
        reloaded.load().await;
        let ids: Vec<String> = reloaded.list().await.into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![added.id]);
    }

    #[tokio::test]
    async fn test_has_new_and_mark_seen() {
        let store = PersistentStore::in_memory();
        let board = board_with(store.clone());
        board.load().await;

        assert!(!board.has_new(false).await);
        assert!(board.has_new(true).await);
        board.mark_all_seen().await.unwrap();
        assert!(!board.has_new(true).await);

        let reloaded = board_with(store);
        reloaded.load().await;
        assert!(!reloaded.has_new(true).await);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_state() {
        let store = PersistentStore::new(Arc::new(MemoryBackend::with_quota(2_000)));
        let board = board_with(store);
        board.load().await;

        let err = board
            .add_top_level_comment(LAUNCH_ANNOUNCEMENT_ID, &bob(), &"x".repeat(5_000))
            .await
            .unwrap_err();
        assert!(err.is_save_failed());
        assert!(board.get(LAUNCH_ANNOUNCEMENT_ID).await.unwrap().comments.is_empty());
    }
}
