//! Local interaction handlers. Each one mutates the store optimistically,
//! then emits the matching event best-effort so peers converge.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Author, Comment, EditDraft, EditField, PostKind};
use crate::notify::Notice;

use super::Feed;

/// A rejected edit draft, naming the fields still missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("update draft is missing {}", join_fields(.missing))]
pub struct EditError {
    pub missing: Vec<EditField>,
}

fn join_fields(missing: &[EditField]) -> String {
    let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
    labels.join(", ")
}

impl Feed {
    /// Flips the local like state of an update post and emits `like_post`.
    /// Nudges and unknown posts are not likeable.
    pub async fn toggle_like(&mut self, post_id: &str) {
        let Some(post) = self.store.get(post_id) else {
            tracing::debug!(post_id, "ignoring like for unknown post");
            return;
        };
        if post.kind != PostKind::Update {
            tracing::debug!(post_id, "ignoring like for non-update post");
            return;
        }
        self.store.patch_by_id(post_id, |post| {
            if post.is_liked {
                post.likes = post.likes.saturating_sub(1);
                post.is_liked = false;
            } else {
                post.likes += 1;
                post.is_liked = true;
            }
        });
        if let Err(err) = self.channel.like_post(post_id).await {
            tracing::warn!(error = %err, post_id, "failed to emit like");
        }
    }

    /// Appends a comment authored by the local user and emits `add_comment`.
    /// Blank text is dropped before it reaches the store.
    pub async fn add_comment(&mut self, post_id: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(post_id, "ignoring empty comment");
            return;
        }
        if self.store.get(post_id).is_none() {
            tracing::debug!(post_id, "ignoring comment for unknown post");
            return;
        }
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            user: Author::with_placeholder_avatar(&self.local_user),
            text: text.to_string(),
            timestamp: "Just now".to_string(),
        };
        self.store.append_comment(post_id, comment.clone());
        if let Err(err) = self.channel.add_comment(post_id, comment).await {
            tracing::warn!(error = %err, post_id, "failed to emit comment");
        }
    }

    /// Emits a nudge for a challenge participant unless this session already
    /// nudged them.
    pub async fn send_nudge(
        &mut self,
        challenge_id: &str,
        participant_id: &str,
        participant_name: &str,
    ) {
        if !self.nudged.insert(participant_id.to_string()) {
            self.notices.send(Notice::AlreadyNudged {
                participant: participant_name.to_string(),
            });
            return;
        }
        self.notices.send(Notice::NudgeSent {
            participant: participant_name.to_string(),
        });
        if let Err(err) = self.channel.send_nudge(challenge_id, participant_id).await {
            tracing::warn!(error = %err, challenge_id, "failed to emit nudge");
        }
    }

    /// Applies a complete edit draft to an update post and emits
    /// `update_post`. An incomplete draft is rejected without touching the
    /// store.
    pub async fn save_edit(&mut self, post_id: &str, draft: EditDraft) -> Result<(), EditError> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            self.notices.send(Notice::EditRejected {
                missing: missing.clone(),
            });
            return Err(EditError { missing });
        }
        let Some(post) = self.store.get(post_id) else {
            tracing::debug!(post_id, "ignoring edit for unknown post");
            return Ok(());
        };
        if post.kind != PostKind::Update {
            tracing::debug!(post_id, "ignoring edit for non-update post");
            return Ok(());
        }
        let mut updated = post.clone();
        draft.apply_to(&mut updated);
        self.store.replace(post_id, updated.clone());
        self.notices.send(Notice::UpdateSaved);
        if let Err(err) = self.channel.update_post(post_id, updated).await {
            tracing::warn!(error = %err, post_id, "failed to emit edit");
        }
        Ok(())
    }

    /// Local-only visibility toggle; nothing is emitted.
    pub fn toggle_comments(&mut self, post_id: &str) {
        self.store
            .patch_by_id(post_id, |post| post.show_comments = !post.show_comments);
    }
}
