//! Ordered post storage. Newest posts sit at the front; every mutation that
//! names an unknown post is a logged no-op so a stale event can never corrupt
//! the feed.

use crate::models::{Comment, Post};

#[derive(Debug, Default, Clone)]
pub struct PostStore {
    posts: Vec<Post>,
}

impl PostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn snapshot(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == post_id)
    }

    /// Inserts a post at the front. A redelivered id is logged but still
    /// inserted; lookups resolve to the newest copy.
    pub fn prepend(&mut self, post: Post) {
        if self.get(&post.id).is_some() {
            tracing::debug!(post_id = %post.id, "prepending post with duplicate id");
        }
        self.posts.insert(0, post);
    }

    /// Applies `patch` to the named post, if it exists.
    pub fn patch_by_id<F>(&mut self, post_id: &str, patch: F)
    where
        F: FnOnce(&mut Post),
    {
        match self.posts.iter_mut().find(|post| post.id == post_id) {
            Some(post) => patch(post),
            None => {
                tracing::debug!(post_id, "skipping patch because post is unknown");
            }
        }
    }

    /// Appends a comment to the named post. Comments are idempotent by id so
    /// a redelivered event cannot double them up.
    pub fn append_comment(&mut self, post_id: &str, comment: Comment) {
        let Some(post) = self.posts.iter_mut().find(|post| post.id == post_id) else {
            tracing::debug!(post_id, "skipping comment because post is unknown");
            return;
        };
        if post.comments.iter().any(|existing| existing.id == comment.id) {
            tracing::debug!(post_id, comment_id = %comment.id, "comment already applied, skipping");
            return;
        }
        post.comments.push(comment);
    }

    /// Replaces the named post in place, keeping its feed position.
    pub fn replace(&mut self, post_id: &str, update: Post) {
        match self.posts.iter().position(|post| post.id == post_id) {
            Some(index) => self.posts[index] = update,
            None => {
                tracing::debug!(post_id, "skipping replace because post is unknown");
            }
        }
    }
}
