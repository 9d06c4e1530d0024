//! Collapses nudges into per-challenge groups for rendering.
//!
//! The derivation is pure: it never mutates the store, so it can be re-run
//! after every change and always lands on the same view for the same posts.

use std::collections::HashMap;

use crate::models::{FeedEntry, GroupedNudge, Post, PostKind, Recency};

/// Walks the feed newest-first, passing updates through at their positions
/// and folding every nudge for a challenge into the slot where that
/// challenge's first nudge appeared.
pub fn group_feed(posts: &[Post]) -> Vec<FeedEntry> {
    let mut entries: Vec<FeedEntry> = Vec::with_capacity(posts.len());
    let mut groups: HashMap<&str, usize> = HashMap::new();

    for post in posts {
        match post.kind {
            PostKind::Update => entries.push(FeedEntry::Update(post.clone())),
            PostKind::Nudge => match groups.get(post.challenge.id.as_str()) {
                Some(&slot) => {
                    if let FeedEntry::Nudges(group) = &mut entries[slot] {
                        merge_nudge(group, post);
                    }
                }
                None => {
                    groups.insert(post.challenge.id.as_str(), entries.len());
                    entries.push(FeedEntry::Nudges(start_group(post)));
                }
            },
        }
    }

    entries
}

/// The first nudge seeds the group, including the target's embedded update.
/// Later merges add senders but never replace that snapshot.
fn start_group(post: &Post) -> GroupedNudge {
    GroupedNudge {
        challenge_id: post.challenge.id.clone(),
        challenge_title: post.challenge.title.clone(),
        has_updated_today: post.challenge.has_updated_today,
        todays_update: post.challenge.todays_update.clone(),
        users: vec![post.author.clone()],
        timestamp: post.timestamp.clone(),
    }
}

fn merge_nudge(group: &mut GroupedNudge, post: &Post) {
    if !group.users.iter().any(|user| user.name == post.author.name) {
        group.users.push(post.author.clone());
    }
    // The group shows its most recent nudge's label.
    if Recency::parse(&post.timestamp) < Recency::parse(&group.timestamp) {
        group.timestamp = post.timestamp.clone();
    }
}
