//! Validation and defaulting boundary for wire payloads.
//!
//! Inbound payloads arrive with most fields optional. Everything is checked
//! and defaulted here, once, so the rest of the crate operates on fully
//! populated [`crate::models`] values. A payload that fails any check is
//! rejected whole rather than applied partially.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Author, ChallengeRef, Comment, Post, PostContent, PostKind};
use crate::utils;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    #[error("unknown post kind `{0}`")]
    UnknownKind(String),
    #[error("payload missing required field `{0}`")]
    MissingField(&'static str),
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "user")]
    pub author: Option<RawAuthor>,
    pub challenge: Option<RawChallenge>,
    pub content: Option<RawContent>,
    pub likes: Option<i64>,
    pub is_liked: Option<bool>,
    pub comments: Option<Vec<RawComment>>,
    pub show_comments: Option<bool>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthor {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub initials: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChallenge {
    pub id: Option<String>,
    pub title: Option<String>,
    pub progress: Option<i64>,
    pub target: Option<i64>,
    pub metric: Option<String>,
    pub has_updated_today: Option<bool>,
    pub todays_update: Option<Box<RawPost>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawContent {
    pub text: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: Option<String>,
    pub user: Option<RawAuthor>,
    pub text: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPostLiked {
    pub post_id: Option<String>,
    pub likes: Option<i64>,
    pub liked_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPostComment {
    pub post_id: Option<String>,
    pub comment: Option<RawComment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPostUpdated {
    pub post_id: Option<String>,
    pub update: Option<RawPost>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLikePost {
    pub post_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSendNudge {
    pub challenge_id: Option<String>,
    pub participant_id: Option<String>,
}

pub fn normalize_post(raw: RawPost) -> Result<Post, EventError> {
    let id = require_text(raw.id, "id")?;
    let kind = match require_text(raw.kind, "type")?.as_str() {
        "update" => PostKind::Update,
        "nudge" => PostKind::Nudge,
        other => return Err(EventError::UnknownKind(other.to_string())),
    };
    let author = normalize_author(raw.author.ok_or(EventError::MissingField("user"))?)?;
    let challenge = normalize_challenge(raw.challenge.ok_or(EventError::MissingField("challenge"))?)?;
    let timestamp = require_text(raw.timestamp, "timestamp")?;
    let content = raw.content.and_then(normalize_content);

    let post = match kind {
        PostKind::Update => Post {
            id,
            kind,
            author,
            challenge,
            content,
            likes: clamp_count(raw.likes.unwrap_or(0)),
            is_liked: raw.is_liked.unwrap_or(false),
            comments: normalize_comments(raw.comments)?,
            show_comments: raw.show_comments.unwrap_or(false),
            timestamp,
        },
        // Nudges never carry engagement state, whatever the sender put there.
        PostKind::Nudge => Post {
            id,
            kind,
            author,
            challenge,
            content,
            likes: 0,
            is_liked: false,
            comments: Vec::new(),
            show_comments: false,
            timestamp,
        },
    };
    Ok(post)
}

pub fn normalize_comment(raw: RawComment) -> Result<Comment, EventError> {
    Ok(Comment {
        id: require_text(raw.id, "comment.id")?,
        user: normalize_author(raw.user.ok_or(EventError::MissingField("comment.user"))?)?,
        text: require_text(raw.text, "comment.text")?,
        timestamp: require_text(raw.timestamp, "comment.timestamp")?,
    })
}

pub fn normalize_post_liked(raw: RawPostLiked) -> Result<(String, u32, String), EventError> {
    Ok((
        require_text(raw.post_id, "postId")?,
        clamp_count(raw.likes.ok_or(EventError::MissingField("likes"))?),
        require_text(raw.liked_by, "likedBy")?,
    ))
}

pub fn normalize_post_comment(raw: RawPostComment) -> Result<(String, Comment), EventError> {
    Ok((
        require_text(raw.post_id, "postId")?,
        normalize_comment(raw.comment.ok_or(EventError::MissingField("comment"))?)?,
    ))
}

pub fn normalize_post_updated(raw: RawPostUpdated) -> Result<(String, Post), EventError> {
    Ok((
        require_text(raw.post_id, "postId")?,
        normalize_post(raw.update.ok_or(EventError::MissingField("update"))?)?,
    ))
}

pub fn normalize_like_request(raw: RawLikePost) -> Result<String, EventError> {
    require_text(raw.post_id, "postId")
}

pub fn normalize_nudge_request(raw: RawSendNudge) -> Result<(String, String), EventError> {
    Ok((
        require_text(raw.challenge_id, "challengeId")?,
        require_text(raw.participant_id, "participantId")?,
    ))
}

fn normalize_author(raw: RawAuthor) -> Result<Author, EventError> {
    let name = require_text(raw.name, "user.name")?;
    let initials = raw
        .initials
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| utils::initials_for(&name));
    let avatar = raw
        .avatar
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| utils::avatar_url_for(&initials));
    Ok(Author {
        name,
        avatar,
        initials,
    })
}

fn normalize_challenge(raw: RawChallenge) -> Result<ChallengeRef, EventError> {
    let id = require_text(raw.id, "challenge.id")?;
    let title = require_text(raw.title, "challenge.title")?;
    // Progress figures travel as a unit; a partial set is dropped whole.
    let (progress, target, metric) = match (raw.progress, raw.target, raw.metric) {
        (Some(progress), Some(target), Some(metric)) => (
            Some(clamp_count(progress)),
            Some(clamp_count(target)),
            Some(metric),
        ),
        _ => (None, None, None),
    };
    let todays_update = match raw.todays_update {
        Some(inner) => Some(Box::new(normalize_post(*inner)?)),
        None => None,
    };
    Ok(ChallengeRef {
        id,
        title,
        progress,
        target,
        metric,
        has_updated_today: raw.has_updated_today.unwrap_or(false),
        todays_update,
    })
}

fn normalize_comments(raw: Option<Vec<RawComment>>) -> Result<Vec<Comment>, EventError> {
    raw.unwrap_or_default()
        .into_iter()
        .map(normalize_comment)
        .collect()
}

fn normalize_content(raw: RawContent) -> Option<PostContent> {
    let text = raw.text.filter(|value| !value.trim().is_empty());
    let image = raw.image.filter(|value| !value.trim().is_empty());
    if text.is_none() && image.is_none() {
        return None;
    }
    Some(PostContent { text, image })
}

fn require_text(raw: Option<String>, field: &'static str) -> Result<String, EventError> {
    match raw {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(EventError::MissingField(field)),
    }
}

fn clamp_count(raw: i64) -> u32 {
    raw.clamp(0, u32::MAX as i64) as u32
}
