//! Wire format shared by both sides of the event channel.
//!
//! Every frame is a JSON [`Envelope`] naming the event and carrying its
//! payload. Server events decode into [`FeedEvent`], client emissions into
//! [`ClientEmission`]; both go through [`crate::normalize`] so a frame either
//! decodes into fully populated models or is rejected whole.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::models::{Comment, Post};
use crate::normalize::{
    self, EventError, RawLikePost, RawPost, RawPostComment, RawPostLiked, RawPostUpdated,
    RawSendNudge,
};

pub const EVENT_VERSION: u8 = 1;

pub const NEW_POST: &str = "new_post";
pub const NEW_NUDGE: &str = "new_nudge";
pub const POST_LIKED: &str = "post_liked";
pub const NEW_COMMENT: &str = "new_comment";
pub const POST_UPDATED: &str = "post_updated";

pub const LIKE_POST: &str = "like_post";
pub const ADD_COMMENT: &str = "add_comment";
pub const UPDATE_POST: &str = "update_post";
pub const SEND_NUDGE: &str = "send_nudge";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u8,
    pub event: String,
    /// Sender identity on client emissions; absent on server events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub payload: serde_json::Value,
}

/// Server-to-client events after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    NewPost(Post),
    NewNudge(Post),
    PostLiked {
        post_id: String,
        likes: u32,
        liked_by: String,
    },
    NewComment {
        post_id: String,
        comment: Comment,
    },
    PostUpdated {
        post_id: String,
        update: Post,
    },
}

/// Client-to-server interaction events after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    LikePost {
        post_id: String,
    },
    AddComment {
        post_id: String,
        comment: Comment,
    },
    UpdatePost {
        post_id: String,
        update: Post,
    },
    SendNudge {
        challenge_id: String,
        participant_id: String,
    },
}

/// A decoded client frame plus whoever sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEmission {
    pub from: Option<String>,
    pub event: ClientEvent,
}

pub fn decode_server_event(frame: &[u8]) -> Result<FeedEvent, EventError> {
    let envelope: Envelope = serde_json::from_slice(frame)?;
    if envelope.version != EVENT_VERSION {
        return Err(EventError::UnsupportedVersion(envelope.version));
    }
    match envelope.event.as_str() {
        NEW_POST => {
            let raw: RawPost = serde_json::from_value(envelope.payload)?;
            Ok(FeedEvent::NewPost(normalize::normalize_post(raw)?))
        }
        NEW_NUDGE => {
            let raw: RawPost = serde_json::from_value(envelope.payload)?;
            Ok(FeedEvent::NewNudge(normalize::normalize_post(raw)?))
        }
        POST_LIKED => {
            let raw: RawPostLiked = serde_json::from_value(envelope.payload)?;
            let (post_id, likes, liked_by) = normalize::normalize_post_liked(raw)?;
            Ok(FeedEvent::PostLiked {
                post_id,
                likes,
                liked_by,
            })
        }
        NEW_COMMENT => {
            let raw: RawPostComment = serde_json::from_value(envelope.payload)?;
            let (post_id, comment) = normalize::normalize_post_comment(raw)?;
            Ok(FeedEvent::NewComment { post_id, comment })
        }
        POST_UPDATED => {
            let raw: RawPostUpdated = serde_json::from_value(envelope.payload)?;
            let (post_id, update) = normalize::normalize_post_updated(raw)?;
            Ok(FeedEvent::PostUpdated { post_id, update })
        }
        other => Err(EventError::UnknownEvent(other.to_string())),
    }
}

pub fn decode_client_event(frame: &[u8]) -> Result<ClientEmission, EventError> {
    let envelope: Envelope = serde_json::from_slice(frame)?;
    if envelope.version != EVENT_VERSION {
        return Err(EventError::UnsupportedVersion(envelope.version));
    }
    let event = match envelope.event.as_str() {
        LIKE_POST => {
            let raw: RawLikePost = serde_json::from_value(envelope.payload)?;
            ClientEvent::LikePost {
                post_id: normalize::normalize_like_request(raw)?,
            }
        }
        ADD_COMMENT => {
            let raw: RawPostComment = serde_json::from_value(envelope.payload)?;
            let (post_id, comment) = normalize::normalize_post_comment(raw)?;
            ClientEvent::AddComment { post_id, comment }
        }
        UPDATE_POST => {
            let raw: RawPostUpdated = serde_json::from_value(envelope.payload)?;
            let (post_id, update) = normalize::normalize_post_updated(raw)?;
            ClientEvent::UpdatePost { post_id, update }
        }
        SEND_NUDGE => {
            let raw: RawSendNudge = serde_json::from_value(envelope.payload)?;
            let (challenge_id, participant_id) = normalize::normalize_nudge_request(raw)?;
            ClientEvent::SendNudge {
                challenge_id,
                participant_id,
            }
        }
        other => return Err(EventError::UnknownEvent(other.to_string())),
    };
    Ok(ClientEmission {
        from: envelope.from,
        event,
    })
}

pub fn encode_server_event(event: &FeedEvent) -> Result<Bytes, serde_json::Error> {
    let (name, payload) = match event {
        FeedEvent::NewPost(post) => (NEW_POST, serde_json::to_value(post)?),
        FeedEvent::NewNudge(post) => (NEW_NUDGE, serde_json::to_value(post)?),
        FeedEvent::PostLiked {
            post_id,
            likes,
            liked_by,
        } => (
            POST_LIKED,
            serde_json::json!({ "postId": post_id, "likes": likes, "likedBy": liked_by }),
        ),
        FeedEvent::NewComment { post_id, comment } => (
            NEW_COMMENT,
            serde_json::json!({ "postId": post_id, "comment": comment }),
        ),
        FeedEvent::PostUpdated { post_id, update } => (
            POST_UPDATED,
            serde_json::json!({ "postId": post_id, "update": update }),
        ),
    };
    encode(name, None, payload)
}

pub fn encode_client_event(from: &str, event: &ClientEvent) -> Result<Bytes, serde_json::Error> {
    let (name, payload) = match event {
        ClientEvent::LikePost { post_id } => {
            (LIKE_POST, serde_json::json!({ "postId": post_id }))
        }
        ClientEvent::AddComment { post_id, comment } => (
            ADD_COMMENT,
            serde_json::json!({ "postId": post_id, "comment": comment }),
        ),
        ClientEvent::UpdatePost { post_id, update } => (
            UPDATE_POST,
            serde_json::json!({ "postId": post_id, "update": update }),
        ),
        ClientEvent::SendNudge {
            challenge_id,
            participant_id,
        } => (
            SEND_NUDGE,
            serde_json::json!({ "challengeId": challenge_id, "participantId": participant_id }),
        ),
    };
    encode(name, Some(from.to_string()), payload)
}

fn encode(
    event: &str,
    from: Option<String>,
    payload: serde_json::Value,
) -> Result<Bytes, serde_json::Error> {
    let envelope = Envelope {
        version: EVENT_VERSION,
        event: event.to_string(),
        from,
        payload,
    };
    let encoded = serde_json::to_vec(&envelope)?;
    Ok(Bytes::from(encoded))
}
