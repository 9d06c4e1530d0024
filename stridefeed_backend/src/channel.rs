//! In-process event channel standing in for the socket transport.
//!
//! Server events fan out to every client as a broadcast of encoded frames,
//! client emissions funnel back to the relay over a single queue, and a watch
//! channel carries the connectivity signal.

mod events;

pub use events::{
    decode_client_event, decode_server_event, encode_client_event, encode_server_event,
    ClientEmission, ClientEvent, Envelope, FeedEvent, EVENT_VERSION,
};

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use tokio::sync::{broadcast, mpsc, watch};

use crate::config::ChannelConfig;
use crate::models::{Comment, Post};

#[derive(Clone)]
pub struct EventHub {
    server_tx: broadcast::Sender<Bytes>,
    client_tx: mpsc::Sender<Bytes>,
    online: Arc<watch::Sender<bool>>,
}

impl EventHub {
    /// Creates the hub and hands back the receiver the relay drains client
    /// emissions from.
    pub fn new(config: &ChannelConfig) -> (Self, mpsc::Receiver<Bytes>) {
        let (server_tx, _) = broadcast::channel(config.event_buffer.max(1));
        let (client_tx, client_rx) = mpsc::channel(config.emit_buffer.max(1));
        let (online, _) = watch::channel(true);
        let hub = Self {
            server_tx,
            client_tx,
            online: Arc::new(online),
        };
        (hub, client_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.server_tx.subscribe()
    }

    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    /// Flips the connectivity signal. The demo and tests use this to stage
    /// dropouts.
    pub fn set_online(&self, online: bool) {
        self.online.send_replace(online);
    }

    /// Broadcasts an encoded server frame to every subscribed client.
    pub fn broadcast(&self, frame: Bytes) {
        if self.server_tx.send(frame).is_err() {
            tracing::debug!("no feed subscribers, dropping server frame");
        }
    }

    /// Emission handle for one client session identified by its user name.
    pub fn client_handle(&self, client_id: &str) -> ChannelHandle {
        ChannelHandle {
            client_id: client_id.to_string(),
            publisher: self.client_tx.clone(),
        }
    }
}

/// Clone-able client handle for emitting interaction events. Sends are best
/// effort: a closed queue drops the frame after logging.
#[derive(Clone)]
pub struct ChannelHandle {
    client_id: String,
    publisher: mpsc::Sender<Bytes>,
}

impl ChannelHandle {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub async fn like_post(&self, post_id: &str) -> Result<()> {
        self.publish(ClientEvent::LikePost {
            post_id: post_id.to_string(),
        })
        .await
    }

    pub async fn add_comment(&self, post_id: &str, comment: Comment) -> Result<()> {
        self.publish(ClientEvent::AddComment {
            post_id: post_id.to_string(),
            comment,
        })
        .await
    }

    pub async fn update_post(&self, post_id: &str, update: Post) -> Result<()> {
        self.publish(ClientEvent::UpdatePost {
            post_id: post_id.to_string(),
            update,
        })
        .await
    }

    pub async fn send_nudge(&self, challenge_id: &str, participant_id: &str) -> Result<()> {
        self.publish(ClientEvent::SendNudge {
            challenge_id: challenge_id.to_string(),
            participant_id: participant_id.to_string(),
        })
        .await
    }

    async fn publish(&self, event: ClientEvent) -> Result<()> {
        let frame = events::encode_client_event(&self.client_id, &event)?;
        if self.publisher.send(frame).await.is_err() {
            tracing::warn!(client = %self.client_id, "event channel closed, dropping emission");
        }
        Ok(())
    }
}
