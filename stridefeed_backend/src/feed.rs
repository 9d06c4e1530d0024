//! Feed synchronization core.
//!
//! One task owns the [`Feed`] state and is its only mutator. Server frames,
//! local interaction commands, and connectivity flips all funnel into that
//! task's loop; after every change it re-derives the grouped view and
//! publishes it over a watch channel for anyone rendering the feed.

pub mod grouping;
pub mod store;

mod actions;
mod sync;

pub use actions::EditError;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::channel::{ChannelHandle, EventHub};
use crate::models::{EditDraft, FeedEntry, Post};
use crate::notify::NoticeSender;

use self::store::PostStore;

const COMMAND_BUFFER: usize = 64;

/// Synchronizer state for one client session. Owned exclusively by the feed
/// loop task; tests drive it directly.
pub struct Feed {
    store: PostStore,
    local_user: String,
    nudged: HashSet<String>,
    channel: ChannelHandle,
    notices: NoticeSender,
    connected: bool,
    rejected_events: u64,
}

impl Feed {
    pub fn new(initial: Vec<Post>, channel: ChannelHandle, notices: NoticeSender) -> Self {
        let local_user = channel.client_id().to_string();
        Self {
            store: PostStore::with_posts(initial),
            local_user,
            nudged: HashSet::new(),
            channel,
            notices,
            connected: true,
            rejected_events: 0,
        }
    }

    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Frames that failed to decode since the session started.
    pub fn rejected_events(&self) -> u64 {
        self.rejected_events
    }

    /// Derives the rendered view from the current store contents.
    pub fn derive_view(&self) -> Vec<FeedEntry> {
        grouping::group_feed(self.store.snapshot())
    }

    pub async fn handle_command(&mut self, command: FeedCommand) {
        match command {
            FeedCommand::ToggleLike { post_id } => self.toggle_like(&post_id).await,
            FeedCommand::AddComment { post_id, text } => self.add_comment(&post_id, &text).await,
            FeedCommand::SendNudge {
                challenge_id,
                participant_id,
                participant_name,
            } => {
                self.send_nudge(&challenge_id, &participant_id, &participant_name)
                    .await
            }
            FeedCommand::SaveEdit { post_id, draft } => {
                if let Err(err) = self.save_edit(&post_id, draft).await {
                    tracing::debug!(error = %err, post_id = %post_id, "edit draft rejected");
                }
            }
            FeedCommand::ToggleComments { post_id } => self.toggle_comments(&post_id),
            FeedCommand::Shutdown => {}
        }
    }
}

/// Local interactions accepted by the feed loop.
#[derive(Debug, Clone)]
pub enum FeedCommand {
    ToggleLike {
        post_id: String,
    },
    AddComment {
        post_id: String,
        text: String,
    },
    SendNudge {
        challenge_id: String,
        participant_id: String,
        participant_name: String,
    },
    SaveEdit {
        post_id: String,
        draft: EditDraft,
    },
    ToggleComments {
        post_id: String,
    },
    Shutdown,
}

/// Clone-able handle over a running feed loop.
#[derive(Clone)]
pub struct FeedHandle {
    commands: mpsc::Sender<FeedCommand>,
    view: watch::Receiver<Vec<FeedEntry>>,
    _feed_worker: Arc<JoinHandle<()>>,
}

impl FeedHandle {
    /// Spawns the feed loop for one client session seeded with `initial`
    /// posts. `local_user` doubles as the session's sender identity.
    pub fn start(
        hub: &EventHub,
        local_user: &str,
        initial: Vec<Post>,
        notices: NoticeSender,
    ) -> Self {
        let inbound = hub.subscribe();
        let mut connectivity = hub.connectivity();
        let mut feed = Feed::new(initial, hub.client_handle(local_user), notices);
        feed.set_connected(*connectivity.borrow_and_update());

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(feed.derive_view());
        let worker = tokio::spawn(async move {
            run_feed_loop(feed, inbound, command_rx, connectivity, view_tx).await;
        });

        Self {
            commands: command_tx,
            view: view_rx,
            _feed_worker: Arc::new(worker),
        }
    }

    /// Latest published view.
    pub fn current_view(&self) -> Vec<FeedEntry> {
        self.view.borrow().clone()
    }

    /// Watch receiver for callers that want to await view changes.
    pub fn view(&self) -> watch::Receiver<Vec<FeedEntry>> {
        self.view.clone()
    }

    pub async fn toggle_like(&self, post_id: &str) -> Result<()> {
        self.send(FeedCommand::ToggleLike {
            post_id: post_id.to_string(),
        })
        .await
    }

    pub async fn add_comment(&self, post_id: &str, text: &str) -> Result<()> {
        self.send(FeedCommand::AddComment {
            post_id: post_id.to_string(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn send_nudge(
        &self,
        challenge_id: &str,
        participant_id: &str,
        participant_name: &str,
    ) -> Result<()> {
        self.send(FeedCommand::SendNudge {
            challenge_id: challenge_id.to_string(),
            participant_id: participant_id.to_string(),
            participant_name: participant_name.to_string(),
        })
        .await
    }

    pub async fn save_edit(&self, post_id: &str, draft: EditDraft) -> Result<()> {
        self.send(FeedCommand::SaveEdit {
            post_id: post_id.to_string(),
            draft,
        })
        .await
    }

    pub async fn toggle_comments(&self, post_id: &str) -> Result<()> {
        self.send(FeedCommand::ToggleComments {
            post_id: post_id.to_string(),
        })
        .await
    }

    pub async fn shutdown(&self) {
        self.commands.send(FeedCommand::Shutdown).await.ok();
    }

    async fn send(&self, command: FeedCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("feed loop has shut down"))
    }
}

async fn run_feed_loop(
    mut feed: Feed,
    mut inbound: broadcast::Receiver<Bytes>,
    mut commands: mpsc::Receiver<FeedCommand>,
    mut connectivity: watch::Receiver<bool>,
    view: watch::Sender<Vec<FeedEntry>>,
) {
    tracing::info!(user = %feed.local_user(), "feed loop started");
    loop {
        tokio::select! {
            frame = inbound.recv() => match frame {
                Ok(frame) => {
                    feed.apply_frame(&frame);
                    let _ = view.send(feed.derive_view());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "feed loop lagged behind server events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            command = commands.recv() => match command {
                Some(FeedCommand::Shutdown) | None => break,
                Some(command) => {
                    feed.handle_command(command).await;
                    let _ = view.send(feed.derive_view());
                }
            },
            changed = connectivity.changed() => match changed {
                Ok(()) => {
                    let online = *connectivity.borrow_and_update();
                    feed.set_connected(online);
                }
                Err(_) => break,
            },
        }
    }
    tracing::info!(user = %feed.local_user(), "feed loop shutting down");
}
