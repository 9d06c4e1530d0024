//! Authoritative side of the event channel. The relay owns the canonical
//! feed: it applies client emissions, broadcasts the resulting events to
//! every subscriber (the sender included), and can weave in synthetic peer
//! activity so a demo session feels inhabited.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::challenges::{nudge_roster, Challenge, Participant};
use crate::channel::{self, ClientEmission, ClientEvent, EventHub, FeedEvent};
use crate::config::SimConfig;
use crate::feed::store::PostStore;
use crate::models::{Author, ChallengeRef, Comment, Post, PostContent, PostKind};
use crate::normalize::EventError;
use crate::utils;

const STATUS_LINES: &[&str] = &[
    "Got my session in before breakfast!",
    "Legs are burning but it was worth it.",
    "Slow day, still showed up.",
    "New personal best this morning!",
    "Halfway there. Keeping the streak alive.",
];

const COMMENT_LINES: &[&str] = &[
    "Great progress! Keep it up! 💪",
    "You're crushing it! 🔥",
    "Nice pace!",
    "See you out there tomorrow?",
];

pub struct Relay {
    hub: EventHub,
    posts: PostStore,
    /// Who currently likes each post. Membership decides whether a
    /// `like_post` toggles the stored count up or down.
    likers: HashMap<String, HashSet<String>>,
    /// Latest update per author. `None` recorded-at keeps the post's own
    /// label; `Some` ages it into a fresh label when embedded in a nudge.
    today_updates: HashMap<String, (Post, Option<DateTime<Utc>>)>,
    challenges: Vec<Challenge>,
    rng: StdRng,
}

impl Relay {
    pub fn new(
        hub: EventHub,
        posts: Vec<Post>,
        challenges: Vec<Challenge>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        let mut likers: HashMap<String, HashSet<String>> = HashMap::new();
        let mut today_updates = HashMap::new();
        for post in &posts {
            if post.kind == PostKind::Update {
                // Seed posts keep their shipped counts and labels.
                likers.entry(post.id.clone()).or_default();
                today_updates.insert(post.author.name.clone(), (post.clone(), None));
            }
        }
        Self {
            hub,
            posts: PostStore::with_posts(posts),
            likers,
            today_updates,
            challenges,
            rng,
        }
    }

    /// Decodes and applies one client frame.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<(), EventError> {
        let emission = channel::decode_client_event(frame)?;
        self.apply(emission);
        Ok(())
    }

    fn apply(&mut self, emission: ClientEmission) {
        let Some(sender) = emission.from else {
            tracing::debug!("dropping client event without sender identity");
            return;
        };
        match emission.event {
            ClientEvent::LikePost { post_id } => self.toggle_like(&sender, &post_id),
            ClientEvent::AddComment { post_id, comment } => self.add_comment(&post_id, comment),
            ClientEvent::UpdatePost { post_id, update } => {
                self.update_post(&sender, &post_id, update)
            }
            ClientEvent::SendNudge {
                challenge_id,
                participant_id,
            } => self.send_nudge(&sender, &challenge_id, &participant_id),
        }
    }

    /// Toggles `sender`'s like on a post and broadcasts the new absolute
    /// count with attribution.
    fn toggle_like(&mut self, sender: &str, post_id: &str) {
        let Some(post) = self.posts.get(post_id) else {
            tracing::debug!(post_id, "ignoring like for unknown post");
            return;
        };
        if post.kind != PostKind::Update {
            tracing::debug!(post_id, "ignoring like for non-update post");
            return;
        }
        let likers = self.likers.entry(post_id.to_string()).or_default();
        let liked = likers.insert(sender.to_string());
        if !liked {
            likers.remove(sender);
        }
        let mut likes = 0;
        self.posts.patch_by_id(post_id, |post| {
            if liked {
                post.likes += 1;
            } else {
                post.likes = post.likes.saturating_sub(1);
            }
            likes = post.likes;
        });
        self.broadcast(FeedEvent::PostLiked {
            post_id: post_id.to_string(),
            likes,
            liked_by: sender.to_string(),
        });
        tracing::info!(post_id, user = sender, likes, "like toggled");
    }

    fn add_comment(&mut self, post_id: &str, comment: Comment) {
        if self.posts.get(post_id).is_none() {
            tracing::debug!(post_id, "ignoring comment for unknown post");
            return;
        }
        self.posts.append_comment(post_id, comment.clone());
        self.broadcast(FeedEvent::NewComment {
            post_id: post_id.to_string(),
            comment,
        });
    }

    fn update_post(&mut self, sender: &str, post_id: &str, update: Post) {
        let Some(existing) = self.posts.get(post_id) else {
            tracing::debug!(post_id, "ignoring edit for unknown post");
            return;
        };
        // Ownership follows the stored post, not whatever the payload claims.
        if existing.author.name != sender {
            tracing::debug!(post_id, sender, "rejecting edit of another author's post");
            return;
        }
        if update.author.name != sender {
            tracing::debug!(post_id, sender, "rejecting edit claiming another author");
            return;
        }
        self.posts.replace(post_id, update.clone());
        if update.kind == PostKind::Update {
            self.today_updates
                .insert(sender.to_string(), (update.clone(), None));
        }
        self.broadcast(FeedEvent::PostUpdated {
            post_id: post_id.to_string(),
            update,
        });
    }

    /// Builds the nudge post for a `send_nudge` request and broadcasts it.
    /// The nudge embeds the target's latest update so readers can see where
    /// they stand.
    fn send_nudge(&mut self, sender: &str, challenge_id: &str, participant_id: &str) {
        let Some(challenge) = self
            .challenges
            .iter()
            .find(|challenge| challenge.id == challenge_id)
        else {
            tracing::debug!(challenge_id, "ignoring nudge for unknown challenge");
            return;
        };
        let Some(target) = challenge
            .participants
            .iter()
            .find(|participant| participant.id == participant_id)
        else {
            tracing::debug!(challenge_id, participant_id, "ignoring nudge for unknown participant");
            return;
        };
        let challenge_title = challenge.title.clone();
        let target_name = target.name.clone();

        let (has_updated_today, todays_update) = self.today_update_for(&target_name);
        let nudge = Post {
            id: Uuid::new_v4().to_string(),
            kind: PostKind::Nudge,
            author: self.author_for(sender),
            challenge: ChallengeRef {
                id: challenge_id.to_string(),
                title: challenge_title,
                progress: None,
                target: None,
                metric: None,
                has_updated_today,
                todays_update,
            },
            content: None,
            likes: 0,
            is_liked: false,
            comments: Vec::new(),
            show_comments: false,
            timestamp: "Just now".to_string(),
        };
        self.posts.prepend(nudge.clone());
        self.broadcast(FeedEvent::NewNudge(nudge));
        tracing::info!(challenge_id, from = sender, to = %target_name, "nudge relayed");
    }

    /// Fabricates one plausible peer action and broadcasts it.
    pub fn synthesize_activity(&mut self) {
        let roll: f64 = self.rng.random();
        if roll < 0.45 {
            self.synthesize_post();
        } else if roll < 0.75 {
            self.synthesize_like();
        } else if roll < 0.95 {
            self.synthesize_comment();
        } else {
            self.synthesize_nudge();
        }
    }

    fn synthesize_post(&mut self) {
        let Some((challenge_index, participant_index)) = self.pick_participant() else {
            return;
        };
        let gain = self.rng.random_range(40..160);
        let (challenge_id, title, author, progress) = {
            let challenge = &mut self.challenges[challenge_index];
            let participant = &mut challenge.participants[participant_index];
            participant.progress.current =
                (participant.progress.current + gain).min(participant.progress.target);
            (
                challenge.id.clone(),
                challenge.title.clone(),
                participant.author(),
                participant.progress.clone(),
            )
        };
        let text = STATUS_LINES[self.rng.random_range(0..STATUS_LINES.len())];
        let post = Post {
            id: Uuid::new_v4().to_string(),
            kind: PostKind::Update,
            author: author.clone(),
            challenge: ChallengeRef {
                id: challenge_id,
                title,
                progress: Some(progress.current),
                target: Some(progress.target),
                metric: Some(progress.metric),
                has_updated_today: false,
                todays_update: None,
            },
            content: Some(PostContent {
                text: Some(text.to_string()),
                image: None,
            }),
            likes: 0,
            is_liked: false,
            comments: Vec::new(),
            show_comments: false,
            timestamp: "Just now".to_string(),
        };
        self.likers.entry(post.id.clone()).or_default();
        self.posts.prepend(post.clone());
        self.today_updates
            .insert(author.name, (post.clone(), Some(Utc::now())));
        self.broadcast(FeedEvent::NewPost(post));
    }

    fn synthesize_like(&mut self) {
        let candidates: Vec<String> = self
            .posts
            .snapshot()
            .iter()
            .filter(|post| post.kind == PostKind::Update)
            .map(|post| post.id.clone())
            .collect();
        if candidates.is_empty() {
            return;
        }
        let post_id = candidates[self.rng.random_range(0..candidates.len())].clone();
        let Some((challenge_index, participant_index)) = self.pick_participant() else {
            return;
        };
        let sender = self.challenges[challenge_index].participants[participant_index]
            .name
            .clone();
        self.toggle_like(&sender, &post_id);
    }

    fn synthesize_comment(&mut self) {
        let candidates: Vec<String> = self
            .posts
            .snapshot()
            .iter()
            .filter(|post| post.kind == PostKind::Update)
            .map(|post| post.id.clone())
            .collect();
        if candidates.is_empty() {
            return;
        }
        let post_id = candidates[self.rng.random_range(0..candidates.len())].clone();
        let Some((challenge_index, participant_index)) = self.pick_participant() else {
            return;
        };
        let author = self.challenges[challenge_index].participants[participant_index].author();
        let text = COMMENT_LINES[self.rng.random_range(0..COMMENT_LINES.len())];
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            user: author,
            text: text.to_string(),
            timestamp: "Just now".to_string(),
        };
        self.add_comment(&post_id, comment);
    }

    fn synthesize_nudge(&mut self) {
        let Some((challenge_index, sender_index)) = self.pick_participant() else {
            return;
        };
        let challenge = &self.challenges[challenge_index];
        let sender = challenge.participants[sender_index].name.clone();
        let roster = nudge_roster(&challenge.participants);
        let Some(target) = roster
            .into_iter()
            .find(|participant| participant.name != sender)
        else {
            return;
        };
        let challenge_id = challenge.id.clone();
        self.send_nudge(&sender, &challenge_id, &target.id);
    }

    fn pick_participant(&mut self) -> Option<(usize, usize)> {
        if self.challenges.is_empty() {
            return None;
        }
        let challenge_index = self.rng.random_range(0..self.challenges.len());
        let roster_len = self.challenges[challenge_index].participants.len();
        if roster_len == 0 {
            return None;
        }
        Some((challenge_index, self.rng.random_range(0..roster_len)))
    }

    fn author_for(&self, name: &str) -> Author {
        self.challenges
            .iter()
            .flat_map(|challenge| challenge.participants.iter())
            .find(|participant| participant.name == name)
            .map(Participant::author)
            .unwrap_or_else(|| Author::with_placeholder_avatar(name))
    }

    fn today_update_for(&self, name: &str) -> (bool, Option<Box<Post>>) {
        match self.today_updates.get(name) {
            Some((post, recorded)) => {
                let mut update = post.clone();
                if let Some(recorded) = recorded {
                    update.timestamp = utils::relative_label(*recorded, Utc::now());
                }
                (true, Some(Box::new(update)))
            }
            None => (false, None),
        }
    }

    fn broadcast(&self, event: FeedEvent) {
        match channel::encode_server_event(&event) {
            Ok(frame) => self.hub.broadcast(frame),
            Err(err) => tracing::warn!(error = %err, "failed to encode server event"),
        }
    }
}

/// Clone-able handle owning the spawned relay loop.
#[derive(Clone)]
pub struct RelayHandle {
    _relay_worker: Arc<JoinHandle<()>>,
}

impl RelayHandle {
    /// Spawns the relay over `emissions`. With `synthetic` set, peers post,
    /// like, comment, and nudge on the configured tick.
    pub fn start(
        hub: EventHub,
        emissions: mpsc::Receiver<Bytes>,
        posts: Vec<Post>,
        challenges: Vec<Challenge>,
        sim: &SimConfig,
        synthetic: bool,
    ) -> Self {
        let relay = Relay::new(hub, posts, challenges, sim.seed);
        let period = synthetic.then(|| Duration::from_millis(sim.tick_ms.max(1)));
        let worker = tokio::spawn(async move {
            run_relay_loop(relay, emissions, period).await;
        });
        Self {
            _relay_worker: Arc::new(worker),
        }
    }
}

pub async fn run_relay_loop(
    mut relay: Relay,
    mut emissions: mpsc::Receiver<Bytes>,
    activity_period: Option<Duration>,
) {
    tracing::info!(synthetic = activity_period.is_some(), "relay loop started");
    let synthetic = activity_period.is_some();
    let mut ticker =
        tokio::time::interval(activity_period.unwrap_or(Duration::from_secs(3600)));
    // The first interval tick fires immediately; swallow it so synthetic
    // activity starts one full period in.
    ticker.tick().await;
    loop {
        tokio::select! {
            frame = emissions.recv() => match frame {
                Some(frame) => {
                    if let Err(err) = relay.handle_frame(&frame) {
                        tracing::warn!(error = %err, "discarding malformed client event");
                    }
                }
                None => break,
            },
            _ = ticker.tick(), if synthetic => relay.synthesize_activity(),
        }
    }
    tracing::info!("relay loop shutting down");
}
