//! Server event application. A frame either decodes into a fully populated
//! event and is applied whole, or it is counted and discarded.

use crate::channel::{self, FeedEvent};
use crate::notify::Notice;

use super::Feed;

impl Feed {
    /// Decodes and applies one broadcast frame. Undecodable frames never
    /// touch the store.
    pub fn apply_frame(&mut self, frame: &[u8]) {
        match channel::decode_server_event(frame) {
            Ok(event) => self.apply_event(event),
            Err(err) => {
                self.rejected_events += 1;
                tracing::warn!(
                    error = %err,
                    rejected = self.rejected_events,
                    "discarding undecodable server event"
                );
            }
        }
    }

    pub fn apply_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::NewPost(post) => {
                if post.author.name != self.local_user {
                    self.notices.send(Notice::NewPost {
                        author: post.author.name.clone(),
                    });
                }
                self.store.prepend(post);
            }
            FeedEvent::NewNudge(post) => {
                if post.author.name != self.local_user {
                    self.notices.send(Notice::NudgeReceived {
                        from: post.author.name.clone(),
                        challenge: post.challenge.title.clone(),
                    });
                }
                self.store.prepend(post);
            }
            FeedEvent::PostLiked {
                post_id,
                likes,
                liked_by,
            } => {
                // The count is authoritative; the liked flag is only ever
                // attributed to the local user's own like.
                self.store.patch_by_id(&post_id, |post| {
                    post.likes = likes;
                    if liked_by == self.local_user {
                        post.is_liked = true;
                    }
                });
            }
            FeedEvent::NewComment { post_id, comment } => {
                if comment.user.name != self.local_user {
                    self.notices.send(Notice::NewComment {
                        author: comment.user.name.clone(),
                    });
                }
                self.store.append_comment(&post_id, comment);
            }
            FeedEvent::PostUpdated { post_id, update } => {
                self.store.replace(&post_id, update);
            }
        }
    }

    /// Records a connectivity flip, surfacing a notice on each transition.
    pub fn set_connected(&mut self, connected: bool) {
        if connected == self.connected {
            return;
        }
        self.connected = connected;
        if connected {
            tracing::info!("event channel connected");
            self.notices.send(Notice::Connected);
        } else {
            tracing::warn!("event channel lost, retrying");
            self.notices.send(Notice::Reconnecting);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{encode_server_event, Envelope, EventHub, EVENT_VERSION};
    use crate::config::ChannelConfig;
    use crate::models::{Author, ChallengeRef, Comment, Post, PostKind};
    use crate::notify::notice_channel;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn update(id: &str, author: &str, likes: u32) -> Post {
        Post {
            id: id.to_string(),
            kind: PostKind::Update,
            author: Author::with_placeholder_avatar(author),
            challenge: ChallengeRef {
                id: "1".to_string(),
                title: "Morning Run Challenge".to_string(),
                progress: Some(500),
                target: Some(900),
                metric: Some("steps".to_string()),
                has_updated_today: false,
                todays_update: None,
            },
            content: None,
            likes,
            is_liked: false,
            comments: Vec::new(),
            show_comments: false,
            timestamp: "2h ago".to_string(),
        }
    }

    fn nudge(id: &str, author: &str) -> Post {
        let mut post = update(id, author, 0);
        post.kind = PostKind::Nudge;
        post.challenge.progress = None;
        post.challenge.target = None;
        post.challenge.metric = None;
        post.timestamp = "Just now".to_string();
        post
    }

    fn comment(id: &str, author: &str) -> Comment {
        Comment {
            id: id.to_string(),
            user: Author::with_placeholder_avatar(author),
            text: "keep it up".to_string(),
            timestamp: "Just now".to_string(),
        }
    }

    fn test_feed(initial: Vec<Post>) -> (Feed, UnboundedReceiver<crate::notify::Notice>) {
        let (hub, _emissions) = EventHub::new(&ChannelConfig::default());
        let (notices, notice_rx) = notice_channel();
        let feed = Feed::new(initial, hub.client_handle("You"), notices);
        (feed, notice_rx)
    }

    #[test]
    fn new_posts_prepend_and_notify_for_other_authors() {
        let (mut feed, mut notices) = test_feed(vec![update("1", "You", 12)]);

        feed.apply_event(FeedEvent::NewPost(update("2", "Mike Johnson", 0)));
        assert_eq!(feed.store().snapshot()[0].id, "2");
        assert_eq!(
            notices.try_recv().ok(),
            Some(Notice::NewPost {
                author: "Mike Johnson".to_string()
            })
        );

        // The echo of the local user's own post is silent.
        feed.apply_event(FeedEvent::NewPost(update("3", "You", 0)));
        assert_eq!(feed.store().snapshot()[0].id, "3");
        assert!(notices.try_recv().is_err());
    }

    #[test]
    fn nudges_notify_with_challenge_title() {
        let (mut feed, mut notices) = test_feed(Vec::new());
        feed.apply_event(FeedEvent::NewNudge(nudge("n1", "Alex Kim")));
        assert_eq!(
            notices.try_recv().ok(),
            Some(Notice::NudgeReceived {
                from: "Alex Kim".to_string(),
                challenge: "Morning Run Challenge".to_string()
            })
        );
    }

    #[test]
    fn like_count_is_authoritative_and_attribution_is_local_only() {
        let (mut feed, _notices) = test_feed(vec![update("1", "You", 12)]);

        feed.apply_event(FeedEvent::PostLiked {
            post_id: "1".to_string(),
            likes: 13,
            liked_by: "Mike Johnson".to_string(),
        });
        let post = feed.store().get("1").expect("post kept");
        assert_eq!(post.likes, 13);
        assert!(!post.is_liked);

        feed.apply_event(FeedEvent::PostLiked {
            post_id: "1".to_string(),
            likes: 14,
            liked_by: "You".to_string(),
        });
        let post = feed.store().get("1").expect("post kept");
        assert_eq!(post.likes, 14);
        assert!(post.is_liked);
    }

    #[test]
    fn events_for_unknown_posts_are_noops() {
        let (mut feed, _notices) = test_feed(vec![update("1", "You", 12)]);

        feed.apply_event(FeedEvent::PostLiked {
            post_id: "missing".to_string(),
            likes: 99,
            liked_by: "Mike Johnson".to_string(),
        });
        feed.apply_event(FeedEvent::NewComment {
            post_id: "missing".to_string(),
            comment: comment("c1", "Emma Wilson"),
        });
        feed.apply_event(FeedEvent::PostUpdated {
            post_id: "missing".to_string(),
            update: update("missing", "Emma Wilson", 0),
        });

        assert_eq!(feed.store().len(), 1);
        assert_eq!(feed.store().get("1").map(|p| p.likes), Some(12));
    }

    #[test]
    fn comments_notify_only_for_other_authors() {
        let (mut feed, mut notices) = test_feed(vec![update("1", "You", 12)]);

        feed.apply_event(FeedEvent::NewComment {
            post_id: "1".to_string(),
            comment: comment("c1", "Emma Wilson"),
        });
        assert_eq!(
            notices.try_recv().ok(),
            Some(Notice::NewComment {
                author: "Emma Wilson".to_string()
            })
        );

        // The echo of the local user's own comment lands without a notice
        // and without doubling up.
        feed.apply_event(FeedEvent::NewComment {
            post_id: "1".to_string(),
            comment: comment("c2", "You"),
        });
        feed.apply_event(FeedEvent::NewComment {
            post_id: "1".to_string(),
            comment: comment("c2", "You"),
        });
        assert!(notices.try_recv().is_err());
        assert_eq!(feed.store().get("1").map(|p| p.comments.len()), Some(2));
    }

    #[test]
    fn post_updated_replaces_in_place() {
        let (mut feed, _notices) = test_feed(vec![
            update("1", "You", 12),
            update("2", "Mike Johnson", 8),
        ]);

        let mut edited = update("2", "Mike Johnson", 8);
        edited.challenge.progress = Some(750);
        feed.apply_event(FeedEvent::PostUpdated {
            post_id: "2".to_string(),
            update: edited,
        });

        let ids: Vec<&str> = feed.store().snapshot().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(
            feed.store().get("2").and_then(|p| p.challenge.progress),
            Some(750)
        );
    }

    #[test]
    fn undecodable_frames_leave_the_store_untouched() {
        let (mut feed, _notices) = test_feed(vec![update("1", "You", 12)]);

        feed.apply_frame(b"not json at all");

        // Well-formed envelope, but the payload is missing required fields.
        let envelope = Envelope {
            version: EVENT_VERSION,
            event: "new_post".to_string(),
            from: None,
            payload: serde_json::json!({ "id": "p9" }),
        };
        feed.apply_frame(&serde_json::to_vec(&envelope).expect("encode"));

        assert_eq!(feed.rejected_events(), 2);
        assert_eq!(feed.store().len(), 1);
        assert_eq!(feed.store().get("1").map(|p| p.likes), Some(12));
    }

    #[test]
    fn valid_frames_decode_back_into_events() {
        let (mut feed, _notices) = test_feed(vec![update("1", "You", 12)]);
        let frame = encode_server_event(&FeedEvent::PostLiked {
            post_id: "1".to_string(),
            likes: 13,
            liked_by: "Mike Johnson".to_string(),
        })
        .expect("encode");

        feed.apply_frame(&frame);
        assert_eq!(feed.rejected_events(), 0);
        assert_eq!(feed.store().get("1").map(|p| p.likes), Some(13));
    }

    #[test]
    fn events_on_distinct_posts_commute() {
        let initial = vec![update("1", "You", 12), update("2", "Mike Johnson", 8)];
        let like_one = FeedEvent::PostLiked {
            post_id: "1".to_string(),
            likes: 13,
            liked_by: "Emma Wilson".to_string(),
        };
        let like_two = FeedEvent::PostLiked {
            post_id: "2".to_string(),
            likes: 9,
            liked_by: "David Lee".to_string(),
        };

        let (mut forward, _n1) = test_feed(initial.clone());
        forward.apply_event(like_one.clone());
        forward.apply_event(like_two.clone());

        let (mut reverse, _n2) = test_feed(initial);
        reverse.apply_event(like_two);
        reverse.apply_event(like_one);

        assert_eq!(forward.store().snapshot(), reverse.store().snapshot());
    }

    #[test]
    fn connectivity_transitions_notify_once_each() {
        let (mut feed, mut notices) = test_feed(Vec::new());

        feed.set_connected(true);
        assert!(notices.try_recv().is_err());

        feed.set_connected(false);
        assert_eq!(notices.try_recv().ok(), Some(Notice::Reconnecting));
        feed.set_connected(false);
        assert!(notices.try_recv().is_err());

        feed.set_connected(true);
        assert_eq!(notices.try_recv().ok(), Some(Notice::Connected));
    }
}
