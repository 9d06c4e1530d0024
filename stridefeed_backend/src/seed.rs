//! Canned demo data: the feed, challenges, and rosters a fresh session
//! starts from.

use crate::challenges::{Challenge, Participant, Progress};
use crate::models::{Author, ChallengeRef, Comment, Post, PostContent, PostKind};

/// Starting feed, newest first: two nudges about the morning run challenge,
/// then the local user's own update, then Mike's.
pub fn feed_posts() -> Vec<Post> {
    vec![
        nudge("3", "Alex Kim", "Just now"),
        nudge("4", "Emma Wilson", "5m ago"),
        your_morning_update(),
        mikes_workout_update(),
    ]
}

pub fn your_morning_update() -> Post {
    Post {
        id: "1".to_string(),
        kind: PostKind::Update,
        author: Author::with_placeholder_avatar("You"),
        challenge: ChallengeRef {
            id: "1".to_string(),
            title: "Morning Run Challenge".to_string(),
            progress: Some(750),
            target: Some(900),
            metric: Some("steps".to_string()),
            has_updated_today: false,
            todays_update: None,
        },
        content: Some(PostContent {
            text: Some(
                "Early morning run! 🏃‍♀️ Feeling energized and ready for the day!".to_string(),
            ),
            image: Some(
                "https://dummyimage.com/600x400/E8E4FF/6366f1&text=Morning+Run".to_string(),
            ),
        }),
        likes: 12,
        is_liked: false,
        comments: seed_comments(),
        show_comments: false,
        timestamp: "2h ago".to_string(),
    }
}

pub fn mikes_workout_update() -> Post {
    Post {
        id: "2".to_string(),
        kind: PostKind::Update,
        author: Author::with_placeholder_avatar("Mike Johnson"),
        challenge: ChallengeRef {
            id: "2".to_string(),
            title: "Strength Training".to_string(),
            progress: Some(600),
            target: Some(800),
            metric: Some("calories".to_string()),
            has_updated_today: false,
            todays_update: None,
        },
        content: Some(PostContent {
            text: Some("Push day complete! 💪 New personal best on bench press.".to_string()),
            image: Some("https://dummyimage.com/600x400/E4FFF4/10B981&text=Workout".to_string()),
        }),
        likes: 8,
        is_liked: false,
        comments: Vec::new(),
        show_comments: false,
        timestamp: "4h ago".to_string(),
    }
}

fn nudge(id: &str, author: &str, timestamp: &str) -> Post {
    Post {
        id: id.to_string(),
        kind: PostKind::Nudge,
        author: Author::with_placeholder_avatar(author),
        challenge: ChallengeRef {
            id: "1".to_string(),
            title: "Morning Run Challenge".to_string(),
            progress: None,
            target: None,
            metric: None,
            has_updated_today: true,
            todays_update: Some(Box::new(your_morning_update())),
        },
        content: None,
        likes: 0,
        is_liked: false,
        comments: Vec::new(),
        show_comments: false,
        timestamp: timestamp.to_string(),
    }
}

fn seed_comments() -> Vec<Comment> {
    vec![
        Comment {
            id: "1".to_string(),
            user: Author::with_placeholder_avatar("Emma Wilson"),
            text: "Great progress! Keep it up! 💪".to_string(),
            timestamp: "1h ago".to_string(),
        },
        Comment {
            id: "2".to_string(),
            user: Author::with_placeholder_avatar("David Lee"),
            text: "You're crushing it! 🔥".to_string(),
            timestamp: "30m ago".to_string(),
        },
    ]
}

pub fn challenges() -> Vec<Challenge> {
    vec![morning_run_challenge(), strength_training_challenge()]
}

pub fn morning_run_challenge() -> Challenge {
    Challenge {
        id: "1".to_string(),
        title: "Morning Run Challenge".to_string(),
        description: "30 days of morning runs to kickstart your day! Join us in building a \
                      healthy morning routine with daily runs. Track your steps, share your \
                      progress, and motivate each other to reach new fitness goals."
            .to_string(),
        participants: vec![
            participant("1", "Sarah Chen", 750, 900, "steps"),
            participant("2", "Mike Johnson", 800, 900, "steps"),
            participant("3", "Alex Kim", 600, 900, "steps"),
        ],
        progress: Progress {
            current: 750,
            target: 900,
            metric: "steps".to_string(),
        },
        days_left: 12,
    }
}

pub fn strength_training_challenge() -> Challenge {
    Challenge {
        id: "2".to_string(),
        title: "Strength Training".to_string(),
        description: "Daily strength sessions. Log the calories you burn and keep each other \
                      honest."
            .to_string(),
        participants: vec![
            participant("1", "Mike Johnson", 600, 800, "calories"),
            participant("2", "Emma Wilson", 450, 800, "calories"),
            participant("3", "David Lee", 720, 800, "calories"),
        ],
        progress: Progress {
            current: 600,
            target: 800,
            metric: "calories".to_string(),
        },
        days_left: 9,
    }
}

fn participant(id: &str, name: &str, current: u32, target: u32, metric: &str) -> Participant {
    let author = Author::with_placeholder_avatar(name);
    Participant {
        id: id.to_string(),
        name: author.name,
        avatar: author.avatar,
        initials: author.initials,
        progress: Progress {
            current,
            target,
            metric: metric.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::grouping::group_feed;

    #[test]
    fn seed_feed_groups_into_three_entries() {
        let entries = group_feed(&feed_posts());
        assert_eq!(entries.len(), 3);

        let group = entries[0].as_nudges().expect("nudges lead the feed");
        let names: Vec<&str> = group.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Alex Kim", "Emma Wilson"]);
        assert_eq!(group.timestamp, "Just now");
        assert!(group.has_updated_today);
        assert_eq!(
            group.todays_update.as_ref().map(|p| p.id.as_str()),
            Some("1")
        );

        assert_eq!(entries[1].as_update().map(|p| p.id.as_str()), Some("1"));
        assert_eq!(entries[2].as_update().map(|p| p.id.as_str()), Some("2"));
    }

    #[test]
    fn seed_identity_is_derived_consistently() {
        let posts = feed_posts();
        let yours = posts.iter().find(|p| p.id == "1").expect("own update");
        assert_eq!(yours.author.initials, "YOU");
        assert_eq!(
            yours.author.avatar,
            "https://dummyimage.com/100/6366f1/ffffff&text=YOU"
        );
        assert_eq!(yours.comments.len(), 2);
    }

    #[test]
    fn seed_challenges_have_unique_participant_ids() {
        for challenge in challenges() {
            let mut ids: Vec<&str> =
                challenge.participants.iter().map(|p| p.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), challenge.participants.len());
        }
    }
}
