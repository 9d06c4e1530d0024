//! Domain types for the activity feed.
//!
//! Everything here is fully populated. Wire payloads with optional fields go
//! through [`crate::normalize`] before they become these types, so downstream
//! code never re-checks presence.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Update,
    Nudge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub avatar: String,
    pub initials: String,
}

impl Author {
    /// Builds an author with the generated placeholder avatar used for
    /// profiles that never uploaded one.
    pub fn with_placeholder_avatar(name: &str) -> Self {
        let initials = utils::initials_for(name);
        let avatar = utils::avatar_url_for(&initials);
        Self {
            name: name.to_string(),
            avatar,
            initials,
        }
    }
}

/// The challenge a post belongs to. Progress figures travel as a unit: either
/// all three of `progress`/`target`/`metric` are present or none are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRef {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    pub has_updated_today: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todays_update: Option<Box<Post>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user: Author,
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    #[serde(rename = "user")]
    pub author: Author,
    pub challenge: ChallengeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<PostContent>,
    pub likes: u32,
    /// Whether the local session has liked this post. Never inferred from
    /// someone else's like event.
    pub is_liked: bool,
    pub comments: Vec<Comment>,
    pub show_comments: bool,
    /// Display label such as "Just now" or "2h ago". Ordered via [`Recency`].
    pub timestamp: String,
}

/// One rendered feed slot after nudge grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeedEntry {
    Update(Post),
    Nudges(GroupedNudge),
}

impl FeedEntry {
    pub fn as_update(&self) -> Option<&Post> {
        match self {
            FeedEntry::Update(post) => Some(post),
            FeedEntry::Nudges(_) => None,
        }
    }

    pub fn as_nudges(&self) -> Option<&GroupedNudge> {
        match self {
            FeedEntry::Update(_) => None,
            FeedEntry::Nudges(group) => Some(group),
        }
    }
}

/// All nudges for one challenge collapsed into a single feed slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedNudge {
    pub challenge_id: String,
    pub challenge_title: String,
    pub has_updated_today: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todays_update: Option<Box<Post>>,
    pub users: Vec<Author>,
    pub timestamp: String,
}

/// Parsed rank of a display timestamp label. Labels compare by approximate
/// age, so an off-convention "90m ago" still ranks older than "1h ago".
/// Smaller is more recent, and any label outside the known shapes sorts last
/// so it never steals a group's timestamp.
#[derive(Debug, Clone, Copy)]
pub enum Recency {
    JustNow,
    MinutesAgo(u32),
    HoursAgo(u32),
    DaysAgo(u32),
    Unknown,
}

impl Recency {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("just now") {
            return Recency::JustNow;
        }
        let Some(amount) = label.strip_suffix(" ago") else {
            return Recency::Unknown;
        };
        let mut chars = amount.chars();
        let unit = chars.next_back();
        match (chars.as_str().parse::<u32>(), unit) {
            (Ok(n), Some('m')) => Recency::MinutesAgo(n),
            (Ok(n), Some('h')) => Recency::HoursAgo(n),
            (Ok(n), Some('d')) => Recency::DaysAgo(n),
            _ => Recency::Unknown,
        }
    }

    fn approx_minutes(self) -> Option<u64> {
        match self {
            Recency::JustNow => Some(0),
            Recency::MinutesAgo(n) => Some(u64::from(n)),
            Recency::HoursAgo(n) => Some(u64::from(n) * 60),
            Recency::DaysAgo(n) => Some(u64::from(n) * 24 * 60),
            Recency::Unknown => None,
        }
    }
}

impl Ord for Recency {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.approx_minutes(), other.approx_minutes()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Recency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality tracks the ordering so "60m ago" and "1h ago" rank the same.
impl PartialEq for Recency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Recency {}

/// Editable slice of an update post. All three fields must be present before
/// the edit can be saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    pub text: String,
    pub progress: Option<u32>,
    pub image: Option<String>,
}

impl EditDraft {
    /// Which required fields the draft is still missing, in display order.
    pub fn missing_fields(&self) -> Vec<EditField> {
        let mut missing = Vec::new();
        if self.text.trim().is_empty() {
            missing.push(EditField::Text);
        }
        if self.progress.is_none() {
            missing.push(EditField::Progress);
        }
        if self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .is_none()
        {
            missing.push(EditField::Image);
        }
        missing
    }

    /// Writes the draft into a post, leaving everything else untouched.
    pub fn apply_to(&self, post: &mut Post) {
        let content = post.content.get_or_insert_with(PostContent::default);
        content.text = Some(self.text.trim().to_string());
        content.image = self.image.clone();
        post.challenge.progress = self.progress;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Text,
    Progress,
    Image,
}

impl EditField {
    pub fn label(self) -> &'static str {
        match self {
            EditField::Text => "text",
            EditField::Progress => "progress",
            EditField::Image => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            id: "p1".to_string(),
            kind: PostKind::Update,
            author: Author::with_placeholder_avatar("Emma Wilson"),
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
                text: Some("out for a run".to_string()),
                image: None,
            }),
            likes: 3,
            is_liked: false,
            comments: Vec::new(),
            show_comments: false,
            timestamp: "2h ago".to_string(),
        }
    }

    #[test]
    fn recency_orders_labels_newest_first() {
        let labels = ["Just now", "5m ago", "59m ago", "1h ago", "23h ago", "1d ago"];
        let parsed: Vec<Recency> = labels.iter().map(|label| Recency::parse(label)).collect();
        let mut sorted = parsed.clone();
        sorted.sort();
        assert_eq!(parsed, sorted);
    }

    #[test]
    fn recency_rejects_unrecognized_labels() {
        assert_eq!(Recency::parse("yesterday"), Recency::Unknown);
        assert_eq!(Recency::parse("5 minutes ago"), Recency::Unknown);
        assert_eq!(Recency::parse("ago"), Recency::Unknown);
        assert_eq!(Recency::parse(""), Recency::Unknown);
        assert!(Recency::parse("Just now") < Recency::parse("whenever"));
    }

    #[test]
    fn recency_ranks_off_convention_labels_by_age() {
        assert!(Recency::parse("100m ago") > Recency::parse("1h ago"));
        assert!(Recency::parse("36h ago") > Recency::parse("1d ago"));
        assert!(Recency::parse("25h ago") < Recency::parse("2d ago"));
        assert_eq!(Recency::parse("60m ago"), Recency::parse("1h ago"));
    }

    #[test]
    fn posts_serialize_with_wire_field_names() {
        let value = serde_json::to_value(sample_post()).expect("serialize post");
        assert_eq!(value["type"], "update");
        assert!(value["user"]["name"].is_string());
        assert_eq!(value["isLiked"], false);
        assert_eq!(value["showComments"], false);
        assert_eq!(value["challenge"]["hasUpdatedToday"], false);
        assert_eq!(value["challenge"]["target"], 900);
        assert!(value["challenge"].get("todaysUpdate").is_none());
    }

    #[test]
    fn edit_draft_reports_missing_fields() {
        let complete = EditDraft {
            text: "done".to_string(),
            progress: Some(800),
            image: Some("https://example.com/p.png".to_string()),
        };
        assert!(complete.missing_fields().is_empty());

        let empty = EditDraft::default();
        assert_eq!(
            empty.missing_fields(),
            vec![EditField::Text, EditField::Progress, EditField::Image]
        );

        let blank_image = EditDraft {
            image: Some("   ".to_string()),
            ..complete.clone()
        };
        assert_eq!(blank_image.missing_fields(), vec![EditField::Image]);
    }

    #[test]
    fn edit_draft_applies_only_its_fields() {
        let mut post = sample_post();
        let draft = EditDraft {
            text: "  evening run instead  ".to_string(),
            progress: Some(820),
            image: Some("https://example.com/run.png".to_string()),
        };
        draft.apply_to(&mut post);

        let content = post.content.as_ref().expect("content kept");
        assert_eq!(content.text.as_deref(), Some("evening run instead"));
        assert_eq!(content.image.as_deref(), Some("https://example.com/run.png"));
        assert_eq!(post.challenge.progress, Some(820));
        assert_eq!(post.challenge.target, Some(900));
        assert_eq!(post.likes, 3);
        assert_eq!(post.timestamp, "2h ago");
    }
}
