//! Shared helpers for display identity and relative timestamps.

use chrono::{DateTime, Utc};

pub const APP_NAME: &str = "stridefeed_backend";

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Uppercase initials for a display name: first letters of the first two
/// words, or the whole word uppercased for single-word names ("You" -> "YOU").
pub fn initials_for(name: &str) -> String {
    let mut words = name.split_whitespace();
    let first = words.next().unwrap_or_default();
    match words.next() {
        Some(second) => {
            let mut initials = String::new();
            initials.extend(first.chars().next().map(|c| c.to_ascii_uppercase()));
            initials.extend(second.chars().next().map(|c| c.to_ascii_uppercase()));
            initials
        }
        None => first.to_uppercase(),
    }
}

/// Placeholder avatar URL for profiles without an uploaded picture.
pub fn avatar_url_for(initials: &str) -> String {
    format!("https://dummyimage.com/100/6366f1/ffffff&text={initials}")
}

/// Renders a wall-clock delta as the display labels the feed uses. Deltas
/// under a minute (and clock skew) read as "Just now".
pub fn relative_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}
