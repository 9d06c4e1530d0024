//! User-facing notices surfaced by the feed loop. The consumer decides how
//! to render them; the demo binary just logs each one.

use std::fmt;

use tokio::sync::mpsc;

use crate::models::EditField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NewPost { author: String },
    NewComment { author: String },
    NudgeReceived { from: String, challenge: String },
    NudgeSent { participant: String },
    AlreadyNudged { participant: String },
    UpdateSaved,
    EditRejected { missing: Vec<EditField> },
    Reconnecting,
    Connected,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NewPost { author } => write!(f, "{author} posted a new update"),
            Notice::NewComment { author } => write!(f, "{author} commented on a post"),
            Notice::NudgeReceived { from, challenge } => {
                write!(f, "{from} nudged you about {challenge}")
            }
            Notice::NudgeSent { participant } => write!(f, "Nudge sent to {participant}!"),
            Notice::AlreadyNudged { participant } => {
                write!(f, "You've already nudged {participant} recently.")
            }
            Notice::UpdateSaved => write!(f, "Your changes have been saved successfully."),
            Notice::EditRejected { missing } => {
                let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
                write!(f, "Update needs {} before it can be saved", labels.join(", "))
            }
            Notice::Reconnecting => {
                write!(f, "Failed to connect to the server. Retrying...")
            }
            Notice::Connected => write!(f, "Connected to live updates"),
        }
    }
}

/// Clone-able sender half of the notice stream. Dropped listeners are fine;
/// notices are advisory.
#[derive(Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    pub fn send(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("notice listener gone, dropping notice");
        }
    }
}

pub fn notice_channel() -> (NoticeSender, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}
