pub mod challenges;
pub mod channel;
pub mod config;
pub mod feed;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod relay;
pub mod seed;
pub mod telemetry;
pub mod utils;

// Re-exports for convenience
pub use channel::{ChannelHandle, EventHub};
pub use feed::{Feed, FeedCommand, FeedHandle};
pub use models::{Comment, FeedEntry, GroupedNudge, Post, PostKind};
pub use notify::Notice;
