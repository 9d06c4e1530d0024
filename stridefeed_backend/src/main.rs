use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::time::{sleep, Duration};

use stridefeed_backend::challenges::{ChallengeService, ProgressDraft};
use stridefeed_backend::channel::EventHub;
use stridefeed_backend::config::StridefeedConfig;
use stridefeed_backend::feed::{grouping, FeedHandle};
use stridefeed_backend::models::{EditDraft, FeedEntry};
use stridefeed_backend::relay::RelayHandle;
use stridefeed_backend::{notify, seed, telemetry, utils};

#[derive(Parser)]
#[command(author, version, about = "Activity feed synchronization engine for fitness challenges")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a live session against the in-process relay with synthetic peers
    Simulate,
    /// Print the grouped seed feed as JSON and exit
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let config = StridefeedConfig::from_env();

    match args.command.unwrap_or(Command::Simulate) {
        Command::Simulate => simulate(config).await,
        Command::Snapshot => snapshot(),
    }
}

/// Spins up the relay and one feed session, scripts a few interactions, and
/// prints the final grouped view when the session ends.
async fn simulate(config: StridefeedConfig) -> Result<()> {
    let (hub, emissions) = EventHub::new(&config.channel);
    let _relay = RelayHandle::start(
        hub.clone(),
        emissions,
        seed::feed_posts(),
        seed::challenges(),
        &config.sim,
        true,
    );

    let (notices, mut notice_rx) = notify::notice_channel();
    let feed = FeedHandle::start(&hub, &config.local_user, seed::feed_posts(), notices);
    tracing::info!(user = %config.local_user, "feed session started");

    let notice_logger = tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            tracing::info!(%notice, "notice");
        }
    });

    // Stage a short dropout partway through so the reconnect flow shows up.
    let dropout_hub = hub.clone();
    let dropout = tokio::spawn(async move {
        sleep(Duration::from_secs(6)).await;
        dropout_hub.set_online(false);
        sleep(Duration::from_secs(2)).await;
        dropout_hub.set_online(true);
    });

    // A small scripted session: cheer on Mike's workout, then nudge whoever
    // has moved the least in the morning run challenge.
    let challenges = ChallengeService::new(seed::challenges());
    sleep(Duration::from_millis(600)).await;
    feed.toggle_like("2").await?;
    sleep(Duration::from_millis(600)).await;
    feed.add_comment("2", "Nice work on the bench!").await?;
    if let Some(target) = challenges.nudge_roster("1")?.first() {
        sleep(Duration::from_millis(600)).await;
        feed.send_nudge("1", &target.id, &target.name).await?;
    }

    // Log tonight's numbers through the composer, saved as an edit of the
    // morning update.
    sleep(Duration::from_millis(600)).await;
    log_progress(&feed).await?;

    sleep(Duration::from_secs(config.sim.duration_secs)).await;

    println!("{}", render_view(&feed.current_view()));
    if let Ok(rows) = challenges.leaderboard("1") {
        println!("morning run standings:");
        for row in rows {
            println!("  #{} {} · {}%", row.rank, row.participant.name, row.percent);
        }
    }
    feed.shutdown().await;
    dropout.abort();
    notice_logger.abort();
    Ok(())
}

async fn log_progress(feed: &FeedHandle) -> Result<()> {
    let Some(own_update) = feed
        .current_view()
        .iter()
        .filter_map(FeedEntry::as_update)
        .find(|post| post.id == "1")
        .cloned()
    else {
        return Ok(());
    };
    let draft = ProgressDraft {
        challenge_id: Some(own_update.challenge.id.clone()),
        value: "820".to_string(),
        comment: "Evening top-up run to close the gap!".to_string(),
        photo: own_update.content.as_ref().and_then(|c| c.image.clone()),
    };
    let entry = draft.validate()?;
    let text = entry
        .comment
        .unwrap_or_else(|| "Progress logged".to_string());
    feed.save_edit(
        "1",
        EditDraft {
            text,
            progress: Some(entry.value),
            image: entry.photo,
        },
    )
    .await
}

fn snapshot() -> Result<()> {
    let report = serde_json::json!({
        "generatedAt": utils::now_utc_iso(),
        "entries": grouping::group_feed(&seed::feed_posts()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn render_view(view: &[FeedEntry]) -> String {
    let mut lines = Vec::with_capacity(view.len() + 1);
    lines.push(format!("feed ({} entries)", view.len()));
    for entry in view {
        match entry {
            FeedEntry::Update(post) => {
                let progress = match (post.challenge.progress, post.challenge.target) {
                    (Some(current), Some(target)) => format!(
                        " [{current}/{target} {}]",
                        post.challenge.metric.as_deref().unwrap_or_default()
                    ),
                    _ => String::new(),
                };
                lines.push(format!(
                    "  {} · {}{} · {} likes, {} comments · {}",
                    post.author.name,
                    post.challenge.title,
                    progress,
                    post.likes,
                    post.comments.len(),
                    post.timestamp
                ));
            }
            FeedEntry::Nudges(group) => {
                let names: Vec<&str> = group.users.iter().map(|user| user.name.as_str()).collect();
                lines.push(format!(
                    "  {} nudged about {} · {}",
                    names.join(", "),
                    group.challenge_title,
                    group.timestamp
                ));
            }
        }
    }
    lines.join("\n")
}
