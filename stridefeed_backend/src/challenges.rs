//! Challenge rosters, leaderboard ranking, and the progress composer.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::Author;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub target: u32,
    pub metric: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub initials: String,
    pub progress: Progress,
}

impl Participant {
    pub fn author(&self) -> Author {
        Author {
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            initials: self.initials.clone(),
        }
    }

    pub fn percent(&self) -> u32 {
        percent_complete(self.progress.current, self.progress.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub participants: Vec<Participant>,
    pub progress: Progress,
    pub days_left: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub participant: Participant,
    pub percent: u32,
}

/// Share of the target reached, in whole percent. A zero target reads as no
/// progress instead of dividing by it.
pub fn percent_complete(current: u32, target: u32) -> u32 {
    if target == 0 {
        return 0;
    }
    ((u64::from(current) * 100) / u64::from(target)) as u32
}

fn completion_ratio(participant: &Participant) -> f64 {
    if participant.progress.target == 0 {
        return 0.0;
    }
    f64::from(participant.progress.current) / f64::from(participant.progress.target)
}

/// Ranks participants by completion, most progress first. Ties keep roster
/// order.
pub fn leaderboard(participants: &[Participant]) -> Vec<LeaderboardRow> {
    let mut sorted: Vec<Participant> = participants.to_vec();
    sorted.sort_by(|a, b| completion_ratio(b).total_cmp(&completion_ratio(a)));
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, participant)| LeaderboardRow {
            rank: index + 1,
            percent: participant.percent(),
            participant,
        })
        .collect()
}

/// Participants ordered most-in-need first, for picking who to nudge.
pub fn nudge_roster(participants: &[Participant]) -> Vec<Participant> {
    let mut sorted: Vec<Participant> = participants.to_vec();
    sorted.sort_by(|a, b| completion_ratio(a).total_cmp(&completion_ratio(b)));
    sorted
}

/// Read-only lookup over the known challenges.
#[derive(Debug, Clone)]
pub struct ChallengeService {
    challenges: Vec<Challenge>,
}

impl ChallengeService {
    pub fn new(challenges: Vec<Challenge>) -> Self {
        Self { challenges }
    }

    pub fn list(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn get(&self, challenge_id: &str) -> Option<&Challenge> {
        self.challenges
            .iter()
            .find(|challenge| challenge.id == challenge_id)
    }

    pub fn leaderboard(&self, challenge_id: &str) -> Result<Vec<LeaderboardRow>> {
        let Some(challenge) = self.get(challenge_id) else {
            bail!("unknown challenge {challenge_id}");
        };
        Ok(leaderboard(&challenge.participants))
    }

    pub fn nudge_roster(&self, challenge_id: &str) -> Result<Vec<Participant>> {
        let Some(challenge) = self.get(challenge_id) else {
            bail!("unknown challenge {challenge_id}");
        };
        Ok(nudge_roster(&challenge.participants))
    }
}

/// Draft state of the progress composer. A challenge must be selected and
/// the metric value numeric before the entry can be posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressDraft {
    pub challenge_id: Option<String>,
    pub value: String,
    pub comment: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub challenge_id: String,
    pub value: u32,
    pub comment: Option<String>,
    pub photo: Option<String>,
}

impl ProgressDraft {
    pub fn validate(&self) -> Result<ProgressEntry> {
        let Some(challenge_id) = self
            .challenge_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
        else {
            bail!("select a challenge first");
        };
        let value: u32 = match self.value.trim().parse() {
            Ok(value) => value,
            Err(_) => bail!("progress value must be a whole number"),
        };
        let comment = Some(self.comment.trim().to_string()).filter(|text| !text.is_empty());
        Ok(ProgressEntry {
            challenge_id: challenge_id.to_string(),
            value,
            comment,
            photo: self.photo.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str, name: &str, current: u32, target: u32) -> Participant {
        let author = Author::with_placeholder_avatar(name);
        Participant {
            id: id.to_string(),
            name: author.name,
            avatar: author.avatar,
            initials: author.initials,
            progress: Progress {
                current,
                target,
                metric: "steps".to_string(),
            },
        }
    }

    fn roster() -> Vec<Participant> {
        vec![
            participant("1", "Sarah Chen", 750, 900),
            participant("2", "Mike Johnson", 800, 900),
            participant("3", "Alex Kim", 600, 900),
        ]
    }

    #[test]
    fn leaderboard_ranks_most_progress_first() {
        let rows = leaderboard(&roster());
        let names: Vec<&str> = rows.iter().map(|row| row.participant.name.as_str()).collect();
        assert_eq!(names, vec!["Mike Johnson", "Sarah Chen", "Alex Kim"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].percent, 88);
        assert_eq!(rows[2].rank, 3);
        assert_eq!(rows[2].percent, 66);
    }

    #[test]
    fn nudge_roster_puts_most_in_need_first() {
        let sorted = nudge_roster(&roster());
        let names: Vec<&str> = sorted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alex Kim", "Sarah Chen", "Mike Johnson"]);
    }

    #[test]
    fn zero_target_reads_as_no_progress() {
        assert_eq!(percent_complete(500, 0), 0);

        let mut participants = roster();
        participants.push(participant("4", "Emma Wilson", 500, 0));
        let rows = leaderboard(&participants);
        assert_eq!(rows.last().map(|row| row.participant.name.as_str()), Some("Emma Wilson"));
        assert_eq!(rows.last().map(|row| row.percent), Some(0));

        let sorted = nudge_roster(&participants);
        assert_eq!(sorted.first().map(|p| p.name.as_str()), Some("Emma Wilson"));
    }

    #[test]
    fn service_rejects_unknown_challenges() {
        let service = ChallengeService::new(vec![Challenge {
            id: "1".to_string(),
            title: "Morning Run Challenge".to_string(),
            description: "runs".to_string(),
            participants: roster(),
            progress: Progress {
                current: 750,
                target: 900,
                metric: "steps".to_string(),
            },
            days_left: 12,
        }]);

        assert!(service.leaderboard("1").is_ok());
        assert!(service.leaderboard("404").is_err());
        assert!(service.nudge_roster("404").is_err());
        assert!(service.get("404").is_none());
    }

    #[test]
    fn progress_draft_validation() {
        let draft = ProgressDraft::default();
        assert!(draft.validate().is_err());

        let draft = ProgressDraft {
            challenge_id: Some("1".to_string()),
            value: "not a number".to_string(),
            ..ProgressDraft::default()
        };
        assert!(draft.validate().is_err());

        let draft = ProgressDraft {
            challenge_id: Some("1".to_string()),
            value: " 8200 ".to_string(),
            comment: "  ".to_string(),
            photo: None,
        };
        let entry = draft.validate().expect("valid draft");
        assert_eq!(entry.challenge_id, "1");
        assert_eq!(entry.value, 8200);
        assert!(entry.comment.is_none());
    }
}
