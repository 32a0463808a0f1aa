//! Match data: stage kinds, bracket sides, match status, and the match record.

use crate::models::team::TeamId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which elimination bracket a team or match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    Winners,
    Losers,
}

impl BracketSide {
    /// The match stage for this bracket side.
    pub fn stage(self) -> StageKind {
        match self {
            BracketSide::Winners => StageKind::Winners,
            BracketSide::Losers => StageKind::Losers,
        }
    }
}

/// Competitive stage a match belongs to. Fixed at creation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Group,
    GroupWinnersFinal,
    GroupLosersFinal,
    Swiss,
    Winners,
    Losers,
}

impl StageKind {
    /// Knockout stages forbid draws and award no standings points.
    pub fn is_knockout(self) -> bool {
        matches!(
            self,
            StageKind::GroupWinnersFinal
                | StageKind::GroupLosersFinal
                | StageKind::Winners
                | StageKind::Losers
        )
    }

    /// Group winners/losers final.
    pub fn is_group_final(self) -> bool {
        matches!(self, StageKind::GroupWinnersFinal | StageKind::GroupLosersFinal)
    }
}

/// Lifecycle state of a match. COMPLETED is the only terminal state;
/// a timed-out match still accepts the score submission that finalizes it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Ongoing,
    Completed,
    TimedOut,
}

/// A single match between two teams.
///
/// `stage`, `stage_round` and `group_number` never change after creation;
/// only the score, status and timer fields mutate.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub stage: StageKind,
    /// Round counter within the stage family (group rounds, Swiss rounds,
    /// or a bracket side's own counter).
    pub stage_round: u32,
    pub group_number: Option<u32>,
    pub team_1: TeamId,
    pub team_2: TeamId,
    /// None until the match is completed.
    pub team_1_score: Option<u32>,
    pub team_2_score: Option<u32>,
    /// Set at completion when the scores differ; always set in knockout stages.
    pub winner_team_id: Option<TeamId>,
    pub status: MatchStatus,
    pub time_limit_minutes: Option<u32>,
    pub timer_started_at: Option<DateTime<Utc>>,
    /// Set at completion: false when the match ran past its time limit.
    pub finished_before_time_limit: Option<bool>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl GameMatch {
    pub fn new(
        tournament_id: TournamentId,
        stage: StageKind,
        stage_round: u32,
        group_number: Option<u32>,
        team_1: TeamId,
        team_2: TeamId,
        time_limit_minutes: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            stage,
            stage_round,
            group_number,
            team_1,
            team_2,
            team_1_score: None,
            team_2_score: None,
            winner_team_id: None,
            status: MatchStatus::Pending,
            time_limit_minutes,
            timer_started_at: None,
            finished_before_time_limit: None,
            ended_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.team_1 == team || self.team_2 == team
    }

    /// The participant that did not win (meaningful once a winner is set).
    pub fn loser_team_id(&self) -> Option<TeamId> {
        let winner = self.winner_team_id?;
        if winner == self.team_1 {
            Some(self.team_2)
        } else {
            Some(self.team_1)
        }
    }
}
