//! Standings calculator: scoring policies and ranked standings rows.

use crate::models::{GameMatch, StageKind, Team, TeamId, Tournament, TournamentError};
use serde::Serialize;

/// Points scheme applied when a match completes, selected by its stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScoringPolicy {
    /// Group finals and elimination brackets: no points, draws forbidden.
    Knockout,
    /// Swiss rounds: 3 for an in-time win, 2 for a time-limit win, 1 each for a tie.
    Timed,
    /// Group rounds 1-2: 2 for a win, 1 each for a tie.
    GroupRound,
}

impl ScoringPolicy {
    pub fn for_stage(stage: StageKind) -> Self {
        match stage {
            StageKind::Group => ScoringPolicy::GroupRound,
            StageKind::Swiss => ScoringPolicy::Timed,
            _ => ScoringPolicy::Knockout,
        }
    }
}

/// Points and score differential one completed match contributes to one team.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScoreDelta {
    pub points: u32,
    pub differential: i32,
}

/// Deltas for both sides of a completed match. `finished_in_time` only
/// matters under the timed policy.
pub fn match_deltas(
    policy: ScoringPolicy,
    team_1_score: u32,
    team_2_score: u32,
    finished_in_time: bool,
) -> (ScoreDelta, ScoreDelta) {
    if policy == ScoringPolicy::Knockout {
        return (ScoreDelta::default(), ScoreDelta::default());
    }
    let diff = team_1_score as i32 - team_2_score as i32;
    let (p1, p2) = if team_1_score == team_2_score {
        (1, 1)
    } else {
        let win = match policy {
            ScoringPolicy::Timed if !finished_in_time => 2,
            ScoringPolicy::Timed => 3,
            _ => 2,
        };
        if team_1_score > team_2_score {
            (win, 0)
        } else {
            (0, win)
        }
    };
    (
        ScoreDelta { points: p1, differential: diff },
        ScoreDelta { points: p2, differential: -diff },
    )
}

/// One team's line in a standings listing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub name: String,
    pub group_number: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
    pub score_differential: i32,
    pub matches_played: u32,
}

/// Standings for every team, over all completed matches of the tournament.
pub fn tournament_standings(tournament: &Tournament) -> Vec<StandingsRow> {
    let matches: Vec<&GameMatch> = tournament
        .matches
        .iter()
        .filter(|m| m.is_completed())
        .collect();
    ranked_rows(tournament.teams.iter(), &matches)
}

/// Standings for one group, over its completed matches only.
pub fn group_standings(
    tournament: &Tournament,
    group_number: u32,
) -> Result<Vec<StandingsRow>, TournamentError> {
    let teams = tournament.teams_in_group(group_number);
    if teams.is_empty() {
        return Err(TournamentError::GroupNotFound(group_number));
    }
    let matches: Vec<&GameMatch> = tournament
        .matches
        .iter()
        .filter(|m| m.is_completed() && m.group_number == Some(group_number))
        .collect();
    Ok(ranked_rows(teams.into_iter(), &matches))
}

/// Build rows from scratch and rank them: points desc, score differential
/// desc, wins desc. The sort is stable, so teams equal on all three keep
/// their registration order.
fn ranked_rows<'a>(
    teams: impl Iterator<Item = &'a Team>,
    matches: &[&GameMatch],
) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = teams
        .map(|team| {
            let mut row = StandingsRow {
                team_id: team.id,
                name: team.name.clone(),
                group_number: team.group_number,
                wins: 0,
                losses: 0,
                draws: 0,
                points: 0,
                score_differential: 0,
                matches_played: 0,
            };
            for m in matches.iter().filter(|m| m.involves(team.id)) {
                let (Some(s1), Some(s2)) = (m.team_1_score, m.team_2_score) else {
                    continue;
                };
                let policy = ScoringPolicy::for_stage(m.stage);
                let finished = m.finished_before_time_limit.unwrap_or(true);
                let (d1, d2) = match_deltas(policy, s1, s2, finished);
                let delta = if m.team_1 == team.id { d1 } else { d2 };
                row.points += delta.points;
                row.score_differential += delta.differential;
                row.matches_played += 1;
                match m.winner_team_id {
                    Some(w) if w == team.id => row.wins += 1,
                    Some(_) => row.losses += 1,
                    None => row.draws += 1,
                }
            }
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.score_differential.cmp(&a.score_differential))
            .then(b.wins.cmp(&a.wins))
    });
    rows
}
