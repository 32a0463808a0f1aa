//! Stage progression: derived per-group and per-tournament state, the
//! caller-triggered advance operations, and terminal-state detection.
//!
//! States are pure functions of the match set; nothing here runs on a
//! timer, and an advance whose guard is unmet is a rejected operation.

use crate::logic::bracket::{round_display_name, side_winner};
use crate::logic::group_stage;
use crate::models::{
    BracketSide, MatchFilter, MatchStatus, StageKind, Tournament, TournamentError,
    TournamentFormat, TournamentStatus,
};
use serde::Serialize;

/// Per-group state in the GROUP format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    Round1InProgress,
    Round2Ready,
    Round2InProgress,
    QualificationReady,
    FinalsReady,
    FinalsInProgress,
    Completed,
}

/// One group's progression state plus its outstanding match count.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct GroupProgress {
    pub group_number: u32,
    pub state: GroupState,
    pub outstanding: usize,
}

/// Summary of one bracket side for progress views.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BracketSummary {
    pub side: BracketSide,
    pub round: u32,
    /// Presentational: "Quarter-final", "Final", ...
    pub round_name: String,
    pub outstanding: usize,
    pub complete: bool,
}

/// Tournament-level progress view, per format family.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TournamentProgress {
    Group {
        groups: Vec<GroupProgress>,
        all_groups_completed: bool,
        brackets: Vec<BracketSummary>,
    },
    Swiss {
        rounds_planned: u32,
        current_round: u32,
        outstanding: usize,
        swiss_complete: bool,
        knockout: Option<BracketSummary>,
    },
}

/// Derive a group's progression state from its matches.
pub fn group_state(
    tournament: &Tournament,
    group_number: u32,
) -> Result<GroupProgress, TournamentError> {
    if tournament.teams_in_group(group_number).is_empty() {
        return Err(TournamentError::GroupNotFound(group_number));
    }
    let finals_winners = MatchFilter::stage(StageKind::GroupWinnersFinal).group(group_number);
    let finals_losers = MatchFilter::stage(StageKind::GroupLosersFinal).group(group_number);
    let has_finals = tournament.matches_where(finals_winners).next().is_some();
    if has_finals {
        let outstanding = tournament.outstanding_matches(finals_winners)
            + tournament.outstanding_matches(finals_losers);
        let state = if outstanding == 0 {
            GroupState::Completed
        } else {
            let any_started = tournament
                .matches_where(finals_winners)
                .chain(tournament.matches_where(finals_losers))
                .any(|m| m.status != MatchStatus::Pending);
            if any_started {
                GroupState::FinalsInProgress
            } else {
                GroupState::FinalsReady
            }
        };
        return Ok(GroupProgress { group_number, state, outstanding });
    }

    let round_2 = MatchFilter::stage_round(StageKind::Group, 2).group(group_number);
    if tournament.matches_where(round_2).next().is_some() {
        let outstanding = tournament.outstanding_matches(round_2);
        let state = if outstanding == 0 {
            GroupState::QualificationReady
        } else {
            GroupState::Round2InProgress
        };
        return Ok(GroupProgress { group_number, state, outstanding });
    }

    let round_1 = MatchFilter::stage_round(StageKind::Group, 1).group(group_number);
    let outstanding = tournament.outstanding_matches(round_1);
    let state = if outstanding == 0 {
        GroupState::Round2Ready
    } else {
        GroupState::Round1InProgress
    };
    Ok(GroupProgress { group_number, state, outstanding })
}

/// Advance one group (or, with `None`, every group that is ready): generate
/// round 2 for a group whose round 1 is done, or the qualification matches
/// for a group whose round 2 is done. Returns the number of matches created.
pub fn advance_groups(
    tournament: &mut Tournament,
    group_number: Option<u32>,
) -> Result<usize, TournamentError> {
    if tournament.format != TournamentFormat::Group {
        return Err(TournamentError::WrongFormat);
    }
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }
    match group_number {
        Some(g) => advance_one_group(tournament, g),
        None => {
            let mut created = 0;
            let mut outstanding_total = 0;
            for g in tournament.group_numbers() {
                let progress = group_state(tournament, g)?;
                match progress.state {
                    GroupState::Round2Ready | GroupState::QualificationReady => {
                        created += advance_one_group(tournament, g)?;
                    }
                    GroupState::Completed => {}
                    _ => outstanding_total += progress.outstanding,
                }
            }
            if created == 0 {
                return Err(TournamentError::NoGroupReady {
                    outstanding: outstanding_total,
                });
            }
            Ok(created)
        }
    }
}

fn advance_one_group(
    tournament: &mut Tournament,
    group_number: u32,
) -> Result<usize, TournamentError> {
    let progress = group_state(tournament, group_number)?;
    match progress.state {
        GroupState::Round2Ready => group_stage::generate_second_round(tournament, group_number),
        GroupState::QualificationReady => {
            group_stage::generate_qualification(tournament, group_number)
        }
        GroupState::Completed => Err(TournamentError::StageAlreadyGenerated),
        _ => Err(TournamentError::RoundIncomplete {
            outstanding: progress.outstanding,
        }),
    }
}

/// Current progress view for the tournament.
pub fn tournament_progress(tournament: &Tournament) -> TournamentProgress {
    match tournament.format {
        TournamentFormat::Group => {
            let groups: Vec<GroupProgress> = tournament
                .group_numbers()
                .into_iter()
                .filter_map(|g| group_state(tournament, g).ok())
                .collect();
            let all_groups_completed = !groups.is_empty()
                && groups.iter().all(|p| p.state == GroupState::Completed);
            let brackets = [BracketSide::Winners, BracketSide::Losers]
                .into_iter()
                .filter_map(|side| bracket_summary(tournament, side))
                .collect();
            TournamentProgress::Group {
                groups,
                all_groups_completed,
                brackets,
            }
        }
        TournamentFormat::Swiss | TournamentFormat::Marathon => {
            let rounds_planned = tournament.rounds_planned.unwrap_or(0);
            let current_round = tournament.swiss_round;
            let outstanding = if current_round > 0 {
                tournament
                    .outstanding_matches(MatchFilter::stage_round(StageKind::Swiss, current_round))
            } else {
                0
            };
            TournamentProgress::Swiss {
                rounds_planned,
                current_round,
                outstanding,
                swiss_complete: current_round >= rounds_planned && outstanding == 0,
                knockout: bracket_summary(tournament, BracketSide::Winners),
            }
        }
    }
}

fn bracket_summary(tournament: &Tournament, side: BracketSide) -> Option<BracketSummary> {
    let round = tournament.bracket_round(side);
    if round == 0 {
        return None;
    }
    let filter = MatchFilter::stage_round(side.stage(), round);
    let matches = tournament.matches_where(filter).count();
    Some(BracketSummary {
        side,
        round,
        round_name: round_display_name(matches * 2),
        outstanding: tournament.outstanding_matches(filter),
        complete: side_winner(tournament, side).is_some(),
    })
}

/// Mark the tournament COMPLETED once its terminal state is reached: every
/// group done and every bracket side that can exist fought to a champion
/// (Swiss: the knockout bracket decided). Safe to call after any mutation.
pub fn refresh_completion(tournament: &mut Tournament) {
    if tournament.status != TournamentStatus::Ongoing {
        return;
    }
    let done = match tournament.format {
        TournamentFormat::Group => group_tournament_done(tournament),
        TournamentFormat::Swiss | TournamentFormat::Marathon => {
            swiss_tournament_done(tournament)
        }
    };
    if done {
        tournament.status = TournamentStatus::Completed;
    }
}

fn group_tournament_done(tournament: &Tournament) -> bool {
    let groups = tournament.group_numbers();
    if groups.is_empty() {
        return false;
    }
    let all_groups = groups.iter().all(|&g| {
        group_state(tournament, g)
            .map(|p| p.state == GroupState::Completed)
            .unwrap_or(false)
    });
    if !all_groups {
        return false;
    }
    // A side with enough qualifiers must run its bracket to a champion;
    // a side below the 4-team minimum can never be bracketed and is skipped.
    [BracketSide::Winners, BracketSide::Losers]
        .into_iter()
        .all(|side| {
            let candidates = tournament
                .teams
                .iter()
                .filter(|t| t.qualification_bracket == Some(side))
                .count();
            if candidates < 4 {
                return true;
            }
            tournament.bracket_round(side) > 0 && side_winner(tournament, side).is_some()
        })
}

fn swiss_tournament_done(tournament: &Tournament) -> bool {
    if tournament.bracket_round(BracketSide::Winners) > 0 {
        return side_winner(tournament, BracketSide::Winners).is_some();
    }
    // Tiny field (under 4 teams): no knockout is possible, the tournament
    // ends with the last planned Swiss round.
    let planned = tournament.rounds_planned.unwrap_or(0);
    tournament.teams.len() < 4
        && tournament.swiss_round >= planned
        && tournament
            .outstanding_matches(MatchFilter::stage(StageKind::Swiss))
            == 0
}
