//! Qualification resolver: sole owner of the teams' qualification fields,
//! and the entry point for building elimination brackets from qualifiers.

use crate::logic::bracket;
use crate::logic::progression::{self, GroupState};
use crate::logic::standings::tournament_standings;
use crate::models::{
    BracketSide, GameMatch, MatchFilter, StageKind, TeamId, Tournament, TournamentError,
    TournamentFormat, TournamentStatus,
};

/// Mark a group's finalists when the qualification matches are generated:
/// ranks 1-2 head for the winners bracket, ranks 3-4 for the losers bracket.
/// A 3-team group's third rank is auto-qualified without a losers final.
pub(crate) fn mark_group_finalists(
    tournament: &mut Tournament,
    ranked: &[TeamId],
) -> Result<(), TournamentError> {
    for (idx, &id) in ranked.iter().enumerate() {
        let side = if idx < 2 {
            BracketSide::Winners
        } else {
            BracketSide::Losers
        };
        let team = tournament
            .team_mut(id)
            .ok_or(TournamentError::TeamNotFound(id))?;
        team.qualification_rank = Some(idx as u32 + 1);
        team.qualification_bracket = Some(side);
    }
    Ok(())
}

/// Confirm ranks once a group final completes: the winners final decides
/// ranks 1 and 2, the losers final ranks 3 and 4.
pub(crate) fn confirm_final_ranks(
    tournament: &mut Tournament,
    m: &GameMatch,
) -> Result<(), TournamentError> {
    let winner = m.winner_team_id.ok_or(TournamentError::DrawInKnockout)?;
    let loser = m.loser_team_id().ok_or(TournamentError::DrawInKnockout)?;
    let (winner_rank, loser_rank) = match m.stage {
        StageKind::GroupWinnersFinal => (1, 2),
        StageKind::GroupLosersFinal => (3, 4),
        _ => return Ok(()),
    };
    tournament
        .team_mut(winner)
        .ok_or(TournamentError::TeamNotFound(winner))?
        .qualification_rank = Some(winner_rank);
    tournament
        .team_mut(loser)
        .ok_or(TournamentError::TeamNotFound(loser))?
        .qualification_rank = Some(loser_rank);
    Ok(())
}

/// Build the round-1 bracket for one side.
///
/// GROUP format: takes the teams qualified for that side once every group
/// has finished its finals, seeding so that round 1 avoids same-group
/// rematches. SWISS/MARATHON: takes the top power-of-two teams of the
/// standings once the Swiss phase is over; only a winners bracket exists.
/// Both sides are generated independently and never merge participants.
pub fn generate_bracket(
    tournament: &mut Tournament,
    side: BracketSide,
) -> Result<usize, TournamentError> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }
    if tournament.bracket_round(side) > 0 {
        return Err(TournamentError::StageAlreadyGenerated);
    }

    let seeds = match tournament.format {
        TournamentFormat::Group => {
            let unfinished = tournament
                .group_numbers()
                .into_iter()
                .filter(|&g| {
                    progression::group_state(tournament, g)
                        .map(|p| p.state != GroupState::Completed)
                        .unwrap_or(true)
                })
                .count();
            if unfinished > 0 {
                return Err(TournamentError::GroupsUnfinished { count: unfinished });
            }
            seed_group_qualifiers(tournament, side)
        }
        TournamentFormat::Swiss | TournamentFormat::Marathon => {
            if side == BracketSide::Losers {
                return Err(TournamentError::NoLosersBracket);
            }
            let planned = tournament.rounds_planned.unwrap_or(0);
            if tournament.swiss_round < planned {
                return Err(TournamentError::SwissRoundsRemaining {
                    remaining: planned - tournament.swiss_round,
                });
            }
            let last = MatchFilter::stage_round(StageKind::Swiss, tournament.swiss_round);
            let outstanding = tournament.outstanding_matches(last);
            if outstanding > 0 {
                return Err(TournamentError::RoundIncomplete { outstanding });
            }
            top_power_of_two(tournament)
        }
    };

    if seeds.len() < 4 {
        return Err(TournamentError::BracketTooSmall { size: seeds.len() });
    }
    if !seeds.len().is_power_of_two() {
        return Err(TournamentError::BracketNotPowerOfTwo { size: seeds.len() });
    }
    bracket::open_round_one(tournament, side, &seeds)
}

/// Seed order for a side's group qualifiers: the better-rank class (rank 1
/// for winners, rank 3 for losers) ordered by group, interleaved with the
/// worse-rank class rotated by one group, so consecutive-pair round 1 never
/// pits two teams of the same group against each other. Unequal class sizes
/// fall back to better ranks first.
fn seed_group_qualifiers(tournament: &Tournament, side: BracketSide) -> Vec<TeamId> {
    let better_rank = match side {
        BracketSide::Winners => 1,
        BracketSide::Losers => 3,
    };
    let mut candidates: Vec<(u32, u32, TeamId)> = tournament
        .teams
        .iter()
        .filter(|t| t.qualification_bracket == Some(side))
        .filter_map(|t| {
            let rank = t.qualification_rank?;
            Some((t.group_number.unwrap_or(0), rank, t.id))
        })
        .collect();
    candidates.sort_by_key(|&(group, rank, _)| (group, rank));

    let better: Vec<TeamId> = candidates
        .iter()
        .filter(|&&(_, rank, _)| rank == better_rank)
        .map(|&(_, _, id)| id)
        .collect();
    let mut worse: Vec<TeamId> = candidates
        .iter()
        .filter(|&&(_, rank, _)| rank != better_rank)
        .map(|&(_, _, id)| id)
        .collect();

    if better.len() == worse.len() && !better.is_empty() {
        worse.rotate_left(1);
        better
            .into_iter()
            .zip(worse)
            .flat_map(|(a, b)| [a, b])
            .collect()
    } else {
        better.into_iter().chain(worse).collect()
    }
}

/// Top K of the standings, K the largest power of two not above the team
/// count.
fn top_power_of_two(tournament: &Tournament) -> Vec<TeamId> {
    let n = tournament.teams.len();
    if n < 2 {
        return Vec::new();
    }
    let k = usize::pow(2, n.ilog2());
    tournament_standings(tournament)
        .into_iter()
        .take(k)
        .map(|row| row.team_id)
        .collect()
}
