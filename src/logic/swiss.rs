//! Swiss pairing: adjacent-rank pairing over the current standings.
//!
//! There is no rematch protection across rounds; a repeat pairing is an
//! accepted limitation of this format for a casual-club setting.

use crate::logic::standings::tournament_standings;
use crate::models::{
    GameMatch, MatchFilter, StageKind, TeamId, Tournament, TournamentError, TournamentStatus,
};

/// Generate the next Swiss round: sort teams by the standings order and pair
/// rank 1 vs 2, 3 vs 4, and so on. Round 1 (all standings zero) pairs in
/// registration order. Refuses once `rounds_planned` is exhausted.
pub fn generate_swiss_round(tournament: &mut Tournament) -> Result<usize, TournamentError> {
    if !tournament.format.is_swiss_style() {
        return Err(TournamentError::WrongFormat);
    }
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }

    let current = tournament.swiss_round;
    if current >= 1 {
        let filter = MatchFilter::stage_round(StageKind::Swiss, current);
        let total = tournament.matches_where(filter).count();
        let outstanding = tournament.outstanding_matches(filter);
        if outstanding > 0 {
            // Nothing played at all means a duplicate generation attempt,
            // not a half-finished round.
            if outstanding == total {
                return Err(TournamentError::StageAlreadyGenerated);
            }
            return Err(TournamentError::RoundIncomplete { outstanding });
        }
    }
    let planned = tournament.rounds_planned.unwrap_or(0);
    if current + 1 > planned {
        return Err(TournamentError::RoundsExhausted { planned });
    }

    let count = tournament.teams.len();
    if count < 2 {
        return Err(TournamentError::NotEnoughTeams { required: 2, have: count });
    }
    if count % 2 != 0 {
        return Err(TournamentError::OddTeamCount { count });
    }

    let ranked: Vec<TeamId> = tournament_standings(tournament)
        .into_iter()
        .map(|row| row.team_id)
        .collect();
    let time_limit = tournament.match_time_limit();
    let mut new_matches: Vec<GameMatch> = ranked
        .chunks(2)
        .map(|pair| {
            GameMatch::new(
                tournament.id,
                StageKind::Swiss,
                current + 1,
                None,
                pair[0],
                pair[1],
                time_limit,
            )
        })
        .collect();
    let created = new_matches.len();
    tournament.matches.append(&mut new_matches);
    tournament.swiss_round = current + 1;
    Ok(created)
}
