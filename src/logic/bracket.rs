//! Elimination brackets: round-1 creation and the next-knockout-round step.
//!
//! The winners and losers brackets each own a round counter on the
//! tournament. The losers side is a true double-elimination feed: each of
//! its rounds absorbs the losers of the winners-bracket round with the same
//! number, once that round is complete.

use crate::logic::progression;
use crate::models::{
    BracketSide, GameMatch, MatchFilter, TeamId, Tournament, TournamentError, TournamentStatus,
};

/// Presentational name for an elimination round, from the number of teams
/// still in it (standard halving sequence).
pub fn round_display_name(team_count: usize) -> String {
    match team_count {
        2 => "Final".to_string(),
        4 => "Semi-final".to_string(),
        8 => "Quarter-final".to_string(),
        n => format!("Round of {}", n),
    }
}

/// Result of a next-knockout-round step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketAdvance {
    RoundGenerated { round: u32, matches: usize },
    /// Fewer than 2 participants remain: the side is done. Reported
    /// idempotently on repeated calls.
    SideComplete { champion: TeamId },
}

/// Create round 1 of a bracket side from an ordered seed list, pairing
/// consecutive seeds. The caller has already validated the seed count.
pub(crate) fn open_round_one(
    tournament: &mut Tournament,
    side: BracketSide,
    seeds: &[TeamId],
) -> Result<usize, TournamentError> {
    debug_assert!(seeds.len() >= 4 && seeds.len().is_power_of_two());
    let time_limit = tournament.match_time_limit();
    let mut new_matches: Vec<GameMatch> = seeds
        .chunks(2)
        .map(|pair| {
            GameMatch::new(
                tournament.id,
                side.stage(),
                1,
                None,
                pair[0],
                pair[1],
                time_limit,
            )
        })
        .collect();
    let created = new_matches.len();
    tournament.matches.append(&mut new_matches);
    *tournament.bracket_round_mut(side) = 1;
    Ok(created)
}

/// Advance a bracket side: collect the participants the current round feeds
/// into the next one, and either create that round or report the side
/// complete. Winners side feeds its winners; losers side feeds its winners
/// plus the losers dropping out of the parallel winners-bracket round.
pub fn advance_bracket(
    tournament: &mut Tournament,
    side: BracketSide,
) -> Result<BracketAdvance, TournamentError> {
    // A completed tournament still answers, so callers can observe the
    // terminal state idempotently.
    if tournament.status == TournamentStatus::Upcoming {
        return Err(TournamentError::NotOngoing);
    }
    let current = tournament.bracket_round(side);
    if current == 0 {
        return Err(TournamentError::RoundNotGenerated { round: 1 });
    }
    let feed = next_round_feed(tournament, side, current)?;
    if feed.len() < 2 {
        progression::refresh_completion(tournament);
        return Ok(BracketAdvance::SideComplete { champion: feed[0] });
    }
    if feed.len() % 2 != 0 {
        return Err(TournamentError::UnevenKnockoutFeed { count: feed.len() });
    }

    let next = current + 1;
    let time_limit = tournament.match_time_limit();
    let mut new_matches: Vec<GameMatch> = feed
        .chunks(2)
        .map(|pair| {
            GameMatch::new(
                tournament.id,
                side.stage(),
                next,
                None,
                pair[0],
                pair[1],
                time_limit,
            )
        })
        .collect();
    let matches = new_matches.len();
    tournament.matches.append(&mut new_matches);
    *tournament.bracket_round_mut(side) = next;
    Ok(BracketAdvance::RoundGenerated { round: next, matches })
}

/// The champion of a bracket side, once fewer than 2 participants remain.
pub fn side_winner(tournament: &Tournament, side: BracketSide) -> Option<TeamId> {
    let round = tournament.bracket_round(side);
    if round == 0 {
        return None;
    }
    match next_round_feed(tournament, side, round) {
        Ok(feed) if feed.len() == 1 => Some(feed[0]),
        _ => None,
    }
}

/// Participants feeding out of `round` on a bracket side. Errors when the
/// round (or, for the losers side, the parallel winners round) is not
/// complete.
fn next_round_feed(
    tournament: &Tournament,
    side: BracketSide,
    round: u32,
) -> Result<Vec<TeamId>, TournamentError> {
    let filter = MatchFilter::stage_round(side.stage(), round);
    let outstanding = tournament.outstanding_matches(filter);
    if outstanding > 0 {
        return Err(TournamentError::RoundIncomplete { outstanding });
    }
    let mut feed: Vec<TeamId> = tournament
        .matches_where(filter)
        .filter_map(|m| m.winner_team_id)
        .collect();

    if side == BracketSide::Losers {
        let winners_round = tournament.bracket_round(BracketSide::Winners);
        if winners_round >= round {
            let parallel = MatchFilter::stage_round(BracketSide::Winners.stage(), round);
            if tournament.outstanding_matches(parallel) > 0 {
                return Err(TournamentError::ParallelWinnersRoundIncomplete { round });
            }
            feed.extend(
                tournament
                    .matches_where(parallel)
                    .filter_map(|m| m.loser_team_id()),
            );
        } else if winners_round > 0 && side_winner(tournament, BracketSide::Winners).is_none() {
            // Winners side exists but is behind and not terminal: its losers
            // for this round are still unknown.
            return Err(TournamentError::ParallelWinnersRoundIncomplete { round });
        }
    }
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::round_display_name;

    #[test]
    fn round_names_follow_the_halving_sequence() {
        assert_eq!(round_display_name(64), "Round of 64");
        assert_eq!(round_display_name(16), "Round of 16");
        assert_eq!(round_display_name(8), "Quarter-final");
        assert_eq!(round_display_name(4), "Semi-final");
        assert_eq!(round_display_name(2), "Final");
    }
}
