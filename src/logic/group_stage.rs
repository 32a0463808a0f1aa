//! Group stage: the group draw, the second round, and qualification matches.

use crate::logic::qualification;
use crate::logic::standings::group_standings;
use crate::models::{
    GameMatch, MatchFilter, StageKind, TeamId, Tournament, TournamentError, TournamentFormat,
    TournamentStatus,
};
use rand::seq::SliceRandom;

/// Draw the groups: shuffle the registered teams, then place them.
/// Called once when a GROUP tournament starts.
pub fn draw_groups(tournament: &mut Tournament) -> Result<usize, TournamentError> {
    let mut order: Vec<TeamId> = tournament.teams.iter().map(|t| t.id).collect();
    order.shuffle(&mut rand::thread_rng());
    place_groups(tournament, &order)
}

/// Deterministic core of the group draw: partition `order` into consecutive
/// chunks of the target size (last chunk may be smaller, but never 1),
/// assign group numbers, and create the round-1 matches pairing adjacent
/// teams of each chunk. A 3-team group has one round-1 match and one idle
/// team; no bye match is ever created.
pub fn place_groups(
    tournament: &mut Tournament,
    order: &[TeamId],
) -> Result<usize, TournamentError> {
    if tournament.format != TournamentFormat::Group {
        return Err(TournamentError::WrongFormat);
    }
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }
    if tournament
        .matches_where(MatchFilter::stage(StageKind::Group))
        .next()
        .is_some()
    {
        return Err(TournamentError::StageAlreadyGenerated);
    }
    if order.len() != tournament.teams.len() {
        return Err(TournamentError::InvalidSettings(
            "draw order must list each registered team exactly once",
        ));
    }
    for &id in order {
        if tournament.team(id).is_none() {
            return Err(TournamentError::TeamNotFound(id));
        }
    }
    let n = order.len();
    if n < 2 {
        return Err(TournamentError::NotEnoughTeams { required: 2, have: n });
    }
    let target = tournament.group_target_size.unwrap_or(4) as usize;
    if n % target == 1 {
        return Err(TournamentError::GroupOfOne);
    }

    // Build everything before touching the aggregate: all-or-nothing.
    let time_limit = tournament.match_time_limit();
    let mut assignments: Vec<(TeamId, u32)> = Vec::with_capacity(n);
    let mut new_matches: Vec<GameMatch> = Vec::new();
    for (idx, chunk) in order.chunks(target).enumerate() {
        let group_number = idx as u32 + 1;
        for &id in chunk {
            assignments.push((id, group_number));
        }
        for pair in chunk.chunks(2) {
            if let [a, b] = pair {
                new_matches.push(GameMatch::new(
                    tournament.id,
                    StageKind::Group,
                    1,
                    Some(group_number),
                    *a,
                    *b,
                    time_limit,
                ));
            }
        }
    }

    for (id, group_number) in assignments {
        if let Some(team) = tournament.team_mut(id) {
            team.group_number = Some(group_number);
        }
    }
    let created = new_matches.len();
    tournament.matches.append(&mut new_matches);
    Ok(created)
}

/// Generate round 2 for a group: rank the group by the group-round policy
/// and pair adjacent ranks, preferring opponents the team has not met yet.
/// With decisive round-1 results this pairs the winners together and the
/// losers together; a 3-team group brings its idle team into play.
pub fn generate_second_round(
    tournament: &mut Tournament,
    group_number: u32,
) -> Result<usize, TournamentError> {
    group_guards(tournament, group_number)?;
    let round_2 = MatchFilter::stage_round(StageKind::Group, 2).group(group_number);
    if tournament.matches_where(round_2).next().is_some() {
        return Err(TournamentError::StageAlreadyGenerated);
    }
    let round_1 = MatchFilter::stage_round(StageKind::Group, 1).group(group_number);
    let outstanding = tournament.outstanding_matches(round_1);
    if outstanding > 0 {
        return Err(TournamentError::RoundIncomplete { outstanding });
    }

    let ranked: Vec<TeamId> = group_standings(tournament, group_number)?
        .into_iter()
        .map(|row| row.team_id)
        .collect();
    let pairs = pair_avoiding_rematches(tournament, &ranked);

    let time_limit = tournament.match_time_limit();
    let mut new_matches: Vec<GameMatch> = pairs
        .into_iter()
        .map(|(a, b)| {
            GameMatch::new(
                tournament.id,
                StageKind::Group,
                2,
                Some(group_number),
                a,
                b,
                time_limit,
            )
        })
        .collect();
    let created = new_matches.len();
    tournament.matches.append(&mut new_matches);
    Ok(created)
}

/// Generate the group's qualification matches after round 2: winners final
/// (rank 1 vs 2, round 3) and, for groups of 4, a losers final (rank 3 vs 4).
/// In a group of 3 the third team is auto-qualified to the losers bracket
/// with no match. The finalists' qualification fields are marked now, not
/// when the finals complete.
pub fn generate_qualification(
    tournament: &mut Tournament,
    group_number: u32,
) -> Result<usize, TournamentError> {
    group_guards(tournament, group_number)?;
    let finals = MatchFilter::stage(StageKind::GroupWinnersFinal).group(group_number);
    if tournament.matches_where(finals).next().is_some() {
        return Err(TournamentError::StageAlreadyGenerated);
    }
    let round_2 = MatchFilter::stage_round(StageKind::Group, 2).group(group_number);
    if tournament.matches_where(round_2).next().is_none() {
        return Err(TournamentError::RoundNotGenerated { round: 2 });
    }
    let outstanding = tournament.outstanding_matches(round_2);
    if outstanding > 0 {
        return Err(TournamentError::RoundIncomplete { outstanding });
    }

    let ranked: Vec<TeamId> = group_standings(tournament, group_number)?
        .into_iter()
        .map(|row| row.team_id)
        .collect();

    let time_limit = tournament.match_time_limit();
    let mut new_matches = vec![GameMatch::new(
        tournament.id,
        StageKind::GroupWinnersFinal,
        3,
        Some(group_number),
        ranked[0],
        ranked[1],
        time_limit,
    )];
    if ranked.len() >= 4 {
        new_matches.push(GameMatch::new(
            tournament.id,
            StageKind::GroupLosersFinal,
            3,
            Some(group_number),
            ranked[2],
            ranked[3],
            time_limit,
        ));
    }

    let marked = ranked.len().min(4);
    qualification::mark_group_finalists(tournament, &ranked[..marked])?;
    let created = new_matches.len();
    tournament.matches.append(&mut new_matches);
    Ok(created)
}

fn group_guards(tournament: &Tournament, group_number: u32) -> Result<(), TournamentError> {
    if tournament.format != TournamentFormat::Group {
        return Err(TournamentError::WrongFormat);
    }
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }
    if tournament.teams_in_group(group_number).is_empty() {
        return Err(TournamentError::GroupNotFound(group_number));
    }
    Ok(())
}

/// Pair `ranked` greedily from the top: each team takes the best-ranked
/// remaining opponent it has not already played, falling back to the first
/// remaining one (a 2-team group replays its only pair). Odd-sized input
/// leaves the last unpaired team idle.
fn pair_avoiding_rematches(
    tournament: &Tournament,
    ranked: &[TeamId],
) -> Vec<(TeamId, TeamId)> {
    let mut remaining: Vec<TeamId> = ranked.to_vec();
    let mut pairs = Vec::new();
    while remaining.len() >= 2 {
        let a = remaining.remove(0);
        let pick = remaining
            .iter()
            .position(|&b| !have_met(tournament, a, b))
            .unwrap_or(0);
        let b = remaining.remove(pick);
        pairs.push((a, b));
    }
    pairs
}

fn have_met(tournament: &Tournament, a: TeamId, b: TeamId) -> bool {
    tournament
        .matches_where(MatchFilter::stage(StageKind::Group))
        .any(|m| m.involves(a) && m.involves(b))
}
