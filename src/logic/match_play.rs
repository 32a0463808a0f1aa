//! Match lifecycle: timers and score submission.
//!
//! PENDING -> ONGOING -> {COMPLETED, TIMED_OUT}; a timed-out match still
//! accepts the score that finalizes it. All clock checks take `now`
//! explicitly so the logic stays deterministic under test.

use crate::logic::progression;
use crate::logic::qualification;
use crate::logic::standings::{match_deltas, ScoringPolicy};
use crate::models::{
    MatchId, MatchStatus, Tournament, TournamentError, TournamentStatus,
};
use chrono::{DateTime, Duration, Utc};

/// Start a match's timer: PENDING -> ONGOING. Requires a timed match.
pub fn start_timer(
    tournament: &mut Tournament,
    match_id: MatchId,
    now: DateTime<Utc>,
) -> Result<(), TournamentError> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }
    let m = tournament
        .match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    if m.time_limit_minutes.is_none() {
        return Err(TournamentError::MatchNotTimed);
    }
    match m.status {
        MatchStatus::Pending => {
            m.timer_started_at = Some(now);
            m.status = MatchStatus::Ongoing;
            Ok(())
        }
        MatchStatus::Completed => Err(TournamentError::MatchAlreadyCompleted),
        MatchStatus::Ongoing | MatchStatus::TimedOut => Err(TournamentError::TimerAlreadyRunning),
    }
}

/// Stop a running timer: ONGOING back to its pre-timer PENDING state.
/// The only cancellation the engine supports.
pub fn stop_timer(
    tournament: &mut Tournament,
    match_id: MatchId,
) -> Result<(), TournamentError> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }
    let m = tournament
        .match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    match m.status {
        MatchStatus::Ongoing => {
            m.timer_started_at = None;
            m.status = MatchStatus::Pending;
            Ok(())
        }
        MatchStatus::Completed => Err(TournamentError::MatchAlreadyCompleted),
        _ => Err(TournamentError::TimerNotRunning),
    }
}

/// Explicitly expire a running timer: ONGOING -> TIMED_OUT once the time
/// limit has elapsed.
pub fn expire_timer(
    tournament: &mut Tournament,
    match_id: MatchId,
    now: DateTime<Utc>,
) -> Result<(), TournamentError> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::NotOngoing);
    }
    let m = tournament
        .match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    match m.status {
        MatchStatus::Ongoing => {
            if !time_limit_elapsed(m.timer_started_at, m.time_limit_minutes, now) {
                return Err(TournamentError::TimeLimitNotReached);
            }
            m.status = MatchStatus::TimedOut;
            Ok(())
        }
        MatchStatus::Completed => Err(TournamentError::MatchAlreadyCompleted),
        _ => Err(TournamentError::TimerNotRunning),
    }
}

/// Submit a final score. Validates before any mutation: a completed match
/// rejects a second submission, and knockout stages reject draws. On
/// success the match is COMPLETED, both teams receive their policy deltas,
/// and a completed group final confirms the qualification ranks.
///
/// `finished_before_time_limit` defaults to true unless the match had
/// already timed out (explicitly or detected lazily against `now`).
pub fn submit_score(
    tournament: &mut Tournament,
    match_id: MatchId,
    team_1_score: u32,
    team_2_score: u32,
    finished_before_time_limit: Option<bool>,
    now: DateTime<Utc>,
) -> Result<(), TournamentError> {
    if tournament.status == TournamentStatus::Upcoming {
        return Err(TournamentError::NotOngoing);
    }
    let m = tournament
        .match_by_id(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    if m.is_completed() {
        return Err(TournamentError::MatchAlreadyCompleted);
    }
    if m.stage.is_knockout() && team_1_score == team_2_score {
        return Err(TournamentError::DrawInKnockout);
    }

    let timed_out = m.status == MatchStatus::TimedOut
        || (m.status == MatchStatus::Ongoing
            && time_limit_elapsed(m.timer_started_at, m.time_limit_minutes, now));
    let finished = finished_before_time_limit.unwrap_or(!timed_out);
    let stage = m.stage;
    let (team_1, team_2) = (m.team_1, m.team_2);

    let policy = ScoringPolicy::for_stage(stage);
    let (d1, d2) = match_deltas(policy, team_1_score, team_2_score, finished);

    let m = tournament
        .match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    m.team_1_score = Some(team_1_score);
    m.team_2_score = Some(team_2_score);
    m.winner_team_id = match team_1_score.cmp(&team_2_score) {
        std::cmp::Ordering::Greater => Some(team_1),
        std::cmp::Ordering::Less => Some(team_2),
        std::cmp::Ordering::Equal => None,
    };
    m.finished_before_time_limit = Some(finished);
    m.status = MatchStatus::Completed;
    m.ended_at = Some(now);
    let completed = m.clone();

    for (id, delta) in [(team_1, d1), (team_2, d2)] {
        let team = tournament
            .team_mut(id)
            .ok_or(TournamentError::TeamNotFound(id))?;
        team.points += delta.points;
        team.score_differential += delta.differential;
    }

    if stage.is_group_final() {
        qualification::confirm_final_ranks(tournament, &completed)?;
    }
    progression::refresh_completion(tournament);
    Ok(())
}

fn time_limit_elapsed(
    started_at: Option<DateTime<Utc>>,
    limit_minutes: Option<u32>,
    now: DateTime<Utc>,
) -> bool {
    match (started_at, limit_minutes) {
        (Some(started), Some(limit)) => {
            now.signed_duration_since(started) >= Duration::minutes(limit as i64)
        }
        _ => false,
    }
}
