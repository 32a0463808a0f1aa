//! Integration tests for the match lifecycle: timers, score submission, and
//! what a completed match leaves behind on the teams.

use chrono::{Duration, Utc};
use petanque_tournament_web::{
    advance_groups, expire_timer, place_groups, start_timer, stop_timer, submit_score,
    MatchFilter, MatchId, MatchStatus, StageKind, Team, TeamId, TeamRegistration, Tournament,
    TournamentError, TournamentSettings, TournamentStatus,
};

fn register(t: &mut Tournament, names: &[&str]) {
    let regs: Vec<TeamRegistration> = names
        .iter()
        .map(|n| TeamRegistration {
            name: n.to_string(),
            members: vec![n.to_string()],
        })
        .collect();
    t.register_teams(&regs).unwrap();
}

/// A started Swiss tournament (round 1 pairs in registration order).
fn swiss_fixture(names: &[&str], timed_minutes: Option<u32>) -> Tournament {
    let mut settings = TournamentSettings::swiss(3);
    if let Some(minutes) = timed_minutes {
        settings = settings.timed(minutes);
    }
    let mut t = Tournament::new(settings).unwrap();
    register(&mut t, names);
    petanque_tournament_web::start_tournament(&mut t).unwrap();
    t
}

fn first_match(t: &Tournament) -> MatchId {
    t.matches[0].id
}

fn team<'a>(t: &'a Tournament, name: &str) -> &'a Team {
    t.teams.iter().find(|x| x.name == name).unwrap()
}

#[test]
fn submitting_a_score_completes_the_match_and_names_the_winner() {
    let mut t = swiss_fixture(&["A", "B"], None);
    let id = first_match(&t);
    let now = Utc::now();
    submit_score(&mut t, id, 13, 9, None, now).unwrap();

    let m = t.match_by_id(id).unwrap();
    assert_eq!(m.status, MatchStatus::Completed);
    assert_eq!(m.team_1_score, Some(13));
    assert_eq!(m.team_2_score, Some(9));
    assert_eq!(m.winner_team_id, Some(m.team_1));
    assert_eq!(m.ended_at, Some(now));
    assert_eq!(m.finished_before_time_limit, Some(true));
}

#[test]
fn a_thirteen_all_knockout_score_is_rejected_and_nothing_changes() {
    let mut t = Tournament::new(TournamentSettings::swiss(1)).unwrap();
    register(&mut t, &["A", "B", "C", "D"]);
    petanque_tournament_web::start_tournament(&mut t).unwrap();
    for id in t.matches.iter().map(|m| m.id).collect::<Vec<_>>() {
        submit_score(&mut t, id, 13, 7, None, Utc::now()).unwrap();
    }
    petanque_tournament_web::generate_bracket(
        &mut t,
        petanque_tournament_web::BracketSide::Winners,
    )
    .unwrap();
    let id = t
        .matches_where(MatchFilter::stage_round(StageKind::Winners, 1))
        .next()
        .unwrap()
        .id;
    assert!(matches!(
        submit_score(&mut t, id, 13, 13, None, Utc::now()),
        Err(TournamentError::DrawInKnockout)
    ));
    let m = t.match_by_id(id).unwrap();
    assert_eq!(m.status, MatchStatus::Pending);
    assert_eq!(m.team_1_score, None);
    assert_eq!(m.team_2_score, None);
    assert_eq!(m.winner_team_id, None);
}

#[test]
fn a_second_submission_is_rejected_and_the_first_result_stands() {
    let mut t = swiss_fixture(&["A", "B"], None);
    let id = first_match(&t);
    submit_score(&mut t, id, 13, 9, None, Utc::now()).unwrap();
    assert!(matches!(
        submit_score(&mut t, id, 0, 13, None, Utc::now()),
        Err(TournamentError::MatchAlreadyCompleted)
    ));
    let m = t.match_by_id(id).unwrap();
    assert_eq!(m.team_1_score, Some(13));
    assert_eq!(m.team_2_score, Some(9));
    assert_eq!(team(&t, "A").points, 3);
    assert_eq!(team(&t, "B").points, 0);
}

#[test]
fn scores_before_the_tournament_starts_are_rejected() {
    let mut t = Tournament::new(TournamentSettings::swiss(3)).unwrap();
    register(&mut t, &["A", "B"]);
    assert_eq!(t.status, TournamentStatus::Upcoming);
    let missing = MatchId::new_v4();
    assert!(matches!(
        submit_score(&mut t, missing, 13, 7, None, Utc::now()),
        Err(TournamentError::NotOngoing)
    ));
}

#[test]
fn unknown_match_ids_are_not_found() {
    let mut t = swiss_fixture(&["A", "B"], None);
    let missing = MatchId::new_v4();
    assert!(matches!(
        submit_score(&mut t, missing, 13, 7, None, Utc::now()),
        Err(TournamentError::MatchNotFound(id)) if id == missing
    ));
}

#[test]
fn timers_require_a_timed_match() {
    let mut t = swiss_fixture(&["A", "B"], None);
    let id = first_match(&t);
    assert!(matches!(
        start_timer(&mut t, id, Utc::now()),
        Err(TournamentError::MatchNotTimed)
    ));
}

#[test]
fn starting_a_running_timer_is_a_conflict() {
    let mut t = swiss_fixture(&["A", "B"], Some(45));
    let id = first_match(&t);
    let now = Utc::now();
    start_timer(&mut t, id, now).unwrap();
    assert_eq!(t.match_by_id(id).unwrap().status, MatchStatus::Ongoing);
    assert!(matches!(
        start_timer(&mut t, id, now),
        Err(TournamentError::TimerAlreadyRunning)
    ));
}

#[test]
fn stopping_a_timer_returns_the_match_to_pending() {
    let mut t = swiss_fixture(&["A", "B"], Some(45));
    let id = first_match(&t);
    start_timer(&mut t, id, Utc::now()).unwrap();
    stop_timer(&mut t, id).unwrap();
    let m = t.match_by_id(id).unwrap();
    assert_eq!(m.status, MatchStatus::Pending);
    assert_eq!(m.timer_started_at, None);
    assert!(matches!(
        stop_timer(&mut t, id),
        Err(TournamentError::TimerNotRunning)
    ));
}

#[test]
fn expiring_a_timer_early_is_rejected() {
    let mut t = swiss_fixture(&["A", "B"], Some(45));
    let id = first_match(&t);
    let start = Utc::now();
    start_timer(&mut t, id, start).unwrap();
    assert!(matches!(
        expire_timer(&mut t, id, start + Duration::minutes(44)),
        Err(TournamentError::TimeLimitNotReached)
    ));
    expire_timer(&mut t, id, start + Duration::minutes(45)).unwrap();
    assert_eq!(t.match_by_id(id).unwrap().status, MatchStatus::TimedOut);
}

#[test]
fn an_expired_match_still_accepts_its_score_as_a_timeout_result() {
    let mut t = swiss_fixture(&["A", "B"], Some(45));
    let id = first_match(&t);
    let start = Utc::now();
    start_timer(&mut t, id, start).unwrap();
    expire_timer(&mut t, id, start + Duration::minutes(45)).unwrap();
    submit_score(&mut t, id, 11, 8, None, start + Duration::minutes(46)).unwrap();

    let m = t.match_by_id(id).unwrap();
    assert_eq!(m.status, MatchStatus::Completed);
    assert_eq!(m.finished_before_time_limit, Some(false));
    // Timed policy: a win after the time limit is worth 2 points, not 3.
    assert_eq!(team(&t, "A").points, 2);
}

#[test]
fn the_time_limit_is_detected_lazily_at_submission() {
    let mut t = swiss_fixture(&["A", "B"], Some(45));
    let id = first_match(&t);
    let start = Utc::now();
    start_timer(&mut t, id, start).unwrap();
    // Nobody called the expiry endpoint, but the clock has run out.
    submit_score(&mut t, id, 11, 8, None, start + Duration::minutes(50)).unwrap();
    let m = t.match_by_id(id).unwrap();
    assert_eq!(m.finished_before_time_limit, Some(false));
    assert_eq!(team(&t, "A").points, 2);
}

#[test]
fn an_explicit_finished_flag_overrides_the_clock() {
    let mut t = swiss_fixture(&["A", "B"], Some(45));
    let id = first_match(&t);
    let start = Utc::now();
    start_timer(&mut t, id, start).unwrap();
    submit_score(&mut t, id, 13, 8, Some(false), start + Duration::minutes(10)).unwrap();
    assert_eq!(
        t.match_by_id(id).unwrap().finished_before_time_limit,
        Some(false)
    );
    assert_eq!(team(&t, "A").points, 2);
}

#[test]
fn a_completed_group_final_confirms_the_qualification_ranks() {
    let mut t = Tournament::new(TournamentSettings::group(4)).unwrap();
    register(&mut t, &["A", "B", "C", "D"]);
    t.status = TournamentStatus::Ongoing;
    let order: Vec<TeamId> = t.teams.iter().map(|x| x.id).collect();
    place_groups(&mut t, &order).unwrap();
    for round in [1, 2] {
        let ids: Vec<_> = t
            .matches_where(MatchFilter::stage_round(StageKind::Group, round))
            .map(|m| m.id)
            .collect();
        for id in ids {
            submit_score(&mut t, id, 13, 7, None, Utc::now()).unwrap();
        }
        advance_groups(&mut t, Some(1)).unwrap();
    }

    let winners_final = t
        .matches_where(MatchFilter::stage(StageKind::GroupWinnersFinal))
        .next()
        .unwrap();
    let (wf_id, favorite, underdog) = (winners_final.id, winners_final.team_1, winners_final.team_2);
    submit_score(&mut t, wf_id, 7, 13, None, Utc::now()).unwrap();
    assert_eq!(t.team(underdog).unwrap().qualification_rank, Some(1));
    assert_eq!(t.team(favorite).unwrap().qualification_rank, Some(2));

    let losers_final = t
        .matches_where(MatchFilter::stage(StageKind::GroupLosersFinal))
        .next()
        .unwrap();
    let (lf_id, third_seed) = (losers_final.id, losers_final.team_1);
    submit_score(&mut t, lf_id, 13, 4, None, Utc::now()).unwrap();
    assert_eq!(t.team(third_seed).unwrap().qualification_rank, Some(3));
}
