//! Integration tests for Swiss pairing and the timed-match scoring policy.

use chrono::{Duration, Utc};
use petanque_tournament_web::{
    expire_timer, generate_swiss_round, start_timer, start_tournament, submit_score,
    tournament_standings, MatchFilter, StageKind, Team, TeamRegistration, Tournament,
    TournamentError, TournamentSettings, TournamentStatus,
};

fn swiss_tournament(names: &[&str], settings: TournamentSettings) -> Tournament {
    let mut t = Tournament::new(settings).unwrap();
    let regs: Vec<TeamRegistration> = names
        .iter()
        .map(|n| TeamRegistration {
            name: n.to_string(),
            members: vec![n.to_string()],
        })
        .collect();
    t.register_teams(&regs).unwrap();
    t
}

fn started(names: &[&str], settings: TournamentSettings) -> Tournament {
    let mut t = swiss_tournament(names, settings);
    start_tournament(&mut t).unwrap();
    t
}

fn team<'a>(t: &'a Tournament, name: &str) -> &'a Team {
    t.teams.iter().find(|x| x.name == name).unwrap()
}

fn submit_between(t: &mut Tournament, a: &str, b: &str, a_score: u32, b_score: u32) {
    let (a_id, b_id) = (team(t, a).id, team(t, b).id);
    let m = t
        .matches
        .iter()
        .find(|m| !m.is_completed() && m.involves(a_id) && m.involves(b_id))
        .unwrap();
    let (id, team_1) = (m.id, m.team_1);
    let (s1, s2) = if team_1 == a_id { (a_score, b_score) } else { (b_score, a_score) };
    submit_score(t, id, s1, s2, None, Utc::now()).unwrap();
}

#[test]
fn round_one_pairs_in_registration_order() {
    let t = started(&["A", "B", "C", "D"], TournamentSettings::swiss(3));
    assert_eq!(t.swiss_round, 1);
    let round_1: Vec<_> = t
        .matches_where(MatchFilter::stage_round(StageKind::Swiss, 1))
        .collect();
    assert_eq!(round_1.len(), 2);
    assert!(round_1[0].involves(team(&t, "A").id) && round_1[0].involves(team(&t, "B").id));
    assert!(round_1[1].involves(team(&t, "C").id) && round_1[1].involves(team(&t, "D").id));
}

#[test]
fn odd_team_count_is_rejected() {
    let mut t = swiss_tournament(&["A", "B", "C"], TournamentSettings::swiss(3));
    assert!(matches!(
        start_tournament(&mut t),
        Err(TournamentError::OddTeamCount { count: 3 })
    ));
    assert_eq!(t.status, TournamentStatus::Upcoming);
}

#[test]
fn next_round_pairs_adjacent_ranks() {
    let mut t = started(&["A", "B", "C", "D"], TournamentSettings::swiss(3));
    // C wins bigger than A: standings become C, A, B, D.
    submit_between(&mut t, "A", "B", 13, 7);
    submit_between(&mut t, "C", "D", 13, 5);
    generate_swiss_round(&mut t).unwrap();
    assert_eq!(t.swiss_round, 2);
    let round_2: Vec<_> = t
        .matches_where(MatchFilter::stage_round(StageKind::Swiss, 2))
        .collect();
    assert_eq!(round_2.len(), 2);
    // Rank 1 must face rank 2, never anyone lower.
    assert!(round_2[0].involves(team(&t, "C").id) && round_2[0].involves(team(&t, "A").id));
    assert!(round_2[1].involves(team(&t, "B").id) && round_2[1].involves(team(&t, "D").id));
}

#[test]
fn regenerating_an_unplayed_round_is_a_conflict() {
    let mut t = started(&["A", "B", "C", "D"], TournamentSettings::swiss(3));
    let before = t.matches.len();
    assert!(matches!(
        generate_swiss_round(&mut t),
        Err(TournamentError::StageAlreadyGenerated)
    ));
    assert_eq!(t.matches.len(), before);
}

#[test]
fn half_played_round_reports_the_outstanding_count() {
    let mut t = started(&["A", "B", "C", "D"], TournamentSettings::swiss(3));
    submit_between(&mut t, "A", "B", 13, 7);
    assert!(matches!(
        generate_swiss_round(&mut t),
        Err(TournamentError::RoundIncomplete { outstanding: 1 })
    ));
}

#[test]
fn planned_rounds_are_exhausted() {
    let mut t = started(&["A", "B", "C", "D"], TournamentSettings::swiss(1));
    submit_between(&mut t, "A", "B", 13, 7);
    submit_between(&mut t, "C", "D", 13, 5);
    assert!(matches!(
        generate_swiss_round(&mut t),
        Err(TournamentError::RoundsExhausted { planned: 1 })
    ));
}

#[test]
fn in_time_win_scores_three_points() {
    let mut t = started(&["A", "B"], TournamentSettings::marathon(2).timed(45));
    let id = t.matches[0].id;
    let now = Utc::now();
    start_timer(&mut t, id, now).unwrap();
    submit_score(&mut t, id, 13, 9, None, now + Duration::minutes(30)).unwrap();
    assert_eq!(team(&t, "A").points, 3);
    assert_eq!(team(&t, "B").points, 0);
    assert_eq!(team(&t, "A").score_differential, 4);
    assert_eq!(t.matches[0].finished_before_time_limit, Some(true));
}

#[test]
fn win_after_timeout_scores_two_points() {
    let mut t = started(&["A", "B"], TournamentSettings::marathon(2).timed(45));
    let id = t.matches[0].id;
    let now = Utc::now();
    start_timer(&mut t, id, now).unwrap();
    expire_timer(&mut t, id, now + Duration::minutes(45)).unwrap();
    submit_score(&mut t, id, 11, 8, None, now + Duration::minutes(46)).unwrap();
    assert_eq!(team(&t, "A").points, 2);
    assert_eq!(t.matches[0].finished_before_time_limit, Some(false));
}

#[test]
fn tie_scores_one_point_each() {
    let mut t = started(&["A", "B"], TournamentSettings::swiss(2).timed(45));
    let id = t.matches[0].id;
    submit_score(&mut t, id, 10, 10, None, Utc::now()).unwrap();
    assert_eq!(team(&t, "A").points, 1);
    assert_eq!(team(&t, "B").points, 1);
    assert_eq!(t.matches[0].winner_team_id, None);
}

#[test]
fn standings_recompute_matches_the_accumulated_team_fields() {
    let mut t = started(&["A", "B", "C", "D"], TournamentSettings::swiss(3));
    submit_between(&mut t, "A", "B", 13, 7);
    submit_between(&mut t, "C", "D", 13, 5);
    generate_swiss_round(&mut t).unwrap();
    submit_between(&mut t, "C", "A", 13, 11);
    submit_between(&mut t, "B", "D", 9, 9);

    let first = tournament_standings(&t);
    let second = tournament_standings(&t);
    assert_eq!(first, second);
    for row in &first {
        let accumulated = t.teams.iter().find(|x| x.id == row.team_id).unwrap();
        assert_eq!(row.points, accumulated.points);
        assert_eq!(row.score_differential, accumulated.score_differential);
    }
    // C leads: two in-time wins.
    assert_eq!(first[0].name, "C");
    assert_eq!(first[0].points, 6);
    assert_eq!(first[0].matches_played, 2);
}
