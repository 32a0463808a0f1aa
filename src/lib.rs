//! Petanque tournament web app: library with models and the tournament
//! progression engine.

pub mod logic;
pub mod models;

pub use logic::{
    advance_bracket, advance_groups, draw_groups, expire_timer, generate_bracket,
    generate_qualification, generate_second_round, generate_swiss_round, group_standings,
    group_state, place_groups, round_display_name, side_winner, start_timer, start_tournament,
    stop_timer, submit_score, tournament_progress, tournament_standings, BracketAdvance,
    BracketSummary, GroupProgress, GroupState, ScoringPolicy, StandingsRow, TournamentProgress,
};
pub use models::{
    BracketSide, ErrorKind, GameMatch, MatchFilter, MatchId, MatchStatus, StageKind, Team,
    TeamId, TeamRegistration, TeamSize, Tournament, TournamentError, TournamentFormat,
    TournamentId, TournamentSettings, TournamentStatus,
};
