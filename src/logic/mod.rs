//! Tournament engine logic: standings, pairing generators, stage
//! progression, match lifecycle, and qualification.

mod bracket;
mod group_stage;
mod match_play;
mod progression;
mod qualification;
mod setup;
mod standings;
mod swiss;

pub use bracket::{advance_bracket, round_display_name, side_winner, BracketAdvance};
pub use group_stage::{
    draw_groups, generate_qualification, generate_second_round, place_groups,
};
pub use match_play::{expire_timer, start_timer, stop_timer, submit_score};
pub use progression::{
    advance_groups, group_state, refresh_completion, tournament_progress, BracketSummary,
    GroupProgress, GroupState, TournamentProgress,
};
pub use qualification::generate_bracket;
pub use setup::start_tournament;
pub use standings::{
    group_standings, match_deltas, tournament_standings, ScoreDelta, ScoringPolicy, StandingsRow,
};
pub use swiss::generate_swiss_round;
