//! Data structures for the tournament engine: teams, matches, tournament state.

mod game;
mod team;
mod tournament;

pub use game::{BracketSide, GameMatch, MatchId, MatchStatus, StageKind};
pub use team::{Team, TeamId, TeamRegistration};
pub use tournament::{
    ErrorKind, MatchFilter, TeamSize, Tournament, TournamentError, TournamentFormat,
    TournamentId, TournamentSettings, TournamentStatus,
};
