//! Team data: registration input and the canonical Team record.

use crate::models::game::BracketSide;
use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team (used in matches and lookups).
pub type TeamId = Uuid;

/// Registration input: team name plus 1-3 player names.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamRegistration {
    pub name: String,
    pub members: Vec<String>,
}

/// A team in a tournament.
///
/// `points` and `score_differential` accumulate as matches complete and are
/// never overwritten. `qualification_rank`/`qualification_bracket` are written
/// only by the qualification logic.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// Player names (1 for singles, 2 for doubles, 3 for triplets).
    pub members: Vec<String>,
    /// Assigned at group-draw time (GROUP format only).
    pub group_number: Option<u32>,
    pub points: u32,
    pub score_differential: i32,
    /// Final group rank (1-4), set when qualification matches are generated
    /// and confirmed once the group finals complete.
    pub qualification_rank: Option<u32>,
    /// Which elimination bracket this team qualified for.
    pub qualification_bracket: Option<BracketSide>,
}

impl Team {
    /// Create a new team with zeroed standings fields.
    pub fn new(
        tournament_id: TournamentId,
        name: impl Into<String>,
        members: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: name.into(),
            members,
            group_number: None,
            points: 0,
            score_differential: 0,
            qualification_rank: None,
            qualification_bracket: None,
        }
    }
}
