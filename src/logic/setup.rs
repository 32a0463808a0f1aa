//! Setup phase: starting a tournament (UPCOMING -> ONGOING plus the first
//! stage's matches).

use crate::logic::{group_stage, swiss};
use crate::models::{Tournament, TournamentError, TournamentFormat, TournamentStatus};

/// Start the tournament: set it ONGOING and generate the opening stage
/// (group draw for GROUP, round 1 for SWISS/MARATHON). All-or-nothing: if
/// the opening generator rejects, the tournament stays UPCOMING.
pub fn start_tournament(tournament: &mut Tournament) -> Result<(), TournamentError> {
    if tournament.status != TournamentStatus::Upcoming {
        return Err(TournamentError::AlreadyStarted);
    }
    tournament.status = TournamentStatus::Ongoing;
    let opening = match tournament.format {
        TournamentFormat::Group => group_stage::draw_groups(tournament),
        TournamentFormat::Swiss | TournamentFormat::Marathon => {
            swiss::generate_swiss_round(tournament)
        }
    };
    if let Err(e) = opening {
        tournament.status = TournamentStatus::Upcoming;
        return Err(e);
    }
    Ok(())
}
