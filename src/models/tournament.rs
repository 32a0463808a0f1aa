//! Tournament aggregate, settings, error taxonomy, and match filters.

use crate::models::game::{BracketSide, GameMatch, MatchId, MatchStatus, StageKind};
use crate::models::team::{Team, TeamId, TeamRegistration};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// How an error should be surfaced to callers (HTTP status at the boundary).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed input; rejected before any state mutation.
    Validation,
    /// A stage guard is not met; the message carries what is missing.
    Precondition,
    /// Duplicate generation or double submission; no mutation.
    Conflict,
    /// Unknown id.
    NotFound,
}

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    // Validation
    InvalidSettings(&'static str),
    EmptyTeamName,
    DuplicateTeamName(String),
    InvalidMemberCount { count: usize },
    OddTeamCount { count: usize },
    DrawInKnockout,
    MatchNotTimed,
    NoLosersBracket,
    WrongFormat,
    GroupOfOne,
    // Precondition
    NotOngoing,
    NotEnoughTeams { required: usize, have: usize },
    RoundIncomplete { outstanding: usize },
    RoundNotGenerated { round: u32 },
    ParallelWinnersRoundIncomplete { round: u32 },
    NoGroupReady { outstanding: usize },
    GroupsUnfinished { count: usize },
    SwissRoundsRemaining { remaining: u32 },
    RoundsExhausted { planned: u32 },
    BracketTooSmall { size: usize },
    BracketNotPowerOfTwo { size: usize },
    UnevenKnockoutFeed { count: usize },
    TimeLimitNotReached,
    TimerNotRunning,
    // Conflict
    AlreadyStarted,
    StageAlreadyGenerated,
    MatchAlreadyCompleted,
    TimerAlreadyRunning,
    // NotFound
    TeamNotFound(TeamId),
    MatchNotFound(MatchId),
    GroupNotFound(u32),
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        use TournamentError::*;
        match self {
            InvalidSettings(_) | EmptyTeamName | DuplicateTeamName(_)
            | InvalidMemberCount { .. } | OddTeamCount { .. } | DrawInKnockout
            | MatchNotTimed | NoLosersBracket | WrongFormat | GroupOfOne => ErrorKind::Validation,
            NotOngoing | NotEnoughTeams { .. } | RoundIncomplete { .. }
            | RoundNotGenerated { .. } | ParallelWinnersRoundIncomplete { .. }
            | NoGroupReady { .. } | GroupsUnfinished { .. } | SwissRoundsRemaining { .. }
            | RoundsExhausted { .. } | BracketTooSmall { .. } | BracketNotPowerOfTwo { .. }
            | UnevenKnockoutFeed { .. } | TimeLimitNotReached | TimerNotRunning => {
                ErrorKind::Precondition
            }
            AlreadyStarted | StageAlreadyGenerated | MatchAlreadyCompleted
            | TimerAlreadyRunning => ErrorKind::Conflict,
            TeamNotFound(_) | MatchNotFound(_) | GroupNotFound(_) => ErrorKind::NotFound,
        }
    }
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TournamentError::*;
        match self {
            InvalidSettings(msg) => write!(f, "Invalid tournament settings: {}", msg),
            EmptyTeamName => write!(f, "Team name must not be empty"),
            DuplicateTeamName(name) => write!(f, "A team named '{}' already exists", name),
            InvalidMemberCount { count } => {
                write!(f, "A team must have 1 to 3 members (got {})", count)
            }
            OddTeamCount { count } => {
                write!(f, "Swiss pairing needs an even team count (got {})", count)
            }
            DrawInKnockout => write!(f, "No draw permitted in elimination stage"),
            MatchNotTimed => write!(f, "Match has no time limit"),
            NoLosersBracket => write!(f, "This format has no losers bracket"),
            WrongFormat => write!(f, "Operation does not apply to this tournament format"),
            GroupOfOne => write!(f, "Group draw would strand a single team in a group"),
            NotOngoing => write!(f, "Tournament is not ongoing"),
            NotEnoughTeams { required, have } => {
                write!(f, "Need at least {} teams (have {})", required, have)
            }
            RoundIncomplete { outstanding } => {
                write!(f, "Current round is not complete ({} match(es) outstanding)", outstanding)
            }
            RoundNotGenerated { round } => {
                write!(f, "Round {} has not been generated yet", round)
            }
            ParallelWinnersRoundIncomplete { round } => {
                write!(
                    f,
                    "Winners-bracket round {} must be complete before the losers bracket can advance",
                    round
                )
            }
            NoGroupReady { outstanding } => {
                write!(f, "No group is ready to advance ({} match(es) outstanding)", outstanding)
            }
            GroupsUnfinished { count } => {
                write!(f, "{} group(s) have not finished their finals", count)
            }
            SwissRoundsRemaining { remaining } => {
                write!(f, "Swiss phase is not finished ({} round(s) remaining)", remaining)
            }
            RoundsExhausted { planned } => {
                write!(f, "All {} planned rounds have been generated", planned)
            }
            BracketTooSmall { size } => {
                write!(f, "An elimination bracket needs at least 4 teams (got {})", size)
            }
            BracketNotPowerOfTwo { size } => {
                write!(f, "Bracket size must be a power of two (got {})", size)
            }
            UnevenKnockoutFeed { count } => {
                write!(f, "Next knockout round needs an even participant count (got {})", count)
            }
            TimeLimitNotReached => write!(f, "Match time limit has not been reached"),
            TimerNotRunning => write!(f, "Match timer is not running"),
            AlreadyStarted => write!(f, "Tournament has already started"),
            StageAlreadyGenerated => write!(f, "Matches for this stage already exist"),
            MatchAlreadyCompleted => write!(f, "Match already has a final score"),
            TimerAlreadyRunning => write!(f, "Match timer already started"),
            TeamNotFound(_) => write!(f, "Team not found"),
            MatchNotFound(_) => write!(f, "Match not found"),
            GroupNotFound(g) => write!(f, "Group {} not found", g),
        }
    }
}

/// Competition format of a tournament.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Round-robin groups with winners/losers qualification brackets.
    Group,
    /// Swiss adjacent-rank pairing, then a knockout phase.
    Swiss,
    /// Same mechanics as Swiss, typically many timed rounds.
    Marathon,
}

impl TournamentFormat {
    /// Swiss and Marathon share the Swiss pairing and timed scoring.
    pub fn is_swiss_style(self) -> bool {
        matches!(self, TournamentFormat::Swiss | TournamentFormat::Marathon)
    }
}

/// Team size per side. Informational only; nothing algorithmic depends on it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSize {
    Single,
    #[default]
    Double,
    Triple,
}

/// Lifecycle state of a tournament: UPCOMING -> ONGOING -> COMPLETED, monotonic.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
}

/// Settings supplied at tournament creation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    pub format: TournamentFormat,
    #[serde(default)]
    pub team_size: TeamSize,
    /// Swiss/Marathon only: number of Swiss rounds to play.
    pub rounds_planned: Option<u32>,
    /// Group format only: 3 or 4.
    pub group_target_size: Option<u32>,
    #[serde(default)]
    pub has_timed_matches: bool,
    pub match_time_limit_minutes: Option<u32>,
}

impl TournamentSettings {
    /// Group-format settings with the given target group size.
    pub fn group(group_target_size: u32) -> Self {
        Self {
            format: TournamentFormat::Group,
            team_size: TeamSize::default(),
            rounds_planned: None,
            group_target_size: Some(group_target_size),
            has_timed_matches: false,
            match_time_limit_minutes: None,
        }
    }

    /// Swiss-format settings with the given number of planned rounds.
    pub fn swiss(rounds_planned: u32) -> Self {
        Self {
            format: TournamentFormat::Swiss,
            team_size: TeamSize::default(),
            rounds_planned: Some(rounds_planned),
            group_target_size: None,
            has_timed_matches: false,
            match_time_limit_minutes: None,
        }
    }

    /// Marathon-format settings with the given number of planned rounds.
    pub fn marathon(rounds_planned: u32) -> Self {
        Self {
            format: TournamentFormat::Marathon,
            ..Self::swiss(rounds_planned)
        }
    }

    /// Enable timed matches with the given per-match limit.
    pub fn timed(mut self, minutes: u32) -> Self {
        self.has_timed_matches = true;
        self.match_time_limit_minutes = Some(minutes);
        self
    }
}

/// Filter over a tournament's matches. All set fields are conjuncts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct MatchFilter {
    pub stage: Option<StageKind>,
    pub stage_round: Option<u32>,
    pub group_number: Option<u32>,
    pub status: Option<MatchStatus>,
}

impl MatchFilter {
    pub fn stage(stage: StageKind) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn stage_round(stage: StageKind, stage_round: u32) -> Self {
        Self {
            stage: Some(stage),
            stage_round: Some(stage_round),
            ..Self::default()
        }
    }

    pub fn group(mut self, group_number: u32) -> Self {
        self.group_number = Some(group_number);
        self
    }

    pub fn accepts(&self, m: &GameMatch) -> bool {
        self.stage.map_or(true, |s| m.stage == s)
            && self.stage_round.map_or(true, |r| m.stage_round == r)
            && self.group_number.map_or(true, |g| m.group_number == Some(g))
            && self.status.map_or(true, |s| m.status == s)
    }
}

/// Full tournament state: settings, teams, matches, and round counters.
///
/// The three round counters are owned by the stage progression logic and
/// record the highest generated round per stage family; they are never
/// inferred from the match set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub format: TournamentFormat,
    pub team_size: TeamSize,
    pub rounds_planned: Option<u32>,
    pub group_target_size: Option<u32>,
    pub status: TournamentStatus,
    pub has_timed_matches: bool,
    pub match_time_limit_minutes: Option<u32>,
    pub teams: Vec<Team>,
    pub matches: Vec<GameMatch>,
    /// Highest generated Swiss round (0 = none yet).
    pub swiss_round: u32,
    /// Highest generated winners-bracket round (0 = none yet).
    pub winners_round: u32,
    /// Highest generated losers-bracket round (0 = none yet).
    pub losers_round: u32,
}

impl Tournament {
    /// Create a new tournament in UPCOMING state. Validates the settings.
    pub fn new(settings: TournamentSettings) -> Result<Self, TournamentError> {
        match settings.format {
            TournamentFormat::Group => {
                if !matches!(settings.group_target_size, Some(3) | Some(4)) {
                    return Err(TournamentError::InvalidSettings(
                        "group format needs a group target size of 3 or 4",
                    ));
                }
            }
            TournamentFormat::Swiss | TournamentFormat::Marathon => {
                if !matches!(settings.rounds_planned, Some(n) if n >= 1) {
                    return Err(TournamentError::InvalidSettings(
                        "swiss/marathon format needs at least 1 planned round",
                    ));
                }
            }
        }
        if settings.has_timed_matches
            && !matches!(settings.match_time_limit_minutes, Some(n) if n >= 1)
        {
            return Err(TournamentError::InvalidSettings(
                "timed matches need a time limit of at least 1 minute",
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            format: settings.format,
            team_size: settings.team_size,
            rounds_planned: settings.rounds_planned,
            group_target_size: settings.group_target_size,
            status: TournamentStatus::Upcoming,
            has_timed_matches: settings.has_timed_matches,
            match_time_limit_minutes: settings.match_time_limit_minutes,
            teams: Vec::new(),
            matches: Vec::new(),
            swiss_round: 0,
            winners_round: 0,
            losers_round: 0,
        })
    }

    /// Register a batch of teams (UPCOMING only). All-or-nothing: the whole
    /// batch is validated (non-empty unique names, 1-3 members) before any
    /// team is added.
    pub fn register_teams(
        &mut self,
        entries: &[TeamRegistration],
    ) -> Result<(), TournamentError> {
        if self.status != TournamentStatus::Upcoming {
            return Err(TournamentError::AlreadyStarted);
        }
        let mut batch: Vec<Team> = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(TournamentError::EmptyTeamName);
            }
            if !(1..=3).contains(&entry.members.len())
                || entry.members.iter().any(|m| m.trim().is_empty())
            {
                return Err(TournamentError::InvalidMemberCount {
                    count: entry.members.len(),
                });
            }
            let duplicate = self
                .teams
                .iter()
                .map(|t| t.name.as_str())
                .chain(batch.iter().map(|t| t.name.as_str()))
                .any(|existing| existing.eq_ignore_ascii_case(name));
            if duplicate {
                return Err(TournamentError::DuplicateTeamName(name.to_string()));
            }
            batch.push(Team::new(self.id, name, entry.members.clone()));
        }
        self.teams.append(&mut batch);
        Ok(())
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn team_mut(&mut self, id: TeamId) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn match_mut(&mut self, id: MatchId) -> Option<&mut GameMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Matches accepted by the filter, in creation order.
    pub fn matches_where(&self, filter: MatchFilter) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(move |m| filter.accepts(m))
    }

    /// Matches of the filter that are not yet completed.
    pub fn outstanding_matches(&self, filter: MatchFilter) -> usize {
        self.matches_where(filter).filter(|m| !m.is_completed()).count()
    }

    /// Group numbers present in the draw, ascending.
    pub fn group_numbers(&self) -> Vec<u32> {
        let mut groups: Vec<u32> = self.teams.iter().filter_map(|t| t.group_number).collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Teams of a group, in registration order.
    pub fn teams_in_group(&self, group_number: u32) -> Vec<&Team> {
        self.teams
            .iter()
            .filter(|t| t.group_number == Some(group_number))
            .collect()
    }

    /// The generated-round counter for a bracket side.
    pub fn bracket_round(&self, side: BracketSide) -> u32 {
        match side {
            BracketSide::Winners => self.winners_round,
            BracketSide::Losers => self.losers_round,
        }
    }

    pub fn bracket_round_mut(&mut self, side: BracketSide) -> &mut u32 {
        match side {
            BracketSide::Winners => &mut self.winners_round,
            BracketSide::Losers => &mut self.losers_round,
        }
    }

    /// Per-match time limit, when the tournament plays timed matches.
    pub fn match_time_limit(&self) -> Option<u32> {
        if self.has_timed_matches {
            self.match_time_limit_minutes
        } else {
            None
        }
    }
}
