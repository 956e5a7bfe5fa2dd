//! Tournament data models: tournaments, participants, matches, frames and standings.

use super::errors::{TournamentError, TournamentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tournament ID type
pub type TournamentId = i64;

/// Participant ID type
pub type ParticipantId = i64;

/// Match ID type
pub type MatchId = i64;

/// Smallest accepted race-to threshold
pub const MIN_RACE_TO: u32 = 1;

/// Largest accepted race-to threshold
pub const MAX_RACE_TO: u32 = 50;

/// Default race-to threshold for new tournaments
pub const DEFAULT_RACE_TO: u32 = 5;

/// Tournament format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentFormat {
    /// Knockout bracket, losers are out
    SingleElimination,
    /// Everyone plays everyone, ranked by standings
    RoundRobin,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "single-elimination",
            TournamentFormat::RoundRobin => "round-robin",
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentFormat {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-elimination" => Ok(TournamentFormat::SingleElimination),
            "round-robin" => Ok(TournamentFormat::RoundRobin),
            other => Err(TournamentError::CorruptRecord(format!(
                "unknown tournament format '{other}'"
            ))),
        }
    }
}

/// Tournament status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentStatus {
    /// Accepting participants, no matches yet
    Draft,
    /// Matches generated, results being entered
    InProgress,
    /// Every match decided
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::InProgress => "in-progress",
            TournamentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TournamentStatus::Draft),
            "in-progress" => Ok(TournamentStatus::InProgress),
            "completed" => Ok(TournamentStatus::Completed),
            other => Err(TournamentError::CorruptRecord(format!(
                "unknown tournament status '{other}'"
            ))),
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
    /// Neither slot can ever be filled
    Bye,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::InProgress => "in-progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Bye => "bye",
        }
    }

    /// Whether the match needs no further play
    pub fn is_settled(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Bye)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "in-progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            "bye" => Ok(MatchStatus::Bye),
            other => Err(TournamentError::CorruptRecord(format!(
                "unknown match status '{other}'"
            ))),
        }
    }
}

/// One of the two entrant positions in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    /// Slot a winner takes in the next-round match.
    ///
    /// Matches are paired bottom-up, so odd match numbers feed slot one and
    /// even match numbers feed slot two.
    pub fn for_feeder(match_number: u32) -> Self {
        if match_number % 2 == 1 {
            Slot::One
        } else {
            Slot::Two
        }
    }
}

/// Tournament configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Tournament name
    pub name: String,
    /// Format used when the tournament is started without an explicit one
    pub format: TournamentFormat,
    /// Frames needed to win a match
    pub race_to: u32,
    /// Full round-robin cycles (2 = home and away)
    pub round_robin_cycles: u32,
}

impl TournamentConfig {
    /// Create a configuration with the default race and a single cycle
    pub fn new(name: impl Into<String>, format: TournamentFormat) -> Self {
        Self {
            name: name.into(),
            format,
            race_to: DEFAULT_RACE_TO,
            round_robin_cycles: 1,
        }
    }

    pub fn with_race_to(mut self, race_to: u32) -> Self {
        self.race_to = race_to;
        self
    }

    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.round_robin_cycles = cycles;
        self
    }

    /// Check the configuration before it is stored
    pub fn validate(&self) -> TournamentResult<()> {
        if self.name.trim().is_empty() {
            return Err(TournamentError::InvalidName);
        }
        validate_race_to(self.race_to)?;
        if self.round_robin_cycles == 0 {
            return Err(TournamentError::InvalidRounds(self.round_robin_cycles));
        }
        Ok(())
    }
}

/// Reject race-to thresholds outside `[MIN_RACE_TO, MAX_RACE_TO]`
pub fn validate_race_to(race_to: u32) -> TournamentResult<()> {
    if (MIN_RACE_TO..=MAX_RACE_TO).contains(&race_to) {
        Ok(())
    } else {
        Err(TournamentError::InvalidRaceTo(race_to))
    }
}

/// Stored tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    pub status: TournamentStatus,
    pub race_to: u32,
    pub round_robin_cycles: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

/// A contestant entered into a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    /// League player ID
    pub player_id: i64,
    /// League team the player represents, if any
    pub team_id: Option<i64>,
    /// Bracket seed, 1 is the top seed
    pub seed: Option<u32>,
}

/// Match record before it has been stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub round: u32,
    pub match_number: u32,
    pub participant1_id: Option<ParticipantId>,
    pub participant2_id: Option<ParticipantId>,
    pub status: MatchStatus,
    pub winner_id: Option<ParticipantId>,
    pub next_match_id: Option<MatchId>,
}

/// Stored match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1-based, round 1 is played first
    pub round: u32,
    /// 1-based position within the round
    pub match_number: u32,
    pub participant1_id: Option<ParticipantId>,
    pub participant2_id: Option<ParticipantId>,
    /// Frames won by slot one
    pub score1: u32,
    /// Frames won by slot two
    pub score2: u32,
    pub status: MatchStatus,
    pub winner_id: Option<ParticipantId>,
    /// Match receiving this match's winner (elimination only)
    pub next_match_id: Option<MatchId>,
}

impl Match {
    /// Build the stored form of a new match
    pub fn from_new(id: MatchId, tournament_id: TournamentId, new: &NewMatch) -> Self {
        Self {
            id,
            tournament_id,
            round: new.round,
            match_number: new.match_number,
            participant1_id: new.participant1_id,
            participant2_id: new.participant2_id,
            score1: 0,
            score2: 0,
            status: new.status,
            winner_id: new.winner_id,
            next_match_id: new.next_match_id,
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<ParticipantId> {
        match slot {
            Slot::One => self.participant1_id,
            Slot::Two => self.participant2_id,
        }
    }

    pub fn set_slot(&mut self, slot: Slot, participant: Option<ParticipantId>) {
        match slot {
            Slot::One => self.participant1_id = participant,
            Slot::Two => self.participant2_id = participant,
        }
    }

    /// Both entrants, once known
    pub fn entrants(&self) -> Option<(ParticipantId, ParticipantId)> {
        self.participant1_id.zip(self.participant2_id)
    }

    pub fn involves(&self, participant_id: ParticipantId) -> bool {
        self.participant1_id == Some(participant_id) || self.participant2_id == Some(participant_id)
    }

    /// Winner and loser with their frame counts, for a completed match with two entrants
    pub fn decided(&self) -> Option<DecidedMatch> {
        if self.status != MatchStatus::Completed {
            return None;
        }
        let (p1, p2) = self.entrants()?;
        let winner = self.winner_id?;
        if winner == p1 {
            Some(DecidedMatch {
                winner: p1,
                loser: p2,
                winner_frames: self.score1,
                loser_frames: self.score2,
            })
        } else if winner == p2 {
            Some(DecidedMatch {
                winner: p2,
                loser: p1,
                winner_frames: self.score2,
                loser_frames: self.score1,
            })
        } else {
            None
        }
    }
}

/// Result of a completed two-player match, from the standings point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecidedMatch {
    pub winner: ParticipantId,
    pub loser: ParticipantId,
    pub winner_frames: u32,
    pub loser_frames: u32,
}

/// One game within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// 1-based, unique within the match
    pub frame_number: u32,
    pub winner_participant_id: ParticipantId,
}

/// Running round-robin record for one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub frames_won: u32,
    pub frames_lost: u32,
    /// Always `frames_won - frames_lost`
    pub frame_difference: i32,
    pub rank: Option<u32>,
}

impl Standing {
    /// Fresh row with every counter at zero
    pub fn new(tournament_id: TournamentId, participant_id: ParticipantId) -> Self {
        Self {
            tournament_id,
            participant_id,
            matches_played: 0,
            wins: 0,
            losses: 0,
            frames_won: 0,
            frames_lost: 0,
            frame_difference: 0,
            rank: None,
        }
    }

    /// Add one match to the record
    pub fn record(&mut self, won: bool, frames_for: u32, frames_against: u32) {
        self.matches_played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.frames_won += frames_for;
        self.frames_lost += frames_against;
        self.sync_difference();
    }

    /// Take back a match previously added with [`Standing::record`]
    pub fn unrecord(&mut self, won: bool, frames_for: u32, frames_against: u32) {
        self.matches_played = self.matches_played.saturating_sub(1);
        if won {
            self.wins = self.wins.saturating_sub(1);
        } else {
            self.losses = self.losses.saturating_sub(1);
        }
        self.frames_won = self.frames_won.saturating_sub(frames_for);
        self.frames_lost = self.frames_lost.saturating_sub(frames_against);
        self.sync_difference();
    }

    fn sync_difference(&mut self) {
        self.frame_difference = self.frames_won as i32 - self.frames_lost as i32;
    }
}

/// What a frame submission did to the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub winner_id: Option<ParticipantId>,
    pub score1: u32,
    pub score2: u32,
}

/// One round of a schedule, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub round: u32,
    pub name: String,
    pub matches: Vec<Match>,
}

/// Display name of a round: "Finals", "Semi-Finals" or "Round N"
pub fn round_name(round: u32, matches_in_round: usize) -> String {
    match matches_in_round {
        1 => "Finals".to_string(),
        2 => "Semi-Finals".to_string(),
        _ => format!("Round {round}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(score1: u32, score2: u32, winner: ParticipantId) -> Match {
        Match {
            id: 1,
            tournament_id: 1,
            round: 1,
            match_number: 1,
            participant1_id: Some(10),
            participant2_id: Some(20),
            score1,
            score2,
            status: MatchStatus::Completed,
            winner_id: Some(winner),
            next_match_id: None,
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            MatchStatus::Pending,
            MatchStatus::InProgress,
            MatchStatus::Completed,
            MatchStatus::Bye,
        ] {
            assert_eq!(status.as_str().parse::<MatchStatus>().unwrap(), status);
        }
        assert!("finished".parse::<TournamentStatus>().is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = TournamentConfig::new("Spring 9-ball", TournamentFormat::RoundRobin);
        assert!(config.validate().is_ok());

        assert!(matches!(
            config.clone().with_race_to(0).validate(),
            Err(TournamentError::InvalidRaceTo(0))
        ));
        assert!(matches!(
            config.clone().with_race_to(51).validate(),
            Err(TournamentError::InvalidRaceTo(51))
        ));
        assert!(matches!(
            config.clone().with_cycles(0).validate(),
            Err(TournamentError::InvalidRounds(0))
        ));
        assert!(matches!(
            TournamentConfig::new("  ", TournamentFormat::RoundRobin).validate(),
            Err(TournamentError::InvalidName)
        ));
    }

    #[test]
    fn test_feeder_slot_parity() {
        assert_eq!(Slot::for_feeder(1), Slot::One);
        assert_eq!(Slot::for_feeder(2), Slot::Two);
        assert_eq!(Slot::for_feeder(7), Slot::One);
    }

    #[test]
    fn test_decided_orients_scores_by_winner() {
        let decided = completed(1, 3, 20).decided().unwrap();
        assert_eq!(decided.winner, 20);
        assert_eq!(decided.loser, 10);
        assert_eq!(decided.winner_frames, 3);
        assert_eq!(decided.loser_frames, 1);

        let mut open = completed(1, 2, 20);
        open.status = MatchStatus::InProgress;
        assert!(open.decided().is_none());
    }

    #[test]
    fn test_standing_record_and_unrecord() {
        let mut standing = Standing::new(1, 10);
        standing.record(true, 3, 1);
        assert_eq!(standing.wins, 1);
        assert_eq!(standing.frame_difference, 2);

        standing.record(false, 0, 3);
        assert_eq!(standing.matches_played, 2);
        assert_eq!(standing.frame_difference, -1);

        standing.unrecord(false, 0, 3);
        assert_eq!(standing.losses, 0);
        assert_eq!(standing.frames_lost, 1);
        assert_eq!(standing.frame_difference, 2);
    }

    #[test]
    fn test_round_names() {
        assert_eq!(round_name(3, 1), "Finals");
        assert_eq!(round_name(2, 2), "Semi-Finals");
        assert_eq!(round_name(1, 4), "Round 1");
    }
}
