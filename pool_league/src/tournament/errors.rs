//! Tournament error types.

use super::models::{MatchId, MatchStatus, ParticipantId, TournamentId, TournamentStatus};
use serde::Serialize;
use thiserror::Error;

/// Broad error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, nothing was written
    Validation,
    /// Referenced tournament, match or participant does not exist
    NotFound,
    /// Operation not allowed in the current tournament or match status
    StateConflict,
    /// Persistence failure, the operation was rolled back and may be retried
    Storage,
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    #[error("Race-to must be between 1 and 50, got {0}")]
    InvalidRaceTo(u32),

    #[error("Round-robin cycles must be at least 1, got {0}")]
    InvalidRounds(u32),

    #[error("Tournament name must not be empty")]
    InvalidName,

    #[error("Frame {frame_number} won by participant {participant_id}, who is not playing this match")]
    InvalidFrameWinner {
        frame_number: u32,
        participant_id: ParticipantId,
    },

    #[error("Frame numbers must be between 1 and 2147483647, got {0}")]
    InvalidFrameNumber(u32),

    #[error("Frame {0} submitted more than once")]
    DuplicateFrameNumber(u32),

    #[error("Both players cannot reach the race to {race_to}")]
    BothSidesReachedRace { race_to: u32 },

    #[error("Participant {0} listed more than once")]
    DuplicateParticipant(ParticipantId),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Tournament not in correct state: expected {expected:?}, got {actual:?}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("Match {match_id} cannot take results while {status:?}")]
    MatchNotPlayable { match_id: MatchId, status: MatchStatus },

    #[error("Match {match_id} already has results, its entrants can no longer change")]
    DownstreamMatchStarted { match_id: MatchId },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Unit of work already committed")]
    UnitOfWorkClosed,
}

impl TournamentError {
    /// Classify the error for the calling layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::InsufficientParticipants { .. }
            | TournamentError::InvalidRaceTo(_)
            | TournamentError::InvalidRounds(_)
            | TournamentError::InvalidName
            | TournamentError::InvalidFrameWinner { .. }
            | TournamentError::InvalidFrameNumber(_)
            | TournamentError::DuplicateFrameNumber(_)
            | TournamentError::BothSidesReachedRace { .. }
            | TournamentError::DuplicateParticipant(_) => ErrorKind::Validation,
            TournamentError::TournamentNotFound(_)
            | TournamentError::MatchNotFound(_)
            | TournamentError::ParticipantNotFound(_) => ErrorKind::NotFound,
            TournamentError::InvalidState { .. }
            | TournamentError::MatchNotPlayable { .. }
            | TournamentError::DownstreamMatchStarted { .. } => ErrorKind::StateConflict,
            TournamentError::Database(_)
            | TournamentError::CorruptRecord(_)
            | TournamentError::UnitOfWorkClosed => ErrorKind::Storage,
        }
    }

    /// Storage failures roll back completely, so the caller may repeat the request
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }

    /// Get a client-safe error message
    ///
    /// Storage errors are reduced to a generic message so SQL details and
    /// record contents never reach the client.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_)
            | TournamentError::CorruptRecord(_)
            | TournamentError::UnitOfWorkClosed => {
                "Storage temporarily unavailable, please retry".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
