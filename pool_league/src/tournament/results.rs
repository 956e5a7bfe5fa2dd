//! Frame submission: validation, scoring and propagation of match results.

use std::collections::HashSet;

use log::{debug, info};

use super::bracket::advance_winner;
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Frame, Match, MatchId, MatchOutcome, MatchStatus, ParticipantId, Tournament, TournamentFormat,
};
use super::standings::apply_result_change;
use crate::db::TournamentStore;

/// Scores derived from a match's frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scoreline {
    pub score1: u32,
    pub score2: u32,
    pub status: MatchStatus,
    pub winner_id: Option<ParticipantId>,
}

/// Largest frame number a stored frame can carry (a signed 32-bit column)
pub const MAX_FRAME_NUMBER: u32 = i32::MAX as u32;

/// Reject a frame list that could not belong to `m`.
///
/// The match needs both entrants. Frame numbers must be unique and lie in
/// `1..=MAX_FRAME_NUMBER`, and every frame winner must be one of the two
/// entrants.
pub fn validate_frames(m: &Match, frames: &[Frame]) -> TournamentResult<(ParticipantId, ParticipantId)> {
    if m.status == MatchStatus::Bye {
        return Err(TournamentError::MatchNotPlayable {
            match_id: m.id,
            status: m.status,
        });
    }
    let (p1, p2) = m.entrants().ok_or(TournamentError::MatchNotPlayable {
        match_id: m.id,
        status: m.status,
    })?;

    let mut seen = HashSet::with_capacity(frames.len());
    for frame in frames {
        if frame.frame_number == 0 || frame.frame_number > MAX_FRAME_NUMBER {
            return Err(TournamentError::InvalidFrameNumber(frame.frame_number));
        }
        if !seen.insert(frame.frame_number) {
            return Err(TournamentError::DuplicateFrameNumber(frame.frame_number));
        }
        if frame.winner_participant_id != p1 && frame.winner_participant_id != p2 {
            return Err(TournamentError::InvalidFrameWinner {
                frame_number: frame.frame_number,
                participant_id: frame.winner_participant_id,
            });
        }
    }

    Ok((p1, p2))
}

/// Count frames per side and decide the match against `race_to`.
///
/// No frames leaves the match pending. Both sides at or past the race is an
/// impossible result and is rejected.
pub fn tally(
    entrants: (ParticipantId, ParticipantId),
    frames: &[Frame],
    race_to: u32,
) -> TournamentResult<Scoreline> {
    let (p1, p2) = entrants;
    let score1 = frames.iter().filter(|f| f.winner_participant_id == p1).count() as u32;
    let score2 = frames.iter().filter(|f| f.winner_participant_id == p2).count() as u32;

    let (status, winner_id) = match (score1 >= race_to, score2 >= race_to) {
        (true, true) => return Err(TournamentError::BothSidesReachedRace { race_to }),
        (true, false) => (MatchStatus::Completed, Some(p1)),
        (false, true) => (MatchStatus::Completed, Some(p2)),
        (false, false) if frames.is_empty() => (MatchStatus::Pending, None),
        (false, false) => (MatchStatus::InProgress, None),
    };

    Ok(Scoreline {
        score1,
        score2,
        status,
        winner_id,
    })
}

/// Replace a match's frames and apply the consequences.
///
/// The submitted list is the complete frame record for the match. For
/// elimination the winner moves into the next match; for round-robin the
/// standings are adjusted by the difference between the old and new result
/// and re-ranked. The caller owns the unit of work and commits it.
pub async fn record_frames(
    store: &mut dyn TournamentStore,
    tournament: &Tournament,
    match_id: MatchId,
    frames: &[Frame],
) -> TournamentResult<MatchOutcome> {
    let previous = store
        .get_match(tournament.id, match_id)
        .await?
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    let entrants = validate_frames(&previous, frames)?;

    store.replace_frames(match_id, frames).await?;
    let stored = store.list_frames(match_id).await?;
    let line = tally(entrants, &stored, tournament.race_to)?;

    let mut current = previous.clone();
    current.score1 = line.score1;
    current.score2 = line.score2;
    current.status = line.status;
    current.winner_id = line.winner_id;
    store.update_match(&current).await?;

    match tournament.format {
        TournamentFormat::SingleElimination => {
            advance_winner(store, &previous, &current).await?;
        }
        TournamentFormat::RoundRobin => {
            apply_result_change(store, tournament.id, previous.decided(), current.decided())
                .await?;
        }
    }

    if current.status == MatchStatus::Completed {
        info!(
            "Match {match_id} in tournament {} completed {}-{}, winner {:?}",
            tournament.id, current.score1, current.score2, current.winner_id
        );
    } else {
        debug!(
            "Match {match_id} in tournament {} now {} at {}-{}",
            tournament.id, current.status, current.score1, current.score2
        );
    }

    Ok(MatchOutcome {
        match_id,
        status: current.status,
        winner_id: current.winner_id,
        score1: current.score1,
        score2: current.score2,
    })
}
