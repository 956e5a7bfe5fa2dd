//! Round-robin fixture generation.

use log::debug;

use super::errors::{TournamentError, TournamentResult};
use super::models::{Match, MatchStatus, NewMatch, ParticipantId, Standing, TournamentId};
use super::round_robin::circle_pairings;
use crate::db::TournamentStore;

/// Generate and store every round-robin match, plus a zeroed standings row
/// for each entrant.
///
/// Rounds are numbered from 1 across all cycles, and match numbers restart at
/// 1 in every round. Returned matches are ordered by round then match number.
pub async fn build_round_robin(
    store: &mut dyn TournamentStore,
    tournament_id: TournamentId,
    entrants: &[ParticipantId],
    cycles: u32,
) -> TournamentResult<Vec<Match>> {
    if entrants.len() < 2 {
        return Err(TournamentError::InsufficientParticipants {
            needed: 2,
            current: entrants.len(),
        });
    }
    if cycles == 0 {
        return Err(TournamentError::InvalidRounds(cycles));
    }

    let mut stored = Vec::new();
    for (round_idx, pairs) in circle_pairings(entrants.len(), cycles).into_iter().enumerate() {
        for (match_idx, (home, away)) in pairs.into_iter().enumerate() {
            let new = NewMatch {
                round: round_idx as u32 + 1,
                match_number: match_idx as u32 + 1,
                participant1_id: Some(entrants[home]),
                participant2_id: Some(entrants[away]),
                status: MatchStatus::Pending,
                winner_id: None,
                next_match_id: None,
            };
            let id = store.create_match(tournament_id, &new).await?;
            stored.push(Match::from_new(id, tournament_id, &new));
        }
    }

    for &participant_id in entrants {
        store
            .upsert_standing(&Standing::new(tournament_id, participant_id))
            .await?;
    }

    debug!(
        "Tournament {tournament_id}: {} round-robin matches for {} entrants",
        stored.len(),
        entrants.len()
    );
    Ok(stored)
}
