//! Round-robin standings maintenance and ranking.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::errors::TournamentResult;
use super::models::{DecidedMatch, ParticipantId, Standing, TournamentId};
use crate::db::TournamentStore;

/// Sort standings into table order and assign ranks `1..=n`.
///
/// Order: wins, then frame difference, then frames won (all descending), with
/// participant ID as the final tie-break so every row gets a distinct rank.
pub fn rank_standings(standings: &mut [Standing]) {
    standings.sort_by_key(|s| {
        (
            Reverse(s.wins),
            Reverse(s.frame_difference),
            Reverse(s.frames_won),
            s.participant_id,
        )
    });
    for (i, standing) in standings.iter_mut().enumerate() {
        standing.rank = Some(i as u32 + 1);
    }
}

/// Swap one decided result for another in the standings, then re-rank.
///
/// `before` is what the match contributed until now and `after` what it
/// contributes from here on; either may be `None`. Re-submitting an
/// unchanged result leaves the counters untouched.
pub async fn apply_result_change(
    store: &mut dyn TournamentStore,
    tournament_id: TournamentId,
    before: Option<DecidedMatch>,
    after: Option<DecidedMatch>,
) -> TournamentResult<Vec<Standing>> {
    let mut table: BTreeMap<ParticipantId, Standing> = store
        .list_standings(tournament_id)
        .await?
        .into_iter()
        .map(|s| (s.participant_id, s))
        .collect();

    if before != after {
        if let Some(old) = before {
            row(&mut table, tournament_id, old.winner).unrecord(
                true,
                old.winner_frames,
                old.loser_frames,
            );
            row(&mut table, tournament_id, old.loser).unrecord(
                false,
                old.loser_frames,
                old.winner_frames,
            );
        }
        if let Some(new) = after {
            row(&mut table, tournament_id, new.winner).record(
                true,
                new.winner_frames,
                new.loser_frames,
            );
            row(&mut table, tournament_id, new.loser).record(
                false,
                new.loser_frames,
                new.winner_frames,
            );
        }
    }

    let mut standings: Vec<Standing> = table.into_values().collect();
    rank_standings(&mut standings);
    for standing in &standings {
        store.upsert_standing(standing).await?;
    }
    Ok(standings)
}

fn row(
    table: &mut BTreeMap<ParticipantId, Standing>,
    tournament_id: TournamentId,
    participant_id: ParticipantId,
) -> &mut Standing {
    table
        .entry(participant_id)
        .or_insert_with(|| Standing::new(tournament_id, participant_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryRepository, TournamentRepository};

    fn standing(participant_id: ParticipantId, wins: u32, won: u32, lost: u32) -> Standing {
        let mut s = Standing::new(1, participant_id);
        s.wins = wins;
        s.frames_won = won;
        s.frames_lost = lost;
        s.frame_difference = won as i32 - lost as i32;
        s
    }

    fn ranked_ids(standings: &[Standing]) -> Vec<ParticipantId> {
        standings.iter().map(|s| s.participant_id).collect()
    }

    #[test]
    fn test_wins_rank_first() {
        let mut rows = vec![standing(1, 1, 10, 2), standing(2, 2, 6, 6)];
        rank_standings(&mut rows);
        assert_eq!(ranked_ids(&rows), vec![2, 1]);
        assert_eq!(rows[0].rank, Some(1));
        assert_eq!(rows[1].rank, Some(2));
    }

    #[test]
    fn test_tie_breaks_in_order() {
        let mut rows = vec![
            standing(4, 1, 5, 5),
            standing(3, 1, 6, 6),
            standing(2, 1, 6, 4),
            standing(1, 1, 5, 5),
        ];
        rank_standings(&mut rows);
        // difference +2 first, then frames won 6 over 5, then lowest ID
        assert_eq!(ranked_ids(&rows), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_ranks_are_dense() {
        let mut rows: Vec<_> = (1..=6).map(|id| standing(id, 0, 0, 0)).collect();
        rank_standings(&mut rows);
        let ranks: Vec<_> = rows.iter().filter_map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_changed_result_replaces_old_contribution() {
        let repo = MemoryRepository::new();
        let mut store = repo.begin().await.unwrap();
        store.upsert_standing(&Standing::new(1, 10)).await.unwrap();
        store.upsert_standing(&Standing::new(1, 20)).await.unwrap();

        let first = DecidedMatch {
            winner: 10,
            loser: 20,
            winner_frames: 3,
            loser_frames: 1,
        };
        apply_result_change(store.as_mut(), 1, None, Some(first))
            .await
            .unwrap();
        apply_result_change(store.as_mut(), 1, Some(first), Some(first))
            .await
            .unwrap();

        let corrected = DecidedMatch {
            winner: 20,
            loser: 10,
            winner_frames: 3,
            loser_frames: 2,
        };
        let standings = apply_result_change(store.as_mut(), 1, Some(first), Some(corrected))
            .await
            .unwrap();

        assert_eq!(standings[0].participant_id, 20);
        assert_eq!(standings[0].wins, 1);
        assert_eq!(standings[0].matches_played, 1);
        assert_eq!(standings[0].frame_difference, 1);
        assert_eq!(standings[1].losses, 1);
        assert_eq!(standings[1].wins, 0);
        assert_eq!(standings[1].frames_won, 2);
    }
}
