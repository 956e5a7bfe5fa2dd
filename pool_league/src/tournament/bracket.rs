//! Single-elimination bracket construction and winner advancement.
//!
//! A bracket is planned in memory as an arena of matches, where each match
//! refers to the match receiving its winner by arena index. Byes are resolved
//! in the plan, then the plan is written bottom-up (final first) so every
//! `next_match_id` already exists when its feeders are inserted.

use log::debug;

use super::errors::{TournamentError, TournamentResult};
use super::models::{Match, MatchStatus, NewMatch, ParticipantId, Slot, TournamentId};
use super::seeding::{bracket_size, round_count, seed_order};
use crate::db::TournamentStore;

/// One match of a planned bracket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMatch {
    pub round: u32,
    pub match_number: u32,
    pub slots: [Option<ParticipantId>; 2],
    pub status: MatchStatus,
    pub winner: Option<ParticipantId>,
    /// Arena index of the match receiving the winner
    pub next: Option<usize>,
}

/// Complete single-elimination bracket before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPlan {
    rounds: u32,
    matches: Vec<PlannedMatch>,
}

impl BracketPlan {
    /// Plan a bracket for entrants in seed order (index 0 is the top seed).
    pub fn new(entrants: &[ParticipantId]) -> TournamentResult<Self> {
        if entrants.len() < 2 {
            return Err(TournamentError::InsufficientParticipants {
                needed: 2,
                current: entrants.len(),
            });
        }

        let rounds = round_count(entrants.len());
        let mut matches = Vec::with_capacity(bracket_size(entrants.len()) - 1);
        for round in 1..=rounds {
            for match_number in 1..=matches_in_round(rounds, round) {
                let next = (round < rounds)
                    .then(|| arena_index(rounds, round + 1, match_number.div_ceil(2)));
                matches.push(PlannedMatch {
                    round,
                    match_number,
                    slots: [None, None],
                    status: MatchStatus::Pending,
                    winner: None,
                    next,
                });
            }
        }

        let order = seed_order(bracket_size(entrants.len()));
        for (i, pair) in order.chunks(2).enumerate() {
            matches[i].slots = [entrants.get(pair[0]).copied(), entrants.get(pair[1]).copied()];
        }

        let mut plan = Self { rounds, matches };
        plan.resolve_byes();
        Ok(plan)
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn matches(&self) -> &[PlannedMatch] {
        &self.matches
    }

    /// Settle every match that can never get a second entrant.
    ///
    /// Rounds are walked in order so a bye winner placed in round `r + 1`
    /// is itself examined when that round comes up.
    fn resolve_byes(&mut self) {
        for round in 1..=self.rounds {
            let start = arena_index(self.rounds, round, 1);
            let count = matches_in_round(self.rounds, round) as usize;

            for idx in start..start + count {
                let dead = [self.slot_is_dead(idx, Slot::One), self.slot_is_dead(idx, Slot::Two)];
                let m = &mut self.matches[idx];

                m.status = match (m.slots, dead) {
                    ([Some(_), Some(_)], _) => MatchStatus::Pending,
                    ([Some(only), None], [_, true]) | ([None, Some(only)], [true, _]) => {
                        m.winner = Some(only);
                        MatchStatus::Completed
                    }
                    ([None, None], [true, true]) => MatchStatus::Bye,
                    _ => MatchStatus::Pending,
                };

                if m.status == MatchStatus::Completed {
                    let (winner, next, match_number) = (m.winner, m.next, m.match_number);
                    debug!("Bye: participant {winner:?} advances from round {round} match {match_number}");
                    if let Some(next) = next {
                        let slot = Slot::for_feeder(match_number) as usize;
                        self.matches[next].slots[slot] = winner;
                    }
                }
            }
        }
    }

    /// A slot is dead when nobody can ever arrive in it
    fn slot_is_dead(&self, idx: usize, slot: Slot) -> bool {
        let m = &self.matches[idx];
        if m.round == 1 {
            return m.slots[slot as usize].is_none();
        }
        let feeder_number = match slot {
            Slot::One => m.match_number * 2 - 1,
            Slot::Two => m.match_number * 2,
        };
        let feeder = &self.matches[arena_index(self.rounds, m.round - 1, feeder_number)];
        feeder.status == MatchStatus::Bye
    }
}

/// Matches in `round` of a bracket with `rounds` rounds
pub fn matches_in_round(rounds: u32, round: u32) -> u32 {
    1 << (rounds - round)
}

fn arena_index(rounds: u32, round: u32, match_number: u32) -> usize {
    let before: u32 = (1..round).map(|r| matches_in_round(rounds, r)).sum();
    (before + match_number - 1) as usize
}

/// Plan and persist a single-elimination bracket.
///
/// Returns the stored matches ordered by round and match number.
pub async fn build_single_elimination(
    store: &mut dyn TournamentStore,
    tournament_id: TournamentId,
    entrants: &[ParticipantId],
) -> TournamentResult<Vec<Match>> {
    let plan = BracketPlan::new(entrants)?;

    let mut ids = vec![None; plan.matches.len()];
    let mut stored = Vec::with_capacity(plan.matches.len());
    for round in (1..=plan.rounds).rev() {
        let start = arena_index(plan.rounds, round, 1);
        let count = matches_in_round(plan.rounds, round) as usize;

        for idx in start..start + count {
            let planned = &plan.matches[idx];
            let new = NewMatch {
                round: planned.round,
                match_number: planned.match_number,
                participant1_id: planned.slots[0],
                participant2_id: planned.slots[1],
                status: planned.status,
                winner_id: planned.winner,
                next_match_id: planned.next.and_then(|next| ids[next]),
            };
            let id = store.create_match(tournament_id, &new).await?;
            ids[idx] = Some(id);
            stored.push(Match::from_new(id, tournament_id, &new));
        }
    }

    stored.sort_by_key(|m| (m.round, m.match_number));
    Ok(stored)
}

/// Move a match's winner into its slot of the next-round match.
///
/// Handles first completion, a corrected result with a different winner, and
/// a correction that reopens the match (the slot is cleared again). The next
/// match's entrants can only change while it has no frames recorded.
pub async fn advance_winner(
    store: &mut dyn TournamentStore,
    previous: &Match,
    current: &Match,
) -> TournamentResult<()> {
    let Some(next_id) = current.next_match_id else {
        return Ok(());
    };

    let settled_winner = |m: &Match| {
        if m.status == MatchStatus::Completed {
            m.winner_id
        } else {
            None
        }
    };
    let winner = settled_winner(current);
    if winner == settled_winner(previous) {
        return Ok(());
    }

    let mut next = store
        .get_match(current.tournament_id, next_id)
        .await?
        .ok_or(TournamentError::MatchNotFound(next_id))?;

    let slot = Slot::for_feeder(current.match_number);
    if next.slot(slot) == winner {
        return Ok(());
    }
    if next.status != MatchStatus::Pending {
        return Err(TournamentError::DownstreamMatchStarted { match_id: next.id });
    }

    next.set_slot(slot, winner);
    store.update_match(&next).await?;
    debug!(
        "Match {} winner {winner:?} placed in match {} {slot:?}",
        current.id, next.id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entrants(n: i64) -> Vec<ParticipantId> {
        (1..=n).map(|i| i * 100).collect()
    }

    fn round(plan: &BracketPlan, round: u32) -> Vec<&PlannedMatch> {
        plan.matches().iter().filter(|m| m.round == round).collect()
    }

    #[test]
    fn test_rejects_fewer_than_two() {
        assert!(matches!(
            BracketPlan::new(&[1]),
            Err(TournamentError::InsufficientParticipants { needed: 2, current: 1 })
        ));
    }

    #[test]
    fn test_two_entrants_single_final() {
        let plan = BracketPlan::new(&[5, 6]).unwrap();
        assert_eq!(plan.rounds(), 1);
        assert_eq!(plan.matches().len(), 1);
        assert_eq!(plan.matches()[0].slots, [Some(5), Some(6)]);
        assert_eq!(plan.matches()[0].next, None);
        assert_eq!(plan.matches()[0].status, MatchStatus::Pending);
    }

    #[test]
    fn test_full_bracket_of_eight_links_rounds() {
        let plan = BracketPlan::new(&entrants(8)).unwrap();
        assert_eq!(plan.rounds(), 3);
        assert_eq!(plan.matches().len(), 7);

        let first = round(&plan, 1);
        assert_eq!(first.len(), 4);
        // 1v8, 4v5, 2v7, 3v6
        assert_eq!(first[0].slots, [Some(100), Some(800)]);
        assert_eq!(first[1].slots, [Some(400), Some(500)]);
        assert_eq!(first[2].slots, [Some(200), Some(700)]);
        assert_eq!(first[3].slots, [Some(300), Some(600)]);
        assert!(first.iter().all(|m| m.status == MatchStatus::Pending));

        for m in plan.matches() {
            match m.next {
                Some(next) => {
                    let target = &plan.matches()[next];
                    assert_eq!(target.round, m.round + 1);
                    assert_eq!(target.match_number, m.match_number.div_ceil(2));
                }
                None => assert_eq!(m.round, 3),
            }
        }
    }

    #[test]
    fn test_five_entrants_three_byes_advance() {
        let plan = BracketPlan::new(&entrants(5)).unwrap();
        let first = round(&plan, 1);

        let byes: Vec<_> = first
            .iter()
            .filter(|m| m.status == MatchStatus::Completed)
            .collect();
        assert_eq!(byes.len(), 3);
        for m in &byes {
            let only = m.slots.iter().flatten().copied().collect::<Vec<_>>();
            assert_eq!(only.len(), 1);
            assert_eq!(m.winner, Some(only[0]));
        }

        // Top three seeds get the byes
        let mut advanced: Vec<_> = byes.iter().filter_map(|m| m.winner).collect();
        advanced.sort();
        assert_eq!(advanced, vec![100, 200, 300]);

        let second = round(&plan, 2);
        let seated: Vec<_> = second.iter().flat_map(|m| m.slots).flatten().collect();
        assert_eq!(seated.len(), 3);
        assert!(second.iter().all(|m| m.status == MatchStatus::Pending));
    }

    #[test]
    fn test_three_entrants() {
        let plan = BracketPlan::new(&[1, 2, 3]).unwrap();
        let first = round(&plan, 1);
        assert_eq!(first[0].slots, [Some(1), None]);
        assert_eq!(first[0].status, MatchStatus::Completed);
        assert_eq!(first[1].slots, [Some(2), Some(3)]);

        let final_match = &round(&plan, 2)[0];
        assert_eq!(final_match.slots, [Some(1), None]);
        assert_eq!(final_match.status, MatchStatus::Pending);
    }

    #[test]
    fn test_no_match_left_without_any_entrant() {
        for n in 2..=33 {
            let plan = BracketPlan::new(&entrants(n)).unwrap();
            assert!(
                plan.matches().iter().all(|m| m.status != MatchStatus::Bye),
                "bye match in bracket of {n}"
            );
        }
    }

    #[test]
    fn test_arena_index_layout() {
        assert_eq!(arena_index(3, 1, 1), 0);
        assert_eq!(arena_index(3, 1, 4), 3);
        assert_eq!(arena_index(3, 2, 1), 4);
        assert_eq!(arena_index(3, 3, 1), 6);
    }
}
