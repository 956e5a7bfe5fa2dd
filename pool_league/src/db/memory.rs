//! Embedded in-process tournament storage.
//!
//! Every unit of work holds one async mutex for its whole lifetime, which
//! serialises all mutations. Writes land in a working copy that replaces the
//! committed state only on `commit()`; dropping the store rolls back.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::repository::{TournamentRepository, TournamentStore};
use crate::tournament::{
    Frame, Match, MatchId, NewMatch, Participant, ParticipantId, Standing, Tournament,
    TournamentConfig, TournamentError, TournamentId, TournamentResult, TournamentStatus,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_id: i64,
    tournaments: BTreeMap<TournamentId, Tournament>,
    participants: BTreeMap<ParticipantId, Participant>,
    matches: BTreeMap<MatchId, Match>,
    frames: HashMap<MatchId, Vec<Frame>>,
    standings: BTreeMap<(TournamentId, ParticipantId), Standing>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory implementation of `TournamentRepository`
#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentRepository for MemoryRepository {
    async fn begin(&self) -> TournamentResult<Box<dyn TournamentStore>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryStore {
            guard: Some(guard),
            working,
        }))
    }

    async fn health_check(&self) -> TournamentResult<()> {
        Ok(())
    }
}

/// Unit of work over [`MemoryRepository`]
pub struct MemoryStore {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
}

impl MemoryStore {
    fn state(&mut self) -> TournamentResult<&mut MemoryState> {
        if self.guard.is_some() {
            Ok(&mut self.working)
        } else {
            Err(TournamentError::UnitOfWorkClosed)
        }
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn create_tournament(
        &mut self,
        config: &TournamentConfig,
    ) -> TournamentResult<Tournament> {
        let state = self.state()?;
        let tournament = Tournament {
            id: state.next_id(),
            name: config.name.trim().to_string(),
            format: config.format,
            status: TournamentStatus::Draft,
            race_to: config.race_to,
            round_robin_cycles: config.round_robin_cycles,
            created_at: Utc::now(),
            started_at: None,
        };
        state.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn get_tournament(&mut self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.state()?.tournaments.get(&id).cloned())
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> TournamentResult<Tournament> {
        self.state()?
            .tournaments
            .get(&id)
            .cloned()
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    async fn list_tournaments(&mut self) -> TournamentResult<Vec<Tournament>> {
        Ok(self.state()?.tournaments.values().rev().cloned().collect())
    }

    async fn update_tournament(&mut self, tournament: &Tournament) -> TournamentResult<()> {
        if let Some(stored) = self.state()?.tournaments.get_mut(&tournament.id) {
            stored.format = tournament.format;
            stored.status = tournament.status;
            stored.started_at = tournament.started_at;
        }
        Ok(())
    }

    async fn add_participant(
        &mut self,
        tournament_id: TournamentId,
        player_id: i64,
        team_id: Option<i64>,
    ) -> TournamentResult<Option<Participant>> {
        let state = self.state()?;
        let entered = state
            .participants
            .values()
            .any(|p| p.tournament_id == tournament_id && p.player_id == player_id);
        if entered {
            return Ok(None);
        }

        let participant = Participant {
            id: state.next_id(),
            tournament_id,
            player_id,
            team_id,
            seed: None,
        };
        state
            .participants
            .insert(participant.id, participant.clone());
        Ok(Some(participant))
    }

    async fn remove_participant(
        &mut self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<bool> {
        let state = self.state()?;
        match state.participants.get(&participant_id) {
            Some(p) if p.tournament_id == tournament_id => {
                state.participants.remove(&participant_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Participant>> {
        Ok(self
            .state()?
            .participants
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn update_seeds(
        &mut self,
        tournament_id: TournamentId,
        seeds: &[(ParticipantId, u32)],
    ) -> TournamentResult<()> {
        let state = self.state()?;
        for &(participant_id, seed) in seeds {
            if let Some(p) = state.participants.get_mut(&participant_id) {
                if p.tournament_id == tournament_id {
                    p.seed = Some(seed);
                }
            }
        }
        Ok(())
    }

    async fn create_match(
        &mut self,
        tournament_id: TournamentId,
        new: &NewMatch,
    ) -> TournamentResult<MatchId> {
        let state = self.state()?;
        let id = state.next_id();
        state
            .matches
            .insert(id, Match::from_new(id, tournament_id, new));
        Ok(id)
    }

    async fn get_match(
        &mut self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> TournamentResult<Option<Match>> {
        Ok(self
            .state()?
            .matches
            .get(&match_id)
            .filter(|m| m.tournament_id == tournament_id)
            .cloned())
    }

    async fn list_matches(&mut self, tournament_id: TournamentId) -> TournamentResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .state()?
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round, m.match_number));
        Ok(matches)
    }

    async fn update_match(&mut self, m: &Match) -> TournamentResult<()> {
        if let Some(stored) = self.state()?.matches.get_mut(&m.id) {
            stored.participant1_id = m.participant1_id;
            stored.participant2_id = m.participant2_id;
            stored.score1 = m.score1;
            stored.score2 = m.score2;
            stored.status = m.status;
            stored.winner_id = m.winner_id;
        }
        Ok(())
    }

    async fn replace_frames(
        &mut self,
        match_id: MatchId,
        frames: &[Frame],
    ) -> TournamentResult<()> {
        let mut frames = frames.to_vec();
        frames.sort_by_key(|f| f.frame_number);
        self.state()?.frames.insert(match_id, frames);
        Ok(())
    }

    async fn list_frames(&mut self, match_id: MatchId) -> TournamentResult<Vec<Frame>> {
        Ok(self
            .state()?
            .frames
            .get(&match_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_standing(&mut self, standing: &Standing) -> TournamentResult<()> {
        self.state()?.standings.insert(
            (standing.tournament_id, standing.participant_id),
            standing.clone(),
        );
        Ok(())
    }

    async fn list_standings(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Standing>> {
        let mut standings: Vec<Standing> = self
            .state()?
            .standings
            .values()
            .filter(|s| s.tournament_id == tournament_id)
            .cloned()
            .collect();
        standings.sort_by_key(|s| (s.rank.is_none(), s.rank, s.participant_id));
        Ok(standings)
    }

    async fn clear_schedule(&mut self, tournament_id: TournamentId) -> TournamentResult<()> {
        let state = self.state()?;
        let doomed: Vec<MatchId> = state
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .map(|m| m.id)
            .collect();
        for id in doomed {
            state.matches.remove(&id);
            state.frames.remove(&id);
        }
        state.standings.retain(|(t, _), _| *t != tournament_id);
        Ok(())
    }

    async fn commit(&mut self) -> TournamentResult<()> {
        let mut guard = self.guard.take().ok_or(TournamentError::UnitOfWorkClosed)?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
