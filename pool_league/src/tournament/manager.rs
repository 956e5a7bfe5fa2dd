//! Tournament manager: the entry point for every scheduling operation.

use chrono::Utc;
use log::{info, warn};
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;

use super::bracket::build_single_elimination;
use super::errors::{TournamentError, TournamentResult};
use super::fixtures::build_round_robin;
use super::models::{
    Frame, Match, MatchId, MatchOutcome, MatchStatus, Participant, ParticipantId, RoundView,
    Standing, Tournament, TournamentConfig, TournamentFormat, TournamentId, TournamentStatus,
    round_name,
};
use super::results::record_frames;
use super::seeding::random_seeds;
use crate::db::{PgTournamentRepository, TournamentRepository, TournamentStore};

/// Tournament manager
///
/// Each mutating operation runs in its own unit of work: it locks the
/// tournament row, does its reads and writes, and commits. Any error drops
/// the unit of work and leaves storage untouched.
#[derive(Clone)]
pub struct TournamentManager {
    repository: Arc<dyn TournamentRepository>,
}

impl TournamentManager {
    /// Create a tournament manager backed by PostgreSQL
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self::with_repository(Arc::new(PgTournamentRepository::new(pool)))
    }

    /// Create a tournament manager over any storage implementation
    pub fn with_repository(repository: Arc<dyn TournamentRepository>) -> Self {
        Self { repository }
    }

    pub async fn health_check(&self) -> TournamentResult<()> {
        self.repository.health_check().await
    }

    /// Create a new tournament in draft status
    pub async fn create_tournament(&self, config: &TournamentConfig) -> TournamentResult<Tournament> {
        config.validate()?;

        let mut store = self.repository.begin().await?;
        let tournament = store.create_tournament(config).await?;
        store.commit().await?;

        info!(
            "Created tournament {} '{}' ({}, race to {})",
            tournament.id, tournament.name, tournament.format, tournament.race_to
        );
        Ok(tournament)
    }

    pub async fn get_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        let mut store = self.repository.begin().await?;
        store
            .get_tournament(tournament_id)
            .await?
            .ok_or(TournamentError::TournamentNotFound(tournament_id))
    }

    /// All tournaments, newest first
    pub async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        let mut store = self.repository.begin().await?;
        store.list_tournaments().await
    }

    /// Enter a player into a draft tournament.
    ///
    /// Returns `None` if the player is already entered.
    pub async fn add_participant(
        &self,
        tournament_id: TournamentId,
        player_id: i64,
        team_id: Option<i64>,
    ) -> TournamentResult<Option<Participant>> {
        let mut store = self.repository.begin().await?;
        let tournament = store.lock_tournament(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Draft)?;

        let participant = store
            .add_participant(tournament_id, player_id, team_id)
            .await?;
        store.commit().await?;

        match &participant {
            Some(p) => info!("Player {player_id} entered tournament {tournament_id} as {}", p.id),
            None => warn!("Player {player_id} already entered in tournament {tournament_id}"),
        }
        Ok(participant)
    }

    /// Withdraw a participant from a draft tournament
    pub async fn remove_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<()> {
        let mut store = self.repository.begin().await?;
        let tournament = store.lock_tournament(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Draft)?;

        if !store.remove_participant(tournament_id, participant_id).await? {
            return Err(TournamentError::ParticipantNotFound(participant_id));
        }
        store.commit().await?;

        info!("Participant {participant_id} withdrawn from tournament {tournament_id}");
        Ok(())
    }

    /// Participants in seed order: seeded ones ascending, then unseeded, ties by ID
    pub async fn seeded_participants(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Participant>> {
        let mut store = self.repository.begin().await?;
        store.lock_tournament(tournament_id).await?;
        seeded(store.as_mut(), tournament_id).await
    }

    /// Give every participant a fresh random seed from `1..=n`.
    ///
    /// Only allowed while the tournament is a draft. Returns the participants
    /// in their new seed order.
    pub async fn shuffle_seeds(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Participant>> {
        let mut store = self.repository.begin().await?;
        let tournament = store.lock_tournament(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Draft)?;

        let participants = store.list_participants(tournament_id).await?;
        if participants.is_empty() {
            return Ok(participants);
        }

        let seeds = random_seeds(participants.len(), &mut rand::rng());
        let assignments: Vec<(ParticipantId, u32)> = participants
            .iter()
            .map(|p| p.id)
            .zip(seeds)
            .collect();
        store.update_seeds(tournament_id, &assignments).await?;

        let reseeded = seeded(store.as_mut(), tournament_id).await?;
        store.commit().await?;

        info!(
            "Shuffled seeds for {} participants in tournament {tournament_id}",
            reseeded.len()
        );
        Ok(reseeded)
    }

    /// Generate the schedule and move the tournament to in-progress.
    ///
    /// `ordered` lists the entrants, top seed first. Every entry must be a
    /// participant of this tournament and appear once.
    pub async fn start_tournament(
        &self,
        tournament_id: TournamentId,
        format: TournamentFormat,
        ordered: &[ParticipantId],
    ) -> TournamentResult<Vec<Match>> {
        self.start(tournament_id, format, Some(ordered)).await
    }

    /// Start with every participant, in seed order
    pub async fn start_seeded(
        &self,
        tournament_id: TournamentId,
        format: TournamentFormat,
    ) -> TournamentResult<Vec<Match>> {
        self.start(tournament_id, format, None).await
    }

    /// Shared start path. Without an explicit order the entrants are read in
    /// seed order under the same tournament lock that builds the schedule.
    async fn start(
        &self,
        tournament_id: TournamentId,
        format: TournamentFormat,
        ordered: Option<&[ParticipantId]>,
    ) -> TournamentResult<Vec<Match>> {
        let mut store = self.repository.begin().await?;
        let mut tournament = store.lock_tournament(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Draft)?;

        let entrants: Vec<ParticipantId> = match ordered {
            Some(ordered) => {
                let entered: HashSet<ParticipantId> = store
                    .list_participants(tournament_id)
                    .await?
                    .into_iter()
                    .map(|p| p.id)
                    .collect();
                let mut seen = HashSet::with_capacity(ordered.len());
                for &participant_id in ordered {
                    if !entered.contains(&participant_id) {
                        return Err(TournamentError::ParticipantNotFound(participant_id));
                    }
                    if !seen.insert(participant_id) {
                        return Err(TournamentError::DuplicateParticipant(participant_id));
                    }
                }
                ordered.to_vec()
            }
            None => seeded(store.as_mut(), tournament_id)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect(),
        };

        let matches = match format {
            TournamentFormat::SingleElimination => {
                build_single_elimination(store.as_mut(), tournament_id, &entrants).await?
            }
            TournamentFormat::RoundRobin => {
                build_round_robin(
                    store.as_mut(),
                    tournament_id,
                    &entrants,
                    tournament.round_robin_cycles,
                )
                .await?
            }
        };

        tournament.format = format;
        tournament.status = TournamentStatus::InProgress;
        tournament.started_at = Some(Utc::now());
        store.update_tournament(&tournament).await?;
        store.commit().await?;

        info!(
            "Started tournament {tournament_id} as {format}: {} entrants, {} matches",
            entrants.len(),
            matches.len()
        );
        Ok(matches)
    }

    /// Replace a match's frames and propagate the result.
    ///
    /// Also allowed on a completed tournament, to correct a result. The
    /// tournament status follows: completed once every match is settled,
    /// in-progress otherwise.
    pub async fn submit_match_frames(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        frames: &[Frame],
    ) -> TournamentResult<MatchOutcome> {
        let mut store = self.repository.begin().await?;
        let mut tournament = store.lock_tournament(tournament_id).await?;
        if tournament.status == TournamentStatus::Draft {
            return Err(TournamentError::InvalidState {
                expected: TournamentStatus::InProgress,
                actual: tournament.status,
            });
        }

        let outcome = record_frames(store.as_mut(), &tournament, match_id, frames).await?;

        let all_settled = store
            .list_matches(tournament_id)
            .await?
            .iter()
            .all(|m| m.status.is_settled());
        let status = if all_settled {
            TournamentStatus::Completed
        } else {
            TournamentStatus::InProgress
        };
        if status != tournament.status {
            tournament.status = status;
            store.update_tournament(&tournament).await?;
            info!("Tournament {tournament_id} is now {status}");
        }
        store.commit().await?;

        Ok(outcome)
    }

    /// Delete the schedule and standings and return the tournament to draft.
    ///
    /// Participants and their seeds are kept.
    pub async fn reset_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        let mut store = self.repository.begin().await?;
        let mut tournament = store.lock_tournament(tournament_id).await?;

        store.clear_schedule(tournament_id).await?;
        tournament.status = TournamentStatus::Draft;
        tournament.started_at = None;
        store.update_tournament(&tournament).await?;
        store.commit().await?;

        info!("Reset tournament {tournament_id} to draft");
        Ok(tournament)
    }

    pub async fn list_participants(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Participant>> {
        let mut store = self.repository.begin().await?;
        store.lock_tournament(tournament_id).await?;
        store.list_participants(tournament_id).await
    }

    /// Matches ordered by round then match number
    pub async fn list_matches(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Match>> {
        let mut store = self.repository.begin().await?;
        store.lock_tournament(tournament_id).await?;
        store.list_matches(tournament_id).await
    }

    /// A match with its recorded frames
    pub async fn get_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> TournamentResult<(Match, Vec<Frame>)> {
        let mut store = self.repository.begin().await?;
        let m = store
            .get_match(tournament_id, match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        let frames = store.list_frames(match_id).await?;
        Ok((m, frames))
    }

    /// Standings in rank order
    pub async fn list_standings(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Standing>> {
        let mut store = self.repository.begin().await?;
        store.lock_tournament(tournament_id).await?;
        store.list_standings(tournament_id).await
    }

    /// Matches grouped by round, with display names.
    ///
    /// Byes are hidden. Round names follow the bracket shape for elimination
    /// and are plain "Round N" for round-robin.
    pub async fn bracket_view(&self, tournament_id: TournamentId) -> TournamentResult<Vec<RoundView>> {
        let mut store = self.repository.begin().await?;
        let tournament = store.lock_tournament(tournament_id).await?;
        let matches = store.list_matches(tournament_id).await?;

        let mut rounds: Vec<RoundView> = Vec::new();
        let mut per_round: Vec<usize> = Vec::new();
        for m in matches {
            if rounds.last().is_none_or(|r| r.round != m.round) {
                rounds.push(RoundView {
                    round: m.round,
                    name: String::new(),
                    matches: Vec::new(),
                });
                per_round.push(0);
            }
            if let (Some(view), Some(count)) = (rounds.last_mut(), per_round.last_mut()) {
                *count += 1;
                if m.status != MatchStatus::Bye {
                    view.matches.push(m);
                }
            }
        }

        for (view, count) in rounds.iter_mut().zip(per_round) {
            view.name = match tournament.format {
                TournamentFormat::SingleElimination => round_name(view.round, count),
                TournamentFormat::RoundRobin => format!("Round {}", view.round),
            };
        }
        Ok(rounds)
    }
}

fn require_status(tournament: &Tournament, expected: TournamentStatus) -> TournamentResult<()> {
    if tournament.status == expected {
        Ok(())
    } else {
        Err(TournamentError::InvalidState {
            expected,
            actual: tournament.status,
        })
    }
}

async fn seeded(
    store: &mut dyn TournamentStore,
    tournament_id: TournamentId,
) -> TournamentResult<Vec<Participant>> {
    let mut participants = store.list_participants(tournament_id).await?;
    participants.sort_by_key(|p| (p.seed.is_none(), p.seed, p.id));
    Ok(participants)
}
