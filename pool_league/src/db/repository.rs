//! Repository trait definitions for tournament storage.
//!
//! The scheduling core talks to storage only through [`TournamentStore`], one
//! atomic unit of work opened by [`TournamentRepository::begin`]. Dropping a
//! store without calling [`TournamentStore::commit`] discards every write made
//! through it.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};
use std::sync::Arc;

use crate::tournament::{
    Frame, Match, MatchId, NewMatch, Participant, ParticipantId, Standing, Tournament,
    TournamentConfig, TournamentError, TournamentId, TournamentResult,
};

/// Source of units of work
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Open a unit of work
    async fn begin(&self) -> TournamentResult<Box<dyn TournamentStore>>;

    /// Check that storage is reachable
    async fn health_check(&self) -> TournamentResult<()>;
}

/// One atomic unit of work over tournament records
#[async_trait]
pub trait TournamentStore: Send {
    /// Insert a draft tournament
    async fn create_tournament(&mut self, config: &TournamentConfig)
    -> TournamentResult<Tournament>;

    /// Find a tournament without locking it
    async fn get_tournament(&mut self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// Load a tournament and hold its write lock until the unit of work ends
    async fn lock_tournament(&mut self, id: TournamentId) -> TournamentResult<Tournament>;

    /// All tournaments, newest first
    async fn list_tournaments(&mut self) -> TournamentResult<Vec<Tournament>>;

    /// Persist format, status and start time
    async fn update_tournament(&mut self, tournament: &Tournament) -> TournamentResult<()>;

    /// Enter a player, `None` if they are already entered
    async fn add_participant(
        &mut self,
        tournament_id: TournamentId,
        player_id: i64,
        team_id: Option<i64>,
    ) -> TournamentResult<Option<Participant>>;

    /// Remove a participant, `false` if there was none
    async fn remove_participant(
        &mut self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<bool>;

    /// Participants ordered by ID
    async fn list_participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Participant>>;

    /// Overwrite seeds
    async fn update_seeds(
        &mut self,
        tournament_id: TournamentId,
        seeds: &[(ParticipantId, u32)],
    ) -> TournamentResult<()>;

    async fn create_match(
        &mut self,
        tournament_id: TournamentId,
        new: &NewMatch,
    ) -> TournamentResult<MatchId>;

    async fn get_match(
        &mut self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> TournamentResult<Option<Match>>;

    /// Matches ordered by round, then match number
    async fn list_matches(&mut self, tournament_id: TournamentId) -> TournamentResult<Vec<Match>>;

    /// Persist entrants, scores, status and winner
    async fn update_match(&mut self, m: &Match) -> TournamentResult<()>;

    /// Delete every frame of the match and insert `frames`
    async fn replace_frames(&mut self, match_id: MatchId, frames: &[Frame])
    -> TournamentResult<()>;

    /// Frames ordered by frame number
    async fn list_frames(&mut self, match_id: MatchId) -> TournamentResult<Vec<Frame>>;

    async fn upsert_standing(&mut self, standing: &Standing) -> TournamentResult<()>;

    /// Standings ordered by rank (unranked last), then participant ID
    async fn list_standings(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Standing>>;

    /// Delete every match, frame and standing of the tournament
    async fn clear_schedule(&mut self, tournament_id: TournamentId) -> TournamentResult<()>;

    /// Make every write visible
    async fn commit(&mut self) -> TournamentResult<()>;
}

/// PostgreSQL implementation of `TournamentRepository`
#[derive(Clone)]
pub struct PgTournamentRepository {
    pool: Arc<PgPool>,
}

impl PgTournamentRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn begin(&self) -> TournamentResult<Box<dyn TournamentStore>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTournamentStore { tx: Some(tx) }))
    }

    async fn health_check(&self) -> TournamentResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

/// Unit of work backed by one database transaction
pub struct PgTournamentStore {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgTournamentStore {
    fn conn(&mut self) -> TournamentResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or(TournamentError::UnitOfWorkClosed)
    }
}

const TOURNAMENT_COLUMNS: &str =
    "id, name, format, status, race_to, round_robin_cycles, created_at, started_at";

const MATCH_COLUMNS: &str = "id, tournament_id, round, match_number, participant1_id, participant2_id, \
     score1, score2, status, winner_id, next_match_id";

fn tournament_from_row(row: &PgRow) -> TournamentResult<Tournament> {
    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        format: row.try_get::<String, _>("format")?.parse()?,
        status: row.try_get::<String, _>("status")?.parse()?,
        race_to: row.try_get::<i32, _>("race_to")? as u32,
        round_robin_cycles: row.try_get::<i32, _>("round_robin_cycles")? as u32,
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
        started_at: row
            .try_get::<Option<chrono::NaiveDateTime>, _>("started_at")?
            .map(|dt| dt.and_utc()),
    })
}

fn participant_from_row(row: &PgRow) -> TournamentResult<Participant> {
    Ok(Participant {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        player_id: row.try_get("player_id")?,
        team_id: row.try_get("team_id")?,
        seed: row.try_get::<Option<i32>, _>("seed")?.map(|s| s as u32),
    })
}

fn match_from_row(row: &PgRow) -> TournamentResult<Match> {
    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        round: row.try_get::<i32, _>("round")? as u32,
        match_number: row.try_get::<i32, _>("match_number")? as u32,
        participant1_id: row.try_get("participant1_id")?,
        participant2_id: row.try_get("participant2_id")?,
        score1: row.try_get::<i32, _>("score1")? as u32,
        score2: row.try_get::<i32, _>("score2")? as u32,
        status: row.try_get::<String, _>("status")?.parse()?,
        winner_id: row.try_get("winner_id")?,
        next_match_id: row.try_get("next_match_id")?,
    })
}

fn standing_from_row(row: &PgRow) -> TournamentResult<Standing> {
    Ok(Standing {
        tournament_id: row.try_get("tournament_id")?,
        participant_id: row.try_get("participant_id")?,
        matches_played: row.try_get::<i32, _>("matches_played")? as u32,
        wins: row.try_get::<i32, _>("wins")? as u32,
        losses: row.try_get::<i32, _>("losses")? as u32,
        frames_won: row.try_get::<i32, _>("frames_won")? as u32,
        frames_lost: row.try_get::<i32, _>("frames_lost")? as u32,
        frame_difference: row.try_get("frame_difference")?,
        rank: row.try_get::<Option<i32>, _>("rank")?.map(|r| r as u32),
    })
}

#[async_trait]
impl TournamentStore for PgTournamentStore {
    async fn create_tournament(
        &mut self,
        config: &TournamentConfig,
    ) -> TournamentResult<Tournament> {
        let row = sqlx::query(&format!(
            "INSERT INTO tournaments (name, format, status, race_to, round_robin_cycles)
             VALUES ($1, $2, 'draft', $3, $4)
             RETURNING {TOURNAMENT_COLUMNS}"
        ))
        .bind(config.name.trim())
        .bind(config.format.as_str())
        .bind(config.race_to as i32)
        .bind(config.round_robin_cycles as i32)
        .fetch_one(self.conn()?)
        .await?;

        tournament_from_row(&row)
    }

    async fn get_tournament(&mut self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> TournamentResult<Tournament> {
        // Row lock serialises every mutation of this tournament's schedule
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or(TournamentError::TournamentNotFound(id))?;

        tournament_from_row(&row)
    }

    async fn list_tournaments(&mut self) -> TournamentResult<Vec<Tournament>> {
        let rows = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.conn()?)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn update_tournament(&mut self, tournament: &Tournament) -> TournamentResult<()> {
        sqlx::query(
            "UPDATE tournaments SET format = $1, status = $2, started_at = $3 WHERE id = $4",
        )
        .bind(tournament.format.as_str())
        .bind(tournament.status.as_str())
        .bind(tournament.started_at.map(|dt| dt.naive_utc()))
        .bind(tournament.id)
        .execute(self.conn()?)
        .await?;
        Ok(())
    }

    async fn add_participant(
        &mut self,
        tournament_id: TournamentId,
        player_id: i64,
        team_id: Option<i64>,
    ) -> TournamentResult<Option<Participant>> {
        let row = sqlx::query(
            "INSERT INTO tournament_participants (tournament_id, player_id, team_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (tournament_id, player_id) DO NOTHING
             RETURNING id, tournament_id, player_id, team_id, seed",
        )
        .bind(tournament_id)
        .bind(player_id)
        .bind(team_id)
        .fetch_optional(self.conn()?)
        .await?;

        row.as_ref().map(participant_from_row).transpose()
    }

    async fn remove_participant(
        &mut self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<bool> {
        let result = sqlx::query(
            "DELETE FROM tournament_participants WHERE tournament_id = $1 AND id = $2",
        )
        .bind(tournament_id)
        .bind(participant_id)
        .execute(self.conn()?)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT id, tournament_id, player_id, team_id, seed
             FROM tournament_participants
             WHERE tournament_id = $1
             ORDER BY id",
        )
        .bind(tournament_id)
        .fetch_all(self.conn()?)
        .await?;

        rows.iter().map(participant_from_row).collect()
    }

    async fn update_seeds(
        &mut self,
        tournament_id: TournamentId,
        seeds: &[(ParticipantId, u32)],
    ) -> TournamentResult<()> {
        for &(participant_id, seed) in seeds {
            sqlx::query(
                "UPDATE tournament_participants SET seed = $1 WHERE tournament_id = $2 AND id = $3",
            )
            .bind(seed as i32)
            .bind(tournament_id)
            .bind(participant_id)
            .execute(self.conn()?)
            .await?;
        }
        Ok(())
    }

    async fn create_match(
        &mut self,
        tournament_id: TournamentId,
        new: &NewMatch,
    ) -> TournamentResult<MatchId> {
        let row = sqlx::query(
            "INSERT INTO tournament_matches
                (tournament_id, round, match_number, participant1_id, participant2_id,
                 status, winner_id, next_match_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(tournament_id)
        .bind(new.round as i32)
        .bind(new.match_number as i32)
        .bind(new.participant1_id)
        .bind(new.participant2_id)
        .bind(new.status.as_str())
        .bind(new.winner_id)
        .bind(new.next_match_id)
        .fetch_one(self.conn()?)
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn get_match(
        &mut self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> TournamentResult<Option<Match>> {
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches WHERE tournament_id = $1 AND id = $2"
        ))
        .bind(tournament_id)
        .bind(match_id)
        .fetch_optional(self.conn()?)
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&mut self, tournament_id: TournamentId) -> TournamentResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches
             WHERE tournament_id = $1
             ORDER BY round, match_number"
        ))
        .bind(tournament_id)
        .fetch_all(self.conn()?)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn update_match(&mut self, m: &Match) -> TournamentResult<()> {
        sqlx::query(
            "UPDATE tournament_matches
             SET participant1_id = $1, participant2_id = $2, score1 = $3, score2 = $4,
                 status = $5, winner_id = $6, updated_at = NOW()
             WHERE id = $7",
        )
        .bind(m.participant1_id)
        .bind(m.participant2_id)
        .bind(m.score1 as i32)
        .bind(m.score2 as i32)
        .bind(m.status.as_str())
        .bind(m.winner_id)
        .bind(m.id)
        .execute(self.conn()?)
        .await?;
        Ok(())
    }

    async fn replace_frames(
        &mut self,
        match_id: MatchId,
        frames: &[Frame],
    ) -> TournamentResult<()> {
        sqlx::query("DELETE FROM tournament_frames WHERE match_id = $1")
            .bind(match_id)
            .execute(self.conn()?)
            .await?;

        for frame in frames {
            sqlx::query(
                "INSERT INTO tournament_frames (match_id, frame_number, winner_id) VALUES ($1, $2, $3)",
            )
            .bind(match_id)
            .bind(frame.frame_number as i32)
            .bind(frame.winner_participant_id)
            .execute(self.conn()?)
            .await?;
        }
        Ok(())
    }

    async fn list_frames(&mut self, match_id: MatchId) -> TournamentResult<Vec<Frame>> {
        let rows = sqlx::query(
            "SELECT frame_number, winner_id FROM tournament_frames
             WHERE match_id = $1
             ORDER BY frame_number",
        )
        .bind(match_id)
        .fetch_all(self.conn()?)
        .await?;

        rows.iter()
            .map(|row| -> TournamentResult<Frame> {
                Ok(Frame {
                    frame_number: row.try_get::<i32, _>("frame_number")? as u32,
                    winner_participant_id: row.try_get("winner_id")?,
                })
            })
            .collect()
    }

    async fn upsert_standing(&mut self, standing: &Standing) -> TournamentResult<()> {
        sqlx::query(
            "INSERT INTO tournament_standings
                (tournament_id, participant_id, matches_played, wins, losses,
                 frames_won, frames_lost, frame_difference, rank)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (tournament_id, participant_id)
             DO UPDATE SET
                matches_played = EXCLUDED.matches_played,
                wins = EXCLUDED.wins,
                losses = EXCLUDED.losses,
                frames_won = EXCLUDED.frames_won,
                frames_lost = EXCLUDED.frames_lost,
                frame_difference = EXCLUDED.frame_difference,
                rank = EXCLUDED.rank",
        )
        .bind(standing.tournament_id)
        .bind(standing.participant_id)
        .bind(standing.matches_played as i32)
        .bind(standing.wins as i32)
        .bind(standing.losses as i32)
        .bind(standing.frames_won as i32)
        .bind(standing.frames_lost as i32)
        .bind(standing.frame_difference)
        .bind(standing.rank.map(|r| r as i32))
        .execute(self.conn()?)
        .await?;
        Ok(())
    }

    async fn list_standings(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Standing>> {
        let rows = sqlx::query(
            "SELECT tournament_id, participant_id, matches_played, wins, losses,
                    frames_won, frames_lost, frame_difference, rank
             FROM tournament_standings
             WHERE tournament_id = $1
             ORDER BY rank NULLS LAST, participant_id",
        )
        .bind(tournament_id)
        .fetch_all(self.conn()?)
        .await?;

        rows.iter().map(standing_from_row).collect()
    }

    async fn clear_schedule(&mut self, tournament_id: TournamentId) -> TournamentResult<()> {
        // Frames go with their matches (ON DELETE CASCADE)
        sqlx::query("DELETE FROM tournament_standings WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(self.conn()?)
            .await?;
        sqlx::query("DELETE FROM tournament_matches WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> TournamentResult<()> {
        let tx = self.tx.take().ok_or(TournamentError::UnitOfWorkClosed)?;
        tx.commit().await?;
        Ok(())
    }
}
