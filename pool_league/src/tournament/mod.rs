//! Tournament scheduling for pool leagues.
//!
//! This module turns a list of entrants into a playable schedule and keeps it
//! consistent as results come in:
//! - Single-elimination brackets with standard seeding and automatic byes
//! - Round-robin fixtures by the circle method, over one or more cycles
//! - Frame-by-frame result entry, winner advancement and result correction
//! - Round-robin standings with a total ranking order
//!
//! ## Example
//!
//! ```no_run
//! use pool_league::db::{Database, DatabaseConfig};
//! use pool_league::tournament::{TournamentConfig, TournamentFormat, TournamentManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect(&DatabaseConfig::from_env()).await?;
//!     db.migrate().await?;
//!     let manager = TournamentManager::new(db.pool());
//!
//!     let config = TournamentConfig::new("Thursday 9-ball", TournamentFormat::SingleElimination)
//!         .with_race_to(4);
//!     let tournament = manager.create_tournament(&config).await?;
//!     for player_id in [101, 102, 103, 104, 105] {
//!         manager.add_participant(tournament.id, player_id, None).await?;
//!     }
//!
//!     let matches = manager
//!         .start_seeded(tournament.id, TournamentFormat::SingleElimination)
//!         .await?;
//!     println!("Generated {} matches", matches.len());
//!
//!     Ok(())
//! }
//! ```

pub mod bracket;
pub mod errors;
pub mod fixtures;
pub mod manager;
pub mod models;
pub mod results;
pub mod round_robin;
pub mod seeding;
pub mod standings;

pub use errors::{ErrorKind, TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    DEFAULT_RACE_TO, DecidedMatch, Frame, MAX_RACE_TO, MIN_RACE_TO, Match, MatchId, MatchOutcome,
    MatchStatus, NewMatch, Participant, ParticipantId, RoundView, Slot, Standing, Tournament,
    TournamentConfig, TournamentFormat, TournamentId, TournamentStatus, round_name,
};
