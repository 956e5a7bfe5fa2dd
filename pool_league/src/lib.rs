//! # Pool League
//!
//! Tournament scheduling core for an amateur pool league.
//!
//! The library generates single-elimination brackets and round-robin fixtures,
//! records frame-by-frame results, advances winners and keeps round-robin
//! standings ranked. Every operation runs against a tournament-scoped unit of
//! work, so concurrent requests against one tournament are serialised and a
//! failed request leaves nothing behind.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Scheduling algorithms, result processing and the [`TournamentManager`]
//! - [`db`]: Connection pooling and the storage ports, with PostgreSQL and in-memory backends
//!
//! ## Example
//!
//! ```
//! use pool_league::tournament::seeding::seed_order;
//!
//! // Seeds 1 and 2 sit in opposite halves of an eight-player bracket
//! assert_eq!(seed_order(8), vec![0, 7, 3, 4, 1, 6, 2, 5]);
//! ```

/// Database access and storage ports.
pub mod db;

/// Tournament scheduling and results.
pub mod tournament;
pub use tournament::{TournamentError, TournamentManager, TournamentResult};
