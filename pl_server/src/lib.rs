//! # Pool League Server
//!
//! HTTP front end for the `pool_league` scheduling core.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
