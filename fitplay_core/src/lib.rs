#![forbid(unsafe_code)]

//! Core domain model and playback logic for the Fitplay workout player.
//!
//! This crate provides:
//! - Domain types (exercises, routines, snapshots)
//! - Routine loading and the built-in default workout
//! - Exercise sequence flattening
//! - The session state machine and its tick driver
//! - Completion stats and the favorites boundary

pub mod types;
pub mod error;
pub mod routine;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod sequence;
pub mod session;
pub mod driver;
pub mod player;
pub mod stats;
pub mod favorites;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_workout, default_workout};
pub use config::{Config, PlayerConfig};
pub use sequence::{ExerciseSequence, SequenceSource};
pub use session::{Command, Outcome, Session};
pub use driver::{share, Driver, SharedSession, TickListener};
pub use player::{Player, PlayerEvent};
pub use stats::{
    read_records, report_completion, CompletionRecord, JsonlStatsSink, StatsPolicy, StatsSink,
    StatsTotals,
};
pub use favorites::{toggle_favorite, FavoritesStore, JsonFavorites, MemoryFavorites};
