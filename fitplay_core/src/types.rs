//! Core domain types for the Fitplay workout player.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and the routines that contain them
//! - Player status and the display snapshot
//! - Stats updates emitted when a workout is finished

use serde::{Deserialize, Serialize};

// ============================================================================
// Routine Types
// ============================================================================

/// A single timed movement step (e.g., "Jumping Jacks", 30 seconds)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(alias = "nombre")]
    pub name: String,
    /// Whole seconds. Zero means the source record carried no usable duration.
    #[serde(
        default,
        alias = "duration_seconds",
        alias = "duration",
        alias = "duracion",
        deserialize_with = "crate::routine::lenient_seconds"
    )]
    pub duration_seconds: u32,
    #[serde(default, alias = "muscle_group", alias = "musculo")]
    pub muscle_group: String,
    #[serde(default, alias = "icono")]
    pub icon: String,
}

impl Exercise {
    pub fn new(
        name: impl Into<String>,
        duration_seconds: u32,
        muscle_group: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            duration_seconds,
            muscle_group: muscle_group.into(),
            icon: icon.into(),
        }
    }
}

/// A named group of exercises within a routine (e.g., "Warm-up")
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseSection {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

/// The two shapes a routine's exercise data can take
///
/// Sectioned data is written as a JSON object mapping section name to an
/// ordered exercise list; section order follows the document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RoutineExercises {
    Flat(Vec<Exercise>),
    Sections(Sections),
}

/// Ordered list of sections, (de)serialized as a JSON object
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sections(pub Vec<ExerciseSection>);

/// A workout routine as delivered by the catalog or a custom-routine store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Routine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default)]
    pub trainer: Option<String>,
    #[serde(default, alias = "nivel")]
    pub level: Option<String>,
    /// Nominal duration as displayed in the catalog (e.g., "20 min")
    #[serde(default, alias = "duracion")]
    pub duration: Option<String>,
    /// Calorie estimate as displayed in the catalog (e.g., "150-250")
    #[serde(default, alias = "calorias")]
    pub calories: Option<String>,
    #[serde(default, alias = "categoria")]
    pub category: Option<String>,
    #[serde(default, alias = "ejercicios")]
    pub exercises: Option<RoutineExercises>,
}

impl Routine {
    /// Stable identity used by favorites and stats: the id, else the name
    pub fn identity(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

// ============================================================================
// Player Types
// ============================================================================

/// Lifecycle status of a workout session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Opened but never started
    Idle,
    Running,
    Paused,
    /// Last exercise finished; no further ticks are accepted
    Completed,
}

/// Read-only view of a session for presentation layers
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub current_index: usize,
    pub remaining_seconds: u32,
    pub is_running: bool,
    pub completed_count: usize,
    pub total: usize,
    pub status: PlayerStatus,
    pub current_exercise: Option<Exercise>,
}

impl SessionSnapshot {
    /// Completed fraction in `[0.0, 1.0]`; 0.0 for an empty sequence
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed_count as f64 / self.total as f64
        }
    }
}

// ============================================================================
// Stats Types
// ============================================================================

/// Increment sent to the user-stats collaborator when a workout completes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsUpdate {
    pub completed_workouts: u32,
    pub calories_burned: u32,
    pub minutes_active: u32,
}
