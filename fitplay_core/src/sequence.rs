//! Flattened exercise sequence for playback.
//!
//! A routine's exercises may be sectioned or flat; the player only ever sees
//! one ordered list. The sequence is rebuilt whenever a different routine is
//! opened and is never mutated afterwards.

use crate::catalog::default_workout;
use crate::{Error, Exercise, Result, Routine, RoutineExercises};

/// Where the steps of a sequence came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceSource {
    Routine,
    /// The routine had no exercises; the built-in workout was substituted
    DefaultFallback,
}

/// Seconds played for a step whose record carries no usable duration
pub const DEFAULT_FALLBACK_STEP_SECONDS: u32 = 30;

/// Ordered, read-only list of exercises to play
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseSequence {
    steps: Vec<Exercise>,
    source: SequenceSource,
    fallback_step_seconds: u32,
}

/// Flatten exercise data in section order, then intra-section order
fn flatten(exercises: &RoutineExercises) -> Vec<Exercise> {
    match exercises {
        RoutineExercises::Flat(list) => list.clone(),
        RoutineExercises::Sections(sections) => sections
            .0
            .iter()
            .flat_map(|s| s.exercises.iter().cloned())
            .collect(),
    }
}

impl ExerciseSequence {
    /// Build the play sequence for a routine, substituting the default
    /// workout when the routine has no exercises
    pub fn build(routine: &Routine) -> Self {
        Self::build_with(routine, true)
    }

    /// Build the play sequence, optionally disabling the default fallback
    ///
    /// With the fallback disabled an exercise-less routine yields an empty
    /// sequence, which the session treats as a valid no-op state.
    pub fn build_with(routine: &Routine, use_default: bool) -> Self {
        let steps = routine.exercises.as_ref().map(flatten).unwrap_or_default();

        if !steps.is_empty() {
            tracing::debug!(
                "Built sequence of {} steps for routine '{}'",
                steps.len(),
                routine.name
            );
            for step in steps.iter().filter(|e| e.duration_seconds == 0) {
                tracing::warn!(
                    "Exercise '{}' in routine '{}' has no duration, using the fallback",
                    step.name,
                    routine.name
                );
            }
            return Self::from_steps(steps);
        }

        if !use_default {
            tracing::warn!(
                "Routine '{}' has no exercises and the default workout is disabled",
                routine.name
            );
            return Self::from_steps(steps);
        }

        let fallback = default_workout()
            .exercises
            .as_ref()
            .map(flatten)
            .unwrap_or_default();
        tracing::warn!(
            "Routine '{}' has no exercises, substituting the default workout ({} steps)",
            routine.name,
            fallback.len()
        );
        Self {
            steps: fallback,
            source: SequenceSource::DefaultFallback,
            fallback_step_seconds: DEFAULT_FALLBACK_STEP_SECONDS,
        }
    }

    /// Build a sequence directly from a list of steps
    pub fn from_steps(steps: Vec<Exercise>) -> Self {
        Self {
            steps,
            source: SequenceSource::Routine,
            fallback_step_seconds: DEFAULT_FALLBACK_STEP_SECONDS,
        }
    }

    /// Replace the duration played for steps without one; zero is ignored
    pub fn with_fallback_seconds(mut self, seconds: u32) -> Self {
        if seconds > 0 {
            self.fallback_step_seconds = seconds;
        }
        self
    }

    pub fn fallback_seconds(&self) -> u32 {
        self.fallback_step_seconds
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, or `Error::OutOfRange`
    pub fn at(&self, index: usize) -> Result<&Exercise> {
        self.steps.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    pub fn get(&self, index: usize) -> Option<&Exercise> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.steps.iter()
    }

    pub fn source(&self) -> SequenceSource {
        self.source
    }

    /// Seconds step `index` actually plays for, with the fallback applied
    pub fn step_seconds(&self, index: usize) -> Option<u32> {
        self.steps.get(index).map(|e| self.effective(e))
    }

    /// Sum of played step durations in seconds
    pub fn total_seconds(&self) -> u64 {
        self.steps.iter().map(|e| u64::from(self.effective(e))).sum()
    }

    fn effective(&self, exercise: &Exercise) -> u32 {
        match exercise.duration_seconds {
            0 => self.fallback_step_seconds,
            secs => secs,
        }
    }
}
