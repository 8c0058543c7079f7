//! Workout session state machine.
//!
//! A `Session` owns the runtime position within one opened routine: which
//! exercise is current, how many seconds are left on it, whether the timer is
//! running, and how many exercises are done. Every change goes through
//! [`Session::apply`] (or the named shorthands), so the transition rules live
//! in one place and the session stays independent of any clock or UI.
//!
//! States:
//! - `Idle`: opened, never started; remaining shows the placeholder
//! - `Running` / `Paused`: distinguished by `is_running`
//! - `Completed`: last exercise finished; ticks are ignored, but stepping
//!   back is allowed and re-enters `Paused`

use crate::config::PlayerConfig;
use crate::{Exercise, ExerciseSequence, PlayerStatus, SessionSnapshot};

/// A command the host or the driver can issue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Toggle,
    Tick,
    SkipForward,
    SkipBackward,
    Reset,
}

/// What a command did to the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Not legal in the current state; nothing changed
    Ignored,
    /// State changed without moving to another exercise
    Updated,
    /// Moved to the exercise at `index`
    Moved { index: usize },
    /// The last exercise finished
    Completed,
}

/// Runtime state of one workout viewing
#[derive(Clone, Debug)]
pub struct Session {
    sequence: ExerciseSequence,
    current_index: usize,
    remaining_seconds: u32,
    completed_count: usize,
    status: PlayerStatus,
    idle_placeholder_seconds: u32,
}

impl Session {
    /// Open a session over `sequence` with default player settings
    pub fn new(sequence: ExerciseSequence) -> Self {
        Self::with_config(sequence, &PlayerConfig::default())
    }

    pub fn with_config(sequence: ExerciseSequence, config: &PlayerConfig) -> Self {
        Self {
            sequence: sequence.with_fallback_seconds(config.fallback_step_seconds),
            current_index: 0,
            remaining_seconds: config.idle_placeholder_seconds,
            completed_count: 0,
            status: PlayerStatus::Idle,
            idle_placeholder_seconds: config.idle_placeholder_seconds,
        }
    }

    /// Apply one command
    pub fn apply(&mut self, command: Command) -> Outcome {
        let outcome = match command {
            Command::Start => self.start(),
            Command::Toggle => self.toggle(),
            Command::Tick => self.tick(),
            Command::SkipForward => self.skip_forward(),
            Command::SkipBackward => self.skip_backward(),
            Command::Reset => self.reset(),
        };
        if outcome != Outcome::Ignored {
            tracing::debug!(
                "{:?} -> {:?} (index {}, remaining {}s, done {}/{})",
                command,
                outcome,
                self.current_index,
                self.remaining_seconds,
                self.completed_count,
                self.sequence.len()
            );
        }
        outcome
    }

    /// Begin playback from `Idle`
    pub fn start(&mut self) -> Outcome {
        if self.status != PlayerStatus::Idle || self.sequence.is_empty() {
            return Outcome::Ignored;
        }
        self.remaining_seconds = self.step_seconds(0);
        self.status = PlayerStatus::Running;
        tracing::info!("Workout started ({} exercises)", self.sequence.len());
        Outcome::Updated
    }

    /// Play/pause
    pub fn toggle(&mut self) -> Outcome {
        match self.status {
            PlayerStatus::Running => {
                self.status = PlayerStatus::Paused;
                Outcome::Updated
            }
            PlayerStatus::Paused => {
                self.status = PlayerStatus::Running;
                Outcome::Updated
            }
            PlayerStatus::Idle => self.start(),
            PlayerStatus::Completed => Outcome::Ignored,
        }
    }

    /// Advance the clock by one second
    pub fn tick(&mut self) -> Outcome {
        if self.status != PlayerStatus::Running {
            return Outcome::Ignored;
        }

        if self.remaining_seconds > 1 {
            self.remaining_seconds -= 1;
            return Outcome::Updated;
        }

        if self.has_next() {
            self.move_to(self.current_index + 1);
            self.completed_count = (self.completed_count + 1).min(self.sequence.len());
            return Outcome::Moved {
                index: self.current_index,
            };
        }

        self.status = PlayerStatus::Completed;
        self.completed_count = self.sequence.len();
        self.remaining_seconds = 0;
        tracing::info!("Workout completed ({} exercises)", self.completed_count);
        Outcome::Completed
    }

    /// Jump to the next exercise, counting the current one as done
    pub fn skip_forward(&mut self) -> Outcome {
        if !self.has_next() {
            return Outcome::Ignored;
        }
        self.move_to(self.current_index + 1);
        self.completed_count = (self.completed_count + 1).min(self.sequence.len());
        if self.status == PlayerStatus::Idle {
            self.status = PlayerStatus::Paused;
        }
        Outcome::Moved {
            index: self.current_index,
        }
    }

    /// Go back one exercise, un-counting one completion
    pub fn skip_backward(&mut self) -> Outcome {
        if self.current_index == 0 {
            return Outcome::Ignored;
        }
        self.move_to(self.current_index - 1);
        self.completed_count = self.completed_count.saturating_sub(1);
        if matches!(self.status, PlayerStatus::Idle | PlayerStatus::Completed) {
            self.status = PlayerStatus::Paused;
        }
        Outcome::Moved {
            index: self.current_index,
        }
    }

    /// Return to the freshly-opened state
    pub fn reset(&mut self) -> Outcome {
        self.current_index = 0;
        self.completed_count = 0;
        self.remaining_seconds = self.idle_placeholder_seconds;
        self.status = PlayerStatus::Idle;
        Outcome::Updated
    }

    fn has_next(&self) -> bool {
        self.current_index + 1 < self.sequence.len()
    }

    fn move_to(&mut self, index: usize) {
        self.current_index = index;
        self.remaining_seconds = self.step_seconds(index);
    }

    fn step_seconds(&self, index: usize) -> u32 {
        self.sequence
            .step_seconds(index)
            .unwrap_or_else(|| self.sequence.fallback_seconds())
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == PlayerStatus::Running
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn sequence(&self) -> &ExerciseSequence {
        &self.sequence
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.sequence.get(self.current_index)
    }

    /// Completed fraction in `[0.0, 1.0]`; 0.0 for an empty sequence
    pub fn progress(&self) -> f64 {
        if self.sequence.is_empty() {
            0.0
        } else {
            self.completed_count as f64 / self.sequence.len() as f64
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current_index,
            remaining_seconds: self.remaining_seconds,
            is_running: self.is_running(),
            completed_count: self.completed_count,
            total: self.sequence.len(),
            status: self.status,
            current_exercise: self.current_exercise().cloned(),
        }
    }
}
