//! Player: one opened routine, its session, and the driver ticking it.
//!
//! Hosts talk to the player with [`Command`]s and receive [`PlayerEvent`]s
//! over a channel. The player starts the driver whenever a command leaves the
//! session running and stops it whenever the session is not, so the timer's
//! lifetime always matches the `Running` state.

use crate::config::PlayerConfig;
use crate::driver::{share, Driver, SharedSession};
use crate::session::{Command, Outcome, Session};
use crate::stats::{CompletionRecord, StatsPolicy};
use crate::{Error, ExerciseSequence, Result, Routine, SessionSnapshot};
use std::sync::mpsc::Sender;
use std::sync::{Arc, MutexGuard};

/// Event delivered to the host after each driver tick
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    Tick(SessionSnapshot),
    /// Moved on to another exercise
    Advanced(SessionSnapshot),
    /// The routine finished; the host should report stats
    Completed(SessionSnapshot),
}

pub struct Player {
    routine: Routine,
    session: SharedSession,
    driver: Driver,
    config: PlayerConfig,
    events: Sender<PlayerEvent>,
}

impl Player {
    /// Open `routine` in a fresh, idle session
    pub fn open(routine: Routine, config: &PlayerConfig, events: Sender<PlayerEvent>) -> Self {
        let session = share(Self::new_session(&routine, config));
        Self {
            routine,
            session,
            driver: Driver::new(config.tick_interval()),
            config: config.clone(),
            events,
        }
    }

    fn new_session(routine: &Routine, config: &PlayerConfig) -> Session {
        let sequence = ExerciseSequence::build_with(routine, config.use_default_sequence);
        tracing::info!(
            "Opened '{}' with {} exercises ({:?})",
            routine.name,
            sequence.len(),
            sequence.source()
        );
        Session::with_config(sequence, config)
    }

    /// Switch to another routine; the previous session is discarded
    pub fn open_routine(&mut self, routine: Routine) -> Result<()> {
        self.driver.stop();
        let fresh = Self::new_session(&routine, &self.config);
        *self.lock()? = fresh;
        self.routine = routine;
        Ok(())
    }

    /// Apply a host command and reconcile the driver with the new state
    pub fn command(&mut self, command: Command) -> Result<Outcome> {
        let (outcome, running) = {
            let mut session = self.lock()?;
            let outcome = session.apply(command);
            (outcome, session.is_running())
        };

        if !running {
            self.driver.stop();
        } else if !self.driver.is_scheduled() {
            let events = self.events.clone();
            self.driver.start(
                Arc::clone(&self.session),
                move |snapshot: &SessionSnapshot, outcome: Outcome| {
                    let event = match outcome {
                        Outcome::Completed => PlayerEvent::Completed(snapshot.clone()),
                        Outcome::Moved { .. } => PlayerEvent::Advanced(snapshot.clone()),
                        _ => PlayerEvent::Tick(snapshot.clone()),
                    };
                    // The host may already be gone; ticks are not queued for it
                    let _ = events.send(event);
                },
            );
        }

        Ok(outcome)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    /// Steps being played, as built when the routine was opened
    pub fn sequence(&self) -> Result<ExerciseSequence> {
        Ok(self.lock()?.sequence().clone())
    }

    /// Stats record for the completed routine under `policy`
    pub fn completion_record(&self, policy: &StatsPolicy) -> Result<CompletionRecord> {
        let session = self.lock()?;
        let update = policy.estimate(&self.routine, session.sequence());
        Ok(CompletionRecord::new(&self.routine, update))
    }

    /// Block until the driver stops by itself (pause or completion)
    pub fn wait(&mut self) {
        self.driver.wait();
    }

    /// Tear down: the driver is stopped before the session is released
    pub fn close(mut self) {
        self.driver.stop();
        tracing::debug!("Closed player for '{}'", self.routine.name);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| Error::State("session lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Exercise, PlayerStatus, RoutineExercises};
    use std::sync::mpsc;

    fn routine(durations: &[u32]) -> Routine {
        Routine {
            id: Some("quick".into()),
            name: "Quick".into(),
            trainer: None,
            level: None,
            duration: None,
            calories: Some("40-60".into()),
            category: None,
            exercises: Some(RoutineExercises::Flat(
                durations
                    .iter()
                    .map(|&d| Exercise::new("step", d, "", ""))
                    .collect(),
            )),
        }
    }

    fn fast_config() -> PlayerConfig {
        PlayerConfig {
            tick_interval_ms: 1,
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn test_play_to_completion_emits_events() {
        let (tx, rx) = mpsc::channel();
        let mut player = Player::open(routine(&[2, 2]), &fast_config(), tx);

        player.command(Command::Start).unwrap();
        player.wait();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[1], PlayerEvent::Advanced(ref s) if s.current_index == 1));
        match events.last() {
            Some(PlayerEvent::Completed(snapshot)) => {
                assert_eq!(snapshot.completed_count, 2);
                assert_eq!(snapshot.remaining_seconds, 0);
                assert!(!snapshot.is_running);
            }
            other => panic!("Expected completion, got {:?}", other),
        }

        let record = player.completion_record(&StatsPolicy::default()).unwrap();
        assert_eq!(record.routine_id, "quick");
        assert_eq!(record.update.calories_burned, 50);
        assert_eq!(record.update.minutes_active, 1);
        player.close();
    }

    #[test]
    fn test_pause_command_stops_driver() {
        let (tx, _rx) = mpsc::channel();
        let mut player = Player::open(routine(&[10_000]), &fast_config(), tx);

        player.command(Command::Toggle).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        player.command(Command::Toggle).unwrap();

        let paused = player.snapshot().unwrap();
        assert_eq!(paused.status, PlayerStatus::Paused);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(player.snapshot().unwrap(), paused);
    }

    #[test]
    fn test_skip_while_paused_keeps_driver_idle() {
        let (tx, rx) = mpsc::channel();
        let mut player = Player::open(routine(&[5, 5, 5]), &fast_config(), tx);

        assert_eq!(player.command(Command::SkipForward).unwrap(), Outcome::Moved { index: 1 });
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(rx.try_recv().is_err());
        assert_eq!(player.snapshot().unwrap().remaining_seconds, 5);
    }

    #[test]
    fn test_open_routine_resets_session() {
        let (tx, _rx) = mpsc::channel();
        let mut player = Player::open(routine(&[10_000]), &fast_config(), tx);
        player.command(Command::Start).unwrap();

        player.open_routine(routine(&[3, 4])).unwrap();
        let snapshot = player.snapshot().unwrap();
        assert_eq!(snapshot.status, PlayerStatus::Idle);
        assert_eq!(snapshot.total, 2);
        assert_eq!(snapshot.completed_count, 0);
        assert_eq!(player.sequence().unwrap().len(), 2);
    }

    #[test]
    fn test_default_sequence_can_be_disabled() {
        let (tx, _rx) = mpsc::channel();
        let mut empty = routine(&[]);
        empty.exercises = None;
        let config = PlayerConfig {
            use_default_sequence: false,
            ..fast_config()
        };

        let mut player = Player::open(empty, &config, tx);
        assert_eq!(player.command(Command::Start).unwrap(), Outcome::Ignored);
        assert_eq!(player.snapshot().unwrap().total, 0);
        assert_eq!(player.routine().name, "Quick");
    }
}
