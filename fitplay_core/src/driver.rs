//! Periodic tick driver for a running session.
//!
//! The driver owns at most one background timer thread. While the shared
//! session is `Running` it applies one `Tick` per interval; as soon as the
//! session is found in any other state the thread exits on its own. `stop()`
//! cancels and joins the thread, and dropping the driver stops it, so a timer
//! can never outlive the view that started it.

use crate::session::{Command, Outcome, Session};
use crate::SessionSnapshot;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Session shared between the driver thread and host commands
pub type SharedSession = Arc<Mutex<Session>>;

/// Wrap a session for use with a [`Driver`]
pub fn share(session: Session) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Receives a snapshot after every tick the driver applies
pub trait TickListener: Send + 'static {
    fn on_tick(&mut self, snapshot: &SessionSnapshot, outcome: Outcome);
}

impl<F> TickListener for F
where
    F: FnMut(&SessionSnapshot, Outcome) + Send + 'static,
{
    fn on_tick(&mut self, snapshot: &SessionSnapshot, outcome: Outcome) {
        self(snapshot, outcome)
    }
}

struct Timer {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

/// Cancellable once-per-interval tick source
pub struct Driver {
    interval: Duration,
    timer: Option<Timer>,
}

impl Driver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking `session`, replacing any timer already scheduled
    pub fn start<L: TickListener>(&mut self, session: SharedSession, listener: L) {
        self.stop();

        let (cancel, cancelled) = channel::<()>();
        let interval = self.interval;
        let handle = thread::spawn(move || run_timer(session, interval, cancelled, listener));

        tracing::debug!("Driver scheduled every {:?}", interval);
        self.timer = Some(Timer { cancel, handle });
    }

    /// Cancel the timer; a no-op when nothing is scheduled
    pub fn stop(&mut self) {
        let Some(timer) = self.timer.take() else {
            return;
        };

        // A closed channel just means the thread already exited
        let _ = timer.cancel.send(());
        if timer.handle.thread().id() == thread::current().id() {
            return;
        }
        if timer.handle.join().is_err() {
            tracing::error!("Driver thread panicked");
        }
        tracing::debug!("Driver stopped");
    }

    /// Block until the current timer exits on its own (session left `Running`)
    pub fn wait(&mut self) {
        if let Some(timer) = self.timer.take() {
            if timer.handle.join().is_err() {
                tracing::error!("Driver thread panicked");
            }
        }
    }

    /// Whether a timer thread is currently alive
    pub fn is_scheduled(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_timer<L: TickListener>(
    session: SharedSession,
    interval: Duration,
    cancelled: Receiver<()>,
    mut listener: L,
) {
    loop {
        match cancelled.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let (snapshot, outcome) = {
            let mut session = match session.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::error!("Session lock poisoned, stopping driver");
                    break;
                }
            };
            if !session.is_running() {
                tracing::debug!("Session is {:?}, driver exiting", session.status());
                break;
            }
            let outcome = session.apply(Command::Tick);
            (session.snapshot(), outcome)
        };

        // Outside the lock so listeners may inspect or command the session
        listener.on_tick(&snapshot, outcome);

        if !snapshot.is_running {
            break;
        }
    }
}
