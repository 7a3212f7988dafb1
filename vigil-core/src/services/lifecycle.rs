//! Session lifecycle management.
//!
//! Auto-terminates an authenticated session after a period of inactivity.
//! Arming spawns a single watcher task that races the activity stream
//! against a deadline; every observed signal abandons the pending deadline
//! and starts a fresh one, so only the latest signal's deadline is ever
//! honored. When the deadline elapses the sign-out hook runs best-effort and
//! the watcher stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::auth::SignOutHook;

/// A user-activity signal observed while a session is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PointerMove,
    KeyPress,
    Scroll,
}

/// Source of user-activity signals.
///
/// The lifecycle manager subscribes on arm and unsubscribes on disarm by
/// dropping the receiver.
pub trait ActivitySignalSource: Send + Sync + 'static {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ActivitySignal>;
}

/// In-process [`ActivitySignalSource`] for hosts that push activity signals
/// directly (a UI event loop forwarding pointer, key, and scroll events).
///
/// Each `subscribe` opens a fresh channel; `report` fans the signal out to
/// every live subscriber and prunes the ones whose receiver was dropped.
#[derive(Default)]
pub struct ActivityBroadcaster {
    subscribers: std::sync::Mutex<Vec<mpsc::UnboundedSender<ActivitySignal>>>,
}

impl ActivityBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report one user-activity signal to all subscribers.
    pub fn report(&self, signal: ActivitySignal) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(signal).is_ok());
    }
}

impl ActivitySignalSource for ActivityBroadcaster {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ActivitySignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}

struct ArmedWatcher {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Inactivity watcher for the active session.
///
/// At most one watcher task exists at a time: arming while armed replaces
/// the previous watcher, and `disarm` is idempotent.
pub struct SessionLifecycleManager {
    timeout: Duration,
    armed: Mutex<Option<ArmedWatcher>>,
}

impl SessionLifecycleManager {
    pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            armed: Mutex::new(None),
        }
    }

    /// Start watching for inactivity.
    ///
    /// The deadline is `now + timeout`; each signal received on `signals`
    /// resets it. When the deadline elapses unreset, `hook.sign_out()` runs
    /// and its error is swallowed. Closing the signal source also stops the
    /// watcher (nothing left to observe means nothing can reset the timer,
    /// but the owner tearing down its source is a disarm, not an expiry).
    pub async fn arm(
        &self,
        mut signals: mpsc::UnboundedReceiver<ActivitySignal>,
        hook: Arc<dyn SignOutHook>,
    ) {
        let mut armed = self.armed.lock().await;
        if let Some(previous) = armed.take() {
            previous.stop();
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let timeout = self.timeout;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Disarm wins over a simultaneously expired deadline.
                    biased;
                    _ = shutdown_rx.changed() => break,
                    signal = signals.recv() => match signal {
                        Some(_) => continue, // fresh deadline on the next iteration
                        None => break,       // signal source closed
                    },
                    _ = tokio::time::sleep(timeout) => {
                        tracing::info!("Inactivity timeout elapsed, signing out");
                        if let Err(e) = hook.sign_out().await {
                            tracing::warn!(error = %e, "Sign-out after inactivity failed");
                        }
                        break;
                    }
                }
            }
        });

        *armed = Some(ArmedWatcher {
            shutdown: shutdown_tx,
            handle,
        });
    }

    /// Stop watching. Idempotent; safe to call when never armed.
    pub async fn disarm(&self) {
        if let Some(watcher) = self.armed.lock().await.take() {
            watcher.stop();
        }
    }

    /// Whether a live watcher is installed.
    ///
    /// A watcher whose task already finished (deadline elapsed, or the
    /// signal source closed) no longer counts as armed; the stale slot is
    /// cleared on the way out.
    pub async fn is_armed(&self) -> bool {
        let mut armed = self.armed.lock().await;
        match armed.as_ref() {
            Some(watcher) if !watcher.handle.is_finished() => true,
            Some(_) => {
                *armed = None;
                false
            }
            None => false,
        }
    }
}

impl ArmedWatcher {
    fn stop(self) {
        // The task exits on the shutdown signal; abort covers the case where
        // the receiver side is already gone.
        if self.shutdown.send(true).is_err() {
            self.handle.abort();
        }
    }
}

impl Drop for SessionLifecycleManager {
    fn drop(&mut self) {
        if let Some(watcher) = self.armed.get_mut().take() {
            watcher.stop();
        }
    }
}
