//! Idle-timeout tracking for sessions.
//!
//! An [`IdleTimer`] is an explicit arm/reset/cancel abstraction over a
//! scheduled task: armed once when a session connects, reset on every
//! successful call, cancelled permanently on close. A deadline that moves
//! while the watcher sleeps re-arms instead of firing, so an in-flight reset
//! can never lose the race against expiry.

use std::{future::Future, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct IdleTimer {
    timeout: Duration,
    deadline: Arc<Mutex<Instant>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: Arc::new(Mutex::new(Instant::now())),
            cancel: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start (or restart) the watcher. `on_expire` runs exactly once, when
    /// the deadline passes without a reset.
    pub fn arm<F, Fut>(&self, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // Replace any previous watcher.
        self.cancel_watcher();

        let token = CancellationToken::new();
        *self.cancel.lock() = Some(token.clone());

        let deadline = Arc::clone(&self.deadline);
        *deadline.lock() = Instant::now() + self.timeout;

        tokio::spawn(async move {
            loop {
                let target = *deadline.lock();
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep_until(target) => {
                        // A successful call may have pushed the deadline out
                        // while we slept; only fire once it has truly passed.
                        if *deadline.lock() <= Instant::now() {
                            on_expire().await;
                            return;
                        }
                    }
                }
            }
        });
    }

    /// Push the deadline out by the full timeout. No-op unless armed.
    pub fn reset(&self) {
        if self.is_armed() {
            *self.deadline.lock() = Instant::now() + self.timeout;
        }
    }

    /// Stop the watcher permanently. Idempotent.
    pub fn cancel(&self) {
        self.cancel_watcher();
    }

    pub fn is_armed(&self) -> bool {
        self.cancel.lock().is_some()
    }

    /// True when armed and the deadline has passed. Used by expiry handlers
    /// to re-check after acquiring locks: a reset or re-arm that happened in
    /// the meantime withdraws the expiry.
    pub fn is_expired(&self) -> bool {
        self.is_armed() && *self.deadline.lock() <= Instant::now()
    }

    fn cancel_watcher(&self) {
        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel_watcher();
    }
}
