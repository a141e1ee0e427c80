// Current-location handle shared by the guard and the session manager

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Route users are sent to whenever their session ends
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Shared handle to the current route.
///
/// Cloning is cheap; all clones observe the same location.
#[derive(Clone)]
pub struct Navigation {
    location: Arc<watch::Sender<String>>,
    replacements: Arc<AtomicU64>,
}

impl Navigation {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self {
            location: Arc::new(tx),
            replacements: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current route path
    pub fn current(&self) -> String {
        self.location.borrow().clone()
    }

    /// Replace the current location without running the guard
    pub fn replace(&self, path: &str) {
        tracing::debug!(from = %self.current(), to = %path, "Replacing location");
        self.location.send_replace(path.to_string());
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of times the location has been replaced
    pub fn replacements(&self) -> u64 {
        self.replacements.load(Ordering::Relaxed)
    }

    /// Receiver notified on every location change
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new("/")
    }
}
