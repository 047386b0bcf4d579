//! Request supersession
//!
//! Switching data sources quickly leaves several fetches in flight. Each
//! fetch takes a ticket from the tracker; only the ticket of the most recent
//! request is current, so a slow response to an older request is dropped
//! instead of overwriting newer data.

use std::sync::Arc;
use parking_lot::RwLock;

/// Tracker state stored internally
#[derive(Debug, Default)]
struct TrackerState {
    generation: u64,
    key: Option<String>,
}

/// Hands out request tickets and decides which one is still current
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    state: Arc<RwLock<TrackerState>>,
}

/// Proof of having issued a request at a given generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub generation: u64,
    pub key: String,
}

impl RequestTracker {
    /// Create a new tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket
    pub fn begin(&self, key: impl Into<String>) -> RequestTicket {
        let mut state = self.state.write();
        state.generation += 1;
        let key = key.into();
        state.key = Some(key.clone());
        RequestTicket {
            generation: state.generation,
            key,
        }
    }

    /// Whether `ticket` belongs to the latest request
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.state.read().generation == ticket.generation
    }

    /// Invalidate all outstanding tickets without starting a new request
    pub fn cancel(&self) {
        let mut state = self.state.write();
        state.generation += 1;
        if let Some(key) = state.key.take() {
            tracing::debug!("Cancelled request for {} (now generation {})", key, state.generation);
        }
    }

    /// Key of the latest request, if one is outstanding or completed
    pub fn current_key(&self) -> Option<String> {
        self.state.read().key.clone()
    }

    /// Current generation number
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let tracker = RequestTracker::new();
        let first = tracker.begin("financials");
        let second = tracker.begin("treasury");

        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
        assert_eq!(tracker.current_key().as_deref(), Some("treasury"));
    }

    #[test]
    fn test_cancel_invalidates_everything() {
        let tracker = RequestTracker::new();
        let ticket = tracker.begin("regional");
        tracker.cancel();

        assert!(!tracker.is_current(&ticket));
        assert!(tracker.current_key().is_none());
        assert_eq!(tracker.generation(), 2);
    }
}
