//! Dataset loading with request supersession
//!
//! The loader owns the "current dataset" of a dashboard panel. Every load
//! takes a ticket from the request tracker; when the response arrives it is
//! applied only if no newer load has started in the meantime.

use std::sync::Arc;
use parking_lot::RwLock;
use fd_core::events::events::{DatasetFailed, DatasetLoaded, QuerySaved, ResponseSuperseded};
use fd_core::{Dataset, EventBus, RequestTicket, RequestTracker};

use crate::query::{SaveQueryRequest, SavedQuery};
use crate::sources::DataApi;
use crate::DataError;

/// What the panel currently shows
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading {
        source: String,
    },
    Loaded {
        source: String,
        dataset: Arc<Dataset>,
    },
    Failed {
        source: String,
        message: String,
    },
}

/// Loads datasets and saved queries for one panel
pub struct DatasetLoader {
    api: Arc<dyn DataApi>,
    tracker: RequestTracker,
    state: Arc<RwLock<LoadState>>,
    last_query: Arc<RwLock<Option<SavedQuery>>>,
    events: EventBus,
}

impl DatasetLoader {
    /// Create a loader backed by `api`, publishing to `events`
    pub fn new(api: Arc<dyn DataApi>, events: EventBus) -> Self {
        Self {
            api,
            tracker: RequestTracker::new(),
            state: Arc::new(RwLock::new(LoadState::Idle)),
            last_query: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Load a data source. Returns whether the response was applied.
    pub async fn load(&self, source: &str) -> bool {
        let ticket = self.begin(source);
        let result = self.api.fetch_dataset(source).await;
        self.apply(&ticket, result)
    }

    /// Execute a saved query and show its rows. Returns whether the
    /// response was applied.
    pub async fn run_saved_query(&self, query: &SavedQuery) -> bool {
        let ticket = self.begin(&query.data_source);
        *self.last_query.write() = Some(query.clone());
        let result = self.api.execute_query(query.id).await;
        self.apply(&ticket, result)
    }

    /// Validate and persist a query
    pub async fn save_query(&self, request: SaveQueryRequest) -> Result<SavedQuery, DataError> {
        request.validate()?;
        let saved = self.api.create_query(&request).await?;
        tracing::info!("Saved query '{}' as #{}", saved.name, saved.id);

        self.events.publish(QuerySaved {
            query_id: saved.id,
            name: saved.name.clone(),
        });
        *self.last_query.write() = Some(saved.clone());
        Ok(saved)
    }

    /// Saved queries visible to the user
    pub async fn saved_queries(&self) -> Result<Vec<SavedQuery>, DataError> {
        Ok(self.api.list_queries().await?)
    }

    /// Drop whatever is in flight, e.g. when the panel closes.
    ///
    /// A pending load returns to `Idle`; an applied result is kept.
    pub fn cancel(&self) {
        self.tracker.cancel();
        let mut state = self.state.write();
        if matches!(*state, LoadState::Loading { .. }) {
            tracing::debug!("Load cancelled");
            *state = LoadState::Idle;
        }
    }

    pub fn state(&self) -> LoadState {
        self.state.read().clone()
    }

    /// The loaded dataset, if the last applied load succeeded
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        match &*self.state.read() {
            LoadState::Loaded { dataset, .. } => Some(dataset.clone()),
            _ => None,
        }
    }

    /// The error message, if the last applied load failed
    pub fn error(&self) -> Option<String> {
        match &*self.state.read() {
            LoadState::Failed { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    /// The most recently loaded or saved query
    pub fn last_loaded_query(&self) -> Option<SavedQuery> {
        self.last_query.read().clone()
    }

    fn begin(&self, source: &str) -> RequestTicket {
        let ticket = self.tracker.begin(source);
        *self.state.write() = LoadState::Loading {
            source: source.to_string(),
        };
        tracing::debug!("Loading {} (generation {})", source, ticket.generation);
        ticket
    }

    fn apply(&self, ticket: &RequestTicket, result: anyhow::Result<Dataset>) -> bool {
        if !self.tracker.is_current(ticket) {
            tracing::debug!(
                "Dropping response for {} (generation {}, current {})",
                ticket.key,
                ticket.generation,
                self.tracker.generation()
            );
            self.events.publish(ResponseSuperseded {
                source_name: ticket.key.clone(),
                generation: ticket.generation,
            });
            return false;
        }

        let source = ticket.key.clone();
        let next = match result {
            Ok(dataset) => {
                tracing::info!("Loaded {} rows from {}", dataset.len(), source);
                self.events.publish(DatasetLoaded {
                    source_name: source.clone(),
                    row_count: dataset.len(),
                    column_count: dataset.columns.len(),
                });
                LoadState::Loaded {
                    source,
                    dataset: Arc::new(dataset),
                }
            }
            Err(err) => {
                let message = format!("{:#}", err);
                tracing::error!("Failed to load {}: {}", source, message);
                self.events.publish(DatasetFailed {
                    source_name: source.clone(),
                    error: message.clone(),
                });
                LoadState::Failed { source, message }
            }
        };
        *self.state.write() = next;
        true
    }
}
