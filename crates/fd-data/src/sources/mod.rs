pub mod batch;
pub mod csv_source;
pub mod http_source;
pub mod json_source;

use async_trait::async_trait;
use indexmap::IndexMap;
use fd_core::{Credential, Dataset, Row, Session};

use crate::query::{SaveQueryRequest, SavedQuery};

pub use batch::fetch_time_series;
pub use csv_source::{CsvOptions, CsvSource};
pub use http_source::HttpDataApi;
pub use json_source::{decode_payload, decode_payload_str};

/// Rows per entity returned by a batched time-series request
pub type TimeSeriesBatch = IndexMap<String, Vec<Row>>;

/// The backend data and query API
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Fetch the rows of a dataset
    async fn fetch_dataset(&self, source: &str) -> anyhow::Result<Dataset>;

    /// List saved queries visible to the current user
    async fn list_queries(&self) -> anyhow::Result<Vec<SavedQuery>>;

    /// Persist a new saved query
    async fn create_query(&self, request: &SaveQueryRequest) -> anyhow::Result<SavedQuery>;

    /// Run a saved query on the backend
    async fn execute_query(&self, query_id: i64) -> anyhow::Result<Dataset>;

    /// Fetch time series for several entities in one request
    async fn time_series_batch(&self, entities: &[String]) -> anyhow::Result<TimeSeriesBatch>;

    /// Exchange an identity provider credential for a backend session
    async fn exchange_credential(&self, credential: &Credential) -> anyhow::Result<Session>;

    /// Name used in logs
    fn source_name(&self) -> &str;
}
