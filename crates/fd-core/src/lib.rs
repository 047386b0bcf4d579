//! Core types for the findash data layer
//!
//! This crate provides the tabular data model shared by the filter, query
//! and chart crates, plus the small pieces of shared plumbing: the event
//! bus, request supersession and the identity provider capability.

pub mod auth;
pub mod dataset;
pub mod events;
pub mod fetch;
pub mod value;

// Re-export commonly used types
pub use auth::{AuthProvider, Credential, Session, StaticCredentialProvider};
pub use dataset::{present, row_from, Dataset, Row};
pub use events::EventBus;
pub use fetch::{RequestTicket, RequestTracker};
pub use value::CellValue;
