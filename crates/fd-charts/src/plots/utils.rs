//! Utilities for chart adapters

pub mod colors;

// Re-export commonly used items
pub use colors::{categorical_color, PALETTE};
