//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no Axum, no reqwest).
//! Only the error taxonomy shared by every pipeline stage.

pub mod errors;

pub use errors::{GENERIC_ERROR_MESSAGE, SearchError};
