//! Services Layer
//!
//! Business logic kept apart from the HTTP handlers so it can be driven
//! directly in tests.

pub mod search_service;

pub use search_service::SearchService;
