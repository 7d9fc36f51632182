//! WorldCat Discovery adapter for the Springshare library search widget.
//!
//! Accepts the widget's search parameters, validates and normalizes them,
//! queries the OCLC WorldCat Discovery API with a cached OAuth token and
//! reshapes the records into the result format the widget renders.

pub mod api;
pub mod api_docs;
pub mod domain;
pub mod infrastructure;
pub mod models;
pub mod modules;
pub mod services;

pub use infrastructure::config;
pub use infrastructure::server;
