//! Springshare widget contract.

pub mod formatter;

pub use formatter::{ResultFormatter, default_url_replace_chars, normalize_title_for_url};
