//! Referrer -> OCLC library symbol resolution.

use std::time::{Duration, Instant};

pub const DEFAULT_LOOKUP_BUDGET: Duration = Duration::from_secs(5);

/// Maps the page a search came from to the library whose holdings should
/// be searched. Resolution never fails: anything unexpected yields the
/// default symbol.
#[derive(Debug, Clone)]
pub struct LibraryResolver {
    /// Domain -> symbol, checked in insertion order
    mappings: Vec<(String, String)>,
    default_symbol: String,
    budget: Duration,
}

impl LibraryResolver {
    pub fn new(mappings: Vec<(String, String)>, default_symbol: impl Into<String>) -> Self {
        Self {
            mappings,
            default_symbol: default_symbol.into(),
            budget: DEFAULT_LOOKUP_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn default_symbol(&self) -> &str {
        &self.default_symbol
    }

    pub fn resolve(&self, referrer: Option<&str>) -> String {
        let Some(referrer) = referrer.map(str::trim).filter(|r| !r.is_empty()) else {
            return self.default_symbol.clone();
        };

        let referrer = referrer.to_lowercase();
        let started = Instant::now();

        for (domain, symbol) in &self.mappings {
            if started.elapsed() >= self.budget {
                tracing::warn!(
                    "Library lookup for '{}' exceeded {:?}, using default {}",
                    referrer,
                    self.budget,
                    self.default_symbol
                );
                return self.default_symbol.clone();
            }

            if domain.is_empty() || symbol.is_empty() {
                continue;
            }

            if referrer.contains(&domain.to_lowercase()) {
                tracing::info!("Referrer '{}' matched {} -> {}", referrer, domain, symbol);
                return symbol.clone();
            }
        }

        tracing::debug!("No library mapping for '{}', using default", referrer);
        self.default_symbol.clone()
    }
}
