//! TTL Policy Module
//!
//! Maps semantic data categories to time-to-live values. Callers pass either
//! raw seconds or a category name; unknown names never fail, they fall back
//! to the most conservative (longest) TTL.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::warn;

// == Category TTLs (seconds) ==
/// Rarely-changing reference data
pub const REFERENCE_TTL_SECS: u64 = 4 * 60 * 60;

/// Schedule / fixture data
pub const SCHEDULE_TTL_SECS: u64 = 12 * 60 * 60;

/// Near-real-time data
pub const LIVE_TTL_SECS: u64 = 2 * 60;

/// Used for unrecognized categories
pub const FALLBACK_TTL_SECS: u64 = SCHEDULE_TTL_SECS;

// == TTL Category ==
/// Built-in data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlCategory {
    Reference,
    Schedule,
    Live,
}

impl TtlCategory {
    pub const ALL: [TtlCategory; 3] = [Self::Reference, Self::Schedule, Self::Live];

    /// Category name as accepted by [`TtlPolicy::resolve`].
    pub fn as_str(&self) -> &'static str {
        match self {
            TtlCategory::Reference => "reference",
            TtlCategory::Schedule => "schedule",
            TtlCategory::Live => "live",
        }
    }

    pub fn default_secs(&self) -> u64 {
        match self {
            TtlCategory::Reference => REFERENCE_TTL_SECS,
            TtlCategory::Schedule => SCHEDULE_TTL_SECS,
            TtlCategory::Live => LIVE_TTL_SECS,
        }
    }
}

impl fmt::Display for TtlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == TTL Input ==
/// What a caller passes as a TTL: raw seconds or a category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtlInput {
    Seconds(u64),
    Category(String),
}

impl From<u64> for TtlInput {
    fn from(secs: u64) -> Self {
        TtlInput::Seconds(secs)
    }
}

impl From<Duration> for TtlInput {
    fn from(ttl: Duration) -> Self {
        TtlInput::Seconds(ttl.as_secs())
    }
}

impl From<&str> for TtlInput {
    fn from(category: &str) -> Self {
        TtlInput::Category(category.to_string())
    }
}

impl From<String> for TtlInput {
    fn from(category: String) -> Self {
        TtlInput::Category(category)
    }
}

impl From<TtlCategory> for TtlInput {
    fn from(category: TtlCategory) -> Self {
        TtlInput::Category(category.as_str().to_string())
    }
}

// == TTL Policy ==
/// Category -> seconds table with a fallback for unknown names.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    table: HashMap<String, u64>,
    fallback_secs: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        let table = TtlCategory::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), c.default_secs()))
            .collect();
        Self {
            table,
            fallback_secs: FALLBACK_TTL_SECS,
        }
    }
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overrides a category.
    pub fn with_category(mut self, name: impl Into<String>, secs: u64) -> Self {
        self.table.insert(name.into(), secs);
        self
    }

    pub fn with_fallback(mut self, secs: u64) -> Self {
        self.fallback_secs = secs;
        self
    }

    /// Resolves a TTL input to seconds.
    ///
    /// Raw seconds pass through unchanged. Unknown category names log a
    /// warning and resolve to the fallback.
    pub fn resolve(&self, input: &TtlInput) -> u64 {
        match input {
            TtlInput::Seconds(secs) => *secs,
            TtlInput::Category(name) => match self.table.get(name) {
                Some(secs) => *secs,
                None => {
                    warn!(
                        category = %name,
                        fallback_secs = self.fallback_secs,
                        "unknown TTL category, using fallback"
                    );
                    self.fallback_secs
                }
            },
        }
    }
}
