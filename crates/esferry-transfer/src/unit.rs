//! Units of work
//!
//! A transfer moves one unit of work at a time: either one calendar day of
//! records (selected by a time-range filter) or one whole index. The unit key
//! is what the checkpoint log stores, so keys must be stable across runs.

use chrono::NaiveDate;
use esferry_common::{Result, TransferError};
use serde_json::{json, Value};

/// Seconds covered by one date unit
const SECONDS_PER_DAY: i64 = 86_400;

/// What a unit of work selects from the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitScope {
    /// One calendar day, as a `[start, end)` epoch-seconds range
    Day { start: i64, end: i64 },
    /// One whole index, match-all
    Index,
}

/// One resumable unit of transfer, keyed for the checkpoint log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    key: String,
    scope: UnitScope,
}

impl WorkUnit {
    /// Build a date unit from a `YYYY-MM-DD` string.
    ///
    /// The range covers the whole UTC day: midnight inclusive to the next
    /// midnight exclusive. Anything unparsable is a configuration error; the
    /// CLI warns and skips such arguments.
    pub fn day(date: &str) -> Result<Self> {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| TransferError::config(format!("invalid date '{}': {}", date, e)))?;
        let midnight = parsed
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TransferError::config(format!("invalid date '{}'", date)))?;
        let start = midnight.and_utc().timestamp();

        Ok(Self {
            key: parsed.format("%Y-%m-%d").to_string(),
            scope: UnitScope::Day {
                start,
                end: start + SECONDS_PER_DAY,
            },
        })
    }

    /// Build an index unit from an index name
    pub fn index(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            scope: UnitScope::Index,
        }
    }

    /// Stable checkpoint key for this unit
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scope(&self) -> &UnitScope {
        &self.scope
    }

    /// Which index (or pattern) the unit searches
    pub fn index_for<'a>(&'a self, pattern: &'a str) -> &'a str {
        match self.scope {
            UnitScope::Day { .. } => pattern,
            UnitScope::Index => &self.key,
        }
    }

    /// The Elasticsearch query selecting this unit's documents
    pub fn query(&self, time_field: &str) -> Value {
        match self.scope {
            UnitScope::Day { start, end } => json!({
                "range": { time_field: { "gte": start, "lt": end } }
            }),
            UnitScope::Index => json!({ "match_all": {} }),
        }
    }
}

impl std::fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}
