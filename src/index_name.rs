use std::fmt;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

use crate::error::ConfigError;

/// Destination index for a single write: `prefix-date_suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub prefix: String,
    pub date_suffix: String,
}

impl IndexTarget {
    pub fn name(&self) -> String {
        format!("{}-{}", self.prefix, self.date_suffix)
    }
}

impl fmt::Display for IndexTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.date_suffix)
    }
}

/// Computes time-bucketed index names from a prefix and a `strftime` pattern.
///
/// `%Y.%m.%d` rotates daily, `%Y.%m` monthly, `%G.%V` weekly. The pattern is
/// checked once in [`IndexNameResolver::new`] so resolving never fails.
#[derive(Debug, Clone)]
pub struct IndexNameResolver {
    prefix: String,
    pattern: String,
}

impl IndexNameResolver {
    pub fn new(prefix: impl Into<String>, pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let prefix = prefix.into();
        let pattern = pattern.into();

        if prefix.is_empty() {
            return Err(ConfigError::EmptyIndexPrefix);
        }
        if pattern.is_empty() || StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidSuffixPattern(pattern));
        }

        Ok(IndexNameResolver { prefix, pattern })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Resolve the target for an explicit point in time.
    pub fn resolve_at(&self, now: DateTime<Utc>) -> IndexTarget {
        IndexTarget {
            prefix: self.prefix.clone(),
            date_suffix: now.format(&self.pattern).to_string(),
        }
    }

    /// Resolve the target for the current wall-clock time.
    pub fn resolve(&self) -> IndexTarget {
        self.resolve_at(Utc::now())
    }
}
