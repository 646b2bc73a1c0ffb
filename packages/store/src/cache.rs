//! Reusable SQL statement cache.
//!
//! The address query has one `OR` clause per street-name variant, so its
//! text depends on how many names a caller supplies. Generated statements
//! are cached per (store identity, name count). The cache is owned by
//! whoever opens stores and injected into them, so several stores can
//! share one, and tests can inspect it.
//!
//! Entries are write-once: the first caller for a key populates it and
//! later callers reuse it. Two concurrent first callers may both build
//! the statement; the loser's copy is discarded.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Key of a cached statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey {
    /// Identity of the store the statement was built for.
    pub store: String,
    /// Number of name conditions in the statement.
    pub name_count: usize,
}

/// Shared cache of generated SQL statements.
#[derive(Debug, Default)]
pub struct StatementCache {
    statements: RwLock<BTreeMap<CacheKey, Arc<str>>>,
}

impl StatementCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached statement for `key`, building it with `build`
    /// on first use.
    pub fn get_or_insert_with(&self, key: CacheKey, build: impl FnOnce() -> String) -> Arc<str> {
        if let Ok(statements) = self.statements.read()
            && let Some(sql) = statements.get(&key)
        {
            return Arc::clone(sql);
        }

        let sql: Arc<str> = Arc::from(build());

        match self.statements.write() {
            Ok(mut statements) => Arc::clone(statements.entry(key).or_insert(sql)),
            Err(_) => sql,
        }
    }

    /// Number of cached statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.read().map_or(0, |s| s.len())
    }

    /// `true` when nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
