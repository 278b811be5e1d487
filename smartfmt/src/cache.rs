//! Caching of parsed templates.
//!
//! Parsing is the expensive half of a format call that repeats the same
//! template, so callers that format the same text many times keep a
//! [`FormatCache`] next to their formatter. The cache is explicit and
//! caller-scoped, never global; entries are keyed by both the template
//! text and a fingerprint of the parser settings they were parsed under,
//! so changing settings can never serve a stale tree.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ast::Format;
use crate::error::ParseErrors;
use crate::parser::Parser;

type Key = (u64, String);
type Entries = HashMap<Key, Arc<Format>>;

/// A cache binding template strings to their parsed trees.
///
/// Safe for concurrent readers; writes are serialized internally.
#[derive(Debug, Default)]
pub struct FormatCache {
    entries: RwLock<Entries>,
}

impl FormatCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached tree for `template` under `parser`'s settings,
    /// parsing and inserting it on a miss.
    pub fn get_or_parse(
        &self,
        parser: &Parser,
        template: &str,
    ) -> Result<Arc<Format>, ParseErrors> {
        let key = (parser.settings().fingerprint(), template.to_string());
        if let Some(found) = read_lock(&self.entries).get(&key) {
            trace!("cache hit for template ({} bytes)", template.len());
            return Ok(found.clone());
        }
        trace!("cache miss for template ({} bytes)", template.len());
        let parsed = Arc::new(parser.parse(template)?);
        let mut entries = write_lock(&self.entries);
        // a racing call may have inserted meanwhile; keep the first tree
        let entry = entries.entry(key).or_insert_with(|| parsed.clone());
        Ok(entry.clone())
    }

    /// The number of cached trees.
    pub fn len(&self) -> usize {
        read_lock(&self.entries).len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        write_lock(&self.entries).clear();
    }
}

fn read_lock(lock: &RwLock<Entries>) -> RwLockReadGuard<'_, Entries> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock(lock: &RwLock<Entries>) -> RwLockWriteGuard<'_, Entries> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
