//! Per-category version tokens for client-side cache invalidation.
//!
//! Each category owns an atomic counter, so bumps of unrelated categories
//! never contend on a lock. The category map itself is only write-locked the
//! first time a category is seen.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Serialize, Serializer};

/// Opaque version token. Clients only compare tokens for equality.
///
/// `generation` identifies the process lifetime so tokens issued before a
/// restart never equal tokens issued after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionToken {
    generation: u64,
    sequence: u64,
}

impl VersionToken {
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}-{}", self.generation, self.sequence)
    }
}

impl Serialize for VersionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Process-wide map from category name to its current version token.
#[derive(Debug)]
pub struct VersionKeyStore {
    generation: u64,
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl Default for VersionKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionKeyStore {
    /// Creates a store whose generation is the current wall-clock time in milliseconds.
    #[must_use]
    pub fn new() -> Self {
        let generation = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        Self::with_generation(generation)
    }

    #[must_use]
    pub fn with_generation(generation: u64) -> Self {
        Self {
            generation,
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Registers categories so they appear in [`Self::get_all`] before their first bump.
    #[must_use]
    pub fn with_categories<'a>(self, categories: impl IntoIterator<Item = &'a str>) -> Self {
        for category in categories {
            self.counter(category);
        }
        self
    }

    /// Returns the current token; a never-bumped category is at sequence zero.
    #[must_use]
    pub fn get(&self, category: &str) -> VersionToken {
        let sequence = self
            .read()
            .get(category)
            .map_or(0, |counter| counter.load(Ordering::Acquire));
        self.token(sequence)
    }

    /// Snapshot of every known category.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<String, VersionToken> {
        self.read()
            .iter()
            .map(|(category, counter)| {
                (category.clone(), self.token(counter.load(Ordering::Acquire)))
            })
            .collect()
    }

    /// Advances the category and returns its new token.
    ///
    /// Concurrent bumps of the same category each observe a distinct sequence.
    pub fn bump(&self, category: &str) -> VersionToken {
        let sequence = self.counter(category).fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(category, sequence, "Version bumped");
        self.token(sequence)
    }

    /// Advances every known category, forcing clients to refetch everything.
    pub fn bump_all(&self) -> BTreeMap<String, VersionToken> {
        let categories: Vec<String> = self.read().keys().cloned().collect();
        categories
            .into_iter()
            .map(|category| {
                let token = self.bump(&category);
                (category, token)
            })
            .collect()
    }

    const fn token(&self, sequence: u64) -> VersionToken {
        VersionToken {
            generation: self.generation,
            sequence,
        }
    }

    fn counter(&self, category: &str) -> Arc<AtomicU64> {
        if let Some(counter) = self.read().get(category) {
            return Arc::clone(counter);
        }

        let mut counters = match self.counters.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.counters.clear_poison();
                poisoned.into_inner()
            }
        };
        Arc::clone(
            counters
                .entry(category.to_string())
                .or_insert_with(|| Arc::new(AtomicU64::new(0))),
        )
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<AtomicU64>>> {
        match self.counters.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.counters.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}
