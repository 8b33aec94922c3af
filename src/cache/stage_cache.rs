//! Memo table for one pipeline stage.
//!
//! Entries are found by stable hash and confirmed by structural equality of
//! the full input, so a hash collision can never return the wrong output.
//! Entries not touched during a run are dropped by `sweep`, which keeps the
//! table sized to the current snapshot instead of every snapshot ever seen.

use super::{stable_hash, CacheValue};
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
}

#[derive(Debug)]
struct Entry<I, O> {
    input: I,
    output: O,
    last_used: u64,
}

#[derive(Debug)]
pub struct StageCache<I, O> {
    name: &'static str,
    entries: HashMap<u64, Vec<Entry<I, O>>>,
    generation: u64,
    stats: CacheStats,
}

impl<I: CacheValue, O: CacheValue> StageCache<I, O> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            generation: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Start a new run: bumps the generation and resets per-run stats.
    pub fn begin_run(&mut self) {
        self.generation += 1;
        self.stats = CacheStats::default();
    }

    /// Return the cached output for an equal input, or compute and store it.
    pub fn get_or_compute<F>(&mut self, input: &I, compute: F) -> O
    where
        F: FnOnce(&I) -> O,
    {
        let hash = stable_hash(input);
        let generation = self.generation;

        if let Some(entry) = self
            .entries
            .get_mut(&hash)
            .and_then(|bucket| bucket.iter_mut().find(|entry| entry.input == *input))
        {
            entry.last_used = generation;
            self.stats.hits += 1;
            trace!(stage = self.name, hash, "cache hit");
            return entry.output.clone();
        }

        self.stats.misses += 1;
        trace!(stage = self.name, hash, "cache miss");
        let output = compute(input);
        self.entries.entry(hash).or_default().push(Entry {
            input: input.clone(),
            output: output.clone(),
            last_used: generation,
        });
        output
    }

    /// Drop entries not used in the current run. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let generation = self.generation;
        let mut removed = 0;
        self.entries.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|entry| entry.last_used == generation);
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        self.stats.evictions += removed;
        removed
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
