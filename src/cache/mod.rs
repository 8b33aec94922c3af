//! Caching contract and in-memory stage caches.
//!
//! The incremental host decides whether to rerun a stage by comparing the
//! stage's input with what it saw last time. That only works if every value
//! crossing a stage boundary:
//!
//! - compares structurally (`Eq`), with sequences compared in order
//! - hashes stably (`Hash`, fed to xxh64 with a fixed seed)
//! - owns its data, with no parser handles inside
//!
//! `CacheValue` captures all three as trait bounds. syn and proc-macro2 types
//! are `!Send`, so a stray AST handle inside a boundary value fails the
//! `Send + Sync` bound at compile time.

pub mod stage_cache;

use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use xxhash_rust::xxh64::Xxh64;

pub use stage_cache::{CacheStats, StageCache};

/// Marker for values allowed to cross a stage boundary.
pub trait CacheValue: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

const HASH_SEED: u64 = 0x5eed_2007_1e57_ab1e;

/// Hash that is identical across runs and processes.
pub fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = Xxh64::new(HASH_SEED);
    value.hash(&mut hasher);
    hasher.finish()
}

/// SHA-256 of file content, hex encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
