//! Graph keys and the sources that allocate them.
//!
//! A key's identity is its sequence number. The label is cosmetic (usually
//! the callee's name) and carries no uniqueness responsibility.

use std::cell::Cell;
use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Key {
    seq: u64,
    label: Option<Arc<str>>,
}

impl Key {
    pub fn new(seq: u64, label: Option<&str>) -> Self {
        Self {
            seq,
            label: label.map(Arc::from),
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seq.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.seq.cmp(&other.seq)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}-{}", label, self.seq),
            None => write!(f, "k{}", self.seq),
        }
    }
}

/// Something that hands out never-repeating sequence numbers.
pub trait KeySource {
    fn next_seq(&self) -> u64;

    fn allocate(&self, label: Option<&str>) -> Key {
        Key::new(self.next_seq(), label)
    }
}

/// Counter owned by a single compilation. Not `Sync`.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    next: Cell<u64>,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(seq: u64) -> Self {
        Self {
            next: Cell::new(seq),
        }
    }
}

impl KeySource for KeyAllocator {
    fn next_seq(&self) -> u64 {
        let seq = self.next.get();
        self.next.set(seq + 1);
        seq
    }
}

/// Atomic counter that may be shared between concurrent compilations so
/// that their keys never collide.
#[derive(Debug, Default)]
pub struct SharedKeyAllocator {
    next: AtomicU64,
}

impl SharedKeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySource for SharedKeyAllocator {
    fn next_seq(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
