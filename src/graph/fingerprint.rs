//! Structural fingerprints: a BLAKE3 hash of a graph up to key renaming.
//!
//! Keys are replaced by their position in key order and labels are
//! ignored, so two compilations of the same tree hash equal even when they
//! drew keys from different allocators.

use std::collections::HashMap;
use std::fmt;

use super::{Descriptor, Graph, Key, Target};

const FINGERPRINT_VERSION: u8 = 1;

/// Crockford base-32 digits (no `i`, `l`, `o`, `u`).
const DIGITS: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// A 256-bit BLAKE3 structural hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// The leading 40 bits as eight base-32 digits.
    pub fn to_short(&self) -> String {
        let prefix = self.0[..5]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        (0..8)
            .rev()
            .map(|i| DIGITS[((prefix >> (i * 5)) & 0x1f) as usize] as char)
            .collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

impl Graph {
    /// Hash the graph structure together with the position of `root`.
    pub fn fingerprint(&self, root: &Key) -> Fingerprint {
        let position: HashMap<&Key, u64> = self
            .keys()
            .enumerate()
            .map(|(i, key)| (key, i as u64))
            .collect();
        // Keys outside the graph hash as u64::MAX.
        let pos = |key: &Key| position.get(key).copied().unwrap_or(u64::MAX);

        let mut hasher = blake3::Hasher::new();
        hasher.update(&[FINGERPRINT_VERSION]);
        hasher.update(&(self.len() as u64).to_le_bytes());
        for descriptor in self.entries.values() {
            match descriptor {
                Descriptor::Literal(value) => {
                    hasher.update(&[0]);
                    value.hash_into(&mut hasher);
                }
                Descriptor::Apply {
                    target,
                    args,
                    kwargs,
                } => {
                    hasher.update(&[1]);
                    match target {
                        Target::Function(f) => {
                            hasher.update(&[0]);
                            hasher.update(&(f.name().len() as u64).to_le_bytes());
                            hasher.update(f.name().as_bytes());
                        }
                        Target::Key(key) => {
                            hasher.update(&[1]);
                            hasher.update(&pos(key).to_le_bytes());
                        }
                    }
                    hasher.update(&(args.len() as u64).to_le_bytes());
                    for arg in args {
                        hasher.update(&pos(arg).to_le_bytes());
                    }
                    hasher.update(&(kwargs.len() as u64).to_le_bytes());
                    for (name, arg) in kwargs {
                        hasher.update(&(name.len() as u64).to_le_bytes());
                        hasher.update(name.as_bytes());
                        hasher.update(&pos(arg).to_le_bytes());
                    }
                }
                Descriptor::Tuple(items) => {
                    hasher.update(&[2]);
                    hasher.update(&(items.len() as u64).to_le_bytes());
                    for item in items {
                        hasher.update(&pos(item).to_le_bytes());
                    }
                }
            }
        }
        hasher.update(&pos(root).to_le_bytes());
        Fingerprint(*hasher.finalize().as_bytes())
    }
}
