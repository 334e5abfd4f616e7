pub mod chain;
pub mod constants;
pub mod error;

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use chain::{Chain, Inconsistency};
pub use error::ChainError;

/// Nanoseconds since the Unix epoch. A clock set before the epoch reads as 0.
pub fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// A sealed record whose `hash` covers every other field.
///
/// Fields are read-only outside this crate; the only mutation path is
/// [`Chain::tamper`]. Serializes for display only; there is no way back in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    index: u64,
    previous_hash: String,
    timestamp: u64,
    transactions: Vec<String>,
    hash: String,
}

impl Block {
    /// Seals a new block stamped with the current wall-clock time.
    pub fn new(index: u64, previous_hash: impl Into<String>, transactions: Vec<String>) -> Self {
        Self::with_timestamp(index, previous_hash, now_nanos(), transactions)
    }

    pub fn with_timestamp(
        index: u64,
        previous_hash: impl Into<String>,
        timestamp: u64,
        transactions: Vec<String>,
    ) -> Self {
        let mut block = Self {
            index,
            previous_hash: previous_hash.into(),
            timestamp,
            transactions,
            hash: String::new(),
        };
        block.hash = block.digest();
        block
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[String] {
        &self.transactions
    }

    /// The hash stored at sealing time, not recomputed.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Canonical encoding fed to the hasher. Variable-length fields carry a
    /// little-endian length prefix so adjacent fields cannot run together.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let payload: usize = self.transactions.iter().map(|t| 8 + t.len()).sum();
        let mut bytes = Vec::with_capacity(8 + 8 + self.previous_hash.len() + 8 + 8 + payload);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        push_prefixed(&mut bytes, &self.previous_hash);
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            push_prefixed(&mut bytes, tx);
        }
        bytes
    }

    /// SHA-256 over [`Block::hash_bytes`] of the current field values, as lowercase hex.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.hash_bytes());
        hex::encode(hasher.finalize())
    }

    /// True while the stored hash still matches the block's content.
    pub fn is_sealed(&self) -> bool {
        self.hash == self.digest()
    }

    pub(crate) fn replace_transactions(&mut self, transactions: Vec<String>) {
        self.transactions = transactions;
    }

    /// Points the block at `previous_hash` and reseals it.
    pub(crate) fn relink(&mut self, previous_hash: String) {
        self.previous_hash = previous_hash;
        self.hash = self.digest();
    }
}

fn push_prefixed(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u64).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} {}", "Index:", self.index)?;
        writeln!(f, "{:<20} {}", "Previous Hash:", self.previous_hash)?;
        writeln!(f, "{:<20} {}", "Timestamp:", self.timestamp)?;
        writeln!(
            f,
            "{:<20} [{}]",
            "Block Transactions:",
            self.transactions.join(" ")
        )?;
        write!(f, "{:<20} {}", "Current Block Hash:", self.hash)
    }
}
