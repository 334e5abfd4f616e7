use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_TRANSACTION};
use crate::{Block, ChainError};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// The earliest defect found by a verification scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inconsistency {
    /// The block's content no longer matches its stored hash.
    HashMismatch {
        index: usize,
        stored: String,
        computed: String,
    },
    /// The block's `previous_hash` does not match its predecessor's stored hash.
    BrokenLink {
        index: usize,
        expected: String,
        found: String,
    },
}

impl Inconsistency {
    pub fn index(&self) -> usize {
        match self {
            Self::HashMismatch { index, .. } | Self::BrokenLink { index, .. } => *index,
        }
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashMismatch {
                index,
                stored,
                computed,
            } => write!(
                f,
                "block {index}: stored hash {stored} does not match content hash {computed}"
            ),
            Self::BrokenLink {
                index,
                expected,
                found,
            } => write!(
                f,
                "block {index}: previous hash {found} does not match predecessor hash {expected}"
            ),
        }
    }
}

/// An in-memory hash chain. Always holds at least the genesis block.
#[derive(Clone, Debug, Serialize)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new() -> Self {
        let genesis = genesis_block();
        info!(hash = %genesis.hash(), "created chain with genesis block");
        Self {
            blocks: vec![genesis],
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// The most recently appended block (genesis on a fresh chain).
    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Seals a block over `transactions`, linked to the current tip, and appends it.
    pub fn append(&mut self, transactions: Vec<String>) -> &Block {
        let previous_hash = self.tip().hash().to_string();
        let block = Block::new(self.blocks.len() as u64, previous_hash, transactions);
        debug!(
            index = block.index(),
            txs = block.transactions().len(),
            hash = %block.hash(),
            "appended block"
        );
        self.blocks.push(block);
        self.tip()
    }

    /// Scans blocks 1.. in order and returns the first defect. The genesis
    /// block is not checked against itself.
    pub fn first_inconsistency(&self) -> Option<Inconsistency> {
        for (i, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = i + 1;

            let computed = current.digest();
            if current.hash() != computed {
                return Some(Inconsistency::HashMismatch {
                    index,
                    stored: current.hash().to_string(),
                    computed,
                });
            }
            if current.previous_hash() != previous.hash() {
                return Some(Inconsistency::BrokenLink {
                    index,
                    expected: previous.hash().to_string(),
                    found: current.previous_hash().to_string(),
                });
            }
        }
        None
    }

    pub fn verify(&self) -> bool {
        match self.first_inconsistency() {
            Some(defect) => {
                warn!(index = defect.index(), "chain verification failed: {defect}");
                false
            }
            None => true,
        }
    }

    /// Overwrites the transactions of the block at `index` without resealing
    /// it, then relinks the following block (if any) to the tampered block's
    /// stored hash and reseals that one.
    ///
    /// The tampered block's stored hash is unchanged, so the relink leaves the
    /// follower's link as it was and [`Chain::verify`] still flags `index`
    /// (for any `index >= 1`). A follower that was itself tampered earlier gets
    /// resealed over its new content, which moves the break to `index + 2`.
    /// Blocks past `index + 1` are never touched.
    pub fn tamper(&mut self, index: i64, transactions: Vec<String>) -> Result<(), ChainError> {
        let len = self.blocks.len();
        let position = match usize::try_from(index) {
            Ok(position) if position < len => position,
            _ => {
                warn!(index, len, "rejected tamper at invalid index");
                return Err(ChainError::InvalidIndex { index, len });
            }
        };

        self.blocks[position].replace_transactions(transactions);
        debug!(index = position, "overwrote block transactions without resealing");

        if position + 1 < len {
            let stale_hash = self.blocks[position].hash().to_string();
            let next = &mut self.blocks[position + 1];
            next.relink(stale_hash);
            debug!(index = position + 1, hash = %next.hash(), "relinked following block");
        }
        Ok(())
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{block}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Index 0, previous hash `"0"`, and a single marker transaction.
pub fn genesis_block() -> Block {
    Block::new(0, GENESIS_PREVIOUS_HASH, vec![GENESIS_TRANSACTION.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn genesis_block_example() {
        let genesis = genesis_block();
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.previous_hash(), "0");
        assert_eq!(genesis.transactions(), &["Genesis Block".to_string()]);
        assert!(genesis.is_sealed());
    }

    #[test]
    fn new_chain_holds_only_genesis() {
        let chain = Chain::new();
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert_eq!(chain.tip().previous_hash(), GENESIS_PREVIOUS_HASH);
        assert!(chain.verify());
    }

    #[test]
    fn append_links_to_previous_tip() {
        let mut chain = Chain::new();
        let genesis_hash = chain.tip().hash().to_string();

        let block = chain.append(txs(&["A", "B"]));
        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_hash(), genesis_hash);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn append_accepts_empty_transactions() {
        let mut chain = Chain::new();
        chain.append(vec![]);
        assert_eq!(chain.len(), 2);
        assert!(chain.tip().transactions().is_empty());
        assert!(chain.verify());
    }

    #[test]
    fn tamper_is_detected_as_hash_mismatch() {
        let mut chain = Chain::new();
        chain.append(txs(&["A", "B"]));
        chain.append(txs(&["C"]));
        let stored = chain.blocks()[1].hash().to_string();

        chain.tamper(1, txs(&["TAMPERED"])).unwrap();

        match chain.first_inconsistency() {
            Some(Inconsistency::HashMismatch {
                index,
                stored: s,
                computed,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(s, stored);
                assert_ne!(computed, stored);
            }
            other => panic!("expected hash mismatch, got {other:?}"),
        }
        assert!(!chain.verify());
    }

    #[test]
    fn tamper_relink_of_follower_is_inert() {
        let mut chain = Chain::new();
        chain.append(txs(&["A"]));
        chain.append(txs(&["B"]));
        let follower_before = chain.blocks()[2].clone();

        chain.tamper(1, txs(&["X"])).unwrap();

        assert_eq!(chain.blocks()[2], follower_before);
    }

    #[test]
    fn tamper_of_tip_touches_nothing_else() {
        let mut chain = Chain::new();
        chain.append(txs(&["A"]));
        let before: Vec<Block> = chain.blocks()[..1].to_vec();

        chain.tamper(1, txs(&["Z"])).unwrap();

        assert_eq!(&chain.blocks()[..1], before.as_slice());
        assert_eq!(chain.tip().transactions(), &["Z".to_string()]);
        assert_eq!(chain.first_inconsistency().map(|d| d.index()), Some(1));
    }

    #[test]
    fn tamper_of_genesis_goes_unnoticed() {
        let mut chain = Chain::new();
        chain.append(txs(&["A"]));

        chain.tamper(0, txs(&["rewritten genesis"])).unwrap();

        assert!(!chain.blocks()[0].is_sealed());
        assert!(chain.verify());
    }

    #[test]
    fn tamper_rejects_out_of_range_index() {
        let mut chain = Chain::new();
        chain.append(txs(&["A"]));
        let before = chain.blocks().to_vec();

        assert_eq!(
            chain.tamper(-1, txs(&["X"])),
            Err(ChainError::InvalidIndex { index: -1, len: 2 })
        );
        assert_eq!(
            chain.tamper(2, txs(&["X"])),
            Err(ChainError::InvalidIndex { index: 2, len: 2 })
        );
        assert_eq!(chain.blocks(), before.as_slice());
    }

    #[test]
    fn invalid_index_message() {
        let err = ChainError::InvalidIndex { index: 5, len: 3 };
        assert_eq!(err.to_string(), "invalid block index: 5 (chain length 3)");
    }

    #[test]
    fn chain_display_prints_every_block() {
        let mut chain = Chain::new();
        chain.append(txs(&["A"]));
        let rendered = chain.to_string();
        assert_eq!(rendered.matches("Index:").count(), 2);
        assert!(rendered.contains("Block Transactions:  [A]"));
        assert!(rendered.ends_with("\n\n"));
    }

    #[test]
    fn inconsistency_display_example() {
        let defect = Inconsistency::BrokenLink {
            index: 2,
            expected: "aa".into(),
            found: "bb".into(),
        };
        assert_eq!(
            defect.to_string(),
            "block 2: previous hash bb does not match predecessor hash aa"
        );
    }
}
