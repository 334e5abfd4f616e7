use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("invalid block index: {index} (chain length {len})")]
    InvalidIndex { index: i64, len: usize },
}
