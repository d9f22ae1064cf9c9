//! Error handling for the ledger
//!
//! Every public operation returns one of the enums below. None of them is
//! fatal: a failed validation never touches the pending buffer and a failed
//! append never touches the chain.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Reasons a transaction is refused admission to the pending buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Sender and recipient are the same public key
    SelfTransfer,
    /// Signature is malformed or does not match the sender's key
    BadSignature,
    /// Sender does not currently hold the coin
    CoinNotOwned,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SelfTransfer => write!(f, "Cannot send a coin to yourself"),
            ValidationError::BadSignature => write!(f, "Signature does not match the transaction"),
            ValidationError::CoinNotOwned => write!(f, "Sender does not own the coin"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Reasons a block is refused by the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendError {
    /// The block does not reference the current tip
    PreviousHashMismatch,
    /// Claimed hash, stored hash and recomputed hash disagree
    ProofInvalid,
    /// The block index is not the tip index plus one
    IndexMismatch { expected: u64, actual: u64 },
}

impl fmt::Display for AppendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendError::PreviousHashMismatch => {
                write!(f, "Previous hash does not match the chain tip")
            }
            AppendError::ProofInvalid => write!(f, "Block hash proof is invalid"),
            AppendError::IndexMismatch { expected, actual } => {
                write!(f, "Invalid block index: expected {expected}, got {actual}")
            }
        }
    }
}

impl std::error::Error for AppendError {}

/// Reasons a mining attempt produced no block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningError {
    /// The pending buffer is empty
    NothingToMine,
    /// The search was stopped through its cancel flag
    Cancelled,
    /// The pending buffer changed while the candidate was being searched
    Stale,
    /// Every nonce was tried without meeting the target
    NonceSpaceExhausted,
    /// The sealed candidate was refused by the chain
    Rejected(AppendError),
    /// The system clock could not be read for the candidate timestamp
    Clock(String),
    /// The candidate could not be encoded for hashing
    Serialization(String),
}

impl fmt::Display for MiningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiningError::NothingToMine => write!(f, "No pending transactions to mine"),
            MiningError::Cancelled => write!(f, "Mining was cancelled"),
            MiningError::Stale => write!(f, "Pending transactions changed during mining"),
            MiningError::NonceSpaceExhausted => write!(f, "No nonce meets the target"),
            MiningError::Rejected(e) => write!(f, "Mined block rejected: {e}"),
            MiningError::Clock(msg) => write!(f, "Clock error: {msg}"),
            MiningError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for MiningError {}

impl From<AppendError> for MiningError {
    fn from(err: AppendError) -> Self {
        MiningError::Rejected(err)
    }
}

impl From<BlockchainError> for MiningError {
    fn from(err: BlockchainError) -> Self {
        match err {
            BlockchainError::Mining(e) => e,
            BlockchainError::Append(e) => MiningError::Rejected(e),
            BlockchainError::Clock(msg) => MiningError::Clock(msg),
            other => MiningError::Serialization(other.to_string()),
        }
    }
}

/// Crate-wide error type
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Key generation, signing or key parsing failures
    Crypto(String),
    /// Canonical encoding failures
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// The system clock is before the Unix epoch
    Clock(String),
    /// Transaction validation errors
    Validation(ValidationError),
    /// Block append errors
    Append(AppendError),
    /// Mining errors
    Mining(MiningError),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Clock(msg) => write!(f, "Clock error: {msg}"),
            BlockchainError::Validation(e) => write!(f, "Transaction rejected: {e}"),
            BlockchainError::Append(e) => write!(f, "Block rejected: {e}"),
            BlockchainError::Mining(e) => write!(f, "Mining error: {e}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<ValidationError> for BlockchainError {
    fn from(err: ValidationError) -> Self {
        BlockchainError::Validation(err)
    }
}

impl From<AppendError> for BlockchainError {
    fn from(err: AppendError) -> Self {
        BlockchainError::Append(err)
    }
}

impl From<MiningError> for BlockchainError {
    fn from(err: MiningError) -> Self {
        BlockchainError::Mining(err)
    }
}
