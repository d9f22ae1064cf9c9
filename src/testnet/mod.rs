//! Test fixtures shared by the unit tests
//!
//! Builds issuer wallets, user wallets and ledgers with genesis issuance so
//! each test can start from a known set of coin owners.

pub mod test_utils;

pub use test_utils::*;
