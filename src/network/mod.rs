//! Transaction propagation between peer ledgers
//!
//! There is no wire protocol: every peer is an in-process `Blockchain`.
//! A relayed transfer reaches each peer with some probability and is then
//! validated against that peer's own view of the history.

pub mod relay;

pub use relay::{relay_transaction, RelayOutcome};
