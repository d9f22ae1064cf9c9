use crate::core::{Blockchain, Transaction};
use crate::error::ValidationError;
use log::{debug, info};
use rand::Rng;

/// What happened to a relayed transaction at one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The peer validated the transaction and buffered it as pending
    Accepted,
    /// The transaction never reached the peer
    Dropped,
    /// The peer received the transaction but refused it
    Rejected(ValidationError),
}

/// Offers `tx` to every peer, each one receiving it with chance `probability`.
///
/// Outcomes are returned in peer order. A peer that never saw the history
/// the transfer depends on refuses it like any other invalid submission.
pub fn relay_transaction<'a, I, R>(
    peers: I,
    tx: &Transaction,
    probability: f64,
    rng: &mut R,
) -> Vec<RelayOutcome>
where
    I: IntoIterator<Item = &'a mut Blockchain>,
    R: Rng,
{
    // gen_bool panics outside 0..=1
    let probability = if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    };

    let outcomes: Vec<RelayOutcome> = peers
        .into_iter()
        .map(|peer| {
            if !rng.gen_bool(probability) {
                debug!("Relay dropped: {tx}");
                return RelayOutcome::Dropped;
            }
            match peer.submit_transaction(tx.clone()) {
                Ok(()) => RelayOutcome::Accepted,
                Err(e) => RelayOutcome::Rejected(e),
            }
        })
        .collect();

    let accepted = outcomes
        .iter()
        .filter(|outcome| **outcome == RelayOutcome::Accepted)
        .count();
    info!("Relayed {tx} to {} peers, {accepted} accepted", outcomes.len());
    outcomes
}
