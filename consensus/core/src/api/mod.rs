//! Trait seams for the intake pipeline's external collaborators.

use crate::hashing::Hash;
use crate::node::NodeId;
use crate::roster::{Roster, SigningCertificate};
use crate::Round;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolves a birth round to the validator set active at that round. Implemented by
/// the component tracking roster transitions; consumed by the intake pipeline.
pub trait RosterHistory: Send + Sync {
    fn roster_for_round(&self, birth_round: Round) -> Option<Arc<Roster>>;
}

/// Flow-control accounting for events traveling through the intake pipeline.
/// [`IntakeEventCounter::event_exited_pipeline`] is called exactly once per event
/// the pipeline drops, regardless of which stage dropped it.
pub trait IntakeEventCounter: Send + Sync {
    fn event_exited_pipeline(&self, sender: Option<NodeId>);
}

/// An [`IntakeEventCounter`] that tracks nothing.
#[derive(Default)]
pub struct NoopIntakeEventCounter;

impl IntakeEventCounter for NoopIntakeEventCounter {
    fn event_exited_pipeline(&self, _sender: Option<NodeId>) {}
}

/// Per-peer in-flight event counts, used by the gossip layer to bound how much
/// unvalidated input a single peer may have in the pipeline at once.
#[derive(Default)]
pub struct PerPeerIntakeCounter {
    counts: RwLock<HashMap<NodeId, Arc<AtomicU64>>>,
}

impl PerPeerIntakeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event received from `sender` as entering the pipeline.
    pub fn event_entered_pipeline(&self, sender: Option<NodeId>) {
        let Some(sender) = sender else { return };
        self.peer_count(sender).fetch_add(1, Ordering::SeqCst);
    }

    /// The number of events from `peer` currently inside the pipeline.
    pub fn in_flight(&self, peer: NodeId) -> u64 {
        self.counts.read().get(&peer).map(|count| count.load(Ordering::SeqCst)).unwrap_or(0)
    }

    fn peer_count(&self, peer: NodeId) -> Arc<AtomicU64> {
        if let Some(count) = self.counts.read().get(&peer) {
            return count.clone();
        }
        self.counts.write().entry(peer).or_default().clone()
    }
}

impl IntakeEventCounter for PerPeerIntakeCounter {
    fn event_exited_pipeline(&self, sender: Option<NodeId>) {
        let Some(sender) = sender else { return };
        let count = self.peer_count(sender);
        // Saturating decrement: an unmatched exit indicates a wiring bug upstream,
        // but must not wrap the counter into a huge in-flight value.
        let _ = count.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| current.checked_sub(1));
    }
}

/// Verifies event signatures for a single validator identity.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &Hash, signature: &[u8]) -> bool;
}

/// Builds [`SignatureVerifier`]s out of roster certificates. Injected into the
/// signature validator so the crypto backend stays swappable (and countable in
/// tests). Returns `None` when the certificate cannot yield a usable key.
pub trait SignatureVerifierFactory: Send + Sync {
    fn create(&self, cert: &SigningCertificate) -> Option<Arc<dyn SignatureVerifier>>;
}
