use crate::api::RosterHistory;
use crate::node::NodeId;
use crate::Round;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The signing material published by a validator. The public key is an opaque blob
/// as distributed; parsing it into a usable verifier happens lazily, at first use,
/// and is the expensive step the verifier cache exists to amortize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningCertificate {
    pub public_key: Option<Vec<u8>>,
}

impl SigningCertificate {
    pub fn new(public_key: Vec<u8>) -> Self {
        Self { public_key: Some(public_key) }
    }
}

/// A single validator in a roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub node_id: NodeId,
    pub weight: u64,
    pub signing_cert: Option<SigningCertificate>,
}

/// The weighted validator set active for a range of rounds. Immutable; many birth
/// rounds typically map to the same roster instance.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn entry(&self, node_id: NodeId) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| entry.node_id == node_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }
}

/// A [`RosterHistory`] backed by a table of (effective round, roster) pairs: a round
/// resolves to the roster of the latest entry at or below it.
pub struct RosterHistoryTable {
    // Sorted by effective round, ascending
    entries: Vec<(Round, Arc<Roster>)>,
}

impl RosterHistoryTable {
    pub fn new(mut entries: Vec<(Round, Arc<Roster>)>) -> Self {
        entries.sort_by_key(|(effective_round, _)| *effective_round);
        Self { entries }
    }

    /// A history where a single roster covers every round.
    pub fn constant(roster: Arc<Roster>) -> Self {
        Self { entries: vec![(0, roster)] }
    }
}

impl RosterHistory for RosterHistoryTable {
    fn roster_for_round(&self, birth_round: Round) -> Option<Arc<Roster>> {
        self.entries
            .iter()
            .rev()
            .find(|(effective_round, _)| *effective_round <= birth_round)
            .map(|(_, roster)| roster.clone())
    }
}
