use hashgraph_consensus_core::event::Event;
use hashgraph_consensus_core::hashing::Hash;
use hashgraph_consensus_core::node::NodeId;
use hashgraph_consensus_core::Round;
use parking_lot::RwLock;
use std::sync::Arc;

/// An authenticated event admitted into the DAG, holding resolved references to its
/// (at most two) parents.
///
/// Parent references are deliberately clearable: when an event becomes ancient its
/// slots are tombstoned so that descendants still in the window do not keep entire
/// ancestor chains alive. Memory stays bounded by the event window alone.
pub struct LinkedEvent {
    event: Arc<Event>,
    parents: RwLock<ParentSlots>,
}

#[derive(Default)]
struct ParentSlots {
    self_parent: Option<Arc<LinkedEvent>>,
    other_parent: Option<Arc<LinkedEvent>>,
}

impl LinkedEvent {
    pub fn new(event: Arc<Event>, self_parent: Option<Arc<LinkedEvent>>, other_parent: Option<Arc<LinkedEvent>>) -> Self {
        Self { event, parents: RwLock::new(ParentSlots { self_parent, other_parent }) }
    }

    pub fn event(&self) -> &Arc<Event> {
        &self.event
    }

    pub fn hash(&self) -> Hash {
        self.event.hash()
    }

    pub fn creator(&self) -> NodeId {
        self.event.creator()
    }

    pub fn birth_round(&self) -> Round {
        self.event.birth_round()
    }

    pub fn time_created(&self) -> Option<u64> {
        self.event.time_created()
    }

    pub fn self_parent(&self) -> Option<Arc<LinkedEvent>> {
        self.parents.read().self_parent.clone()
    }

    pub fn other_parent(&self) -> Option<Arc<LinkedEvent>> {
        self.parents.read().other_parent.clone()
    }

    /// The resolved parents, self-parent first. May hold the same event twice in a
    /// single-validator network.
    pub fn parents(&self) -> Vec<Arc<LinkedEvent>> {
        let slots = self.parents.read();
        slots.self_parent.iter().chain(slots.other_parent.iter()).cloned().collect()
    }

    /// Tombstones both parent slots, releasing the ancestor chain.
    pub fn clear_parents(&self) {
        let mut slots = self.parents.write();
        slots.self_parent = None;
        slots.other_parent = None;
    }
}
