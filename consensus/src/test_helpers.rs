//! Fixtures for building events in tests.

use hashgraph_consensus_core::event::{Event, EventCore, EventDescriptor, EventOrigin, GossipEvent};
use hashgraph_consensus_core::hashing::Hash;
use hashgraph_consensus_core::node::NodeId;
use hashgraph_consensus_core::{Round, ROUND_FIRST};
use std::sync::Arc;

/// Builds an [`Event`] with sensible defaults: a random content hash, a single
/// small transaction, a zeroed signature, and gossip origin from the creator.
pub struct TestEventBuilder {
    hash: Option<Hash>,
    creator: NodeId,
    birth_round: Round,
    time_created: Option<u64>,
    self_parent: Option<EventDescriptor>,
    other_parent: Option<EventDescriptor>,
    transactions: Vec<Vec<u8>>,
    signature: Vec<u8>,
    origin: Option<EventOrigin>,
    omit_core: bool,
}

impl Default for TestEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEventBuilder {
    pub fn new() -> Self {
        Self {
            hash: None,
            creator: NodeId::new(0),
            birth_round: ROUND_FIRST,
            time_created: Some(1_000),
            self_parent: None,
            other_parent: None,
            transactions: vec![vec![1, 2, 3]],
            signature: vec![0; 64],
            origin: None,
            omit_core: false,
        }
    }

    pub fn hash(mut self, hash: Hash) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn creator(mut self, creator: NodeId) -> Self {
        self.creator = creator;
        self
    }

    pub fn birth_round(mut self, birth_round: Round) -> Self {
        self.birth_round = birth_round;
        self
    }

    pub fn time_created(mut self, millis: u64) -> Self {
        self.time_created = Some(millis);
        self
    }

    pub fn missing_time_created(mut self) -> Self {
        self.time_created = None;
        self
    }

    /// Declares `parent` as the self-parent, deriving the descriptor from it.
    pub fn self_parent(self, parent: &Event) -> Self {
        let descriptor = descriptor_of(parent);
        self.self_parent_descriptor(descriptor)
    }

    pub fn self_parent_descriptor(mut self, descriptor: EventDescriptor) -> Self {
        self.self_parent = Some(descriptor);
        self
    }

    pub fn other_parent(self, parent: &Event) -> Self {
        let descriptor = descriptor_of(parent);
        self.other_parent_descriptor(descriptor)
    }

    pub fn other_parent_descriptor(mut self, descriptor: EventDescriptor) -> Self {
        self.other_parent = Some(descriptor);
        self
    }

    pub fn transactions(mut self, transactions: Vec<Vec<u8>>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    pub fn self_created(mut self) -> Self {
        self.origin = Some(EventOrigin::SelfCreated);
        self
    }

    pub fn sender(mut self, sender: NodeId) -> Self {
        self.origin = Some(EventOrigin::Gossip(sender));
        self
    }

    /// Builds an event whose wire data carried no core at all.
    pub fn omit_core(mut self) -> Self {
        self.omit_core = true;
        self
    }

    pub fn build(self) -> Arc<Event> {
        let core = if self.omit_core {
            None
        } else {
            Some(EventCore {
                creator: self.creator,
                birth_round: self.birth_round,
                time_created: self.time_created,
                self_parent: self.self_parent,
                other_parent: self.other_parent,
            })
        };
        let gossip = GossipEvent { core, signature: self.signature, transactions: self.transactions };
        let hash = self.hash.unwrap_or_else(|| Hash::from(rand::random::<u64>()));
        let origin = self.origin.unwrap_or(EventOrigin::Gossip(self.creator));
        Arc::new(Event::new(hash, gossip, origin))
    }
}

/// The descriptor a child would embed to reference `event` as a parent.
pub fn descriptor_of(event: &Event) -> EventDescriptor {
    EventDescriptor::new(event.hash(), event.creator(), event.birth_round())
}
