use crate::hashing::Hash;
use crate::node::NodeId;
use crate::Round;
use serde::{Deserialize, Serialize};

/// A lightweight pointer to a parent event, embedded in its children.
///
/// The hash is kept as raw wire bytes rather than a [`Hash`]: a malicious peer may
/// gossip a descriptor with a digest of any length, and the structural validator is
/// the stage responsible for rejecting it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub hash: Vec<u8>,
    pub creator: NodeId,
    pub birth_round: Round,
}

impl EventDescriptor {
    pub fn new(hash: Hash, creator: NodeId, birth_round: Round) -> Self {
        Self { hash: hash.as_bytes().to_vec(), creator, birth_round }
    }

    /// The descriptor's digest as an addressable hash, if it has the right length.
    pub fn event_hash(&self) -> Option<Hash> {
        Hash::try_from_slice(&self.hash)
    }
}

/// The signed core of a gossiped event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCore {
    pub creator: NodeId,
    pub birth_round: Round,
    /// Creation time in milliseconds since the unix epoch. Absent on malformed gossip.
    pub time_created: Option<u64>,
    pub self_parent: Option<EventDescriptor>,
    pub other_parent: Option<EventDescriptor>,
}

impl EventCore {
    /// Iterates over the declared parent descriptors, self-parent first.
    pub fn parents(&self) -> impl Iterator<Item = &EventDescriptor> {
        self.self_parent.iter().chain(self.other_parent.iter())
    }
}

/// An event as it arrives off the wire, after deserialization but before any
/// validation. Required fields are optional here because arbitrary peers control
/// the encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossipEvent {
    pub core: Option<EventCore>,
    pub signature: Vec<u8>,
    pub transactions: Vec<Vec<u8>>,
}

/// Where an event entered this node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOrigin {
    /// Created and signed by this process; implicitly trusted.
    SelfCreated,
    /// Received over gossip from the given peer; must be authenticated.
    Gossip(NodeId),
}

/// A gossiped (or self-created) unit of consensus input: a batch of transactions
/// plus up to two parent references, already hashed by the upstream codec.
///
/// Events are immutable. Every intake stage consumes them read-only and either
/// forwards the same `Arc` or drops it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    hash: Hash,
    gossip: GossipEvent,
    origin: EventOrigin,
}

impl Event {
    pub fn new(hash: Hash, gossip: GossipEvent, origin: EventOrigin) -> Self {
        Self { hash, gossip, origin }
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn gossip(&self) -> &GossipEvent {
        &self.gossip
    }

    pub fn origin(&self) -> EventOrigin {
        self.origin
    }

    pub fn signature(&self) -> &[u8] {
        &self.gossip.signature
    }

    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.gossip.transactions
    }

    /// The core of the event if the wire data carried one.
    pub fn core_opt(&self) -> Option<&EventCore> {
        self.gossip.core.as_ref()
    }

    /// The core of the event.
    /// NOTE: is expected to be called only after the event passed structural validation
    pub fn core(&self) -> &EventCore {
        self.gossip.core.as_ref().unwrap()
    }

    pub fn creator(&self) -> NodeId {
        self.core().creator
    }

    pub fn birth_round(&self) -> Round {
        self.core().birth_round
    }

    pub fn time_created(&self) -> Option<u64> {
        self.core().time_created
    }

    pub fn is_self_created(&self) -> bool {
        matches!(self.origin, EventOrigin::SelfCreated)
    }

    /// The peer this event was received from, if it arrived over gossip.
    pub fn sender(&self) -> Option<NodeId> {
        match self.origin {
            EventOrigin::SelfCreated => None,
            EventOrigin::Gossip(sender) => Some(sender),
        }
    }
}
