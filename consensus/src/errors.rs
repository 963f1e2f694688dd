use hashgraph_consensus_core::hashing::Hash;
use hashgraph_consensus_core::node::NodeId;
use hashgraph_consensus_core::Round;
use thiserror::Error;

/// The reasons an event is rejected from the intake pipeline. All of these are
/// non-fatal and data-dependent: they surface through counters and throttled logs,
/// never across a stage's public boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("event is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("parent descriptor digest is {0} bytes, expected {1}")]
    InvalidParentHashLength(usize, usize),

    #[error("transaction payload of {0} bytes exceeds the per-transaction limit of {1}")]
    TransactionTooLarge(usize, u64),

    #[error("event carries {0} transaction bytes, more than the permitted {1}")]
    TooManyTransactionBytes(u64, u64),

    #[error("event declares multiple parents created by {0}")]
    DuplicateParentCreator(NodeId),

    #[error("event birth round {0} is less than the max parent birth round {1}")]
    BirthRoundOlderThanParents(Round, Round),

    #[error("no roster known for round {0}")]
    NoRosterForRound(Round),

    #[error("creator {0} is not in the applicable roster")]
    UnknownCreator(NodeId),

    #[error("roster entry for {0} has no usable signing certificate")]
    MissingCertificate(NodeId),

    #[error("signature verification failed for event {0}")]
    InvalidSignature(Hash),
}

pub type EventProcessResult<T> = std::result::Result<T, RuleError>;
