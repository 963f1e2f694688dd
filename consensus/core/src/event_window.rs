use crate::{Round, ROUND_FIRST};
use serde::{Deserialize, Serialize};

/// The current ancientness boundary plus associated round bookkeeping, advanced by
/// the consensus engine as it makes progress and pushed into the intake pipeline
/// wholesale. Immutable once constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    /// The latest round to have reached consensus.
    pub latest_consensus_round: Round,
    /// Events with a birth round below this threshold are ancient: permanently
    /// ignorable and evictable.
    pub ancient_threshold: Round,
    /// Events with a birth round below this threshold are expired and no longer
    /// needed even for state reconstruction.
    pub expired_threshold: Round,
}

impl EventWindow {
    pub fn new(latest_consensus_round: Round, ancient_threshold: Round, expired_threshold: Round) -> Self {
        Self { latest_consensus_round, ancient_threshold, expired_threshold }
    }

    /// The window in effect before any round has reached consensus.
    pub fn genesis() -> Self {
        Self { latest_consensus_round: ROUND_FIRST, ancient_threshold: ROUND_FIRST, expired_threshold: ROUND_FIRST }
    }

    /// A window where everything below `ancient_threshold` is ancient and the other
    /// rounds are derived. Useful for tests and for callers that only track the
    /// ancient boundary.
    pub fn from_ancient_threshold(ancient_threshold: Round) -> Self {
        Self {
            latest_consensus_round: ancient_threshold.max(ROUND_FIRST),
            ancient_threshold,
            expired_threshold: ancient_threshold,
        }
    }

    /// The round newly created events are anchored to.
    pub fn pending_consensus_round(&self) -> Round {
        self.latest_consensus_round + 1
    }

    /// The span of non-ancient rounds.
    pub fn non_ancient_round_span(&self) -> Round {
        self.pending_consensus_round().saturating_sub(self.ancient_threshold)
    }

    pub fn is_ancient(&self, birth_round: Round) -> bool {
        birth_round < self.ancient_threshold
    }
}
