use crate::hashing::HASH_SIZE;

/// The default cap on the total transaction bytes a single event may carry.
pub const MAX_EVENT_TRANSACTION_BYTES: u64 = 245_760;

/// The default cap on a single transaction payload.
pub const MAX_TRANSACTION_BYTES: u64 = 6_144;

/// Externally loaded intake limits, referenced by the structural validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    /// The exact length a parent descriptor digest must have.
    pub digest_length: usize,
    /// Maximum total transaction bytes per event.
    pub max_event_transaction_bytes: u64,
    /// Maximum bytes of a single transaction payload.
    pub max_transaction_bytes: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            digest_length: HASH_SIZE,
            max_event_transaction_bytes: MAX_EVENT_TRANSACTION_BYTES,
            max_transaction_bytes: MAX_TRANSACTION_BYTES,
        }
    }
}
