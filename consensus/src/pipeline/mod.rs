pub mod intake;
pub mod internal_validator;
pub mod linker;
pub mod signature_validator;

use crate::errors::RuleError;
use hashgraph_consensus_core::event::Event;
use hashgraph_utils::rate_limit::RateLimitedLogger;
use log::warn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The minimum period between log messages for a specific mode of failure.
pub(crate) const MINIMUM_LOG_PERIOD: Duration = Duration::from_secs(60);

/// Monotonic accumulators for everything the intake pipeline counts: one per
/// rejection reason, plus pipeline throughput totals. Shared by all three stages.
#[derive(Default)]
pub struct IntakeCounters {
    pub events_submitted: AtomicU64,
    pub events_linked: AtomicU64,
    pub evicted_events: AtomicU64,
    /// Events or parents dropped for being ancient. Not an error: falling behind
    /// the window is the expected fate of slow gossip.
    pub ancient_discards: AtomicU64,

    // Structural rejections
    pub null_field: AtomicU64,
    pub invalid_field_length: AtomicU64,
    pub oversized_transaction: AtomicU64,
    pub too_many_transaction_bytes: AtomicU64,
    pub duplicate_parent_creator: AtomicU64,
    pub invalid_birth_round: AtomicU64,

    // Authentication rejections
    pub no_roster: AtomicU64,
    pub unknown_creator: AtomicU64,
    pub missing_certificate: AtomicU64,
    pub invalid_signature: AtomicU64,

    // Linkage defects (non-fatal: the edge is omitted, the event still links)
    pub missing_parents: AtomicU64,
    pub parent_birth_round_mismatch: AtomicU64,
    pub non_monotonic_time_created: AtomicU64,
}

impl IntakeCounters {
    pub fn snapshot(&self) -> IntakeCountersSnapshot {
        IntakeCountersSnapshot {
            events_submitted: self.events_submitted.load(Ordering::SeqCst),
            events_linked: self.events_linked.load(Ordering::SeqCst),
            evicted_events: self.evicted_events.load(Ordering::SeqCst),
            ancient_discards: self.ancient_discards.load(Ordering::SeqCst),
            null_field: self.null_field.load(Ordering::SeqCst),
            invalid_field_length: self.invalid_field_length.load(Ordering::SeqCst),
            oversized_transaction: self.oversized_transaction.load(Ordering::SeqCst),
            too_many_transaction_bytes: self.too_many_transaction_bytes.load(Ordering::SeqCst),
            duplicate_parent_creator: self.duplicate_parent_creator.load(Ordering::SeqCst),
            invalid_birth_round: self.invalid_birth_round.load(Ordering::SeqCst),
            no_roster: self.no_roster.load(Ordering::SeqCst),
            unknown_creator: self.unknown_creator.load(Ordering::SeqCst),
            missing_certificate: self.missing_certificate.load(Ordering::SeqCst),
            invalid_signature: self.invalid_signature.load(Ordering::SeqCst),
            missing_parents: self.missing_parents.load(Ordering::SeqCst),
            parent_birth_round_mismatch: self.parent_birth_round_mismatch.load(Ordering::SeqCst),
            non_monotonic_time_created: self.non_monotonic_time_created.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn count_rejection(&self, error: &RuleError) {
        let counter = match error {
            RuleError::MissingField(_) => &self.null_field,
            RuleError::InvalidParentHashLength(..) => &self.invalid_field_length,
            RuleError::TransactionTooLarge(..) => &self.oversized_transaction,
            RuleError::TooManyTransactionBytes(..) => &self.too_many_transaction_bytes,
            RuleError::DuplicateParentCreator(_) => &self.duplicate_parent_creator,
            RuleError::BirthRoundOlderThanParents(..) => &self.invalid_birth_round,
            RuleError::NoRosterForRound(_) => &self.no_roster,
            RuleError::UnknownCreator(_) => &self.unknown_creator,
            RuleError::MissingCertificate(_) => &self.missing_certificate,
            RuleError::InvalidSignature(_) => &self.invalid_signature,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct IntakeCountersSnapshot {
    pub events_submitted: u64,
    pub events_linked: u64,
    pub evicted_events: u64,
    pub ancient_discards: u64,
    pub null_field: u64,
    pub invalid_field_length: u64,
    pub oversized_transaction: u64,
    pub too_many_transaction_bytes: u64,
    pub duplicate_parent_creator: u64,
    pub invalid_birth_round: u64,
    pub no_roster: u64,
    pub unknown_creator: u64,
    pub missing_certificate: u64,
    pub invalid_signature: u64,
    pub missing_parents: u64,
    pub parent_birth_round_mismatch: u64,
    pub non_monotonic_time_created: u64,
}

/// One throttle per rejection reason, so a hostile peer hammering a single failure
/// mode cannot drown out reports of the others.
pub(crate) struct RejectionLogs {
    null_field: RateLimitedLogger,
    invalid_field_length: RateLimitedLogger,
    transaction_bytes: RateLimitedLogger,
    invalid_parents: RateLimitedLogger,
    invalid_birth_round: RateLimitedLogger,
    no_roster: RateLimitedLogger,
    unknown_creator: RateLimitedLogger,
    missing_certificate: RateLimitedLogger,
    invalid_signature: RateLimitedLogger,
}

impl RejectionLogs {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            null_field: RateLimitedLogger::new(interval),
            invalid_field_length: RateLimitedLogger::new(interval),
            transaction_bytes: RateLimitedLogger::new(interval),
            invalid_parents: RateLimitedLogger::new(interval),
            invalid_birth_round: RateLimitedLogger::new(interval),
            no_roster: RateLimitedLogger::new(interval),
            unknown_creator: RateLimitedLogger::new(interval),
            missing_certificate: RateLimitedLogger::new(interval),
            invalid_signature: RateLimitedLogger::new(interval),
        }
    }

    pub(crate) fn log(&self, event: &Event, error: &RuleError) {
        let throttle = match error {
            RuleError::MissingField(_) => &self.null_field,
            RuleError::InvalidParentHashLength(..) => &self.invalid_field_length,
            RuleError::TransactionTooLarge(..) | RuleError::TooManyTransactionBytes(..) => &self.transaction_bytes,
            RuleError::DuplicateParentCreator(_) => &self.invalid_parents,
            RuleError::BirthRoundOlderThanParents(..) => &self.invalid_birth_round,
            RuleError::NoRosterForRound(_) => &self.no_roster,
            RuleError::UnknownCreator(_) => &self.unknown_creator,
            RuleError::MissingCertificate(_) => &self.missing_certificate,
            RuleError::InvalidSignature(_) => &self.invalid_signature,
        };
        if let Some(suppressed) = throttle.acquire() {
            if suppressed > 0 {
                warn!("dropping event {}: {} ({} earlier occurrences suppressed)", event.hash(), error, suppressed);
            } else {
                warn!("dropping event {}: {}", event.hash(), error);
            }
        }
    }
}
