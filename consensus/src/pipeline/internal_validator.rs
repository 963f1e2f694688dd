use crate::errors::{EventProcessResult, RuleError};
use crate::pipeline::{IntakeCounters, RejectionLogs, MINIMUM_LOG_PERIOD};
use hashgraph_consensus_core::api::IntakeEventCounter;
use hashgraph_consensus_core::config::Params;
use hashgraph_consensus_core::event::{Event, EventCore};
use std::sync::Arc;

/// Stateless structural sanity stage. Rejects events that are malformed regardless
/// of any consensus state: absent required fields, wrong digest lengths, oversized
/// transaction batches, duplicate-creator parents, and birth rounds older than the
/// event's own parents.
///
/// Pure apart from counters and throttled logs, so it is safe to share across
/// arbitrarily many worker threads.
pub struct InternalEventValidator {
    params: Params,
    counters: Arc<IntakeCounters>,
    intake_counter: Arc<dyn IntakeEventCounter>,
    logs: RejectionLogs,
}

impl InternalEventValidator {
    pub fn new(params: Params, counters: Arc<IntakeCounters>, intake_counter: Arc<dyn IntakeEventCounter>) -> Self {
        Self { params, counters, intake_counter, logs: RejectionLogs::new(MINIMUM_LOG_PERIOD) }
    }

    /// Forwards the event if it is structurally sound, or drops it with a counter
    /// increment and a throttled log otherwise.
    pub fn validate(&self, event: Arc<Event>) -> Option<Arc<Event>> {
        match self.validate_event(&event) {
            Ok(()) => Some(event),
            Err(error) => {
                self.counters.count_rejection(&error);
                self.logs.log(&event, &error);
                self.intake_counter.event_exited_pipeline(event.sender());
                None
            }
        }
    }

    fn validate_event(&self, event: &Event) -> EventProcessResult<()> {
        let core = Self::check_required_fields(event)?;
        self.check_parent_hash_lengths(core)?;
        self.check_transaction_byte_count(event)?;
        Self::check_parents_have_distinct_creators(core)?;
        Self::check_birth_round(core)?;
        Ok(())
    }

    fn check_required_fields(event: &Event) -> EventProcessResult<&EventCore> {
        let Some(core) = event.core_opt() else {
            return Err(RuleError::MissingField("core"));
        };
        if core.time_created.is_none() {
            return Err(RuleError::MissingField("time_created"));
        }
        if event.transactions().iter().any(|payload| payload.is_empty()) {
            return Err(RuleError::MissingField("transaction"));
        }
        Ok(core)
    }

    fn check_parent_hash_lengths(&self, core: &EventCore) -> EventProcessResult<()> {
        for parent in core.parents() {
            if parent.hash.len() != self.params.digest_length {
                return Err(RuleError::InvalidParentHashLength(parent.hash.len(), self.params.digest_length));
            }
        }
        Ok(())
    }

    fn check_transaction_byte_count(&self, event: &Event) -> EventProcessResult<()> {
        let mut total_bytes: u64 = 0;
        for payload in event.transactions() {
            if payload.len() as u64 > self.params.max_transaction_bytes {
                return Err(RuleError::TransactionTooLarge(payload.len(), self.params.max_transaction_bytes));
            }
            total_bytes = total_bytes.saturating_add(payload.len() as u64);
        }
        if total_bytes > self.params.max_event_transaction_bytes {
            return Err(RuleError::TooManyTransactionBytes(total_bytes, self.params.max_event_transaction_bytes));
        }
        Ok(())
    }

    fn check_parents_have_distinct_creators(core: &EventCore) -> EventProcessResult<()> {
        if let (Some(self_parent), Some(other_parent)) = (&core.self_parent, &core.other_parent)
            && self_parent.creator == other_parent.creator
        {
            return Err(RuleError::DuplicateParentCreator(self_parent.creator));
        }
        Ok(())
    }

    /// A child cannot claim a birth round prior to the birth round of its parents.
    fn check_birth_round(core: &EventCore) -> EventProcessResult<()> {
        let max_parent_birth_round = core.parents().map(|parent| parent.birth_round).max().unwrap_or(0);
        if core.birth_round < max_parent_birth_round {
            return Err(RuleError::BirthRoundOlderThanParents(core.birth_round, max_parent_birth_round));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestEventBuilder;
    use hashgraph_consensus_core::event::EventDescriptor;
    use hashgraph_consensus_core::hashing::Hash;
    use hashgraph_consensus_core::node::NodeId;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingIntakeCounter {
        exits: AtomicU64,
    }

    impl IntakeEventCounter for CountingIntakeCounter {
        fn event_exited_pipeline(&self, _sender: Option<NodeId>) {
            self.exits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn validator() -> (InternalEventValidator, Arc<IntakeCounters>, Arc<CountingIntakeCounter>) {
        let counters = Arc::new(IntakeCounters::default());
        let intake_counter = Arc::new(CountingIntakeCounter::default());
        let validator = InternalEventValidator::new(Params::default(), counters.clone(), intake_counter.clone());
        (validator, counters, intake_counter)
    }

    #[test]
    fn accepts_well_formed_event() {
        let (validator, _, exits) = validator();
        let event = TestEventBuilder::new().build();
        assert!(validator.validate(event).is_some());
        assert_eq!(exits.exits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejects_missing_core() {
        let (validator, counters, exits) = validator();
        let event = TestEventBuilder::new().omit_core().build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().null_field, 1);
        assert_eq!(exits.exits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejects_missing_time_created() {
        let (validator, counters, _) = validator();
        let event = TestEventBuilder::new().missing_time_created().build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().null_field, 1);
    }

    #[test]
    fn rejects_empty_transaction_payload() {
        let (validator, counters, _) = validator();
        let event = TestEventBuilder::new().transactions(vec![vec![1], vec![]]).build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().null_field, 1);
    }

    #[test]
    fn rejects_wrong_length_parent_hash() {
        let (validator, counters, _) = validator();
        let descriptor = EventDescriptor { hash: vec![0xab; 31], creator: NodeId::new(0), birth_round: 1 };
        let event = TestEventBuilder::new().self_parent_descriptor(descriptor).build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().invalid_field_length, 1);
    }

    #[test]
    fn rejects_when_total_transaction_bytes_exceed_cap() {
        // 5000 transactions of 100 bytes each is well past the 245,760 byte cap
        let (validator, counters, exits) = validator();
        let event = TestEventBuilder::new().transactions(vec![vec![0xaa; 100]; 5000]).build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().too_many_transaction_bytes, 1);
        assert_eq!(exits.exits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejects_single_oversized_transaction() {
        let (validator, counters, _) = validator();
        let event = TestEventBuilder::new().transactions(vec![vec![0xaa; 6_145]]).build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().oversized_transaction, 1);
    }

    #[test]
    fn rejects_parents_with_shared_creator_even_with_distinct_hashes() {
        let (validator, counters, _) = validator();
        let creator = NodeId::new(3);
        let event = TestEventBuilder::new()
            .self_parent_descriptor(EventDescriptor::new(Hash::from(1), creator, 1))
            .other_parent_descriptor(EventDescriptor::new(Hash::from(2), creator, 1))
            .build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().duplicate_parent_creator, 1);
    }

    #[test]
    fn rejects_birth_round_below_max_parent() {
        let (validator, counters, _) = validator();
        let event = TestEventBuilder::new()
            .birth_round(4)
            .self_parent_descriptor(EventDescriptor::new(Hash::from(1), NodeId::new(0), 3))
            .other_parent_descriptor(EventDescriptor::new(Hash::from(2), NodeId::new(1), 5))
            .build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().invalid_birth_round, 1);
    }

    #[test]
    fn accepts_birth_round_equal_to_max_parent() {
        let (validator, _, _) = validator();
        let event = TestEventBuilder::new()
            .birth_round(5)
            .self_parent_descriptor(EventDescriptor::new(Hash::from(1), NodeId::new(0), 3))
            .other_parent_descriptor(EventDescriptor::new(Hash::from(2), NodeId::new(1), 5))
            .build();
        assert!(validator.validate(event).is_some());
    }
}
