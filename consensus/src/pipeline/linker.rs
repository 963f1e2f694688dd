use crate::model::linked_event::LinkedEvent;
use crate::pipeline::{IntakeCounters, MINIMUM_LOG_PERIOD};
use hashgraph_consensus_core::api::{IntakeEventCounter, RosterHistory};
use hashgraph_consensus_core::event::{Event, EventDescriptor};
use hashgraph_consensus_core::event_window::EventWindow;
use hashgraph_consensus_core::hashing::Hash;
use hashgraph_consensus_core::Round;
use hashgraph_utils::rate_limit::RateLimitedLogger;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Resolves each validated event's claimed parents against the window of already
/// linked events, producing the DAG node the consensus algorithm consumes, and
/// evicts events as they turn ancient.
///
/// Events must arrive in topological order: a parent is resolvable only once it has
/// itself been linked, and resolution is a single lookup, never retried or queued.
/// The linker is therefore a strictly sequential consumer (`&mut self`), unlike the
/// two validation stages ahead of it.
pub struct ConsensusLinker {
    event_window: EventWindow,
    roster_history: Arc<dyn RosterHistory>,
    counters: Arc<IntakeCounters>,
    intake_counter: Arc<dyn IntakeEventCounter>,

    // Windowed parent indices: hash-keyed for O(1) resolution, birth-round-bucketed
    // so window advances evict whole rounds at once
    events: HashMap<Hash, Arc<LinkedEvent>>,
    rounds: BTreeMap<Round, Vec<Hash>>,

    missing_parent_log: RateLimitedLogger,
    birth_round_mismatch_log: RateLimitedLogger,
    time_created_log: RateLimitedLogger,
}

impl ConsensusLinker {
    pub fn new(
        roster_history: Arc<dyn RosterHistory>,
        counters: Arc<IntakeCounters>,
        intake_counter: Arc<dyn IntakeEventCounter>,
    ) -> Self {
        Self {
            event_window: EventWindow::genesis(),
            roster_history,
            counters,
            intake_counter,
            events: HashMap::new(),
            rounds: BTreeMap::new(),
            missing_parent_log: RateLimitedLogger::new(MINIMUM_LOG_PERIOD),
            birth_round_mismatch_log: RateLimitedLogger::new(MINIMUM_LOG_PERIOD),
            time_created_log: RateLimitedLogger::new(MINIMUM_LOG_PERIOD),
        }
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    /// The number of non-ancient events currently tracked.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Links the event into the DAG, resolving its claimed parents. Returns `None`
    /// only for ancient events; a parent that cannot be resolved merely leaves its
    /// slot empty.
    pub fn link(&mut self, event: Arc<Event>) -> Option<Arc<LinkedEvent>> {
        if self.event_window.is_ancient(event.birth_round()) {
            // Ancient events can be safely ignored: nothing is stored
            self.counters.ancient_discards.fetch_add(1, Ordering::SeqCst);
            self.intake_counter.event_exited_pipeline(event.sender());
            return None;
        }

        let core = event.core();
        let self_parent = core.self_parent.as_ref().and_then(|descriptor| self.resolve_parent(&event, descriptor, true));
        let mut other_parent = core.other_parent.as_ref().and_then(|descriptor| self.resolve_parent(&event, descriptor, false));

        // In a single-validator network the consensus progress rule still expects two
        // named parents, so the self-parent stands in for the missing other-parent.
        // TODO: move this into the consensus component's progress rule and drop the patch here
        if other_parent.is_none() && self_parent.is_some() && self.roster_is_singleton(event.birth_round()) {
            other_parent = self_parent.clone();
        }

        let linked = Arc::new(LinkedEvent::new(event, self_parent, other_parent));
        self.events.insert(linked.hash(), linked.clone());
        self.rounds.entry(linked.birth_round()).or_default().push(linked.hash());
        self.counters.events_linked.fetch_add(1, Ordering::SeqCst);
        Some(linked)
    }

    /// Advances the window, removing every event whose birth round fell below the
    /// new ancient threshold. Evicted events have their parent slots tombstoned and
    /// are returned for the caller to release.
    pub fn set_event_window(&mut self, event_window: EventWindow) -> Vec<Arc<LinkedEvent>> {
        self.event_window = event_window;

        let retained = self.rounds.split_off(&event_window.ancient_threshold);
        let ancient_rounds = std::mem::replace(&mut self.rounds, retained);

        let mut evicted = Vec::new();
        for hash in ancient_rounds.into_values().flatten() {
            if let Some(linked) = self.events.remove(&hash) {
                linked.clear_parents();
                evicted.push(linked);
            }
        }
        self.counters.evicted_events.fetch_add(evicted.len() as u64, Ordering::SeqCst);
        evicted
    }

    fn resolve_parent(&self, child: &Event, descriptor: &EventDescriptor, is_self_parent: bool) -> Option<Arc<LinkedEvent>> {
        if self.event_window.is_ancient(descriptor.birth_round) {
            // An ancient parent is not an error, just an edge the DAG no longer needs
            return None;
        }

        let hash = descriptor.event_hash()?;
        let Some(candidate) = self.events.get(&hash) else {
            self.counters.missing_parents.fetch_add(1, Ordering::SeqCst);
            if let Some(suppressed) = self.missing_parent_log.acquire() {
                debug!(
                    "parent {} of event {} is not linked, omitting the edge ({} similar omissions suppressed)",
                    hash,
                    child.hash(),
                    suppressed
                );
            }
            return None;
        };

        if candidate.birth_round() != descriptor.birth_round {
            self.counters.parent_birth_round_mismatch.fetch_add(1, Ordering::SeqCst);
            if let Some(suppressed) = self.birth_round_mismatch_log.acquire() {
                warn!(
                    "event {} claims parent {} at birth round {} but it was linked at {} ({} suppressed)",
                    child.hash(),
                    hash,
                    descriptor.birth_round,
                    candidate.birth_round(),
                    suppressed
                );
            }
            return None;
        }

        // Only a single creator's own timeline is comparable, so the monotonicity
        // check applies to the self-parent slot alone
        if is_self_parent && candidate.time_created() >= child.time_created() {
            self.counters.non_monotonic_time_created.fetch_add(1, Ordering::SeqCst);
            if let Some(suppressed) = self.time_created_log.acquire() {
                warn!(
                    "event {} was not created strictly after its self-parent {} ({} suppressed)",
                    child.hash(),
                    hash,
                    suppressed
                );
            }
            return None;
        }

        Some(candidate.clone())
    }

    fn roster_is_singleton(&self, birth_round: Round) -> bool {
        self.roster_history.roster_for_round(birth_round).is_some_and(|roster| roster.len() == 1)
    }
}
