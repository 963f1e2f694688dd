use crate::model::linked_event::LinkedEvent;
use crate::pipeline::internal_validator::InternalEventValidator;
use crate::pipeline::linker::ConsensusLinker;
use crate::pipeline::signature_validator::EventSignatureValidator;
use crate::pipeline::IntakeCounters;
use crossbeam_channel::{bounded, Receiver, Sender};
use hashgraph_consensus_core::api::{IntakeEventCounter, RosterHistory, SignatureVerifierFactory};
use hashgraph_consensus_core::config::Params;
use hashgraph_consensus_core::event::Event;
use hashgraph_consensus_core::event_window::EventWindow;
use rayon::ThreadPool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

/// Bound on events in flight between submission and linking.
pub const DEFAULT_PIPELINE_CAPACITY: usize = 1_024;

/// Everything the intake pipeline consumes: events off the gossip/creation path and
/// control-plane window advances, on one channel so they stay ordered.
pub enum IntakeMessage {
    Exit,
    Event(Arc<Event>),
    EventWindow(EventWindow),
}

/// What the pipeline hands to the consensus engine.
pub enum ConsensusMessage {
    Linked(Arc<LinkedEvent>),
    Evicted(Vec<Arc<LinkedEvent>>),
}

enum Sequenced {
    /// An event's reserved slot; yields `None` when validation dropped the event.
    Event(Receiver<Option<Arc<Event>>>),
    Window(EventWindow),
}

/// Wires the three intake stages together: the two validators run on a shared
/// thread pool, and their outputs are funneled through an ordered channel into a
/// single linker worker, which is what upholds the linker's topological-order
/// requirement without any locking of its state.
pub struct EventIntakeProcessor {
    receiver: Receiver<IntakeMessage>,
    consensus_sender: Sender<ConsensusMessage>,
    thread_pool: Arc<ThreadPool>,
    internal_validator: Arc<InternalEventValidator>,
    signature_validator: Arc<EventSignatureValidator>,
    linker: ConsensusLinker,
    counters: Arc<IntakeCounters>,
}

impl EventIntakeProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        receiver: Receiver<IntakeMessage>,
        consensus_sender: Sender<ConsensusMessage>,
        thread_pool: Arc<ThreadPool>,
        params: Params,
        event_window: EventWindow,
        roster_history: Arc<dyn RosterHistory>,
        verifier_factory: Arc<dyn SignatureVerifierFactory>,
        counters: Arc<IntakeCounters>,
        intake_counter: Arc<dyn IntakeEventCounter>,
    ) -> Self {
        let internal_validator = Arc::new(InternalEventValidator::new(params, counters.clone(), intake_counter.clone()));
        let signature_validator = Arc::new(EventSignatureValidator::new(
            event_window,
            roster_history.clone(),
            verifier_factory,
            counters.clone(),
            intake_counter.clone(),
        ));
        let linker = ConsensusLinker::new(roster_history, counters.clone(), intake_counter);
        Self { receiver, consensus_sender, thread_pool, internal_validator, signature_validator, linker, counters }
    }

    /// The signature validator, for control-plane roster updates while the worker
    /// runs. Updates are atomic swaps and need no channel.
    pub fn signature_validator(&self) -> Arc<EventSignatureValidator> {
        self.signature_validator.clone()
    }

    pub fn counters(&self) -> Arc<IntakeCounters> {
        self.counters.clone()
    }

    /// Consumes intake messages until `Exit` or channel closure. Dropping the
    /// consensus sender on return is the downstream termination signal.
    pub fn worker(self) {
        let Self { receiver, consensus_sender, thread_pool, internal_validator, signature_validator, mut linker, counters } = self;

        let (ordered_sender, ordered_receiver) = bounded(DEFAULT_PIPELINE_CAPACITY);
        let link_thread = thread::spawn(move || {
            Self::link_worker(&mut linker, ordered_receiver, consensus_sender);
        });

        while let Ok(msg) = receiver.recv() {
            match msg {
                IntakeMessage::Exit => break,
                IntakeMessage::EventWindow(window) => {
                    // The validator swap takes effect immediately; the linker observes the
                    // update in order with the event stream
                    signature_validator.set_event_window(window);
                    if ordered_sender.send(Sequenced::Window(window)).is_err() {
                        break;
                    }
                }
                IntakeMessage::Event(event) => {
                    counters.events_submitted.fetch_add(1, Ordering::SeqCst);
                    // Reserve the event's slot in the linker's input before spawning its
                    // validation, so the linker consumes submission order even though
                    // validations finish out of order
                    let (slot_sender, slot_receiver) = bounded(1);
                    if ordered_sender.send(Sequenced::Event(slot_receiver)).is_err() {
                        break;
                    }
                    let internal = internal_validator.clone();
                    let signature = signature_validator.clone();
                    thread_pool.spawn(move || {
                        let validated = internal.validate(event).and_then(|event| signature.validate(event));
                        // A dropped event forwards None so the sequence never stalls
                        let _ = slot_sender.send(validated);
                    });
                }
            }
        }

        drop(ordered_sender);
        link_thread.join().unwrap();
    }

    fn link_worker(linker: &mut ConsensusLinker, receiver: Receiver<Sequenced>, consensus_sender: Sender<ConsensusMessage>) {
        while let Ok(item) = receiver.recv() {
            match item {
                Sequenced::Window(window) => {
                    let evicted = linker.set_event_window(window);
                    if !evicted.is_empty() && consensus_sender.send(ConsensusMessage::Evicted(evicted)).is_err() {
                        break;
                    }
                }
                Sequenced::Event(slot) => {
                    let Ok(Some(event)) = slot.recv() else { continue };
                    if let Some(linked) = linker.link(event)
                        && consensus_sender.send(ConsensusMessage::Linked(linked)).is_err()
                    {
                        break;
                    }
                }
            }
        }
    }
}
