use crate::errors::RuleError;
use crate::pipeline::{IntakeCounters, RejectionLogs, MINIMUM_LOG_PERIOD};
use arc_swap::ArcSwap;
use hashgraph_consensus_core::api::{IntakeEventCounter, RosterHistory, SignatureVerifier, SignatureVerifierFactory};
use hashgraph_consensus_core::event::Event;
use hashgraph_consensus_core::event_window::EventWindow;
use hashgraph_consensus_core::hashing::Hash;
use hashgraph_consensus_core::node::NodeId;
use hashgraph_consensus_core::roster::{Roster, SigningCertificate};
use parking_lot::RwLock;
use secp256k1::schnorr;
use secp256k1::{Message, XOnlyPublicKey, SECP256K1};
use std::collections::HashMap;
use std::hash::{Hash as StdHash, Hasher};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Cryptographic authentication stage. Verifies that each gossiped event was signed
/// by its claimed creator under the roster active at the event's birth round.
///
/// Runs on a shared worker pool: the only mutable state is behind atomic reference
/// swaps, and the verifier cache uses compute-once insertion, so concurrent
/// validations are safe and in-flight ones always observe a consistent
/// (history, cache) pair.
pub struct EventSignatureValidator {
    event_window: ArcSwap<EventWindow>,
    roster_state: ArcSwap<RosterState>,
    verifier_factory: Arc<dyn SignatureVerifierFactory>,
    counters: Arc<IntakeCounters>,
    intake_counter: Arc<dyn IntakeEventCounter>,
    logs: RejectionLogs,
}

/// A roster history paired with the verifier cache built against it. Replaced
/// wholesale when the history changes, never mutated in place, so validations
/// holding the old pair finish consistently against it.
struct RosterState {
    history: Arc<dyn RosterHistory>,
    cache: VerifierCache,
}

enum Rejection {
    /// Below the ancient threshold; dropped silently, not an error.
    Ancient,
    Rule(RuleError),
}

impl EventSignatureValidator {
    pub fn new(
        event_window: EventWindow,
        roster_history: Arc<dyn RosterHistory>,
        verifier_factory: Arc<dyn SignatureVerifierFactory>,
        counters: Arc<IntakeCounters>,
        intake_counter: Arc<dyn IntakeEventCounter>,
    ) -> Self {
        Self {
            event_window: ArcSwap::from_pointee(event_window),
            roster_state: ArcSwap::from_pointee(RosterState { history: roster_history, cache: VerifierCache::new() }),
            verifier_factory,
            counters,
            intake_counter,
            logs: RejectionLogs::new(MINIMUM_LOG_PERIOD),
        }
    }

    /// Forwards the event if its signature is authentic (or it was created by this
    /// process), or drops it otherwise.
    pub fn validate(&self, event: Arc<Event>) -> Option<Arc<Event>> {
        match self.validate_event(&event) {
            Ok(()) => Some(event),
            Err(rejection) => {
                match rejection {
                    Rejection::Ancient => {
                        self.counters.ancient_discards.fetch_add(1, Ordering::SeqCst);
                    }
                    Rejection::Rule(error) => {
                        self.counters.count_rejection(&error);
                        self.logs.log(&event, &error);
                    }
                }
                self.intake_counter.event_exited_pipeline(event.sender());
                None
            }
        }
    }

    /// Installs a new event window. An atomic swap; concurrent validations see
    /// either the old or the new window, never a partial update.
    pub fn set_event_window(&self, event_window: EventWindow) {
        self.event_window.store(Arc::new(event_window));
    }

    /// Installs a new roster history together with a brand-new, empty verifier
    /// cache. The previous cache object is left untouched for in-flight callers.
    pub fn update_roster_history(&self, roster_history: Arc<dyn RosterHistory>) {
        self.roster_state.store(Arc::new(RosterState { history: roster_history, cache: VerifierCache::new() }));
    }

    fn validate_event(&self, event: &Event) -> Result<(), Rejection> {
        // Cheap early exit: an ancient event is dropped before any roster or cache work
        if self.event_window.load().is_ancient(event.birth_round()) {
            return Err(Rejection::Ancient);
        }

        // Events created by this process were signed by it and need no re-verification
        if event.is_self_created() {
            return Ok(());
        }

        let state = self.roster_state.load_full();
        let roster = state
            .history
            .roster_for_round(event.birth_round())
            .ok_or(Rejection::Rule(RuleError::NoRosterForRound(event.birth_round())))?;

        let verifier = state
            .cache
            .resolve(&roster, event.creator(), self.verifier_factory.as_ref())
            .map_err(Rejection::Rule)?;

        if !verifier.verify(&event.hash(), event.signature()) {
            return Err(Rejection::Rule(RuleError::InvalidSignature(event.hash())));
        }
        Ok(())
    }
}

/// A roster keyed by object identity. Holding the `Arc` keeps the pointer from
/// being reused while the key is alive.
#[derive(Clone)]
struct RosterIdentity(Arc<Roster>);

impl PartialEq for RosterIdentity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RosterIdentity {}

impl StdHash for RosterIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

#[derive(Clone)]
enum VerifierSlot {
    Verifier(Arc<dyn SignatureVerifier>),
    /// Construction failed; cached so a doomed lookup is never retried.
    Invalid(RuleError),
}

impl VerifierSlot {
    fn into_result(self) -> Result<Arc<dyn SignatureVerifier>, RuleError> {
        match self {
            VerifierSlot::Verifier(verifier) => Ok(verifier),
            VerifierSlot::Invalid(error) => Err(error),
        }
    }
}

/// Memoized per-(roster, node) signature verifiers. Certificate parsing and
/// verifier construction are expensive; each (roster identity, node id) pair is
/// computed at most once, including under concurrent first-access races.
struct VerifierCache {
    map: RwLock<HashMap<(RosterIdentity, NodeId), VerifierSlot>>,
}

impl VerifierCache {
    fn new() -> Self {
        Self { map: RwLock::new(HashMap::new()) }
    }

    fn resolve(
        &self,
        roster: &Arc<Roster>,
        creator: NodeId,
        factory: &dyn SignatureVerifierFactory,
    ) -> Result<Arc<dyn SignatureVerifier>, RuleError> {
        let key = (RosterIdentity(roster.clone()), creator);
        if let Some(slot) = self.map.read().get(&key) {
            return slot.clone().into_result();
        }
        // The write lock spans construction, which makes the insert compute-once:
        // racing first accessors serialize here and all but one find the entry.
        let mut map = self.map.write();
        let slot = map.entry(key).or_insert_with(|| Self::build(roster, creator, factory));
        slot.clone().into_result()
    }

    fn build(roster: &Arc<Roster>, creator: NodeId, factory: &dyn SignatureVerifierFactory) -> VerifierSlot {
        let Some(entry) = roster.entry(creator) else {
            return VerifierSlot::Invalid(RuleError::UnknownCreator(creator));
        };
        let Some(cert) = &entry.signing_cert else {
            return VerifierSlot::Invalid(RuleError::MissingCertificate(creator));
        };
        match factory.create(cert) {
            Some(verifier) => VerifierSlot::Verifier(verifier),
            None => VerifierSlot::Invalid(RuleError::MissingCertificate(creator)),
        }
    }
}

/// The default verifier factory: events are signed with 64-byte Schnorr signatures
/// over their 32-byte content hash, under x-only secp256k1 keys published in the
/// roster.
pub struct SchnorrVerifierFactory;

impl SignatureVerifierFactory for SchnorrVerifierFactory {
    fn create(&self, cert: &SigningCertificate) -> Option<Arc<dyn SignatureVerifier>> {
        let key_bytes = cert.public_key.as_deref()?;
        let key = XOnlyPublicKey::from_slice(key_bytes).ok()?;
        Some(Arc::new(SchnorrVerifier { key }))
    }
}

struct SchnorrVerifier {
    key: XOnlyPublicKey,
}

impl SignatureVerifier for SchnorrVerifier {
    fn verify(&self, message: &Hash, signature: &[u8]) -> bool {
        let Ok(signature) = schnorr::Signature::from_slice(signature) else {
            return false;
        };
        let message = Message::from_digest(message.as_bytes());
        SECP256K1.verify_schnorr(&signature, &message, &self.key).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestEventBuilder;
    use hashgraph_consensus_core::api::NoopIntakeEventCounter;
    use hashgraph_consensus_core::roster::{RosterEntry, RosterHistoryTable};
    use secp256k1::Keypair;
    use std::sync::atomic::AtomicUsize;

    struct AcceptAllVerifier;

    impl SignatureVerifier for AcceptAllVerifier {
        fn verify(&self, _message: &Hash, _signature: &[u8]) -> bool {
            true
        }
    }

    /// Counts constructions, accepting every signature.
    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl SignatureVerifierFactory for CountingFactory {
        fn create(&self, _cert: &SigningCertificate) -> Option<Arc<dyn SignatureVerifier>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Some(Arc::new(AcceptAllVerifier))
        }
    }

    fn roster_with_cert(node_id: NodeId, public_key: Option<Vec<u8>>) -> Arc<Roster> {
        Arc::new(Roster::new(vec![RosterEntry {
            node_id,
            weight: 10,
            signing_cert: public_key.map(SigningCertificate::new),
        }]))
    }

    fn validator_with(
        roster: Arc<Roster>,
        factory: Arc<dyn SignatureVerifierFactory>,
    ) -> (EventSignatureValidator, Arc<IntakeCounters>) {
        let counters = Arc::new(IntakeCounters::default());
        let validator = EventSignatureValidator::new(
            EventWindow::genesis(),
            Arc::new(RosterHistoryTable::constant(roster)),
            factory,
            counters.clone(),
            Arc::new(NoopIntakeEventCounter),
        );
        (validator, counters)
    }

    #[test]
    fn accepts_self_created_event_without_consulting_factory() {
        let creator = NodeId::new(0);
        let factory = Arc::new(CountingFactory::default());
        let (validator, _) = validator_with(roster_with_cert(creator, Some(vec![0; 32])), factory.clone());

        let event = TestEventBuilder::new().creator(creator).self_created().build();
        assert!(validator.validate(event).is_some());
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejects_ancient_event_without_touching_roster_or_cache() {
        let creator = NodeId::new(0);
        let factory = Arc::new(CountingFactory::default());
        let (validator, counters) = validator_with(roster_with_cert(creator, Some(vec![0; 32])), factory.clone());
        validator.set_event_window(EventWindow::from_ancient_threshold(10));

        let event = TestEventBuilder::new().creator(creator).birth_round(5).build();
        assert!(validator.validate(event).is_none());
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.ancient_discards, 1);
        assert_eq!(snapshot.invalid_signature, 0);
        assert_eq!(snapshot.no_roster, 0);
    }

    #[test]
    fn constructs_verifier_exactly_once_per_creator() {
        let creator = NodeId::new(0);
        let factory = Arc::new(CountingFactory::default());
        let (validator, _) = validator_with(roster_with_cert(creator, Some(vec![0; 32])), factory.clone());

        for _ in 0..10 {
            let event = TestEventBuilder::new().creator(creator).build();
            assert!(validator.validate(event).is_some());
        }
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn roster_history_update_installs_fresh_cache() {
        let creator = NodeId::new(0);
        let roster = roster_with_cert(creator, Some(vec![0; 32]));
        let factory = Arc::new(CountingFactory::default());
        let (validator, _) = validator_with(roster.clone(), factory.clone());

        assert!(validator.validate(TestEventBuilder::new().creator(creator).build()).is_some());
        assert!(validator.validate(TestEventBuilder::new().creator(creator).build()).is_some());
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);

        validator.update_roster_history(Arc::new(RosterHistoryTable::constant(roster)));
        assert!(validator.validate(TestEventBuilder::new().creator(creator).build()).is_some());
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn rejects_event_with_no_roster_for_round() {
        let roster = roster_with_cert(NodeId::new(0), Some(vec![0; 32]));
        let counters = Arc::new(IntakeCounters::default());
        let validator = EventSignatureValidator::new(
            EventWindow::genesis(),
            Arc::new(RosterHistoryTable::new(vec![(100, roster)])),
            Arc::new(CountingFactory::default()),
            counters.clone(),
            Arc::new(NoopIntakeEventCounter),
        );

        let event = TestEventBuilder::new().birth_round(5).build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().no_roster, 1);
    }

    #[test]
    fn rejects_creator_missing_from_roster() {
        let factory = Arc::new(CountingFactory::default());
        let (validator, counters) = validator_with(roster_with_cert(NodeId::new(0), Some(vec![0; 32])), factory.clone());

        // Rejected twice; the cached failure sentinel means the roster lookup is not retried
        for _ in 0..2 {
            let event = TestEventBuilder::new().creator(NodeId::new(9)).build();
            assert!(validator.validate(event).is_none());
        }
        assert_eq!(counters.snapshot().unknown_creator, 2);
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejects_creator_without_certificate() {
        let creator = NodeId::new(0);
        let (validator, counters) = validator_with(roster_with_cert(creator, None), Arc::new(CountingFactory::default()));

        let event = TestEventBuilder::new().creator(creator).build();
        assert!(validator.validate(event).is_none());
        assert_eq!(counters.snapshot().missing_certificate, 1);
    }

    #[test]
    fn verifies_real_schnorr_signatures() {
        let creator = NodeId::new(0);
        let keypair = Keypair::new(SECP256K1, &mut rand::thread_rng());
        let (public_key, _) = XOnlyPublicKey::from_keypair(&keypair);
        let roster = roster_with_cert(creator, Some(public_key.serialize().to_vec()));
        let (validator, counters) = validator_with(roster, Arc::new(SchnorrVerifierFactory));

        let hash = Hash::from(42);
        let message = Message::from_digest(hash.as_bytes());
        let signature = SECP256K1.sign_schnorr(&message, &keypair);

        let signed = TestEventBuilder::new().creator(creator).hash(hash).signature(signature.serialize().to_vec()).build();
        assert!(validator.validate(signed).is_some());

        let forged = TestEventBuilder::new().creator(creator).hash(Hash::from(43)).signature(signature.serialize().to_vec()).build();
        assert!(validator.validate(forged).is_none());
        assert_eq!(counters.snapshot().invalid_signature, 1);
    }
}
