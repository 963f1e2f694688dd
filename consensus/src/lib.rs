//! The event intake pipeline: the gatekeeper through which every gossiped or
//! self-created event must pass before it is admitted into the in-memory DAG the
//! consensus algorithm operates on.
//!
//! Three sequential stages, each of which either forwards the event or silently
//! drops it: structural validation ([`pipeline::internal_validator`]), signature
//! authentication ([`pipeline::signature_validator`]), and parent linking
//! ([`pipeline::linker`]). The first two are stateless or share-nothing enough to
//! run on a worker pool; the linker is a single sequential consumer.

pub mod errors;
pub mod model;
pub mod pipeline;
pub mod test_helpers;
