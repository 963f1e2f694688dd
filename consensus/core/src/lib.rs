pub mod api;
pub mod config;
pub mod event;
pub mod event_window;
pub mod hashing;
pub mod node;
pub mod roster;

/// A consensus round number. Events are anchored to the round in effect when they
/// were created (their "birth round"), which is what bounds the memory of every
/// windowed structure in the system.
pub type Round = u64;

/// The first possible consensus round.
pub const ROUND_FIRST: Round = 1;
