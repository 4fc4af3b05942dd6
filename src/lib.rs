//! slservd - Straylight Services Daemon
//!
//! The state-synchronization core of a TS6 services pseudo-server. It mirrors
//! the network's channels and users, parses channel mode changes into
//! discrete state transitions, decides which wire commands to emit for local
//! intents, and dispatches events to reacting handlers.

pub mod casemap;
pub mod config;
pub mod error;
pub mod events;
pub mod modes;
pub mod protocol;
pub mod pseudoclient;
pub mod state;
pub mod uplink;
pub mod wire;

pub use error::SyncError;
pub use events::{Dispatch, Event, EventBus, EventKind};
pub use state::Matrix;
