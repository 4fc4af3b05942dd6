//! Channel modes: symbols, dialect tables, parsing and outgoing intents.

mod intent;
mod parse;
mod table;
mod types;

pub use intent::{ChannelModeIntent, IntentId, PendingIntents, format_channel_mode};
pub use parse::parse_channel_modes;
pub use table::{ModeCategory, ModeTable};
pub use types::{ChannelMode, ListMode, Mode, ModeAction, ModeChange, StatusMode};
