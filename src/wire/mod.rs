//! Wire layer: TS6 commands and line framing.

mod command;
mod message;

pub use command::Command;
pub use message::Message;
