//! Mirrored network state.

mod channel;
pub mod managers;
mod matrix;
mod uid;
mod user;

pub use channel::Channel;
pub use managers::{ChannelManager, UserManager};
pub use matrix::{LinkState, Matrix, ServerIdentity};
pub use uid::{Sid, Uid, UidGenerator};
pub use user::User;
