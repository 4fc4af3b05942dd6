//! State managers for the Matrix.

pub mod channel;
pub mod user;

pub use channel::ChannelManager;
pub use user::UserManager;
