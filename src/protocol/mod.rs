//! Protocol synchronization layer.
//!
//! - [`sync`]: locally originated intents (join, part, quit, mode emission)
//!   and the choice of wire command for each.
//! - [`receive`]: inbound TS6 handlers that mirror remote state.
//! - [`handshake`]: the link registration lines sent on connect.
//!
//! How status modes are applied is a per-dialect capability, expressed by
//! [`StatusModeHandler`].

pub mod handshake;
pub mod receive;
pub mod sync;

use crate::error::{SyncError, SyncResult};
use crate::modes::{ModeAction, StatusMode};
use crate::state::UserManager;
use crate::state::Uid;

/// Applies status mode changes to the (user, channel) pair.
pub trait StatusModeHandler {
    /// Resolve the member identifier carried in a mode parameter.
    fn resolve(&self, users: &UserManager, target: &str) -> Option<Uid>;

    /// Grant or revoke `status` for `target` on `channel`.
    ///
    /// Fails with [`SyncError::UnknownUser`] without touching any state when
    /// the target cannot be resolved.
    fn apply_status_mode(
        &self,
        users: &mut UserManager,
        action: ModeAction,
        status: StatusMode,
        target: &str,
        channel: &str,
    ) -> SyncResult {
        let user = self
            .resolve(users, target)
            .and_then(|uid| users.get_mut(&uid))
            .ok_or_else(|| SyncError::UnknownUser(target.to_string()))?;

        match action {
            ModeAction::Add => user.add_status_mode(channel, status),
            ModeAction::Delete => user.remove_status_mode(channel, status),
        }
        Ok(())
    }
}

/// TS6 servers send UIDs in mode parameters; local callers may still pass
/// nicknames, so those are tried second.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ts6StatusModes;

impl StatusModeHandler for Ts6StatusModes {
    fn resolve(&self, users: &UserManager, target: &str) -> Option<Uid> {
        users.resolve(target)
    }
}

/// Nickname-keyed dialects (RFC 1459 servers without UIDs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NickStatusModes;

impl StatusModeHandler for NickStatusModes {
    fn resolve(&self, users: &UserManager, target: &str) -> Option<Uid> {
        users.uid_by_nick(target).cloned()
    }
}
