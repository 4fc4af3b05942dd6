//! The Matrix - the daemon's state context.
//!
//! The Matrix owns the channel and user registries, the event bus, the
//! pending mode intents and the outbound queue to the uplink. Everything
//! runs on one thread of control, so state is plain owned data: components
//! get `&mut Matrix` instead of reaching for globals.
//!
//! Channel lifecycle lives here because it must post events: a channel is
//! created by its first reference and deleted by the removal of its last
//! member, never any other way.

use crate::error::{SyncError, SyncResult};
use crate::events::{Dispatch, Event, EventBus};
use crate::modes::{
    Mode, ModeAction, ModeChange, ModeTable, PendingIntents, StatusMode, parse_channel_modes,
};
use crate::protocol::{StatusModeHandler, Ts6StatusModes};
use crate::state::{Channel, ChannelManager, Sid, Uid, UidGenerator, User, UserManager};
use crate::wire::{Command, Message};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Our own server identity on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    /// Server name (e.g., "services.example.net").
    pub name: String,
    /// TS6 server ID (3 characters).
    pub sid: Sid,
    pub description: String,
}

/// Where the uplink connection is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkState {
    #[default]
    Unconnected,
    /// Handshake sent; the uplink is still bursting.
    Bursting,
    /// The uplink's burst is over.
    Synced,
}

pub struct Matrix {
    pub me: ServerIdentity,
    pub channel_manager: ChannelManager,
    pub user_manager: UserManager,
    /// Mode category table of the uplink's dialect.
    pub modes: ModeTable,
    pub intents: PendingIntents,
    pub link_state: LinkState,
    status_handler: Box<dyn StatusModeHandler>,
    bus: EventBus<Matrix>,
    outbound: mpsc::UnboundedSender<Message>,
    uid_generator: UidGenerator,
}

impl Dispatch for Matrix {
    fn bus(&self) -> &EventBus<Self> {
        &self.bus
    }

    fn bus_mut(&mut self) -> &mut EventBus<Self> {
        &mut self.bus
    }
}

impl Matrix {
    /// Create a Matrix speaking the TS6 dialect. Everything sent to the
    /// uplink goes to `outbound`.
    pub fn new(me: ServerIdentity, outbound: mpsc::UnboundedSender<Message>) -> Self {
        let uid_generator = UidGenerator::new(me.sid.clone());
        Self {
            me,
            channel_manager: ChannelManager::new(),
            user_manager: UserManager::new(),
            modes: ModeTable::ts6(),
            intents: PendingIntents::new(),
            link_state: LinkState::Unconnected,
            status_handler: Box::new(Ts6StatusModes),
            bus: EventBus::new(),
            outbound,
            uid_generator,
        }
    }

    /// Swap in another dialect's mode table and status handling.
    pub fn with_dialect<H>(mut self, modes: ModeTable, status_handler: H) -> Self
    where
        H: StatusModeHandler + 'static,
    {
        self.modes = modes;
        self.status_handler = Box::new(status_handler);
        self
    }

    /// Current unix time, used as TS for channels and users we create.
    pub fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    pub(crate) fn next_uid(&mut self) -> Uid {
        self.uid_generator.next_uid()
    }

    /// Queue a command for the uplink. Failures are logged once and returned;
    /// nothing is retried.
    pub fn send(&self, source: Option<&str>, command: Command) -> SyncResult {
        let msg = Message {
            source: source.map(str::to_string),
            command,
        };
        self.outbound.send(msg).map_err(|e| {
            error!(command = %e.0.command.verb(), "Failed to queue command for uplink");
            SyncError::from(e)
        })
    }

    /// Send a command sourced from our own SID.
    pub fn send_from_server(&self, command: Command) -> SyncResult {
        self.send(Some(&self.me.sid), command)
    }

    // ========================================================================
    // Channel lifecycle
    // ========================================================================

    pub fn lookup_channel(&self, name: &str) -> Option<&Channel> {
        self.channel_manager.get(name)
    }

    /// Return the channel, creating it (TS `ts`) and posting
    /// [`Event::ChannelAdded`] on first reference.
    ///
    /// Returns `None` only if a `ChannelAdded` handler removed it again.
    pub fn create_or_get_channel(&mut self, name: &str, ts: i64) -> Option<&Channel> {
        if !self.channel_manager.contains(name) {
            self.channel_manager.insert(Channel::new(name, ts));
            debug!(channel = %name, ts, "New channel");
            self.post(Event::ChannelAdded {
                channel: name.to_string(),
            });
        }
        self.channel_manager.get(name)
    }

    /// Add `uid` to the roster of an existing channel.
    pub fn add_member(&mut self, channel: &str, uid: &str) -> bool {
        let Some(chan) = self.channel_manager.get_mut(channel) else {
            warn!(channel = %channel, uid = %uid, "Cannot add member to unknown channel");
            return false;
        };
        if !chan.add_user(uid.to_string()) {
            return false;
        }
        let name = chan.name().to_string();
        debug!(channel = %name, uid = %uid, members = chan.member_count(), "User joined channel");

        self.post(Event::UserJoinedChannel {
            uid: uid.to_string(),
            channel: name,
        });
        true
    }

    /// Remove `uid` from a channel's roster, dropping the user's status
    /// there and deleting the channel if it is now empty.
    pub fn remove_member(&mut self, channel: &str, uid: &str) -> bool {
        let Some(chan) = self.channel_manager.get_mut(channel) else {
            return false;
        };
        if !chan.delete_user(uid) {
            return false;
        }
        let name = chan.name().to_string();
        debug!(channel = %name, uid = %uid, members = chan.member_count(), "User parted channel");

        if let Some(user) = self.user_manager.get_mut(uid) {
            user.forget_channel(&name);
        }

        self.post(Event::UserPartedChannel {
            uid: uid.to_string(),
            channel: name.clone(),
        });
        self.remove_channel_if_empty(&name);
        true
    }

    /// Delete the channel and post [`Event::ChannelDeleted`] iff it has no
    /// members. Safe to call on populated channels.
    pub fn remove_channel_if_empty(&mut self, name: &str) -> bool {
        let Some(channel) = self.channel_manager.remove_if_empty(name) else {
            return false;
        };
        debug!(channel = %channel, "Removing empty channel");
        self.post(Event::ChannelDeleted { channel });
        true
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub fn add_user(&mut self, user: User) {
        let uid = user.uid.clone();
        debug!(uid = %uid, nick = %user.nick, "New user");
        self.user_manager.insert(user);
        self.post(Event::UserAdded { uid });
    }

    /// Remove a user from every channel and then from the registry.
    pub fn remove_user(&mut self, uid: &str) -> Option<User> {
        for channel in self.channel_manager.channels_of(uid) {
            self.remove_member(&channel, uid);
        }
        let user = self.user_manager.remove(uid)?;
        debug!(uid = %uid, nick = %user.nick, "User quit");
        self.post(Event::UserDeleted { user: user.clone() });
        Some(user)
    }

    // ========================================================================
    // Modes
    // ========================================================================

    /// Record a status change for (uid, channel) and post the matching
    /// mode event. Used where the protocol implies a grant, as SJOIN does.
    pub fn set_status(&mut self, action: ModeAction, status: StatusMode, uid: &str, channel: &str) {
        let Some(user) = self.user_manager.get_mut(uid) else {
            warn!(target = %uid, mode = %status.as_str(), channel = %channel, "Cannot set status for unknown user");
            return;
        };
        match action {
            ModeAction::Add => user.add_status_mode(channel, status),
            ModeAction::Delete => user.remove_status_mode(channel, status),
        }
        let change = ModeChange::new(action, status, Some(uid.to_string()));
        self.post(mode_event(change, channel.to_string()));
    }

    /// Parse `modes`/`params` and apply each change to `channel` in order,
    /// posting one mode event per change. Returns the changes applied.
    ///
    /// Status changes are routed to the dialect's [`StatusModeHandler`]; an
    /// unknown target is logged and skipped without aborting the rest.
    pub fn apply_channel_modes<S: AsRef<str>>(
        &mut self,
        channel: &str,
        modes: &str,
        params: &[S],
    ) -> Vec<ModeChange> {
        if !self.channel_manager.contains(channel) {
            warn!(channel = %channel, modes = %modes, "Mode change for unknown channel");
            return Vec::new();
        }

        let changes = parse_channel_modes(&self.modes, modes, params);
        let mut applied = Vec::with_capacity(changes.len());

        for change in changes {
            // A handler for the previous change may have emptied the channel.
            let Some(chan) = self.channel_manager.get_mut(channel) else {
                warn!(channel = %channel, "Channel vanished while applying modes");
                break;
            };
            let name = chan.name().to_string();

            match change.mode {
                Mode::Status(status) => {
                    let target = change.param.as_deref().unwrap_or_default();
                    if let Err(e) = self.status_handler.apply_status_mode(
                        &mut self.user_manager,
                        change.action,
                        status,
                        target,
                        &name,
                    ) {
                        warn!(
                            target = %target,
                            mode = %status.as_str(),
                            channel = %name,
                            error = %e,
                            "Cannot apply status mode"
                        );
                    }
                }
                _ => {
                    chan.apply_mode(&change);
                    debug!(
                        channel = %name,
                        action = %change.action,
                        mode = %change.mode,
                        param = change.param.as_deref().unwrap_or(""),
                        "Channel mode changed"
                    );
                }
            }

            self.post(mode_event(change.clone(), name));
            applied.push(change);
        }

        applied
    }
}

/// The event announcing one mode change.
fn mode_event(change: ModeChange, channel: String) -> Event {
    match change.action {
        ModeAction::Add => Event::ModeAddedOnChannel {
            mode: change.mode,
            param: change.param,
            channel,
        },
        ModeAction::Delete => Event::ModeDeletedOnChannel {
            mode: change.mode,
            param: change.param,
            channel,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn matrix() -> (Matrix, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let me = ServerIdentity {
            name: "services.example.net".into(),
            sid: "0SV".into(),
            description: "Services".into(),
        };
        (Matrix::new(me, tx), rx)
    }

    #[test]
    fn create_or_get_posts_once() {
        let (mut m, _rx) = matrix();
        let added = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&added);
        m.handle(EventKind::ChannelAdded, move |_, _| *counter.borrow_mut() += 1);

        assert!(m.create_or_get_channel("#ops", 10).is_some());
        assert!(m.create_or_get_channel("#OPS", 20).is_some());
        assert_eq!(*added.borrow(), 1);
        assert_eq!(m.lookup_channel("#ops").map(|c| c.timestamp), Some(10));
    }

    #[test]
    fn last_part_deletes_channel() {
        let (mut m, _rx) = matrix();
        m.add_user(User::new("0AAAAAAAB", "alice", "a", "h", "r", 1));
        m.create_or_get_channel("#ops", 10);
        assert!(m.add_member("#ops", "0AAAAAAAB"));
        assert!(!m.add_member("#ops", "0AAAAAAAB"));

        assert!(m.remove_member("#ops", "0AAAAAAAB"));
        assert!(m.lookup_channel("#ops").is_none());
        assert!(!m.remove_member("#ops", "0AAAAAAAB"));
    }

    #[test]
    fn remove_if_empty_keeps_populated_channel() {
        let (mut m, _rx) = matrix();
        m.create_or_get_channel("#ops", 10);
        m.add_member("#ops", "0AAAAAAAB");
        assert!(!m.remove_channel_if_empty("#ops"));
        assert!(m.lookup_channel("#ops").is_some());
    }

    #[test]
    fn remove_user_parts_everything() {
        let (mut m, _rx) = matrix();
        m.add_user(User::new("0AAAAAAAB", "alice", "a", "h", "r", 1));
        for chan in ["#a", "#b"] {
            m.create_or_get_channel(chan, 1);
            m.add_member(chan, "0AAAAAAAB");
        }
        let user = m.remove_user("0AAAAAAAB").unwrap();
        assert_eq!(user.nick, "alice");
        assert!(m.channel_manager.is_empty());
        assert!(m.user_manager.is_empty());
    }

    #[test]
    fn modes_on_unknown_channel_are_ignored() {
        let (mut m, _rx) = matrix();
        assert!(m.apply_channel_modes("#nowhere", "+nt", &[] as &[&str]).is_empty());
    }

    #[test]
    fn send_fails_once_uplink_is_gone() {
        let (m, rx) = matrix();
        drop(rx);
        let err = m.send_from_server(Command::Error { message: "x".into() }).unwrap_err();
        assert_eq!(err.error_code(), "send_error");
    }

    #[test]
    fn rfc1459_dialect_uses_nicks() {
        let (m, _rx) = matrix();
        let mut m = m.with_dialect(ModeTable::rfc1459(), crate::protocol::NickStatusModes);
        m.add_user(User::new("0AAAAAAAB", "alice", "a", "h", "r", 1));
        m.create_or_get_channel("#ops", 1);
        m.add_member("#ops", "0AAAAAAAB");

        m.apply_channel_modes("#ops", "+oe", &["alice", "mask"]);
        let alice = m.user_manager.get("0AAAAAAAB").unwrap();
        assert!(alice.has_status_mode("#ops", StatusMode::Operator));
        // 'e' is unknown to RFC 1459 and consumed nothing
        assert!(m.lookup_channel("#ops").unwrap().modes().is_empty());
    }
}
