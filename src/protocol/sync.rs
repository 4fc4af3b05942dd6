//! Locally originated state changes.
//!
//! Each operation picks the wire command for the change, queues it for the
//! uplink, then mirrors the change into local state so handlers see the
//! same events they would for a remote change. The send result is returned
//! to the caller; local state is updated either way.

use crate::error::{SyncError, SyncResult};
use crate::modes::{ChannelModeIntent, IntentId, ModeAction, StatusMode, format_channel_mode};
use crate::state::{Matrix, Uid, User};
use crate::wire::Command;
use tracing::{debug, error, info, warn};

/// User modes our pseudo-clients are introduced with.
const PSEUDO_CLIENT_UMODES: &str = "+ioS";

impl Matrix {
    /// Introduce a pseudo-client to the network and register it locally.
    pub fn introduce_user(
        &mut self,
        nick: &str,
        username: &str,
        host: &str,
        realname: &str,
    ) -> SyncResult<Uid> {
        let uid = self.next_uid();
        let ts = Self::now();

        let sent = self.send_from_server(Command::Uid {
            nick: nick.to_string(),
            hopcount: 1,
            ts,
            umodes: PSEUDO_CLIENT_UMODES.to_string(),
            username: username.to_string(),
            host: host.to_string(),
            ip: "0".to_string(),
            uid: uid.clone(),
            realname: realname.to_string(),
        });

        info!(uid = %uid, nick = %nick, "Introducing pseudo-client");
        self.add_user(
            User::new(uid.clone(), nick, username, host, realname, ts)
                .with_umodes(PSEUDO_CLIENT_UMODES),
        );

        sent.map(|()| uid)
    }

    /// Join `origin` (UID or nick) to `channel`.
    ///
    /// A channel with no members is created on the wire with SJOIN and the
    /// joiner opped in the same line. Otherwise the user sends JOIN and our
    /// server toggles their operator status with TMODE.
    pub fn join(&mut self, origin: &str, channel: &str) -> SyncResult {
        let Some(uid) = self.user_manager.resolve(origin) else {
            error!(origin = %origin, channel = %channel, "Cannot join unknown user");
            return Err(SyncError::UnknownUser(origin.to_string()));
        };

        let Some(chan) = self.create_or_get_channel(channel, Self::now()) else {
            warn!(channel = %channel, "Channel removed during creation");
            return Err(SyncError::UnknownChannel(channel.to_string()));
        };
        if chan.is_member(&uid) {
            debug!(uid = %uid, channel = %chan, "Already a member");
            return Ok(());
        }
        let name = chan.name().to_string();
        let ts = chan.timestamp;
        let empty = chan.is_empty();

        let sent = if empty {
            let sent = self.send_from_server(Command::Sjoin {
                ts,
                channel: name.clone(),
                modes: "+".to_string(),
                params: Vec::new(),
                members: vec![format!("{}{}", StatusMode::Operator.prefix(), uid)],
            });
            self.set_status(ModeAction::Add, StatusMode::Operator, &uid, &name);
            sent
        } else {
            let sent = self.send(
                Some(&uid),
                Command::Join {
                    ts,
                    channel: name.clone(),
                },
            );
            let toggled = self.toggle_status_mode(&uid, &name, StatusMode::Operator);
            sent.and(toggled)
        };

        self.add_member(&name, &uid);
        sent
    }

    /// Flip `status` for `uid` on `channel` with a TMODE from our server.
    pub fn toggle_status_mode(&mut self, uid: &str, channel: &str, status: StatusMode) -> SyncResult {
        let Some(user) = self.user_manager.get(uid) else {
            return Err(SyncError::UnknownUser(uid.to_string()));
        };
        let action = if user.has_status_mode(channel, status) {
            ModeAction::Delete
        } else {
            ModeAction::Add
        };

        let Some(chan) = self.lookup_channel(channel) else {
            return Err(SyncError::UnknownChannel(channel.to_string()));
        };
        let name = chan.name().to_string();
        let ts = chan.timestamp;

        let Some(c) = self.modes.char_for(status.into()) else {
            warn!(mode = %status.as_str(), "Dialect has no character for status mode");
            return Ok(());
        };

        let sent = self.send_from_server(Command::Tmode {
            ts,
            channel: name.clone(),
            modes: format!("{}{}", action.sign(), c),
            params: vec![uid.to_string()],
        });
        self.set_status(action, status, uid, &name);
        sent
    }

    /// Part `uid` from `channel`, deleting the channel if it empties.
    pub fn part(&mut self, uid: &str, channel: &str, reason: Option<&str>) -> SyncResult {
        if self.user_manager.get(uid).is_none() {
            return Err(SyncError::UnknownUser(uid.to_string()));
        }
        let Some(chan) = self.lookup_channel(channel) else {
            return Err(SyncError::UnknownChannel(channel.to_string()));
        };
        if !chan.is_member(uid) {
            return Err(SyncError::NotMember {
                user: uid.to_string(),
                channel: chan.name().to_string(),
            });
        }
        let name = chan.name().to_string();

        let sent = self.send(
            Some(uid),
            Command::Part {
                channel: name.clone(),
                reason: reason.map(str::to_string),
            },
        );
        self.remove_member(&name, uid);
        sent
    }

    /// Quit one of our users, parting it from all channels.
    pub fn quit(&mut self, uid: &str, reason: Option<&str>) -> SyncResult {
        if self.user_manager.get(uid).is_none() {
            return Err(SyncError::UnknownUser(uid.to_string()));
        }
        let sent = self.send(
            Some(uid),
            Command::Quit {
                reason: reason.map(str::to_string),
            },
        );
        self.remove_user(uid);
        sent
    }

    /// Store a mode change for later emission.
    pub fn queue_channel_mode(&mut self, intent: ChannelModeIntent) -> IntentId {
        let id = self.intents.queue(intent);
        debug!(intent = %id, "Queued channel mode intent");
        id
    }

    /// Send a queued intent as one TMODE and apply it locally.
    ///
    /// The intent leaves the store even if the channel has gone away, so an
    /// id can never be emitted twice.
    pub fn emit_channel_mode(&mut self, id: IntentId) -> SyncResult {
        let intent = self.intents.take(id).map_err(|taken| {
            if taken {
                SyncError::IntentAlreadyEmitted(id)
            } else {
                SyncError::UnknownIntent(id)
            }
        })?;

        let Some(chan) = self.lookup_channel(&intent.channel) else {
            warn!(intent = %id, channel = %intent.channel, "Mode intent for unknown channel");
            return Err(SyncError::UnknownChannel(intent.channel));
        };
        let name = chan.name().to_string();
        let ts = chan.timestamp;

        let (modes, params) = format_channel_mode(&self.modes, &intent, chan.key());
        if modes.is_empty() {
            debug!(intent = %id, channel = %name, "Nothing to emit");
            return Ok(());
        }

        let source = intent.origin.unwrap_or_else(|| self.me.sid.clone());
        let sent = self.send(
            Some(&source),
            Command::Tmode {
                ts,
                channel: name.clone(),
                modes: modes.clone(),
                params: params.clone(),
            },
        );
        self.apply_channel_modes(&name, &modes, &params);
        sent
    }

    pub fn privmsg(&self, source: &str, target: &str, text: &str) -> SyncResult {
        self.send(
            Some(source),
            Command::Privmsg {
                target: target.to_string(),
                text: text.to_string(),
            },
        )
    }

    pub fn notice(&self, source: &str, target: &str, text: &str) -> SyncResult {
        self.send(
            Some(source),
            Command::Notice {
                target: target.to_string(),
                text: text.to_string(),
            },
        )
    }
}
