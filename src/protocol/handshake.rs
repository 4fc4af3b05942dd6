//! Link registration.
//!
//! We always initiate the link: on connect we send PASS, CAPAB, SERVER and
//! SVINFO, then burst our own users. The uplink's burst ends with its
//! first PING (see [`receive`](super::receive)).

use crate::error::SyncResult;
use crate::events::{Dispatch, Event};
use crate::state::{LinkState, Matrix, ServerIdentity};
use crate::wire::Command;
use tracing::info;

/// Capabilities we advertise.
pub const CAPABILITIES: &[&str] = &["QS", "EX", "IE", "KLN", "UNKLN", "ENCAP", "TB", "SERVICES"];

/// The registration lines for our side of the link, in order.
pub fn registration(me: &ServerIdentity, password: &str, now: i64) -> Vec<Command> {
    vec![
        Command::Pass {
            password: password.to_string(),
            sid: me.sid.clone(),
        },
        Command::Capab(CAPABILITIES.iter().map(|c| c.to_string()).collect()),
        Command::Server {
            name: me.name.clone(),
            hopcount: 1,
            description: me.description.clone(),
        },
        Command::Svinfo { ts: now },
    ]
}

impl Matrix {
    /// Send our registration and start bursting.
    ///
    /// Posts [`Event::Connected`] and then [`Event::StartOfBurst`], whose
    /// handlers introduce our pseudo-clients.
    pub fn on_connect(&mut self, password: &str) -> SyncResult {
        for command in registration(&self.me, password, Self::now()) {
            self.send(None, command)?;
        }
        self.link_state = LinkState::Bursting;
        info!(server = %self.me.name, sid = %self.me.sid, "Link registration sent");

        self.post(Event::Connected);
        self.post(Event::StartOfBurst);
        Ok(())
    }

    /// Forget the network. Everything is learned again on the next link.
    ///
    /// Every user quits, so each channel empties and is deleted through the
    /// usual part path and handlers see the matching events. Queued intents
    /// are dropped; their ids report as already emitted.
    pub fn on_disconnect(&mut self) {
        self.link_state = LinkState::Unconnected;

        for uid in self.user_manager.uids() {
            self.remove_user(&uid);
        }
        // Members we never saw a UID for.
        for name in self.channel_manager.names() {
            let members: Vec<_> = self
                .lookup_channel(&name)
                .map(|c| c.members().iter().cloned().collect())
                .unwrap_or_default();
            for uid in members {
                self.remove_member(&name, &uid);
            }
            self.remove_channel_if_empty(&name);
        }

        let dropped = self.intents.clear();
        info!(dropped_intents = dropped, "Link closed, network state cleared");
        self.post(Event::Disconnected);
    }
}
