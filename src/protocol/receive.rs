//! Inbound TS6 handling.
//!
//! Mirrors what the uplink tells us into the Matrix. Malformed lines and
//! references to unknown entities are logged and dropped; nothing here can
//! fail the link except an ERROR from the uplink itself.

use crate::events::{Dispatch, Event};
use crate::modes::{ChannelMode, Mode, ModeAction, StatusMode};
use crate::state::{LinkState, Matrix, User};
use crate::wire::{Command, Message};
use tracing::{debug, error, info, trace, warn};

/// Allowed clock difference reported by SVINFO before we complain.
const MAX_CLOCK_DELTA: i64 = 60;

impl Matrix {
    /// Parse one line from the uplink and handle it.
    pub fn handle_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match line.parse::<Message>() {
            Ok(msg) => self.handle_message(msg),
            Err(e) => warn!(line = %line, error = %e, "Dropping malformed line"),
        }
    }

    /// Handle one message from the uplink.
    pub fn handle_message(&mut self, msg: Message) {
        let source = msg.source.unwrap_or_default();
        trace!(source = %source, command = %msg.command.verb(), "Inbound");

        match msg.command {
            Command::Pass { sid, .. } => {
                info!(sid = %sid, "Uplink sent PASS");
            }
            Command::Capab(caps) => {
                debug!(caps = %caps.join(" "), "Uplink capabilities");
            }
            Command::Server { name, description, .. } => {
                info!(server = %name, description = %description, "Linked to uplink");
            }
            Command::Sid { name, sid, .. } => {
                debug!(server = %name, sid = %sid, "Remote server introduced");
            }
            Command::Svinfo { ts } => {
                let delta = (Self::now() - ts).abs();
                if delta > MAX_CLOCK_DELTA {
                    warn!(delta, "Clock differs from uplink");
                }
            }
            Command::Ping { origin, .. } => self.handle_ping(origin),
            Command::Pong { origin, .. } => {
                trace!(origin = %origin, "PONG");
            }
            Command::Uid {
                nick,
                ts,
                umodes,
                username,
                host,
                uid,
                realname,
                ..
            } => {
                if self.user_manager.get(&uid).is_some() {
                    warn!(uid = %uid, nick = %nick, "UID already known, replacing");
                }
                self.add_user(User::new(uid, nick, username, host, realname, ts).with_umodes(umodes));
            }
            Command::Sjoin {
                ts,
                channel,
                modes,
                params,
                members,
            } => self.handle_sjoin(ts, &channel, &modes, &params, &members),
            Command::Join { ts, channel } => self.handle_join(&source, ts, &channel),
            Command::Part { channel, .. } => {
                if !self.remove_member(&channel, &source) {
                    warn!(uid = %source, channel = %channel, "PART from non-member");
                }
            }
            Command::Kick { channel, target, .. } => {
                let uid = self.user_manager.resolve(&target).unwrap_or(target);
                if !self.remove_member(&channel, &uid) {
                    warn!(target = %uid, channel = %channel, "KICK of non-member");
                }
            }
            Command::Quit { .. } => {
                if self.remove_user(&source).is_none() {
                    warn!(uid = %source, "QUIT from unknown user");
                }
            }
            Command::Tmode {
                ts,
                channel,
                modes,
                params,
            } => {
                let Some(ours) = self.lookup_channel(&channel).map(|c| c.timestamp) else {
                    warn!(channel = %channel, "TMODE for unknown channel");
                    return;
                };
                if ts > ours {
                    debug!(channel = %channel, ts, ours, "Ignoring TMODE with newer TS");
                    return;
                }
                self.apply_channel_modes(&channel, &modes, &params);
            }
            Command::Bmask {
                ts,
                channel,
                list,
                masks,
            } => {
                let Some(ours) = self.lookup_channel(&channel).map(|c| c.timestamp) else {
                    warn!(channel = %channel, "BMASK for unknown channel");
                    return;
                };
                if ts > ours || masks.is_empty() {
                    return;
                }
                let modes: String = std::iter::once('+')
                    .chain(std::iter::repeat_n(list, masks.len()))
                    .collect();
                self.apply_channel_modes(&channel, &modes, &masks);
            }
            Command::Privmsg { target, text } => {
                self.post(Event::Privmsg {
                    source,
                    target,
                    text,
                });
            }
            Command::Notice { target, .. } => {
                trace!(source = %source, target = %target, "NOTICE");
            }
            Command::Error { message } => {
                error!(message = %message, "Uplink sent ERROR");
            }
            Command::Raw { verb, .. } => {
                trace!(verb = %verb, "Unhandled command");
            }
        }
    }

    fn handle_ping(&mut self, origin: String) {
        if let Err(e) = self.send_from_server(Command::Pong {
            origin: self.me.name.clone(),
            target: Some(origin),
        }) {
            debug!(error = %e, "PONG not sent, link is going away");
        }

        // The uplink pings us once its burst is done.
        if self.link_state == LinkState::Bursting {
            self.link_state = LinkState::Synced;
            info!("Uplink finished bursting");
            self.post(Event::EndOfBurst);
        }
    }

    /// SJOIN timestamp rules: a lower TS replaces ours and wipes our modes
    /// and statuses; an equal TS merges; a higher TS keeps only the members.
    fn handle_sjoin(&mut self, ts: i64, channel: &str, modes: &str, params: &[String], members: &[String]) {
        let Some(chan) = self.create_or_get_channel(channel, ts) else {
            return;
        };
        let name = chan.name().to_string();
        let ours = chan.timestamp;

        if ts < ours {
            self.lower_channel_ts(&name, ts);
        }
        let accept = ts <= ours;

        if accept && !modes.is_empty() && modes != "+" {
            self.apply_channel_modes(&name, modes, params);
        }

        for member in members {
            let uid = member.trim_start_matches(|c| StatusMode::from_prefix(c).is_some());
            if self.user_manager.get(uid).is_none() {
                warn!(uid = %uid, channel = %name, "SJOIN with unknown user");
                continue;
            }
            self.add_member(&name, uid);

            if accept {
                let prefixes = &member[..member.len() - uid.len()];
                for status in prefixes.chars().filter_map(StatusMode::from_prefix) {
                    self.set_status(ModeAction::Add, status, uid, &name);
                }
            }
        }

        self.remove_channel_if_empty(&name);
    }

    fn handle_join(&mut self, uid: &str, ts: i64, channel: &str) {
        if self.user_manager.get(uid).is_none() {
            warn!(uid = %uid, channel = %channel, "JOIN from unknown user");
            return;
        }

        if channel == "0" {
            for name in self.channel_manager.channels_of(uid) {
                self.remove_member(&name, uid);
            }
            return;
        }

        let Some(chan) = self.create_or_get_channel(channel, ts) else {
            return;
        };
        let name = chan.name().to_string();
        if ts < chan.timestamp {
            self.lower_channel_ts(&name, ts);
        }
        self.add_member(&name, uid);
    }

    /// Adopt a lower TS: every mode and status we held is dropped.
    fn lower_channel_ts(&mut self, channel: &str, ts: i64) {
        let Some(chan) = self.channel_manager.get_mut(channel) else {
            return;
        };
        info!(channel = %chan, old = chan.timestamp, new = ts, "Channel TS lowered, resetting modes");
        chan.timestamp = ts;

        let mut cleared: Vec<(ChannelMode, Option<String>)> = chan
            .modes()
            .iter()
            .map(|&mode| {
                let param = match mode {
                    ChannelMode::Keyed => chan.key().map(str::to_string),
                    _ => chan.extra_param(mode).map(str::to_string),
                };
                (mode, param)
            })
            .collect();
        cleared.sort();
        chan.clear_modes();

        let name = chan.name().to_string();
        let members: Vec<String> = chan.members().iter().cloned().collect();

        for (mode, param) in cleared {
            self.post(Event::ModeDeletedOnChannel {
                mode: Mode::Channel(mode),
                param,
                channel: name.clone(),
            });
        }

        for uid in members {
            for status in [StatusMode::Operator, StatusMode::Voice] {
                let held = self
                    .user_manager
                    .get(&uid)
                    .is_some_and(|u| u.has_status_mode(&name, status));
                if held {
                    self.set_status(ModeAction::Delete, status, &uid, &name);
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::state::ServerIdentity;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::sync::mpsc;

    fn matrix() -> (Matrix, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let me = ServerIdentity {
            name: "services.example.net".into(),
            sid: "0SV".into(),
            description: "Services".into(),
        };
        let mut m = Matrix::new(me, tx);
        for line in [
            ":0AA UID alice 1 1000 +i alice example.org 192.0.2.1 0AAAAAAAB :Alice",
            ":0AA UID bob 1 1000 +i bob example.org 192.0.2.2 0AAAAAAAC :Bob",
        ] {
            m.handle_line(line);
        }
        (m, rx)
    }

    #[test]
    fn uid_registers_user() {
        let (m, _rx) = matrix();
        let alice = m.user_manager.lookup("Alice").unwrap();
        assert_eq!(alice.uid, "0AAAAAAAB");
        assert_eq!(alice.umodes, "+i");
    }

    #[test]
    fn sjoin_creates_channel_with_modes_and_prefixes() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #ops +ntk secret :@0AAAAAAAB +0AAAAAAAC");

        let chan = m.lookup_channel("#ops").unwrap();
        assert_eq!(chan.timestamp, 500);
        assert_eq!(chan.key(), Some("secret"));
        assert!(chan.has_mode(ChannelMode::NoExternal));
        assert_eq!(chan.member_count(), 2);

        let alice = m.user_manager.get("0AAAAAAAB").unwrap();
        let bob = m.user_manager.get("0AAAAAAAC").unwrap();
        assert!(alice.has_status_mode("#ops", StatusMode::Operator));
        assert!(bob.has_status_mode("#ops", StatusMode::Voice));
    }

    #[test]
    fn sjoin_with_lower_ts_resets_our_state() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #ops +s :@0AAAAAAAB");
        m.handle_line(":0AA SJOIN 400 #ops +m :0AAAAAAAC");

        let chan = m.lookup_channel("#ops").unwrap();
        assert_eq!(chan.timestamp, 400);
        assert!(!chan.has_mode(ChannelMode::Secret));
        assert!(chan.has_mode(ChannelMode::Moderated));
        let alice = m.user_manager.get("0AAAAAAAB").unwrap();
        assert!(!alice.has_status_mode("#ops", StatusMode::Operator));
    }

    #[test]
    fn sjoin_with_higher_ts_keeps_only_members() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #ops +n :0AAAAAAAB");
        m.handle_line(":0AA SJOIN 900 #ops +m :@0AAAAAAAC");

        let chan = m.lookup_channel("#ops").unwrap();
        assert_eq!(chan.timestamp, 500);
        assert!(!chan.has_mode(ChannelMode::Moderated));
        assert!(chan.is_member("0AAAAAAAC"));
        let bob = m.user_manager.get("0AAAAAAAC").unwrap();
        assert!(!bob.has_status_mode("#ops", StatusMode::Operator));
    }

    #[test]
    fn sjoin_of_unknown_users_leaves_no_channel() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #ghosts + :@0AAZZZZZZ");
        assert!(m.lookup_channel("#ghosts").is_none());
    }

    #[test]
    fn tmode_with_newer_ts_is_ignored() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #ops + :0AAAAAAAB");
        m.handle_line(":0AAAAAAAB TMODE 600 #ops +s");
        assert!(!m.lookup_channel("#ops").unwrap().has_mode(ChannelMode::Secret));
        m.handle_line(":0AAAAAAAB TMODE 500 #ops +s");
        assert!(m.lookup_channel("#ops").unwrap().has_mode(ChannelMode::Secret));
    }

    #[test]
    fn bmask_forwards_list_entries() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #ops + :0AAAAAAAB");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        m.handle(EventKind::ModeAddedOnChannel, move |_, event| {
            if let Event::ModeAddedOnChannel { mode, param, .. } = event {
                log.borrow_mut().push((*mode, param.clone()));
            }
        });

        m.handle_line(":0AA BMASK 500 #ops b :*!*@a.example *!*@b.example");
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1.as_deref(), Some("*!*@b.example"));
        assert!(m.lookup_channel("#ops").unwrap().modes().is_empty());
    }

    #[test]
    fn join_zero_parts_everything() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #a + :0AAAAAAAB");
        m.handle_line(":0AA SJOIN 500 #b + :0AAAAAAAB 0AAAAAAAC");
        m.handle_line(":0AAAAAAAB JOIN 0");

        assert!(m.lookup_channel("#a").is_none());
        assert_eq!(m.lookup_channel("#b").unwrap().member_count(), 1);
    }

    #[test]
    fn kick_and_quit_clean_up() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN 500 #ops + :0AAAAAAAB 0AAAAAAAC");
        m.handle_line(":0AAAAAAAB KICK #ops 0AAAAAAAC :out");
        assert!(!m.lookup_channel("#ops").unwrap().is_member("0AAAAAAAC"));

        m.handle_line(":0AAAAAAAB QUIT :bye");
        assert!(m.lookup_channel("#ops").is_none());
        assert!(m.user_manager.get("0AAAAAAAB").is_none());
    }

    #[test]
    fn first_ping_after_burst_ends_it() {
        let (mut m, mut rx) = matrix();
        m.link_state = LinkState::Bursting;

        let bursts = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&bursts);
        m.handle(EventKind::EndOfBurst, move |_, _| *counter.borrow_mut() += 1);

        m.handle_line("PING :hub.example.net");
        m.handle_line("PING :hub.example.net");

        assert_eq!(*bursts.borrow(), 1);
        assert_eq!(m.link_state, LinkState::Synced);
        let pong = rx.try_recv().unwrap();
        assert_eq!(pong.to_string(), ":0SV PONG services.example.net :hub.example.net");
    }

    #[test]
    fn ping_on_closed_link_still_ends_burst() {
        let (mut m, rx) = matrix();
        drop(rx);
        m.link_state = LinkState::Bursting;

        m.handle_line("PING :hub.example.net");
        assert_eq!(m.link_state, LinkState::Synced);
    }

    #[test]
    fn privmsg_is_posted() {
        let (mut m, _rx) = matrix();
        let seen = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        m.handle(EventKind::Privmsg, move |_, event| {
            *slot.borrow_mut() = Some(event.clone());
        });

        m.handle_line(":0AAAAAAAB PRIVMSG 0SVAAAAAA :help");
        assert_eq!(
            *seen.borrow(),
            Some(Event::Privmsg {
                source: "0AAAAAAAB".into(),
                target: "0SVAAAAAA".into(),
                text: "help".into(),
            })
        );
    }

    #[test]
    fn malformed_lines_are_dropped() {
        let (mut m, _rx) = matrix();
        m.handle_line(":0AA SJOIN notanumber #ops + :0AAAAAAAB");
        m.handle_line("");
        assert!(m.channel_manager.is_empty());
    }
}
