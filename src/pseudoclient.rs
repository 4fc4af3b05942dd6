//! Configured pseudo-clients.
//!
//! Each `[[pseudoclient]]` block is introduced when our burst starts and
//! joined to its channels once the uplink has finished bursting, so our
//! joins are judged against the network's real channel state.

use crate::config::PseudoClientBlock;
use crate::events::{Dispatch, EventKind, HandlerId};
use crate::state::Matrix;
use std::rc::Rc;
use tracing::warn;

/// Hook the pseudo-clients into the burst events.
pub fn register(matrix: &mut Matrix, blocks: Vec<PseudoClientBlock>) -> [HandlerId; 2] {
    let blocks = Rc::new(blocks);

    let intro = Rc::clone(&blocks);
    let start = matrix.handle(EventKind::StartOfBurst, move |m, _| {
        for block in intro.iter() {
            let host = block.host.clone().unwrap_or_else(|| m.me.name.clone());
            let realname = if block.realname.is_empty() {
                &block.nick
            } else {
                &block.realname
            };
            if let Err(e) = m.introduce_user(&block.nick, &block.user, &host, realname) {
                warn!(nick = %block.nick, error = %e, "Failed to introduce pseudo-client");
            }
        }
    });

    let end = matrix.handle(EventKind::EndOfBurst, move |m, _| {
        for block in blocks.iter() {
            let Some(uid) = m.user_manager.uid_by_nick(&block.nick).cloned() else {
                warn!(nick = %block.nick, "Pseudo-client is gone, not joining channels");
                continue;
            };
            for channel in &block.channels {
                if let Err(e) = m.join(&uid, channel) {
                    warn!(nick = %block.nick, channel = %channel, error = %e, "Pseudo-client join failed");
                }
            }
        }
    });

    [start, end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::StatusMode;
    use crate::state::ServerIdentity;
    use crate::wire::Message;
    use tokio::sync::mpsc;

    fn block(nick: &str, channels: &[&str]) -> PseudoClientBlock {
        PseudoClientBlock {
            nick: nick.to_string(),
            user: "services".to_string(),
            host: None,
            realname: String::new(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn introduced_on_burst_and_joined_after() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let me = ServerIdentity {
            name: "services.example.net".into(),
            sid: "0SV".into(),
            description: "Services".into(),
        };
        let mut m = Matrix::new(me, tx);
        register(&mut m, vec![block("ChanServ", &["#services"])]);

        m.on_connect("linkpass").unwrap();
        let lines: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|msg| msg.to_string())
            .collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[4].contains(" UID ChanServ 1 "));
        assert!(lines[4].ends_with("services services.example.net 0 0SVAAAAAA :ChanServ"));
        assert!(m.lookup_channel("#services").is_none());

        m.handle_line("PING :hub.example.net");
        let lines: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|msg| msg.to_string())
            .collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with(":0SV SJOIN "));
        assert!(lines[1].ends_with(" #services + :@0SVAAAAAA"));

        let chanserv = m.user_manager.get("0SVAAAAAA").unwrap();
        assert!(chanserv.has_status_mode("#services", StatusMode::Operator));
    }
}
