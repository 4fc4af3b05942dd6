//! Integration tests for a full link: registration, the uplink's burst and
//! our pseudo-clients joining once it ends.

mod common;

use common::{SID, TestNetwork};
use slservd::config::{Config, validate};
use slservd::events::EventKind;
use slservd::modes::StatusMode;
use slservd::pseudoclient;
use slservd::state::LinkState;
use std::io::Write;

const CONFIG: &str = r##"
[server]
name = "services.example.net"
sid = "0SV"
description = "Test Services"

[uplink]
host = "127.0.0.1"
password = "linkpass"

[[pseudoclient]]
nick = "ChanServ"
realname = "Channel Services"
channels = ["#services", "#lobby"]
"##;

fn load_config() -> Config {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let config = Config::load(file.path()).unwrap();
    validate(&config).unwrap();
    config
}

#[test]
fn full_link_lifecycle() {
    let config = load_config();
    let mut net = TestNetwork::new();
    pseudoclient::register(&mut net.matrix, config.pseudoclient.clone());
    let bursts = net.record(&[EventKind::StartOfBurst, EventKind::EndOfBurst]);

    net.matrix.on_connect(&config.uplink.password).unwrap();
    let sent = net.sent();
    assert_eq!(sent[0], format!("PASS linkpass TS 6 :{SID}"));
    assert!(sent[1].starts_with("CAPAB :"));
    assert_eq!(sent[2], "SERVER services.example.net 1 :Test Services");
    assert!(sent[3].starts_with("SVINFO 6 6 0 :"));
    assert!(sent[4].starts_with(&format!(":{SID} UID ChanServ 1 ")));
    assert_eq!(net.matrix.link_state, LinkState::Bursting);

    // The uplink's burst: #lobby already exists with an older TS.
    net.feed(&[
        "PASS linkpass TS 6 :0AA",
        "CAPAB :QS EX IE KLN UNKLN ENCAP TB SERVICES",
        "SERVER hub.example.net 1 :Hub",
        "SVINFO 6 6 0 :1300000000",
        ":0AA UID alice 1 1000 +i alice example.org 192.0.2.1 0AAAAAAAB :Alice",
        ":0AA SJOIN 900 #lobby +ntl 50 :@0AAAAAAAB",
        ":0AA BMASK 900 #lobby b :*!*@spam.example",
    ]);
    assert!(net.sent().is_empty());

    net.feed(&["PING :hub.example.net"]);
    assert_eq!(net.matrix.link_state, LinkState::Synced);
    assert_eq!(bursts.borrow().len(), 2);

    let sent = net.sent();
    assert_eq!(sent[0], format!(":{SID} PONG services.example.net :hub.example.net"));
    let chanserv = net.matrix.user_manager.uid_by_nick("ChanServ").unwrap().clone();

    // #services is new: SJOIN with ChanServ opped.
    assert!(sent[1].starts_with(&format!(":{SID} SJOIN ")));
    assert!(sent[1].ends_with(&format!(" #services + :@{chanserv}")));
    // #lobby exists: JOIN at the uplink's TS, then our server ops ChanServ.
    assert_eq!(sent[2], format!(":{chanserv} JOIN 900 #lobby +"));
    assert_eq!(sent[3], format!(":{SID} TMODE 900 #lobby +o {chanserv}"));

    let lobby = net.matrix.lookup_channel("#lobby").unwrap();
    assert_eq!(lobby.member_count(), 2);
    assert_eq!(lobby.extra_param(slservd::modes::ChannelMode::Limited), Some("50"));
    let cs = net.matrix.user_manager.get(&chanserv).unwrap();
    assert!(cs.has_status_mode("#lobby", StatusMode::Operator));
    assert!(cs.has_status_mode("#services", StatusMode::Operator));

    // A later PING is just answered.
    net.feed(&["PING :hub.example.net"]);
    assert_eq!(net.sent().len(), 1);
    assert_eq!(bursts.borrow().len(), 2);

    net.matrix.on_disconnect();
    assert_eq!(net.matrix.link_state, LinkState::Unconnected);
    assert!(net.matrix.channel_manager.is_empty());
}

#[test]
fn privmsg_to_pseudoclient_reaches_handlers() {
    let config = load_config();
    let mut net = TestNetwork::new();
    pseudoclient::register(&mut net.matrix, config.pseudoclient);
    net.matrix.on_connect("linkpass").unwrap();
    let messages = net.record(&[EventKind::Privmsg]);

    net.feed(&[
        ":0AA UID alice 1 1000 +i alice example.org 192.0.2.1 0AAAAAAAB :Alice",
        ":0AAAAAAAB PRIVMSG 0SVAAAAAA :REGISTER #lobby",
    ]);
    assert_eq!(messages.borrow().len(), 1);
}
