//! Integration tests for reentrant event dispatch through the Matrix.

mod common;

use common::TestNetwork;
use slservd::events::{Dispatch, Event, EventKind};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn nested_posts_run_before_later_handlers() {
    let mut net = TestNetwork::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&order);
    net.matrix.handle(EventKind::ChannelAdded, move |m, _| {
        log.borrow_mut().push("h1 before");
        m.post(Event::EndOfBurst);
        log.borrow_mut().push("h1 after");
    });
    let log = Rc::clone(&order);
    net.matrix.handle(EventKind::ChannelAdded, move |_, _| log.borrow_mut().push("h2"));
    let log = Rc::clone(&order);
    net.matrix.handle(EventKind::EndOfBurst, move |_, _| log.borrow_mut().push("b1"));
    let log = Rc::clone(&order);
    net.matrix.handle(EventKind::EndOfBurst, move |_, _| log.borrow_mut().push("b2"));

    net.matrix.create_or_get_channel("#ops", 1000);

    assert_eq!(*order.borrow(), vec!["h1 before", "b1", "b2", "h1 after", "h2"]);
}

#[test]
fn handler_mutations_are_visible_to_later_handlers() {
    let mut net = TestNetwork::new();
    net.remote_user("alice", "0AAAAAAAB");

    // First handler joins alice to every new channel; the second sees her.
    net.matrix.handle(EventKind::ChannelAdded, |m, event| {
        if let Event::ChannelAdded { channel } = event {
            m.add_member(channel, "0AAAAAAAB");
        }
    });
    let seen = Rc::new(RefCell::new(0));
    let count = Rc::clone(&seen);
    net.matrix.handle(EventKind::ChannelAdded, move |m, event| {
        if let Event::ChannelAdded { channel } = event {
            *count.borrow_mut() = m.lookup_channel(channel).map_or(0, |c| c.member_count());
        }
    });

    net.matrix.create_or_get_channel("#ops", 1000);
    assert_eq!(*seen.borrow(), 1);
}

#[test]
fn handler_removing_channel_is_tolerated() {
    let mut net = TestNetwork::new();
    net.remote_user("alice", "0AAAAAAAB");
    net.remote_user("bob", "0AAAAAAAC");
    net.feed(&[":0AA SJOIN 1000 #ops + :0AAAAAAAB"]);

    // Kick alice out as soon as anything changes, emptying the channel
    // while the mode string is still being applied.
    net.matrix.handle(EventKind::ModeAddedOnChannel, |m, event| {
        if let Event::ModeAddedOnChannel { channel, .. } = event {
            m.remove_member(channel, "0AAAAAAAB");
        }
    });

    let changes = net.matrix.apply_channel_modes("#ops", "+nt", &[] as &[&str]);
    assert_eq!(changes.len(), 1);
    assert!(net.matrix.lookup_channel("#ops").is_none());
}

#[test]
fn unhandled_handlers_stop_firing() {
    let mut net = TestNetwork::new();
    let fired = Rc::new(RefCell::new(0));
    let count = Rc::clone(&fired);
    let id = net
        .matrix
        .handle(EventKind::ChannelAdded, move |_, _| *count.borrow_mut() += 1);

    net.matrix.create_or_get_channel("#a", 1);
    assert!(net.matrix.bus_mut().unhandle(id));
    net.matrix.create_or_get_channel("#b", 1);

    assert_eq!(*fired.borrow(), 1);
}
