//! Synchronous event bus.
//!
//! Posting an event runs every handler registered for its kind, in
//! registration order, before `post` returns. A handler that posts another
//! event runs that event's handlers to completion before the outer event's
//! remaining handlers (depth-first). Handlers registered while an event is
//! being dispatched do not see that event.
//!
//! Handlers get `&mut` access to the context that owns the bus, so they
//! must look entities up again after posting: a nested event may have
//! deleted the channel or user they were working on.

use crate::modes::Mode;
use crate::state::{Channel, Uid, User};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Everything the core announces.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// First reference to a new channel name.
    ChannelAdded { channel: String },
    /// Last member left; carries the removed channel.
    ChannelDeleted { channel: Channel },
    /// Non-status mode set, list entry added, or status granted.
    ModeAddedOnChannel {
        mode: Mode,
        param: Option<String>,
        channel: String,
    },
    /// Non-status mode cleared, list entry removed, or status revoked.
    ModeDeletedOnChannel {
        mode: Mode,
        param: Option<String>,
        channel: String,
    },
    UserJoinedChannel { uid: Uid, channel: String },
    UserPartedChannel { uid: Uid, channel: String },
    /// A user was introduced, by us or by the uplink.
    UserAdded { uid: Uid },
    /// A user quit; carries the removed user.
    UserDeleted { user: User },
    /// Transport connected and our handshake was sent.
    Connected,
    /// Transport closed.
    Disconnected,
    /// Time to introduce our pseudo-clients.
    StartOfBurst,
    /// The uplink finished its burst.
    EndOfBurst,
    Privmsg {
        source: String,
        target: String,
        text: String,
    },
}

/// Discriminant used as the subscription key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChannelAdded,
    ChannelDeleted,
    ModeAddedOnChannel,
    ModeDeletedOnChannel,
    UserJoinedChannel,
    UserPartedChannel,
    UserAdded,
    UserDeleted,
    Connected,
    Disconnected,
    StartOfBurst,
    EndOfBurst,
    Privmsg,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ChannelAdded { .. } => EventKind::ChannelAdded,
            Self::ChannelDeleted { .. } => EventKind::ChannelDeleted,
            Self::ModeAddedOnChannel { .. } => EventKind::ModeAddedOnChannel,
            Self::ModeDeletedOnChannel { .. } => EventKind::ModeDeletedOnChannel,
            Self::UserJoinedChannel { .. } => EventKind::UserJoinedChannel,
            Self::UserPartedChannel { .. } => EventKind::UserPartedChannel,
            Self::UserAdded { .. } => EventKind::UserAdded,
            Self::UserDeleted { .. } => EventKind::UserDeleted,
            Self::Connected => EventKind::Connected,
            Self::Disconnected => EventKind::Disconnected,
            Self::StartOfBurst => EventKind::StartOfBurst,
            Self::EndOfBurst => EventKind::EndOfBurst,
            Self::Privmsg { .. } => EventKind::Privmsg,
        }
    }
}

/// Registered callback. `C` is the context that owns the bus.
pub type Handler<C> = Rc<dyn Fn(&mut C, &Event)>;

/// Token returned by [`EventBus::handle`], used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

pub struct EventBus<C> {
    handlers: HashMap<EventKind, Vec<(HandlerId, Handler<C>)>>,
    next_id: u64,
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register a handler for one event kind.
    pub fn handle<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&mut C, &Event) + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Rc::new(handler)));
        id
    }

    /// Unregister a handler. Returns false if it was not registered.
    pub fn unhandle(&mut self, id: HandlerId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(h, _)| *h == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// The handlers registered for `kind` right now, in order.
    pub fn handlers(&self, kind: EventKind) -> Vec<Handler<C>> {
        self.handlers
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A context that owns an event bus and can post to it.
pub trait Dispatch: Sized {
    fn bus(&self) -> &EventBus<Self>;

    fn bus_mut(&mut self) -> &mut EventBus<Self>;

    /// Dispatch `event` to its handlers synchronously.
    fn post(&mut self, event: Event) {
        let handlers = self.bus().handlers(event.kind());
        trace!(kind = ?event.kind(), handlers = handlers.len(), "Posting event");
        for handler in handlers {
            handler(self, &event);
        }
    }

    /// Shorthand for `bus_mut().handle(..)`.
    fn handle<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&mut Self, &Event) + 'static,
    {
        self.bus_mut().handle(kind, handler)
    }
}
