//! Channel registry storage.
//!
//! Holds live channels keyed by casemapped name. Lifecycle operations that
//! post events (create-on-first-reference, delete-when-empty) live on
//! [`Matrix`](crate::state::Matrix), which owns both this manager and the
//! event bus.

use crate::casemap::irc_to_lower;
use crate::state::Channel;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ChannelManager {
    channels: HashMap<String, Channel>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&irc_to_lower(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(&irc_to_lower(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(&irc_to_lower(name))
    }

    /// Insert a new channel. An existing entry under the same name is kept
    /// and `false` is returned.
    pub(crate) fn insert(&mut self, channel: Channel) -> bool {
        let key = irc_to_lower(channel.name());
        if self.channels.contains_key(&key) {
            return false;
        }
        self.channels.insert(key, channel);
        true
    }

    /// Remove a channel only if it has no members.
    pub(crate) fn remove_if_empty(&mut self, name: &str) -> Option<Channel> {
        let key = irc_to_lower(name);
        if self.channels.get(&key)?.is_empty() {
            self.channels.remove(&key)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.channels.values().map(|c| c.name().to_string()).collect()
    }

    /// Names of the channels `uid` is a member of.
    pub fn channels_of(&self, uid: &str) -> Vec<String> {
        self.channels
            .values()
            .filter(|c| c.is_member(uid))
            .map(|c| c.name().to_string())
            .collect()
    }
}
