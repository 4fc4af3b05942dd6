//! User entity.

use crate::casemap::irc_to_lower;
use crate::modes::StatusMode;
use crate::state::Uid;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A user known to the network: one of our pseudo-clients or a remote user
/// introduced by `UID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub uid: Uid,
    pub nick: String,
    pub username: String,
    pub host: String,
    pub realname: String,
    /// User mode string as introduced, e.g. `+iS`.
    pub umodes: String,
    /// Nick TS.
    pub timestamp: i64,
    /// Status held on each channel, keyed by casemapped channel name.
    status_modes: HashMap<String, BTreeSet<StatusMode>>,
}

impl User {
    pub fn new(
        uid: impl Into<Uid>,
        nick: impl Into<String>,
        username: impl Into<String>,
        host: impl Into<String>,
        realname: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            uid: uid.into(),
            nick: nick.into(),
            username: username.into(),
            host: host.into(),
            realname: realname.into(),
            umodes: "+".to_string(),
            timestamp,
            status_modes: HashMap::new(),
        }
    }

    pub fn with_umodes(mut self, umodes: impl Into<String>) -> Self {
        self.umodes = umodes.into();
        self
    }

    /// Registry key for this user.
    pub fn key(&self) -> &str {
        &self.uid
    }

    pub fn add_status_mode(&mut self, channel: &str, status: StatusMode) {
        self.status_modes
            .entry(irc_to_lower(channel))
            .or_default()
            .insert(status);
    }

    pub fn remove_status_mode(&mut self, channel: &str, status: StatusMode) {
        let key = irc_to_lower(channel);
        if let Some(set) = self.status_modes.get_mut(&key) {
            set.remove(&status);
            if set.is_empty() {
                self.status_modes.remove(&key);
            }
        }
    }

    pub fn has_status_mode(&self, channel: &str, status: StatusMode) -> bool {
        self.status_modes
            .get(&irc_to_lower(channel))
            .is_some_and(|set| set.contains(&status))
    }

    /// Prefix string for SJOIN, highest status first.
    pub fn prefixes(&self, channel: &str) -> String {
        self.status_modes
            .get(&irc_to_lower(channel))
            .map(|set| set.iter().map(|s| s.prefix()).collect())
            .unwrap_or_default()
    }

    /// Drop all status bookkeeping for a channel the user left.
    pub fn forget_channel(&mut self, channel: &str) {
        self.status_modes.remove(&irc_to_lower(channel));
    }

    /// Channels on which this user holds any status.
    pub fn status_channels(&self) -> impl Iterator<Item = &str> {
        self.status_modes.keys().map(String::as_str)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new("0AAAAAAAB", "alice", "alice", "example.org", "Alice", 1)
    }

    #[test]
    fn status_is_per_channel_and_casemapped() {
        let mut user = alice();
        user.add_status_mode("#Ops", StatusMode::Operator);
        assert!(user.has_status_mode("#ops", StatusMode::Operator));
        assert!(!user.has_status_mode("#other", StatusMode::Operator));
        assert!(!user.has_status_mode("#ops", StatusMode::Voice));
    }

    #[test]
    fn prefixes_are_ordered() {
        let mut user = alice();
        user.add_status_mode("#ops", StatusMode::Voice);
        user.add_status_mode("#ops", StatusMode::Operator);
        assert_eq!(user.prefixes("#ops"), "@+");
    }

    #[test]
    fn forget_channel_drops_status() {
        let mut user = alice();
        user.add_status_mode("#ops", StatusMode::Operator);
        user.forget_channel("#OPS");
        assert!(!user.has_status_mode("#ops", StatusMode::Operator));
        assert_eq!(user.status_channels().count(), 0);
    }

    #[test]
    fn removing_last_status_prunes_entry() {
        let mut user = alice();
        user.add_status_mode("#ops", StatusMode::Voice);
        user.remove_status_mode("#ops", StatusMode::Voice);
        assert_eq!(user.status_channels().count(), 0);
    }
}
