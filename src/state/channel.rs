//! Channel entity.

use crate::modes::{ChannelMode, Mode, ModeAction, ModeChange};
use crate::state::Uid;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// A channel mirrored from the network.
///
/// Status modes are never stored here; they live on the [`User`] for the
/// (member, channel) pair. Members are referenced by UID and resolved
/// through the user registry.
///
/// [`User`]: crate::state::User
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    name: String,
    /// Creation TS, used for SJOIN/JOIN/TMODE conflict resolution.
    pub timestamp: i64,
    key: Option<String>,
    modes: HashSet<ChannelMode>,
    extra_params: HashMap<ChannelMode, String>,
    members: BTreeSet<Uid>,
}

impl Channel {
    pub fn new(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            timestamp,
            key: None,
            modes: HashSet::new(),
            extra_params: HashMap::new(),
            members: BTreeSet::new(),
        }
    }

    /// The channel name, including prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key, present iff the channel is `+k`.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn modes(&self) -> &HashSet<ChannelMode> {
        &self.modes
    }

    pub fn has_mode(&self, mode: ChannelMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Value of a parameter mode other than the key (e.g. the `+l` limit).
    pub fn extra_param(&self, mode: ChannelMode) -> Option<&str> {
        self.extra_params.get(&mode).map(String::as_str)
    }

    /// Apply a non-status change to the channel's own state.
    ///
    /// Status changes are ignored here and list changes carry no state.
    pub fn apply_mode(&mut self, change: &ModeChange) {
        let Mode::Channel(mode) = change.mode else {
            return;
        };

        match (change.action, mode) {
            (ModeAction::Add, ChannelMode::Keyed) => {
                let Some(key) = change.param.clone() else {
                    return;
                };
                self.key = Some(key);
                self.modes.insert(mode);
            }
            (ModeAction::Delete, ChannelMode::Keyed) => {
                self.key = None;
                self.modes.remove(&mode);
            }
            (ModeAction::Add, _) => {
                if let Some(param) = &change.param {
                    self.extra_params.insert(mode, param.clone());
                }
                self.modes.insert(mode);
            }
            (ModeAction::Delete, _) => {
                self.extra_params.remove(&mode);
                self.modes.remove(&mode);
            }
        }
    }

    /// Drop every mode, the key and all parameters.
    pub fn clear_modes(&mut self) {
        self.modes.clear();
        self.extra_params.clear();
        self.key = None;
    }

    pub fn members(&self) -> &BTreeSet<Uid> {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_member(&self, uid: &str) -> bool {
        self.members.contains(uid)
    }

    /// Returns false if the user was already a member.
    pub fn add_user(&mut self, uid: Uid) -> bool {
        self.members.insert(uid)
    }

    /// Returns false if the user was not a member.
    pub fn delete_user(&mut self, uid: &str) -> bool {
        self.members.remove(uid)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
