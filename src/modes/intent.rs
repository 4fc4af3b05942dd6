//! Locally originated channel mode changes awaiting emission.
//!
//! Services build a [`ChannelModeIntent`], queue it in [`PendingIntents`]
//! and later emit it by id. Emission removes the intent from the store, so an
//! id can be emitted at most once.

use super::table::{ModeCategory, ModeTable};
use super::types::{ChannelMode, ListMode, Mode, ModeAction, ModeChange, StatusMode};
use crate::state::Uid;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Handle for a queued intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntentId(pub u64);

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending mode change on one channel.
///
/// `origin` is the UID the TMODE is sent from; `None` sends it from our own
/// server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelModeIntent {
    pub origin: Option<Uid>,
    pub channel: String,
    pub changes: Vec<ModeChange>,
}

impl ChannelModeIntent {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            origin: None,
            channel: channel.into(),
            changes: Vec::new(),
        }
    }

    /// Send the change on behalf of a user instead of the server.
    pub fn from_user(mut self, uid: impl Into<Uid>) -> Self {
        self.origin = Some(uid.into());
        self
    }

    pub fn add_status(self, status: StatusMode, target: impl Into<String>) -> Self {
        self.push(ModeAction::Add, status, Some(target.into()))
    }

    pub fn remove_status(self, status: StatusMode, target: impl Into<String>) -> Self {
        self.push(ModeAction::Delete, status, Some(target.into()))
    }

    pub fn add_list(self, list: ListMode, mask: impl Into<String>) -> Self {
        self.push(ModeAction::Add, list, Some(mask.into()))
    }

    pub fn remove_list(self, list: ListMode, mask: impl Into<String>) -> Self {
        self.push(ModeAction::Delete, list, Some(mask.into()))
    }

    /// Set a flag or a parameter mode (`param` is ignored for flags).
    pub fn set(self, mode: ChannelMode, param: Option<String>) -> Self {
        self.push(ModeAction::Add, mode, param)
    }

    /// Clear a flag or parameter mode. The key needs its current value.
    pub fn unset(self, mode: ChannelMode, param: Option<String>) -> Self {
        self.push(ModeAction::Delete, mode, param)
    }

    fn push(mut self, action: ModeAction, mode: impl Into<Mode>, param: Option<String>) -> Self {
        self.changes.push(ModeChange::new(action, mode, param));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Render an intent as a mode string and its parameters.
///
/// Consecutive changes with the same action share one sign, e.g.
/// `+ov-k` with params `[uid1, uid2, key]`. Parameters follow the same
/// consumption rules as [`parse_channel_modes`](super::parse_channel_modes),
/// so the string parses back into the same changes:
///
/// - status, list and `+k`/`+<param mode>` changes without a parameter are
///   skipped;
/// - `-k` always carries one, falling back to `current_key` and then `*`;
/// - `-<param mode>` and flags never carry one.
///
/// Modes the dialect has no character for are left out.
pub fn format_channel_mode(
    table: &ModeTable,
    intent: &ChannelModeIntent,
    current_key: Option<&str>,
) -> (String, Vec<String>) {
    let mut modes = String::new();
    let mut params = Vec::new();
    let mut current = None;

    for change in &intent.changes {
        let Some((c, (category, _))) = table
            .char_for(change.mode)
            .and_then(|c| table.classify(c).map(|class| (c, class)))
        else {
            continue;
        };

        let param = match (category, change.action) {
            (ModeCategory::Status | ModeCategory::List, _)
            | (ModeCategory::Key | ModeCategory::Param, ModeAction::Add) => {
                match &change.param {
                    Some(p) => Some(p.clone()),
                    None => {
                        warn!(channel = %intent.channel, mode = %c, "Skipping mode change without its parameter");
                        continue;
                    }
                }
            }
            (ModeCategory::Key, ModeAction::Delete) => Some(
                change
                    .param
                    .clone()
                    .or_else(|| current_key.map(str::to_string))
                    .unwrap_or_else(|| "*".to_string()),
            ),
            (ModeCategory::Param, ModeAction::Delete) | (ModeCategory::Bool, _) => None,
        };

        if current != Some(change.action) {
            modes.push(change.action.sign());
            current = Some(change.action);
        }
        modes.push(c);
        params.extend(param);
    }

    (modes, params)
}

/// Queue of intents that have not been emitted yet.
#[derive(Debug, Default)]
pub struct PendingIntents {
    pending: HashMap<IntentId, ChannelModeIntent>,
    next_id: u64,
}

impl PendingIntents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, intent: ChannelModeIntent) -> IntentId {
        let id = IntentId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, intent);
        id
    }

    /// Remove an intent for emission.
    ///
    /// `Err(true)` means the id was handed out and already taken; `Err(false)`
    /// means it was never issued by this store.
    pub fn take(&mut self, id: IntentId) -> Result<ChannelModeIntent, bool> {
        match self.pending.remove(&id) {
            Some(intent) => Ok(intent),
            None => Err(id.0 < self.next_id),
        }
    }

    /// Drop every pending intent, returning how many there were. Ids are
    /// never reused.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn get(&self, id: IntentId) -> Option<&ChannelModeIntent> {
        self.pending.get(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
