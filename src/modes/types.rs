//! Channel mode symbols.
//!
//! Modes are split by how they are stored: [`StatusMode`]s live on the
//! (member, channel) pair, [`ListMode`]s are forwarded but not persisted,
//! and [`ChannelMode`]s are the only ones a channel's mode set may hold.

use std::fmt;

/// Per-member channel privileges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusMode {
    /// 'o' - Channel operator
    Operator,
    /// 'v' - Voice
    Voice,
}

impl StatusMode {
    /// The NAMES/SJOIN prefix for this status.
    pub fn prefix(self) -> char {
        match self {
            Self::Operator => '@',
            Self::Voice => '+',
        }
    }

    /// Map an SJOIN member prefix back to a status.
    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            '@' => Some(Self::Operator),
            '+' => Some(Self::Voice),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Voice => "voice",
        }
    }
}

/// Mask list modes. Entries are not mirrored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListMode {
    /// 'b' - Ban mask
    Ban,
    /// 'e' - Ban exception
    Exception,
    /// 'I' - Invite exception
    InviteException,
    /// 'q' - Quiet mask
    Quiet,
}

impl ListMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Exception => "exception",
            Self::InviteException => "invite_exception",
            Self::Quiet => "quiet",
        }
    }
}

/// Modes recorded in a channel's mode set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelMode {
    // === Take a parameter ===
    /// 'k' - Channel key
    Keyed,
    /// 'l' - Member limit
    Limited,
    /// 'f' - Forward target
    Forward,
    /// 'j' - Join throttle
    JoinThrottle,

    // === Flags ===
    /// 'i' - Invite only
    InviteOnly,
    /// 'm' - Moderated
    Moderated,
    /// 'n' - No external messages
    NoExternal,
    /// 'p' - Private
    Private,
    /// 's' - Secret
    Secret,
    /// 't' - Only ops change the topic
    TopicLock,
    /// 'c' - Strip colours
    NoColor,
    /// 'g' - Anyone may invite
    FreeInvite,
    /// 'r' - Registered users only
    RegisteredOnly,
    /// 'z' - Ops see messages blocked by +m/+b
    OpModerated,
    /// 'L' - Large ban lists
    LargeLists,
    /// 'P' - Permanent
    Permanent,
    /// 'F' - Free forward target
    FreeTarget,
    /// 'Q' - Forwarding disabled
    DisableForward,
    /// 'C' - No CTCP
    NoCtcp,
}

impl ChannelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyed => "keyed",
            Self::Limited => "limited",
            Self::Forward => "forward",
            Self::JoinThrottle => "join_throttle",
            Self::InviteOnly => "invite_only",
            Self::Moderated => "moderated",
            Self::NoExternal => "no_external",
            Self::Private => "private",
            Self::Secret => "secret",
            Self::TopicLock => "topic_lock",
            Self::NoColor => "no_color",
            Self::FreeInvite => "free_invite",
            Self::RegisteredOnly => "registered_only",
            Self::OpModerated => "op_moderated",
            Self::LargeLists => "large_lists",
            Self::Permanent => "permanent",
            Self::FreeTarget => "free_target",
            Self::DisableForward => "disable_forward",
            Self::NoCtcp => "no_ctcp",
        }
    }
}

/// Any channel mode symbol, tagged by category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Status(StatusMode),
    List(ListMode),
    Channel(ChannelMode),
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status(m) => m.as_str(),
            Self::List(m) => m.as_str(),
            Self::Channel(m) => m.as_str(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StatusMode> for Mode {
    fn from(m: StatusMode) -> Self {
        Self::Status(m)
    }
}

impl From<ListMode> for Mode {
    fn from(m: ListMode) -> Self {
        Self::List(m)
    }
}

impl From<ChannelMode> for Mode {
    fn from(m: ChannelMode) -> Self {
        Self::Channel(m)
    }
}

/// Direction of a mode change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeAction {
    Add,
    Delete,
}

impl ModeAction {
    pub fn sign(self) -> char {
        match self {
            Self::Add => '+',
            Self::Delete => '-',
        }
    }
}

impl fmt::Display for ModeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// One parsed mode change: the unit both the parser and intents work in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeChange {
    pub action: ModeAction,
    pub mode: Mode,
    pub param: Option<String>,
}

impl ModeChange {
    pub fn new(action: ModeAction, mode: impl Into<Mode>, param: Option<String>) -> Self {
        Self {
            action,
            mode: mode.into(),
            param,
        }
    }

    pub fn is_add(&self) -> bool {
        self.action == ModeAction::Add
    }
}
