//! Mode category tables.
//!
//! A table maps each mode character of a protocol dialect to exactly one
//! category. The category alone decides parameter consumption and whether
//! the mode is persisted on the channel.

use super::types::{ChannelMode, ListMode, Mode, StatusMode};
use std::collections::HashMap;

/// How a mode character behaves while parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeCategory {
    /// Always one parameter (a member); stored on the member.
    Status,
    /// Always one parameter (a mask); not stored.
    List,
    /// The channel key: always one parameter.
    Key,
    /// One parameter when added, none when removed.
    Param,
    /// Never a parameter.
    Bool,
}

/// Static category table for one protocol dialect.
#[derive(Clone, Debug)]
pub struct ModeTable {
    status: HashMap<char, StatusMode>,
    list: HashMap<char, ListMode>,
    param: HashMap<char, ChannelMode>,
    boolean: HashMap<char, ChannelMode>,
    key: char,
}

impl ModeTable {
    /// The modes every RFC 1459 server understands.
    pub fn rfc1459() -> Self {
        Self {
            status: HashMap::from([('o', StatusMode::Operator), ('v', StatusMode::Voice)]),
            list: HashMap::from([('b', ListMode::Ban)]),
            param: HashMap::from([('l', ChannelMode::Limited)]),
            boolean: HashMap::from([
                ('i', ChannelMode::InviteOnly),
                ('m', ChannelMode::Moderated),
                ('n', ChannelMode::NoExternal),
                ('p', ChannelMode::Private),
                ('s', ChannelMode::Secret),
                ('t', ChannelMode::TopicLock),
            ]),
            key: 'k',
        }
    }

    /// The charybdis-family TS6 dialect.
    pub fn ts6() -> Self {
        let mut table = Self::rfc1459();
        table.list.extend([
            ('e', ListMode::Exception),
            ('I', ListMode::InviteException),
            ('q', ListMode::Quiet),
        ]);
        table
            .param
            .extend([('f', ChannelMode::Forward), ('j', ChannelMode::JoinThrottle)]);
        table.boolean.extend([
            ('c', ChannelMode::NoColor),
            ('g', ChannelMode::FreeInvite),
            ('r', ChannelMode::RegisteredOnly),
            ('z', ChannelMode::OpModerated),
            ('L', ChannelMode::LargeLists),
            ('P', ChannelMode::Permanent),
            ('F', ChannelMode::FreeTarget),
            ('Q', ChannelMode::DisableForward),
            ('C', ChannelMode::NoCtcp),
        ]);
        table
    }

    /// Resolve a mode character. Status is checked first, then list, key,
    /// param and bool.
    pub fn classify(&self, c: char) -> Option<(ModeCategory, Mode)> {
        if let Some(&m) = self.status.get(&c) {
            Some((ModeCategory::Status, Mode::Status(m)))
        } else if let Some(&m) = self.list.get(&c) {
            Some((ModeCategory::List, Mode::List(m)))
        } else if c == self.key {
            Some((ModeCategory::Key, Mode::Channel(ChannelMode::Keyed)))
        } else if let Some(&m) = self.param.get(&c) {
            Some((ModeCategory::Param, Mode::Channel(m)))
        } else {
            self.boolean
                .get(&c)
                .map(|&m| (ModeCategory::Bool, Mode::Channel(m)))
        }
    }

    /// Reverse lookup used when formatting outgoing mode strings.
    pub fn char_for(&self, mode: Mode) -> Option<char> {
        fn find<V: PartialEq + Copy>(map: &HashMap<char, V>, v: V) -> Option<char> {
            map.iter().find(|(_, x)| **x == v).map(|(c, _)| *c)
        }

        match mode {
            Mode::Status(m) => find(&self.status, m),
            Mode::List(m) => find(&self.list, m),
            Mode::Channel(ChannelMode::Keyed) => Some(self.key),
            Mode::Channel(m) => find(&self.param, m).or_else(|| find(&self.boolean, m)),
        }
    }

    /// The distinguished key mode character.
    pub fn key_char(&self) -> char {
        self.key
    }

    /// Every character this table knows, across all categories.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.status
            .keys()
            .chain(self.list.keys())
            .chain(self.param.keys())
            .chain(self.boolean.keys())
            .copied()
            .chain(std::iter::once(self.key))
    }
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::ts6()
    }
}
