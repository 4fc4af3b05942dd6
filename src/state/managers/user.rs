//! User registry.
//!
//! Users are owned here, keyed by UID, with a casemapped nickname index.
//! Channels refer to users by UID only.

use crate::casemap::irc_to_lower;
use crate::state::{Uid, User};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct UserManager {
    users: HashMap<Uid, User>,
    nicks: HashMap<String, Uid>,
}

impl UserManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user. A previous holder of the nick loses the
    /// index entry.
    pub fn insert(&mut self, user: User) {
        if let Some(old) = self.users.get(&user.uid) {
            self.nicks.remove(&irc_to_lower(&old.nick));
        }
        self.nicks.insert(irc_to_lower(&user.nick), user.uid.clone());
        self.users.insert(user.uid.clone(), user);
    }

    pub fn remove(&mut self, uid: &str) -> Option<User> {
        let user = self.users.remove(uid)?;
        let nick_key = irc_to_lower(&user.nick);
        if self.nicks.get(&nick_key).is_some_and(|u| u == uid) {
            self.nicks.remove(&nick_key);
        }
        Some(user)
    }

    pub fn get(&self, uid: &str) -> Option<&User> {
        self.users.get(uid)
    }

    pub fn get_mut(&mut self, uid: &str) -> Option<&mut User> {
        self.users.get_mut(uid)
    }

    pub fn uid_by_nick(&self, nick: &str) -> Option<&Uid> {
        self.nicks.get(&irc_to_lower(nick))
    }

    /// Resolve an identifier that may be either a UID or a nickname.
    pub fn lookup(&self, identifier: &str) -> Option<&User> {
        self.users.get(identifier).or_else(|| {
            self.uid_by_nick(identifier)
                .and_then(|uid| self.users.get(uid))
        })
    }

    /// Resolve an identifier to the canonical UID.
    pub fn resolve(&self, identifier: &str) -> Option<Uid> {
        self.lookup(identifier).map(|u| u.uid.clone())
    }

    /// Every known UID.
    pub fn uids(&self) -> Vec<Uid> {
        self.users.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uid: &str, nick: &str) -> User {
        User::new(uid, nick, "u", "h", "r", 1)
    }

    #[test]
    fn lookup_by_uid_or_nick() {
        let mut users = UserManager::new();
        users.insert(user("0AAAAAAAB", "Alice"));
        assert_eq!(users.lookup("0AAAAAAAB").map(|u| u.nick.as_str()), Some("Alice"));
        assert_eq!(users.resolve("alice").as_deref(), Some("0AAAAAAAB"));
        assert!(users.lookup("bob").is_none());
    }

    #[test]
    fn replacing_user_reindexes_nick() {
        let mut users = UserManager::new();
        users.insert(user("0AAAAAAAB", "alice"));
        users.insert(user("0AAAAAAAB", "alicia"));
        assert!(users.uid_by_nick("alice").is_none());
        assert!(users.uid_by_nick("alicia").is_some());
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn remove_clears_nick_index() {
        let mut users = UserManager::new();
        users.insert(user("0AAAAAAAB", "alice"));
        assert!(users.remove("0AAAAAAAB").is_some());
        assert!(users.lookup("alice").is_none());
        assert!(users.is_empty());
    }
}
