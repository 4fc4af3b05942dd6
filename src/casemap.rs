//! IRC case-mapping for channel and nickname keys.
//!
//! Channel names and nicknames are compared with the `rfc1459` mapping, in
//! which `[]\~` are the uppercase forms of `{}|^`.

/// Convert a single character to IRC lowercase.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Convert a name to the key used by the registries.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}
