//! UID generation for our pseudo-clients.

/// Unique identifier for a user (TS6 UID string).
pub type Uid = String;

/// Server identifier (TS6 SID, 3 characters).
pub type Sid = String;

/// Generates UIDs in TS6 format.
///
/// Format: SID (3 chars) + client ID (6 chars, `A-Z` then `0-9`).
/// The first UID handed out is `<SID>AAAAAA`.
#[derive(Debug)]
pub struct UidGenerator {
    sid: Sid,
    counter: u64,
}

impl UidGenerator {
    pub fn new(sid: impl Into<Sid>) -> Self {
        Self {
            sid: sid.into(),
            counter: 0,
        }
    }

    /// Generate the next UID.
    pub fn next_uid(&mut self) -> Uid {
        let n = self.counter;
        self.counter += 1;
        format!("{}{}", self.sid, base36_encode_6(n))
    }
}

/// Encode a number as a 6-character base36 string.
fn base36_encode_6(mut n: u64) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut result = [b'A'; 6];

    for slot in result.iter_mut().rev() {
        *slot = CHARS[(n % 36) as usize];
        n /= 36;
    }

    String::from_utf8_lossy(&result).into_owned()
}
