//! TS6 commands used by the services link.

use crate::error::WireError;

/// A TS6 command. Anything not modelled here is kept as [`Command::Raw`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `PASS <password> TS 6 :<sid>`
    Pass { password: String, sid: String },
    /// `CAPAB :<caps>`
    Capab(Vec<String>),
    /// `SERVER <name> <hopcount> :<description>`
    Server {
        name: String,
        hopcount: u32,
        description: String,
    },
    /// `SID <name> <hopcount> <sid> :<description>`
    Sid {
        name: String,
        hopcount: u32,
        sid: String,
        description: String,
    },
    /// `SVINFO 6 6 0 :<current time>`
    Svinfo { ts: i64 },
    /// `UID <nick> <hops> <ts> <umodes> <user> <host> <ip> <uid> :<gecos>`
    Uid {
        nick: String,
        hopcount: u32,
        ts: i64,
        umodes: String,
        username: String,
        host: String,
        ip: String,
        uid: String,
        realname: String,
    },
    /// `SJOIN <ts> <channel> <modes> [params...] :<prefixed uids>`
    Sjoin {
        ts: i64,
        channel: String,
        modes: String,
        params: Vec<String>,
        members: Vec<String>,
    },
    /// `JOIN <ts> <channel> +`; `JOIN 0` parts every channel.
    Join { ts: i64, channel: String },
    Part {
        channel: String,
        reason: Option<String>,
    },
    Kick {
        channel: String,
        target: String,
        reason: Option<String>,
    },
    Quit { reason: Option<String> },
    /// `TMODE <ts> <channel> <modes> [params...]`
    Tmode {
        ts: i64,
        channel: String,
        modes: String,
        params: Vec<String>,
    },
    /// `BMASK <ts> <channel> <type> :<masks>`
    Bmask {
        ts: i64,
        channel: String,
        list: char,
        masks: Vec<String>,
    },
    Ping { origin: String, target: Option<String> },
    Pong { origin: String, target: Option<String> },
    Privmsg { target: String, text: String },
    Notice { target: String, text: String },
    Error { message: String },
    Raw { verb: String, params: Vec<String> },
}

fn need(params: &[String], command: &'static str, needed: usize) -> Result<(), WireError> {
    if params.len() < needed {
        Err(WireError::NeedMoreParams {
            command,
            needed,
            got: params.len(),
        })
    } else {
        Ok(())
    }
}

fn parse_ts(s: &str) -> Result<i64, WireError> {
    s.parse()
        .map_err(|_| WireError::InvalidTimestamp(s.to_string()))
}

fn parse_hops(s: &str) -> u32 {
    s.parse().unwrap_or(1)
}

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

impl Command {
    /// Build a typed command from a verb and its already-split parameters.
    pub fn parse(verb: &str, mut p: Vec<String>) -> Result<Self, WireError> {
        let verb = verb.to_ascii_uppercase();
        let cmd = match verb.as_str() {
            "PASS" => {
                need(&p, "PASS", 1)?;
                let sid = p.get(3).cloned().unwrap_or_default();
                Self::Pass {
                    password: p.swap_remove(0),
                    sid,
                }
            }
            "CAPAB" => Self::Capab(p.last().map(|s| words(s)).unwrap_or_default()),
            "SERVER" => {
                need(&p, "SERVER", 3)?;
                Self::Server {
                    hopcount: parse_hops(&p[1]),
                    description: p.swap_remove(2),
                    name: p.swap_remove(0),
                }
            }
            "SID" => {
                need(&p, "SID", 4)?;
                let mut it = p.into_iter();
                let name = it.next().unwrap_or_default();
                let hopcount = parse_hops(&it.next().unwrap_or_default());
                let sid = it.next().unwrap_or_default();
                let description = it.next().unwrap_or_default();
                Self::Sid {
                    name,
                    hopcount,
                    sid,
                    description,
                }
            }
            "SVINFO" => {
                need(&p, "SVINFO", 4)?;
                Self::Svinfo {
                    ts: parse_ts(&p[3])?,
                }
            }
            "UID" => {
                need(&p, "UID", 9)?;
                let ts = parse_ts(&p[2])?;
                let hopcount = parse_hops(&p[1]);
                let mut it = p.into_iter();
                let nick = it.next().unwrap_or_default();
                let mut it = it.skip(2);
                Self::Uid {
                    nick,
                    hopcount,
                    ts,
                    umodes: it.next().unwrap_or_default(),
                    username: it.next().unwrap_or_default(),
                    host: it.next().unwrap_or_default(),
                    ip: it.next().unwrap_or_default(),
                    uid: it.next().unwrap_or_default(),
                    realname: it.next().unwrap_or_default(),
                }
            }
            "SJOIN" => {
                need(&p, "SJOIN", 4)?;
                let ts = parse_ts(&p[0])?;
                let members = p.pop().map(|m| words(&m)).unwrap_or_default();
                let mut it = p.into_iter().skip(1);
                Self::Sjoin {
                    ts,
                    channel: it.next().unwrap_or_default(),
                    modes: it.next().unwrap_or_default(),
                    params: it.collect(),
                    members,
                }
            }
            "JOIN" => {
                need(&p, "JOIN", 1)?;
                if p[0] == "0" {
                    Self::Join {
                        ts: 0,
                        channel: "0".to_string(),
                    }
                } else {
                    need(&p, "JOIN", 2)?;
                    Self::Join {
                        ts: parse_ts(&p[0])?,
                        channel: p.swap_remove(1),
                    }
                }
            }
            "PART" => {
                need(&p, "PART", 1)?;
                let mut it = p.into_iter();
                Self::Part {
                    channel: it.next().unwrap_or_default(),
                    reason: it.next(),
                }
            }
            "KICK" => {
                need(&p, "KICK", 2)?;
                let mut it = p.into_iter();
                Self::Kick {
                    channel: it.next().unwrap_or_default(),
                    target: it.next().unwrap_or_default(),
                    reason: it.next(),
                }
            }
            "QUIT" => Self::Quit { reason: p.pop() },
            "TMODE" => {
                need(&p, "TMODE", 3)?;
                let ts = parse_ts(&p[0])?;
                let mut it = p.into_iter().skip(1);
                Self::Tmode {
                    ts,
                    channel: it.next().unwrap_or_default(),
                    modes: it.next().unwrap_or_default(),
                    params: it.collect(),
                }
            }
            "BMASK" => {
                need(&p, "BMASK", 4)?;
                Self::Bmask {
                    ts: parse_ts(&p[0])?,
                    list: p[2].chars().next().unwrap_or('b'),
                    masks: words(&p[3]),
                    channel: p.swap_remove(1),
                }
            }
            "PING" => {
                need(&p, "PING", 1)?;
                let mut it = p.into_iter();
                Self::Ping {
                    origin: it.next().unwrap_or_default(),
                    target: it.next(),
                }
            }
            "PONG" => {
                need(&p, "PONG", 1)?;
                let mut it = p.into_iter();
                Self::Pong {
                    origin: it.next().unwrap_or_default(),
                    target: it.next(),
                }
            }
            "PRIVMSG" | "NOTICE" => {
                need(&p, if verb == "PRIVMSG" { "PRIVMSG" } else { "NOTICE" }, 2)?;
                let text = p.swap_remove(1);
                let target = p.swap_remove(0);
                if verb == "PRIVMSG" {
                    Self::Privmsg { target, text }
                } else {
                    Self::Notice { target, text }
                }
            }
            "ERROR" => Self::Error {
                message: p.pop().unwrap_or_default(),
            },
            _ => Self::Raw {
                verb: verb.clone(),
                params: p,
            },
        };
        Ok(cmd)
    }

    /// Verb, parameters, and whether the last parameter is always sent as
    /// a trailing (`:`-prefixed) parameter.
    pub fn to_parts(&self) -> (&str, Vec<String>, bool) {
        match self {
            Self::Pass { password, sid } => (
                "PASS",
                vec![password.clone(), "TS".into(), "6".into(), sid.clone()],
                true,
            ),
            Self::Capab(caps) => ("CAPAB", vec![caps.join(" ")], true),
            Self::Server {
                name,
                hopcount,
                description,
            } => (
                "SERVER",
                vec![name.clone(), hopcount.to_string(), description.clone()],
                true,
            ),
            Self::Sid {
                name,
                hopcount,
                sid,
                description,
            } => (
                "SID",
                vec![
                    name.clone(),
                    hopcount.to_string(),
                    sid.clone(),
                    description.clone(),
                ],
                true,
            ),
            Self::Svinfo { ts } => (
                "SVINFO",
                vec!["6".into(), "6".into(), "0".into(), ts.to_string()],
                true,
            ),
            Self::Uid {
                nick,
                hopcount,
                ts,
                umodes,
                username,
                host,
                ip,
                uid,
                realname,
            } => (
                "UID",
                vec![
                    nick.clone(),
                    hopcount.to_string(),
                    ts.to_string(),
                    umodes.clone(),
                    username.clone(),
                    host.clone(),
                    ip.clone(),
                    uid.clone(),
                    realname.clone(),
                ],
                true,
            ),
            Self::Sjoin {
                ts,
                channel,
                modes,
                params,
                members,
            } => {
                let mut out = vec![ts.to_string(), channel.clone(), modes.clone()];
                out.extend(params.iter().cloned());
                out.push(members.join(" "));
                ("SJOIN", out, true)
            }
            Self::Join { ts, channel } => {
                if channel == "0" {
                    ("JOIN", vec!["0".into()], false)
                } else {
                    ("JOIN", vec![ts.to_string(), channel.clone(), "+".into()], false)
                }
            }
            Self::Part { channel, reason } => {
                let mut out = vec![channel.clone()];
                out.extend(reason.iter().cloned());
                ("PART", out, reason.is_some())
            }
            Self::Kick {
                channel,
                target,
                reason,
            } => {
                let mut out = vec![channel.clone(), target.clone()];
                out.extend(reason.iter().cloned());
                ("KICK", out, reason.is_some())
            }
            Self::Quit { reason } => ("QUIT", reason.iter().cloned().collect(), true),
            Self::Tmode {
                ts,
                channel,
                modes,
                params,
            } => {
                let mut out = vec![ts.to_string(), channel.clone(), modes.clone()];
                out.extend(params.iter().cloned());
                ("TMODE", out, false)
            }
            Self::Bmask {
                ts,
                channel,
                list,
                masks,
            } => (
                "BMASK",
                vec![
                    ts.to_string(),
                    channel.clone(),
                    list.to_string(),
                    masks.join(" "),
                ],
                true,
            ),
            Self::Ping { origin, target } => {
                let mut out = vec![origin.clone()];
                out.extend(target.iter().cloned());
                ("PING", out, true)
            }
            Self::Pong { origin, target } => {
                let mut out = vec![origin.clone()];
                out.extend(target.iter().cloned());
                ("PONG", out, true)
            }
            Self::Privmsg { target, text } => ("PRIVMSG", vec![target.clone(), text.clone()], true),
            Self::Notice { target, text } => ("NOTICE", vec![target.clone(), text.clone()], true),
            Self::Error { message } => ("ERROR", vec![message.clone()], true),
            Self::Raw { verb, params } => (verb.as_str(), params.clone(), false),
        }
    }

    /// The verb this command is sent as.
    pub fn verb(&self) -> &str {
        self.to_parts().0
    }
}
