//! TS6 line tokenizing and formatting.

use super::command::Command;
use crate::error::WireError;
use std::fmt;
use std::str::FromStr;

/// One protocol line: an optional source (SID or UID) and a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub source: Option<String>,
    pub command: Command,
}

impl Message {
    pub fn new(command: Command) -> Self {
        Self {
            source: None,
            command,
        }
    }

    pub fn with_source(source: impl Into<String>, command: Command) -> Self {
        Self {
            source: Some(source.into()),
            command,
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Self::new(command)
    }
}

/// Split a line into source, verb and parameters.
fn tokenize(line: &str) -> Result<(Option<&str>, &str, Vec<String>), WireError> {
    let mut rest = line.trim_end_matches(['\r', '\n']).trim_start();

    let source = match rest.strip_prefix(':') {
        Some(stripped) => {
            let (src, tail) = stripped.split_once(' ').unwrap_or((stripped, ""));
            rest = tail.trim_start();
            Some(src)
        }
        None => None,
    };

    let (verb, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
    if verb.is_empty() {
        return Err(WireError::Empty);
    }

    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_string());
            break;
        }
        let (param, tail) = rest.split_once(' ').unwrap_or((rest, ""));
        params.push(param.to_string());
        rest = tail;
    }

    Ok((source, verb, params))
}

impl FromStr for Message {
    type Err = WireError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (source, verb, params) = tokenize(line)?;
        Ok(Self {
            source: source.map(str::to_string),
            command: Command::parse(verb, params)?,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, ":{} ", source)?;
        }

        let (verb, params, trailing) = self.command.to_parts();
        f.write_str(verb)?;

        let last = params.len().saturating_sub(1);
        for (i, param) in params.iter().enumerate() {
            let needs_colon =
                i == last && (trailing || param.is_empty() || param.contains(' ') || param.starts_with(':'));
            if needs_colon {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }
        Ok(())
    }
}
