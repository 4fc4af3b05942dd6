//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::casemap::irc_to_lower;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.sid must be exactly 3 characters, got {0}")]
    InvalidSid(usize),
    #[error("server.sid must match pattern [0-9][A-Z0-9][A-Z0-9], got '{0}'")]
    InvalidSidFormat(String),
    #[error("uplink.host is required")]
    MissingUplinkHost,
    #[error("pseudoclient.nick is required")]
    MissingPseudoClientNick,
    #[error("pseudoclient nick '{0}' is used twice")]
    DuplicatePseudoClient(String),
    #[error("pseudoclient '{nick}' has invalid channel name '{channel}'")]
    InvalidChannel { nick: String, channel: String },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    // SID validation (TS6 format)
    let sid = &config.server.sid;
    if sid.len() != 3 {
        errors.push(ValidationError::InvalidSid(sid.len()));
    } else {
        let chars: Vec<char> = sid.chars().collect();
        let valid = chars[0].is_ascii_digit()
            && (chars[1].is_ascii_uppercase() || chars[1].is_ascii_digit())
            && (chars[2].is_ascii_uppercase() || chars[2].is_ascii_digit());
        if !valid {
            errors.push(ValidationError::InvalidSidFormat(sid.clone()));
        }
    }

    if config.uplink.host.is_empty() {
        errors.push(ValidationError::MissingUplinkHost);
    }

    let mut seen = HashSet::new();
    for block in &config.pseudoclient {
        if block.nick.is_empty() {
            errors.push(ValidationError::MissingPseudoClientNick);
            continue;
        }
        if !seen.insert(irc_to_lower(&block.nick)) {
            errors.push(ValidationError::DuplicatePseudoClient(block.nick.clone()));
        }
        for channel in &block.channels {
            if !channel.starts_with(['#', '&']) || channel.contains([' ', ',']) {
                errors.push(ValidationError::InvalidChannel {
                    nick: block.nick.clone(),
                    channel: channel.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(server: &str, extra: &str) -> Config {
        let toml = format!(
            "{server}\n[uplink]\nhost = \"127.0.0.1\"\npassword = \"x\"\n{extra}"
        );
        toml::from_str(&toml).unwrap()
    }

    const SERVER: &str = "[server]\nname = \"services.test\"\nsid = \"00T\"";

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&config(SERVER, "")).is_ok());
    }

    #[test]
    fn test_invalid_sid_fails() {
        let short = config("[server]\nname = \"s\"\nsid = \"0T\"", "");
        let errors = validate(&short).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidSid(2))));

        let lettered = config("[server]\nname = \"s\"\nsid = \"A0T\"", "");
        let errors = validate(&lettered).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidSidFormat(_))));
    }

    #[test]
    fn test_pseudoclient_checks() {
        let extra = r##"
[[pseudoclient]]
nick = "ChanServ"
channels = ["ops"]

[[pseudoclient]]
nick = "chanserv"

[[pseudoclient]]
nick = ""
"##;
        let errors = validate(&config(SERVER, extra)).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidChannel { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicatePseudoClient(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingPseudoClientNick)));
    }
}
