//! Channel mode string parsing.
//!
//! Turns a mode string plus its trailing parameters into an ordered list of
//! [`ModeChange`]s. Parameter consumption depends only on the category the
//! character resolves to in the dialect's [`ModeTable`]:
//!
//! | category | `+` | `-` |
//! |----------|-----|-----|
//! | status   | 1   | 1   |
//! | list     | 1   | 1   |
//! | key      | 1   | 1   |
//! | param    | 1   | 0   |
//! | bool     | 0   | 0   |
//!
//! Unknown characters consume nothing and produce nothing.

use super::table::{ModeCategory, ModeTable};
use super::types::{ModeAction, ModeChange};
use tracing::{debug, warn};

/// Parse `modes` against `table`, taking parameters from the front of `params`.
///
/// Characters seen before any `+`/`-` are treated as additions. A mode whose
/// parameter is missing still yields a change, with `param: None`.
pub fn parse_channel_modes<S: AsRef<str>>(
    table: &ModeTable,
    modes: &str,
    params: &[S],
) -> Vec<ModeChange> {
    let mut changes = Vec::with_capacity(modes.len());
    let mut params = params.iter().map(|p| p.as_ref());
    let mut action = None;

    for c in modes.chars() {
        match c {
            '+' => {
                action = Some(ModeAction::Add);
                continue;
            }
            '-' => {
                action = Some(ModeAction::Delete);
                continue;
            }
            _ => {}
        }

        let Some((category, mode)) = table.classify(c) else {
            warn!(mode = %c, modes = %modes, "Unknown channel mode character, skipping");
            continue;
        };
        let action = action.unwrap_or(ModeAction::Add);

        let takes = match category {
            ModeCategory::Status | ModeCategory::List | ModeCategory::Key => true,
            ModeCategory::Param => action == ModeAction::Add,
            ModeCategory::Bool => false,
        };

        let param = if takes {
            let param = params.next().filter(|p| !p.is_empty()).map(str::to_string);
            if param.is_none() {
                warn!(mode = %mode, action = %action, "Channel mode is missing its parameter");
            }
            param
        } else {
            None
        };

        changes.push(ModeChange {
            action,
            mode,
            param,
        });
    }

    let leftover = params.count();
    if leftover > 0 {
        debug!(modes = %modes, leftover, "Unused mode parameters");
    }

    changes
}
