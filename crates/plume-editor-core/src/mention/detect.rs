//! Detection of an in-progress `@mention` token before the caret.

use crate::mention::MentionOptions;
use crate::port::DocumentPort;

/// The trigger character.
pub const TRIGGER: char = '@';

/// A valid mention token ending at the caret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Offset of the literal `@`.
    pub trigger_index: usize,
    /// Text between the `@` and the caret. Never contains whitespace.
    pub query: String,
    /// Exclusive end of the token, i.e. where the caret sits.
    pub end: usize,
}

/// Find the mention token the caret is currently completing.
///
/// Scans back at most `options.search_window()` offsets for the nearest
/// `@`. The match is valid only if the caret is strictly after the `@`, the
/// `@` is at document start or follows whitespace, and the query between
/// them has no whitespace and a length within `[min_chars, max_chars]`.
///
/// Offsets are measured with [`DocumentPort::offset_width`], so the result
/// stays in the port's own units.
pub fn detect_trigger<P: DocumentPort + ?Sized>(
    port: &P,
    caret: usize,
    options: &MentionOptions,
) -> Option<TriggerMatch> {
    if caret > port.len() {
        return None;
    }
    let window_start = caret.saturating_sub(options.search_window());
    let before: Vec<char> = port.text(window_start, caret - window_start).chars().collect();

    let relative = before.iter().rposition(|c| *c == TRIGGER)?;
    let leading: String = before[..relative].iter().collect();
    let trigger_index = window_start + port.offset_width(&leading);
    if caret <= trigger_index {
        return None;
    }

    let preceding = match relative {
        0 if trigger_index == 0 => None,
        0 => Some(port.char_at(trigger_index - 1)?),
        _ => Some(before[relative - 1]),
    };
    if preceding.is_some_and(|c| !c.is_whitespace()) {
        return None;
    }

    let query: String = before[relative + 1..].iter().collect();
    if query.chars().any(char::is_whitespace) {
        return None;
    }

    let query_len = query.chars().count();
    if query_len < options.min_chars || query_len > options.max_chars {
        return None;
    }

    Some(TriggerMatch {
        trigger_index,
        end: trigger_index + 1 + port.offset_width(&query),
        query,
    })
}
