//! In-band thinking markers (spec.md §4.A, §6.5).
//!
//! Some small local models emit a delimited reasoning span ahead of their
//! visible answer: `<open>…<close>`, where `<close>` is sometimes omitted
//! (the model ran out of budget mid-thought). The Model Adapter must never
//! strip this span — it is part of the raw text `generate_text` returns.
//! Splitting thinking from visible content is a caller-side convention,
//! used here by the synthesize node to populate `TurnState::model_thinking`
//! without leaking the reasoning span into the clinician-facing response.

pub const THINKING_OPEN: &str = "<think>";
pub const THINKING_CLOSE: &str = "</think>";

/// Split `raw` into (visible_content, thinking_text). If no opening marker
/// is present, the whole string is visible content and `thinking_text` is
/// `None`. If the closing marker is missing, everything after the opening
/// marker is treated as thinking text and visible content is empty.
pub fn split_thinking(raw: &str) -> (String, Option<String>) {
    let Some(open_idx) = raw.find(THINKING_OPEN) else {
        return (raw.to_string(), None);
    };

    let before = &raw[..open_idx];
    let after_open = &raw[open_idx + THINKING_OPEN.len()..];

    match after_open.find(THINKING_CLOSE) {
        Some(close_idx) => {
            let thinking = after_open[..close_idx].trim().to_string();
            let after_close = &after_open[close_idx + THINKING_CLOSE.len()..];
            let visible = format!("{before}{after_close}").trim().to_string();
            (visible, Some(thinking))
        }
        None => {
            let thinking = after_open.trim().to_string();
            (before.trim().to_string(), Some(thinking))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_marker_is_all_visible() {
        let (visible, thinking) = split_thinking("plain answer");
        assert_eq!(visible, "plain answer");
        assert!(thinking.is_none());
    }

    #[test]
    fn well_formed_span_splits_both_parts() {
        let (visible, thinking) =
            split_thinking("<think>weighing QT risk vs benefit</think>Avoid dofetilide here.");
        assert_eq!(visible, "Avoid dofetilide here.");
        assert_eq!(thinking.as_deref(), Some("weighing QT risk vs benefit"));
    }

    #[test]
    fn unterminated_span_is_all_thinking() {
        let (visible, thinking) = split_thinking("<think>still reasoning about the interaction");
        assert_eq!(visible, "");
        assert_eq!(thinking.as_deref(), Some("still reasoning about the interaction"));
    }
}
