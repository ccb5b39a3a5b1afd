//! F.1 Input assembly — deterministic, no LM call (spec.md §4.F.1).

use cp_domain::state::ExtractedEntities;
use cp_domain::TurnState;

/// Small fixed vocabulary of drug mentions this deterministic pass
/// recognizes. A production deployment would widen this against a real
/// formulary; the core only needs "does this query plausibly concern a
/// named drug" for downstream tool-selection hinting.
const KNOWN_DRUGS: &[&str] = &[
    "dofetilide",
    "amiodarone",
    "warfarin",
    "lipitor",
    "atorvastatin",
    "metformin",
    "aspirin",
    "ibuprofen",
    "lisinopril",
    "metoprolol",
];

const ACTION_VERBS: &[&str] = &[
    "document", "prescribe", "save", "get", "check", "search", "find", "update", "lookup",
    "review", "order", "refill",
];

/// Recognizes a short opaque patient-identifier token: an alphabetic
/// prefix of 2-4 letters, an optional hyphen, then 3-6 digits (e.g.
/// `PT-1001`, `mrn4521`).
fn looks_like_patient_id(word: &str) -> bool {
    let word = word.trim_matches(|c: char| !c.is_alphanumeric());
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < 5 || chars.len() > 10 {
        return false;
    }
    let mut i = 0;
    let mut prefix_len = 0;
    while i < chars.len() && chars[i].is_ascii_alphabetic() {
        i += 1;
        prefix_len += 1;
    }
    if !(2..=4).contains(&prefix_len) {
        return false;
    }
    if i < chars.len() && chars[i] == '-' {
        i += 1;
    }
    let digit_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let digit_len = i - digit_start;
    i == chars.len() && (3..=6).contains(&digit_len)
}

fn extract_entities(text: &str) -> ExtractedEntities {
    let lower = text.to_lowercase();
    let mut patient_ids = Vec::new();
    let mut drug_mentions = Vec::new();
    let mut action_verbs = Vec::new();

    for raw_word in text.split_whitespace() {
        if looks_like_patient_id(raw_word) {
            let cleaned = raw_word.trim_matches(|c: char| !c.is_alphanumeric());
            if !patient_ids.iter().any(|p: &String| p == cleaned) {
                patient_ids.push(cleaned.to_string());
            }
        }
    }

    for drug in KNOWN_DRUGS {
        if lower.contains(drug) && !drug_mentions.iter().any(|d: &String| d == drug) {
            drug_mentions.push(drug.to_string());
        }
    }

    for verb in ACTION_VERBS {
        if lower
            .split_whitespace()
            .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *verb)
            && !action_verbs.iter().any(|v: &String| v == verb)
        {
            action_verbs.push(verb.to_string());
        }
    }

    ExtractedEntities {
        patient_ids,
        drug_mentions,
        action_verbs,
        has_image: false,
    }
}

/// Scan the user query and conversation history, populate
/// `extracted_entities`, and carry over prior-turn image findings if the
/// current turn has no new image (spec.md §4.F.1).
pub fn run(state: &mut TurnState) {
    let mut combined = state.user_query.clone();
    for turn in &state.conversation_history {
        combined.push(' ');
        combined.push_str(&turn.content);
    }

    let mut entities = extract_entities(&combined);
    entities.has_image = state.image_data.is_some();
    state.extracted_entities = entities;

    if state.image_data.is_none() {
        if let Some(previous) = state.previous_image_findings.clone() {
            state.image_findings = Some(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_patient_id_drug_and_verb() {
        let mut state = TurnState::new("Check PT-1001 for dofetilide interactions");
        run(&mut state);
        assert_eq!(state.extracted_entities.patient_ids, vec!["PT-1001"]);
        assert_eq!(state.extracted_entities.drug_mentions, vec!["dofetilide"]);
        assert!(state.extracted_entities.action_verbs.contains(&"check".to_string()));
    }

    #[test]
    fn no_image_carries_over_previous_findings() {
        let mut state = TurnState::new("follow up");
        state.previous_image_findings = Some("prior chest x-ray: no acute findings".into());
        run(&mut state);
        assert_eq!(
            state.image_findings.as_deref(),
            Some("prior chest x-ray: no acute findings")
        );
        assert!(!state.extracted_entities.has_image);
    }

    #[test]
    fn plain_query_has_no_entities() {
        let mut state = TurnState::new("What is hypertension?");
        run(&mut state);
        assert!(state.extracted_entities.patient_ids.is_empty());
        assert!(state.extracted_entities.drug_mentions.is_empty());
    }
}
