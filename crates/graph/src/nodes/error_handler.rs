//! F.6 Error handling — deterministic strategy selection, no LM call
//! (spec.md §4.F.6).

use cp_domain::config::GraphConfig;
use cp_domain::state::{ErrorStrategy, ResultQuality};
use cp_domain::tool_result::ErrorCategory;
use cp_domain::TurnState;

/// Choose how to react to the most recent tool failure and record that
/// decision on the turn state. Pure function of `state` and `config` — no
/// model call, matching the original's deterministic dispatch table.
pub fn run(config: &GraphConfig, state: &mut TurnState) {
    let category = state.tool_results.last().and_then(|r| r.error_category);
    let message = state
        .tool_results
        .last()
        .and_then(|r| r.error_message.clone())
        .unwrap_or_else(|| "Tool call did not produce a usable result.".to_string());

    state.error_messages.push(message.clone());

    let strategy = match (state.last_result_classification, category) {
        (Some(ResultQuality::ErrorFatal), _) => ErrorStrategy::AskUser,
        (_, Some(ErrorCategory::Validation)) => ErrorStrategy::AskUser,
        // A successful-but-ambiguous result (e.g. three matching patient
        // records) can't be resolved by retrying; only the clinician can
        // pick one (spec.md §7 taxonomy item 2).
        (Some(ResultQuality::SuccessPartial), None) => ErrorStrategy::AskUser,
        // A genuinely not-found tool failure isn't worth retrying.
        (_, Some(ErrorCategory::NotFound)) => ErrorStrategy::SkipAndContinue,
        // A tool that ran fine but came back empty is worth one reshaped
        // attempt before the hard ceiling gives up on it (spec.md §7 item 3).
        (Some(ResultQuality::NoResults), _) => ErrorStrategy::RetryDifferentArgs,
        (_, Some(ErrorCategory::TransportTransient)) | (_, Some(ErrorCategory::Internal)) => {
            if state.retryable_retry_count < config.retryable_retry_limit {
                ErrorStrategy::RetrySame
            } else {
                ErrorStrategy::RetryDifferentArgs
            }
        }
        _ => ErrorStrategy::SkipAndContinue,
    };

    if matches!(strategy, ErrorStrategy::RetrySame) {
        state.retryable_retry_count += 1;
    }
    if matches!(strategy, ErrorStrategy::AskUser) {
        state.clarification_request = Some(message);
    }

    state.last_error_strategy = Some(strategy);
}
