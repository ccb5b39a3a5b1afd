//! Routing decisions between nodes (spec.md §4.F routing diagram) and the
//! centralized "are we done with the tool loop?" predicate (spec.md §9 Open
//! Question — resolved by centralizing here rather than scattering the
//! check across every node).

use cp_domain::config::GraphConfig;
use cp_domain::state::{ErrorStrategy, Intent, ResultQuality};
use cp_domain::TurnState;

use crate::node_id::NodeId;

/// True once the tool loop should stop iterating: either the task's
/// sub-needs are satisfied, or the hard ceiling (spec.md I6) has been hit.
pub fn is_done(state: &TurnState, config: &GraphConfig) -> bool {
    state.step_count >= config.tool_loop_ceiling || state.subneeds_satisfied()
}

/// After intent classification: direct answers skip the tool loop entirely.
pub fn route_after_intent(state: &TurnState) -> NodeId {
    match state.intent {
        Some(Intent::ToolNeeded) => NodeId::ToolSelect,
        _ => NodeId::Synthesize,
    }
}

/// After result classification (spec.md §4.F routing diagram / §7 taxonomy):
/// only an unambiguous rich success is eligible to loop on its own via
/// `is_done`. Every other quality — partial (e.g. an ambiguous patient
/// match), no-results, and the two error qualities — needs the error
/// handler's judgment on whether to retry, skip, or ask the clinician.
pub fn route_after_result_classify(state: &TurnState, config: &GraphConfig) -> NodeId {
    match state.last_result_classification {
        Some(ResultQuality::SuccessRich) => {
            if is_done(state, config) {
                NodeId::Synthesize
            } else {
                NodeId::ToolSelect
            }
        }
        Some(_) => NodeId::ErrorHandler,
        None => NodeId::Synthesize,
    }
}

/// After error handling (spec.md §4.F.6 routing diagram): `ask_user` and
/// `skip_and_continue` always end the turn at synthesis; the two retry
/// strategies loop back to tool-select, bounded only by the hard ceiling
/// (I6) — *not* by the subneeds-satisfied heuristic, which applies solely
/// to the success path (§4.F routing diagram distinguishes the two
/// branches explicitly).
pub fn route_after_error_handler(state: &TurnState, config: &GraphConfig) -> NodeId {
    match state.last_error_strategy {
        Some(ErrorStrategy::AskUser) | Some(ErrorStrategy::SkipAndContinue) => NodeId::Synthesize,
        Some(ErrorStrategy::RetrySame) | Some(ErrorStrategy::RetryDifferentArgs) => {
            if state.step_count >= config.tool_loop_ceiling {
                NodeId::Synthesize
            } else {
                NodeId::ToolSelect
            }
        }
        None => NodeId::Synthesize,
    }
}
