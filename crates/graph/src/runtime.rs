//! The Graph Runtime (spec.md §4.E): a declarative node/edge scheduler over
//! the seven nodes in `crate::nodes`, with an interrupt-before boundary at
//! `tool_execute` and checkpoint/resume across that pause.
//!
//! Grounded on `sa_gateway::runtime::turn`'s node-loop shape and
//! `sa_gateway::runtime::approval::ApprovalStore`'s request/decision
//! vocabulary, adapted to the stateless-across-the-pause design documented
//! in `crate::checkpoint`.

use std::sync::Arc;
use std::time::Instant;

use cp_domain::config::GraphConfig;
use cp_domain::{Error, Result, ToolResult, TurnState};
use cp_model::ModelAdapter;
use cp_tools::{ToolRegistry, NONE_TOOL};
use serde_json::Value;
use tokio::sync::mpsc::Sender;

use crate::checkpoint::CheckpointStore;
use crate::events::GraphEvent;
use crate::node_id::NodeId;
use crate::{nodes, routing};

/// The clinician's answer to a pending `tool_approval_request` (spec.md
/// §4.G "Resume with decision").
#[derive(Debug, Clone)]
pub enum ResumeDecision {
    /// Proceed with the call. `args` overrides the proposed arguments when
    /// the clinician edited them before approving.
    Approve { args: Option<Value> },
    Reject { reason: String },
}

/// What a `start_turn`/`resume` call produced, for the caller
/// (`cp-runner::AgentRunner`) to act on: a paused turn carries no final
/// state (nothing to build a clinical trace from yet); a completed turn
/// hands back the full state so the caller can read `final_response`,
/// `tool_results`, and anything else it needs for the external event and
/// the session's persisted message log.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed(TurnState),
    Paused { checkpoint_id: String },
}

/// Owns the shared, frozen-after-startup resources every turn reads from
/// (spec.md §5 "Shared resource policy") plus the per-session checkpoint
/// store. One `GraphRuntime` is shared across every session in the process.
pub struct GraphRuntime {
    model: Arc<dyn ModelAdapter>,
    tools: Arc<ToolRegistry>,
    config: GraphConfig,
    checkpoints: CheckpointStore,
}

impl GraphRuntime {
    pub fn new(model: Arc<dyn ModelAdapter>, tools: Arc<ToolRegistry>, config: GraphConfig) -> Self {
        Self {
            model,
            tools,
            config,
            checkpoints: CheckpointStore::new(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Begin a turn at the entry node and drive it to completion, a pause,
    /// or an error, streaming `GraphEvent`s to `tx` as it goes (spec.md
    /// §4.G "Start turn").
    pub async fn start_turn(&self, state: TurnState, tx: Sender<GraphEvent>) -> Result<TurnOutcome> {
        self.drive(NodeId::entry(), state, tx, false).await
    }

    /// Consume a checkpoint and continue execution with the clinician's
    /// decision applied (spec.md §4.G "Resume with decision").
    pub async fn resume(
        &self,
        checkpoint_id: &str,
        decision: ResumeDecision,
        tx: Sender<GraphEvent>,
    ) -> Result<TurnOutcome> {
        let Some(checkpoint) = self.checkpoints.take(checkpoint_id) else {
            let message = format!("no checkpoint with id {checkpoint_id}");
            let _ = tx
                .send(GraphEvent::Error {
                    kind: "unknown_checkpoint".into(),
                    message: message.clone(),
                    recoverable: false,
                })
                .await;
            return Err(Error::Other(message));
        };

        let mut state = checkpoint.state;
        match decision {
            ResumeDecision::Approve { args } => {
                if let Some(args) = args {
                    state.current_args = Some(args);
                }
                // The checkpointed node is always `ToolExecute`; skip the
                // approval check this one time since it was already granted.
                self.drive(checkpoint.resume_node, state, tx, true).await
            }
            ResumeDecision::Reject { reason } => {
                // Grounded on `agent_runner.py::resume_with_approval`'s rejection
                // branch: record the declined call and go straight to synthesis
                // rather than re-entering the classify/error loop.
                let tool_name = state.current_tool.clone().unwrap_or_else(|| NONE_TOOL.to_string());
                let args = state.current_args.clone().unwrap_or_else(|| serde_json::json!({}));
                state.tool_results.push(ToolResult::rejected(tool_name, args, reason));
                state.step_count += 1;
                self.drive(NodeId::Synthesize, state, tx, false).await
            }
        }
    }

    /// Run nodes starting at `node` until the turn completes, pauses at an
    /// interrupt-before boundary, or fails.
    async fn drive(
        &self,
        mut node: NodeId,
        mut state: TurnState,
        tx: Sender<GraphEvent>,
        mut skip_next_approval_check: bool,
    ) -> Result<TurnOutcome> {
        loop {
            if node == NodeId::ToolExecute && !skip_next_approval_check {
                if let Some(checkpoint_id) = self.maybe_pause_for_approval(&state, &tx).await? {
                    self.checkpoints
                        .take_snapshot(checkpoint_id.clone(), state, NodeId::ToolExecute);
                    return Ok(TurnOutcome::Paused { checkpoint_id });
                }
            }
            skip_next_approval_check = false;

            let _ = tx
                .send(GraphEvent::NodeStart {
                    node_id: node.id().to_string(),
                    label: node.label().to_string(),
                })
                .await;

            if node == NodeId::ToolExecute {
                let tool_name = state.current_tool.clone().unwrap_or_else(|| NONE_TOOL.to_string());
                let args = state.current_args.clone().unwrap_or_else(|| serde_json::json!({}));
                let _ = tx.send(GraphEvent::ToolExecutionStart { tool_name, args }).await;
            }

            let start = Instant::now();
            let outcome = self.execute_node(node, &mut state).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            if let Err(err) = outcome {
                let _ = tx
                    .send(GraphEvent::Error {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                        recoverable: false,
                    })
                    .await;
                return Err(err);
            }

            if node == NodeId::ToolExecute {
                if let Some(last) = state.tool_results.last() {
                    let _ = tx
                        .send(GraphEvent::ToolExecutionEnd {
                            tool_name: last.tool_name.clone(),
                            success: last.success,
                            result: last.result.clone(),
                            duration_ms,
                        })
                        .await;
                }
            }

            let _ = tx
                .send(GraphEvent::NodeEnd {
                    node_id: node.id().to_string(),
                    label: node.label().to_string(),
                    duration_ms,
                })
                .await;

            node = match node {
                NodeId::InputAssembly => NodeId::IntentClassify,
                NodeId::IntentClassify => routing::route_after_intent(&state),
                NodeId::ToolSelect => NodeId::ToolExecute,
                NodeId::ToolExecute => NodeId::ResultClassify,
                NodeId::ResultClassify => routing::route_after_result_classify(&state, &self.config),
                NodeId::ErrorHandler => routing::route_after_error_handler(&state, &self.config),
                NodeId::Synthesize => {
                    let tool_calls_made = state
                        .tool_results
                        .iter()
                        .filter(|r| r.tool_name != NONE_TOOL)
                        .count();
                    let _ = tx
                        .send(GraphEvent::Completion {
                            final_response: state.final_response.clone().unwrap_or_default(),
                            tool_calls_made,
                            trace: None,
                        })
                        .await;
                    return Ok(TurnOutcome::Completed(state));
                }
            };
        }
    }

    /// Before dispatching a real (non-`"none"`) tool call, pause the turn
    /// and ask the clinician to approve it (spec.md §4.E interrupt-before
    /// boundary). Returns the fresh checkpoint id if the turn should pause.
    async fn maybe_pause_for_approval(
        &self,
        state: &TurnState,
        tx: &Sender<GraphEvent>,
    ) -> Result<Option<String>> {
        let tool_name = state.current_tool.clone().unwrap_or_else(|| NONE_TOOL.to_string());
        if tool_name == NONE_TOOL {
            return Ok(None);
        }
        let checkpoint_id = uuid::Uuid::new_v4().to_string();
        let args = state.current_args.clone().unwrap_or_else(|| serde_json::json!({}));
        let intent = state.task_summary.clone().unwrap_or_default();
        let _ = tx
            .send(GraphEvent::ToolApprovalRequest {
                tool_name,
                args,
                intent,
                checkpoint_id: checkpoint_id.clone(),
            })
            .await;
        Ok(Some(checkpoint_id))
    }

    async fn execute_node(&self, node: NodeId, state: &mut TurnState) -> Result<()> {
        match node {
            NodeId::InputAssembly => {
                nodes::input_assembly::run(state);
                Ok(())
            }
            NodeId::IntentClassify => nodes::intent_classify::run(&self.model, state).await,
            NodeId::ToolSelect => nodes::tool_select::run(&self.model, &self.tools, state).await,
            NodeId::ToolExecute => nodes::tool_execute::run(&self.tools, state).await,
            NodeId::ResultClassify => nodes::result_classify::run(&self.model, state).await,
            NodeId::ErrorHandler => {
                nodes::error_handler::run(&self.config, state);
                Ok(())
            }
            NodeId::Synthesize => nodes::synthesize::run(&self.model, &self.config, state).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_model::mock::MockModelAdapter;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    struct Echo;

    #[async_trait::async_trait]
    impl cp_tools::ToolExecutor for Echo {
        async fn call(&self, args: HashMap<String, Value>) -> cp_tools::ToolOutcome {
            cp_tools::ToolOutcome::ok(json!({"echo": args}))
        }
    }

    async fn drain(mut rx: mpsc::Receiver<GraphEvent>) -> Vec<GraphEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn direct_intent_completes_without_touching_the_tool_loop() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({
            "intent": "direct", "task_summary": "explain hypertension", "suggested_tool": null,
        }));
        adapter.push_text("Hypertension is persistently elevated blood pressure.");

        let runtime = GraphRuntime::new(
            Arc::new(adapter),
            Arc::new(ToolRegistry::new()),
            GraphConfig::default(),
        );
        let (tx, rx) = mpsc::channel(32);
        runtime
            .start_turn(TurnState::new("what is hypertension?"), tx)
            .await
            .unwrap();
        drop(runtime);

        let events = drain(rx).await;
        assert!(matches!(events.last(), Some(GraphEvent::Completion { .. })));
        assert!(!events.iter().any(|e| matches!(e, GraphEvent::ToolApprovalRequest { .. })));
    }

    #[tokio::test]
    async fn tool_needed_pauses_for_approval_then_resumes_to_completion() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({
            "intent": "tool_needed", "task_summary": "check dofetilide safety", "suggested_tool": "check_drug_safety",
        }));
        adapter.push_structured(json!({"tool_name": "check_drug_safety", "brand_name": "dofetilide"}));
        adapter.push_structured(json!({"quality": "success_rich", "reasoning": "boxed warning found"}));
        adapter.push_text("Dofetilide carries a boxed Torsade de Pointes warning.");

        let tools = Arc::new(ToolRegistry::new());
        tools
            .register(
                "check_drug_safety",
                "FDA boxed warnings",
                vec![("brand_name", "drug name")],
                Arc::new(Echo),
                HashMap::new(),
            )
            .await;

        let runtime = GraphRuntime::new(Arc::new(adapter), tools, GraphConfig::default());
        let (tx, rx) = mpsc::channel(32);
        runtime
            .start_turn(TurnState::new("is dofetilide safe for my patient?"), tx)
            .await
            .unwrap();
        let events = drain(rx).await;

        let checkpoint_id = events.iter().find_map(|e| match e {
            GraphEvent::ToolApprovalRequest { checkpoint_id, .. } => Some(checkpoint_id.clone()),
            _ => None,
        });
        let checkpoint_id = checkpoint_id.expect("expected a pause for approval");

        let (tx2, rx2) = mpsc::channel(32);
        runtime
            .resume(&checkpoint_id, ResumeDecision::Approve { args: None }, tx2)
            .await
            .unwrap();
        let resumed_events = drain(rx2).await;
        assert!(matches!(resumed_events.last(), Some(GraphEvent::Completion { .. })));
    }

    #[tokio::test]
    async fn rejecting_a_tool_call_records_a_rejected_result_and_still_completes() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({
            "intent": "tool_needed", "task_summary": "update chart", "suggested_tool": "update_patient_record",
        }));
        adapter.push_structured(json!({"tool_name": "update_patient_record", "patient_id": "pt-1001"}));

        let tools = Arc::new(ToolRegistry::new());
        tools
            .register(
                "update_patient_record",
                "Write to the chart",
                vec![("patient_id", "patient id")],
                Arc::new(Echo),
                HashMap::new(),
            )
            .await;

        let runtime = GraphRuntime::new(Arc::new(adapter), tools, GraphConfig::default());
        let (tx, rx) = mpsc::channel(32);
        runtime
            .start_turn(TurnState::new("document this in the chart"), tx)
            .await
            .unwrap();
        let events = drain(rx).await;
        let checkpoint_id = events
            .iter()
            .find_map(|e| match e {
                GraphEvent::ToolApprovalRequest { checkpoint_id, .. } => Some(checkpoint_id.clone()),
                _ => None,
            })
            .expect("expected a pause for approval");

        // Rejection routes straight to synthesize, which needs a free-form
        // model call; no further canned responses are queued, so this
        // should surface as an error rather than silently succeed.
        let (tx2, rx2) = mpsc::channel(32);
        let result = runtime
            .resume(
                &checkpoint_id,
                ResumeDecision::Reject { reason: "clinician declined".into() },
                tx2,
            )
            .await;
        assert!(result.is_err());
        let events2 = drain(rx2).await;
        assert!(events2.iter().any(|e| matches!(e, GraphEvent::Error { .. })));
    }
}
