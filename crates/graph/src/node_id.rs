use serde::Serialize;

/// The seven named nodes of the agent graph (spec.md §4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    InputAssembly,
    IntentClassify,
    ToolSelect,
    ToolExecute,
    ResultClassify,
    ErrorHandler,
    Synthesize,
}

impl NodeId {
    /// Stable identifier used in events and checkpoints.
    pub fn id(&self) -> &'static str {
        match self {
            NodeId::InputAssembly => "input_assembly",
            NodeId::IntentClassify => "intent_classify",
            NodeId::ToolSelect => "tool_select",
            NodeId::ToolExecute => "tool_execute",
            NodeId::ResultClassify => "result_classify",
            NodeId::ErrorHandler => "error_handler",
            NodeId::Synthesize => "synthesize",
        }
    }

    /// Human-readable label used in `node_start`/`node_end` events.
    pub fn label(&self) -> &'static str {
        match self {
            NodeId::InputAssembly => "Input Assembly",
            NodeId::IntentClassify => "Intent Classification",
            NodeId::ToolSelect => "Tool Selection",
            NodeId::ToolExecute => "Tool Execution",
            NodeId::ResultClassify => "Result Classification",
            NodeId::ErrorHandler => "Error Handling",
            NodeId::Synthesize => "Response Synthesis",
        }
    }

    /// The designated entry node (spec.md §4.E).
    pub fn entry() -> Self {
        NodeId::InputAssembly
    }
}
