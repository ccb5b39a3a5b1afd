//! Tool registry and execution layer (spec.md §4.B): a uniform dispatch
//! over heterogeneous async I/O tools with pre-formatted clinician-safe
//! error surfaces and result classification.

pub mod registry;
pub mod stubs;

pub use registry::{ToolDefinition, ToolExecutor, ToolOutcome, ToolRegistry, ToolSummary, NONE_TOOL};
