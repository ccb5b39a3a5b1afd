//! The Agent Runner (spec.md §4.G): composes the Graph Runtime, the Tool
//! Registry, the Model Adapter, and the Session Store into the two public
//! turn operations a gateway calls — `start_turn` and
//! `resume_with_decision`.

pub mod clinical_trace;
pub mod runner;

pub use runner::{session_messages_as_model_messages, AgentRunner};
