//! Shared application state passed to every API handler (spec.md §6.1).

use std::sync::Arc;

use cp_domain::config::Config;
use cp_graph::GraphRuntime;
use cp_runner::AgentRunner;
use cp_sessions::SessionStore;
use cp_tools::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub tools: Arc<ToolRegistry>,
    pub graph: Arc<GraphRuntime>,
    pub runner: Arc<AgentRunner>,
}
