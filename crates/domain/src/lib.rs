pub mod config;
pub mod error;
pub mod message;
pub mod schema;
pub mod session;
pub mod state;
pub mod thinking;
pub mod tool_result;
pub mod trace;

pub use error::{Error, Result};
pub use message::{HistoryTurn, Message, Role};
pub use schema::{FieldType, OutputSchema, SchemaField};
pub use session::{PendingApproval, Session, SessionMessage, SessionStatus};
pub use state::{ErrorStrategy, ExtractedEntities, Intent, ResultQuality, TurnState};
pub use tool_result::{ErrorCategory, ToolResult};
pub use trace::TraceEvent;
