use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session status (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Processing,
    WaitingApproval,
    Error,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

/// A single entry in a session's ordered, append-only message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    /// "user" | "assistant" | "tool".
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Value,
}

impl SessionMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Value::Object(Default::default()),
        }
    }
}

/// A tool call awaiting clinician approval (spec.md §3 "Pending approval").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    pub tool_name: String,
    pub tool_args: Value,
    /// Human-readable clinical intent for the proposed action.
    pub clinical_intent: String,
    /// Opaque checkpoint handle used by the Graph Runtime to resume.
    pub checkpoint_id: String,
}

/// A durable chat session with the clinical agent (spec.md §3 "Session").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    #[serde(default)]
    pub pending_approval: Option<PendingApproval>,
    #[serde(default)]
    pub selected_patient_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            status: SessionStatus::Idle,
            messages: Vec::new(),
            pending_approval: None,
            selected_patient_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.messages.push(SessionMessage::new(role, content));
        self.updated_at = Utc::now();
    }

    pub fn set_pending_approval(&mut self, approval: PendingApproval) {
        self.pending_approval = Some(approval);
        self.status = SessionStatus::WaitingApproval;
        self.updated_at = Utc::now();
    }

    pub fn clear_pending_approval(&mut self) {
        self.pending_approval = None;
        self.status = SessionStatus::Processing;
        self.updated_at = Utc::now();
    }

    /// Invariant (spec.md §3, I2): exactly one of {pending_approval set and
    /// status = waiting-approval} or {pending_approval unset and status in
    /// {idle, processing, error}} holds.
    pub fn invariant_holds(&self) -> bool {
        match (&self.pending_approval, self.status) {
            (Some(_), SessionStatus::WaitingApproval) => true,
            (None, SessionStatus::Idle)
            | (None, SessionStatus::Processing)
            | (None, SessionStatus::Error) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_satisfies_invariant() {
        let s = Session::new("sess-1");
        assert!(s.invariant_holds());
        assert_eq!(s.status, SessionStatus::Idle);
    }

    #[test]
    fn pending_approval_implies_waiting_status() {
        let mut s = Session::new("sess-1");
        s.set_pending_approval(PendingApproval {
            tool_name: "check_drug_safety".into(),
            tool_args: serde_json::json!({"drug_name": "dofetilide"}),
            clinical_intent: "check boxed warnings".into(),
            checkpoint_id: "ckpt-1".into(),
        });
        assert!(s.invariant_holds());
        assert_eq!(s.status, SessionStatus::WaitingApproval);

        s.clear_pending_approval();
        assert!(s.invariant_holds());
        assert!(s.pending_approval.is_none());
    }

    #[test]
    fn add_message_appends_and_touches() {
        let mut s = Session::new("sess-1");
        let before = s.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        s.add_message("user", "hello");
        assert_eq!(s.messages.len(), 1);
        assert!(s.updated_at >= before);
    }
}
