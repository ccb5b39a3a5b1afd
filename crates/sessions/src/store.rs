//! Durable per-session state with write-through persistence (spec.md §4.C).
//!
//! Backed by either in-memory only (`data_dir: None`, used by tests) or a
//! directory of `{session_id}.json` files, one document per session. Every
//! mutation is flushed atomically (write to a sibling `.tmp` file, then
//! rename). On startup, every file in the directory is loaded; any loaded
//! session carrying a pending-approval record has it cleared and its
//! status reset to idle — checkpoints are in-memory only and do not
//! survive a restart (spec.md I3).
//!
//! Grounded on `original_source/.../api/services/session_store.py`'s
//! `SessionStore` (`_load_all`/`_save`/`_delete_file` shape), adapted to
//! the teacher's `RwLock<HashMap<...>>` + load-on-`new` store idiom
//! (`sa_sessions::store::SessionStore`), with persistence corrected to the
//! atomic write-then-rename contract both sources name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use cp_domain::session::{PendingApproval, Session, SessionStatus};
use cp_domain::trace::TraceEvent;
use cp_domain::{Error, Result};

/// Durable store of sessions, serialized per-session mutation (spec.md §5
/// "a session cannot have two concurrent turns" is enforced one layer up,
/// by `cp-runner`; this store only guarantees that reads/writes on the
/// shared map are internally consistent).
pub struct SessionStore {
    data_dir: Option<PathBuf>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// In-memory-only store (spec.md §4.C, used by tests).
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Load (or create) a store backed by `data_dir`, loading every
    /// `*.json` file found there. Any loaded session with a pending
    /// approval has it cleared per spec.md I3.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(Error::Io)?;

        let mut sessions = HashMap::new();
        let mut loaded = 0usize;
        for entry in std::fs::read_dir(&data_dir).map_err(Error::Io)? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read session file, skipping");
                    continue;
                }
            };
            let mut session: Session = match serde_json::from_str(&raw) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse session file, skipping");
                    continue;
                }
            };
            if session.pending_approval.is_some() {
                session.pending_approval = None;
                session.status = SessionStatus::Idle;
            }
            sessions.insert(session.session_id.clone(), session);
            loaded += 1;
        }

        if loaded > 0 {
            tracing::info!(sessions = loaded, dir = %data_dir.display(), "session store loaded");
        }

        Ok(Self {
            data_dir: Some(data_dir),
            sessions: RwLock::new(sessions),
        })
    }

    fn path_for(&self, session_id: &str) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(format!("{session_id}.json")))
    }

    /// Atomic write-through: write to a sibling `.tmp` file then rename
    /// (spec.md §4.C, §6.2).
    fn save(&self, session: &Session) -> Result<()> {
        let Some(target) = self.path_for(&session.session_id) else {
            return Ok(());
        };
        let tmp = target.with_extension("tmp");
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&tmp, json).map_err(Error::Io)?;
        std::fs::rename(&tmp, &target).map_err(Error::Io)?;
        Ok(())
    }

    fn delete_file(&self, session_id: &str) {
        if let Some(path) = self.path_for(session_id) {
            let _ = std::fs::remove_file(path);
        }
    }

    pub fn create(&self) -> Result<Session> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(session_id.clone());
        self.save(&session)?;
        self.sessions.write().insert(session_id.clone(), session.clone());
        TraceEvent::SessionResolved {
            session_id,
            is_new: true,
        }
        .emit();
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn list(&self) -> Vec<Session> {
        self.sessions.read().values().cloned().collect()
    }

    pub fn delete(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            self.delete_file(session_id);
        }
        removed
    }

    fn mutate<F>(&self, session_id: &str, f: F) -> Result<Option<Session>>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write();
        let Some(session) = sessions.get_mut(session_id) else {
            return Ok(None);
        };
        f(session);
        self.save(session)?;
        Ok(Some(session.clone()))
    }

    pub fn append_message(
        &self,
        session_id: &str,
        role: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Option<Session>> {
        let role = role.into();
        let content = content.into();
        self.mutate(session_id, |s| s.add_message(role, content))
    }

    pub fn set_pending_approval(
        &self,
        session_id: &str,
        approval: PendingApproval,
    ) -> Result<Option<Session>> {
        self.mutate(session_id, |s| s.set_pending_approval(approval))
    }

    pub fn clear_pending_approval(&self, session_id: &str) -> Result<Option<Session>> {
        self.mutate(session_id, |s| s.clear_pending_approval())
    }

    pub fn set_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<Option<Session>> {
        self.mutate(session_id, |s| {
            s.status = status;
            s.updated_at = chrono::Utc::now();
        })
    }

    pub fn set_selected_patient(
        &self,
        session_id: &str,
        patient_id: Option<String>,
    ) -> Result<Option<Session>> {
        self.mutate(session_id, |s| {
            s.selected_patient_id = patient_id;
            s.updated_at = chrono::Utc::now();
        })
    }

    /// Reset turn-level session bookkeeping for a new user message (spec.md
    /// §4.C `reset-for-new-turn`). The message log, pending approval, and
    /// status are governed separately by the Runner's turn lifecycle; this
    /// only touches `updated_at`, mirroring
    /// `session_store.py::reset_for_new_turn`.
    pub fn reset_for_new_turn(&self, session_id: &str) -> Result<Option<Session>> {
        self.mutate(session_id, |s| {
            s.updated_at = chrono::Utc::now();
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}
