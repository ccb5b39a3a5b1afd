//! Checkpoint/resume (spec.md §4.E, §9 "Coroutine / async control flow and
//! interrupts").
//!
//! A checkpoint is a snapshot of turn state taken at an interrupt-before
//! boundary, sufficient to resume execution from that boundary. Per
//! spec.md §9's resolution, the paused turn is not kept alive as an
//! in-flight task across the pause — the caller (`cp-runner`) decides when
//! to resume by calling `GraphRuntime::resume`, at which point a fresh
//! async task continues from the checkpointed node. This is a deliberate
//! simplification of `sa_gateway::runtime::approval::ApprovalStore`'s
//! `oneshot`-parked-task pattern: there is no live receiver to park on
//! here, so the store holds only the snapshot.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::node_id::NodeId;
use cp_domain::TurnState;

/// A paused turn's full state plus the node it should resume into.
#[derive(Clone)]
pub struct Checkpoint {
    pub state: TurnState,
    pub resume_node: NodeId,
}

/// Per-session, in-memory checkpoint store (spec.md §4.E, §5 "The Graph
/// Runtime's checkpoints are per-session, in-memory").
#[derive(Default)]
pub struct CheckpointStore {
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_snapshot(&self, checkpoint_id: impl Into<String>, state: TurnState, resume_node: NodeId) {
        self.checkpoints
            .write()
            .insert(checkpoint_id.into(), Checkpoint { state, resume_node });
    }

    /// Remove and return a checkpoint by id — resuming consumes it.
    pub fn take(&self, checkpoint_id: &str) -> Option<Checkpoint> {
        self.checkpoints.write().remove(checkpoint_id)
    }

    pub fn discard(&self, checkpoint_id: &str) {
        self.checkpoints.write().remove(checkpoint_id);
    }
}
