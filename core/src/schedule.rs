//! Timed transition queue.
//!
//! RULE: The store never mutates itself from a background thread. Every
//! deferred mutation is an entry here and fires only when the store clock is
//! advanced past its due time.
//!
//! Entries fire in (due time, scheduling order). Each entry belongs to a
//! `TaskHandle`; one handle owns all the transitions of one debate run or one
//! document, so cancelling the handle cancels the whole group.

use crate::{
    model::{DebateStage, DocumentStatus},
    types::{CaseId, DocumentId, Millis, RunId},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    DocumentStatus {
        document_id: DocumentId,
        status: DocumentStatus,
    },
    DebateStage {
        run_id: RunId,
        stage: DebateStage,
    },
}

#[derive(Debug, Clone)]
struct ScheduledTransition {
    handle: TaskHandle,
    case_id: CaseId,
    transition: Transition,
}

#[derive(Debug, Default)]
pub struct Schedule {
    queue: BTreeMap<(Millis, u64), ScheduledTransition>,
    next_seq: u64,
    next_handle: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_handle(&mut self) -> TaskHandle {
        self.next_handle += 1;
        TaskHandle(self.next_handle)
    }

    pub fn schedule(
        &mut self,
        handle: TaskHandle,
        case_id: &str,
        due_ms: Millis,
        transition: Transition,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert(
            (due_ms, seq),
            ScheduledTransition {
                handle,
                case_id: case_id.to_string(),
                transition,
            },
        );
    }

    /// Remove the earliest transition due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, Transition)> {
        let (&(due, seq), _) = self.queue.iter().next()?;
        if due > now {
            return None;
        }
        self.queue
            .remove(&(due, seq))
            .map(|entry| (due, entry.transition))
    }

    /// Cancel every pending transition owned by `handle`. Returns how many were dropped.
    pub fn cancel(&mut self, handle: TaskHandle) -> usize {
        self.retain(|entry| entry.handle != handle)
    }

    pub fn cancel_case(&mut self, case_id: &str) -> usize {
        self.retain(|entry| entry.case_id != case_id)
    }

    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_for(&self, handle: TaskHandle) -> usize {
        self.queue.values().filter(|e| e.handle == handle).count()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    fn retain(&mut self, keep: impl Fn(&ScheduledTransition) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, entry| keep(entry));
        before - self.queue.len()
    }
}
