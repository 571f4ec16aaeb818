//! Async task bookkeeping.
//!
//! The reducer assigns an id when it emits an async effect and records it
//! here; the completion event carries the id back. A completion whose id is
//! no longer the active one is stale and gets dropped by the reducer.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Lifecycle state for one task kind (mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self, id: TaskId) {
        self.active = Some(id);
    }

    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
        }
        ok
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub execute: TaskState,
    pub photo_fetch: TaskState,
}

impl Tasks {
    pub fn is_any_running(&self) -> bool {
        self.execute.is_running() || self.photo_fetch.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_only_matches_active_id() {
        let mut seq = TaskSeq::default();
        let a = seq.next_id();
        let b = seq.next_id();
        assert_ne!(a, b);

        let mut state = TaskState::default();
        state.start(b);
        assert!(!state.finish_if_active(a));
        assert!(state.is_running());
        assert!(state.finish_if_active(b));
        assert!(!state.is_running());
    }
}
