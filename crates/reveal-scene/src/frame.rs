//! Frame-scheduled continuations.
//!
//! Playback never blocks: a running timeline asks for one more frame, and the
//! stage hands due tasks back on the next tick. Tasks requested while due
//! tasks are being run land in the following frame.

use crate::animation::types::{FrameRequestId, IdSource, TimelineId};

/// Work to resume on the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTask {
    /// Advance a timeline playback.
    Timeline(TimelineId),
}

/// Queue of pending frame continuations, in request order.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: Vec<(FrameRequestId, FrameTask)>,
    ids: IdSource,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, task: FrameTask) -> FrameRequestId {
        let id = FrameRequestId(self.ids.next());
        self.pending.push((id, task));
        id
    }

    /// Drop a pending request. Returns false if it already ran or was
    /// cancelled.
    pub fn cancel(&mut self, id: FrameRequestId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(pending, _)| *pending != id);
        self.pending.len() != before
    }

    /// Take every request made so far, leaving the queue empty for
    /// requests made while these run.
    pub fn take_due(&mut self) -> Vec<(FrameRequestId, FrameTask)> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self, id: FrameRequestId) -> bool {
        self.pending.iter().any(|(pending, _)| *pending == id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
