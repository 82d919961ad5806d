use std::collections::VecDeque;

use crate::canvas::buffer::PixelBuffer;

/// Maximum number of undoable gestures kept in memory.
pub const HISTORY_DEPTH: usize = 20;

/// Deep copy of the mask buffer at a point in time. Never aliases the live
/// buffer, so undo/redo cannot race with ongoing drawing.
struct MaskSnapshot {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl MaskSnapshot {
    fn capture(mask: &PixelBuffer) -> Self {
        Self {
            width: mask.width(),
            height: mask.height(),
            data: mask.data().to_vec(),
        }
    }

    fn restore(&self, mask: &mut PixelBuffer) -> bool {
        if mask.width() != self.width || mask.height() != self.height {
            log::warn!("history snapshot dimensions do not match the live mask, skipping");
            return false;
        }
        mask.data_mut().copy_from_slice(&self.data);
        true
    }
}

/// Snapshot-based undo/redo over the mask buffer, bounded depth.
///
/// One `store_state` call per discrete user gesture (stroke start, flood
/// fill, mask reset, prediction merge), never per brush stamp.
pub struct History {
    past: VecDeque<MaskSnapshot>,
    future: Vec<MaskSnapshot>,
    depth: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_depth(HISTORY_DEPTH)
    }

    pub fn with_depth(depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            depth,
        }
    }

    /// Capture the current mask before a mutating gesture. Evicts the oldest
    /// entry past the depth bound and always invalidates the redo branch.
    pub fn store_state(&mut self, mask: &PixelBuffer) {
        self.past.push_back(MaskSnapshot::capture(mask));
        if self.past.len() > self.depth {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Restore the most recent past state; the current state moves to the
    /// redo stack. Returns false when there is nothing to undo.
    pub fn undo(&mut self, mask: &mut PixelBuffer) -> bool {
        let Some(snapshot) = self.past.pop_back() else {
            return false;
        };
        self.future.push(MaskSnapshot::capture(mask));
        snapshot.restore(mask)
    }

    /// Re-apply the most recently undone state. Returns false when the redo
    /// stack is empty.
    pub fn redo(&mut self, mask: &mut PixelBuffer) -> bool {
        let Some(snapshot) = self.future.pop() else {
            return false;
        };
        self.past.push_back(MaskSnapshot::capture(mask));
        snapshot.restore(mask)
    }

    /// Drop all history, e.g. when a new image loads.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
