use crate::error::{Error, Result};

/// Where a [`FrameAssembler`] is in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyState {
    /// No bytes accumulated.
    Idle,
    /// One or more fragments appended, marker not yet seen.
    Accumulating,
}

/// Accumulates depacketized fragments into one contiguous frame.
///
/// The buffer is allocated once with a fixed capacity and never grows.
/// A fragment that would overflow it discards the whole in-progress frame,
/// so the accumulated length can never exceed the capacity.
///
/// ```text
/// Idle ──push(frag, false)──> Accumulating ──push(frag, false)──> Accumulating
///   ^                                                  │
///   └──────── finish() <── push(frag, true) = complete ┘
/// ```
#[derive(Debug)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    capacity: usize,
    complete: bool,
}

impl FrameAssembler {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            complete: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes accumulated for the frame in progress.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn state(&self) -> ReassemblyState {
        if self.buf.is_empty() {
            ReassemblyState::Idle
        } else {
            ReassemblyState::Accumulating
        }
    }

    /// Append `fragment` at the current write offset.
    ///
    /// Returns `Ok(true)` when `end_of_frame` completes the frame; the caller
    /// must then hand it off with [`finish`](Self::finish). On overflow the
    /// frame in progress is discarded and the assembler returns to
    /// [`ReassemblyState::Idle`].
    pub fn push(&mut self, fragment: &[u8], end_of_frame: bool) -> Result<bool> {
        if self.complete {
            // previous frame was never handed off
            self.reset();
        }

        let needed = self.buf.len() + fragment.len();
        if needed > self.capacity {
            let discarded = self.buf.len();
            self.reset();
            tracing::warn!(
                needed,
                capacity = self.capacity,
                discarded,
                "reassembly overflow, frame discarded"
            );
            return Err(Error::ReassemblyOverflow {
                needed,
                capacity: self.capacity,
            });
        }

        self.buf.extend_from_slice(fragment);
        tracing::trace!(
            fragment = fragment.len(),
            total = self.buf.len(),
            end_of_frame,
            "fragment appended"
        );
        self.complete = end_of_frame;
        Ok(end_of_frame)
    }

    /// Hand the completed frame to `f`, then reset to
    /// [`ReassemblyState::Idle`] whatever `f` returns.
    pub fn finish<R>(&mut self, f: impl FnOnce(&[u8]) -> R) -> R {
        let result = f(&self.buf);
        self.reset();
        result
    }

    /// Drop any accumulated bytes.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.complete = false;
    }
}
