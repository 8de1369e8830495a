//! Chunk completion signal between the DMA interrupt and the worker.
//!
//! Single slot: there is never more than one chunk in flight, so the
//! interrupt handler only has to raise a flag and the worker only has to
//! observe it.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::hal::Monotonic;

pub struct CompletionSignal {
    fired: AtomicBool,
}

impl CompletionSignal {
    pub const fn new() -> Self {
        Self { fired: AtomicBool::new(false) }
    }

    /// Called from the DMA interrupt (transfer complete or transfer error).
    /// Never blocks.
    #[inline]
    pub fn notify(&self) {
        self.fired.store(true, Ordering::Release);
    }

    /// Arm for the next chunk.
    #[inline]
    pub fn reset(&self) {
        self.fired.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Consume the signal if it has fired.
    #[inline]
    pub fn take(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }

    /// Wait until notified or `timeout_ms` elapsed. Returns `true` when the
    /// signal was received.
    pub fn wait<C: Monotonic>(&self, clock: &C, timeout_ms: u32) -> bool {
        let start = clock.now_ms();
        loop {
            if self.take() {
                return true;
            }
            if clock.has_elapsed(start, timeout_ms) {
                // Last look: the interrupt may have landed right at the deadline.
                return self.take();
            }
            core::hint::spin_loop();
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}
