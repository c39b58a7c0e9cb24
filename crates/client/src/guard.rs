//! In-flight guard for operations that must not overlap.

use std::sync::atomic::{AtomicBool, Ordering};

/// Flag marking one outstanding operation.
///
/// [`try_begin`](Self::try_begin) hands out at most one [`InFlightTicket`]
/// at a time; the flag clears when the ticket drops, including on early
/// return or panic unwinding.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Claim the guard, or `None` if an operation is already outstanding.
    #[must_use]
    pub fn try_begin(&self) -> Option<InFlightTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightTicket { guard: self })
    }

    /// Whether an operation is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of a claimed [`InFlight`]; releases it on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the ticket is dropped"]
pub struct InFlightTicket<'a> {
    guard: &'a InFlight,
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
