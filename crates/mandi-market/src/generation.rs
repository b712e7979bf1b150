//! Last-request-wins guard for overlapping record fetches.
//!
//! Every fetch takes a [`RequestTicket`]. Any later [`RequestGeneration::begin`]
//! or [`RequestGeneration::supersede`] invalidates all earlier tickets, so a
//! slow response for an old selection can be recognised and dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared monotonically increasing generation counter. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

impl RequestGeneration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, invalidating every outstanding ticket.
    #[must_use]
    pub fn begin(&self) -> RequestTicket {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket {
            id,
            generation: Arc::clone(&self.current),
        }
    }

    /// Invalidates outstanding tickets without starting a request.
    pub fn supersede(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Proof of which generation a request was issued under.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    id: u64,
    generation: Arc<AtomicU64>,
}

impl RequestTicket {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `true` while no newer request has begun or been superseded.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.id
    }
}
