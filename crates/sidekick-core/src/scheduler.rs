//! Request scheduling and stale-result suppression.
//!
//! The scheduler owns a monotonically increasing generation counter per
//! editable document. Each edit-triggered completion attempt is admitted
//! under the next generation; admitting a new attempt while an older one
//! is still in flight marks the older handle `Cancelled`. Cancellation is
//! cooperative: the in-flight inference call is not torn down, but its
//! eventual result compares stale at [`RequestScheduler::complete`] and
//! is discarded.
//!
//! This gives admission-order semantics: a request admitted later always
//! wins over one admitted earlier, regardless of which completes first.
//! That is the chief correctness property of the pipeline — an
//! out-of-order completion can never overwrite a newer keystroke's
//! in-progress edit.
//!
//! All operations are synchronous and non-suspending; the counters are
//! the only shared mutable state, guarded by a single mutex so that no
//! two admissions for the same document observe the same previous
//! generation.

use std::collections::HashMap;
use std::sync::Mutex;

/// One admitted completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandle {
    pub document_id: String,
    pub generation: u64,
}

/// Lifecycle state of a request handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Admitted and awaiting its result.
    Pending,
    /// Its result was delivered (success or error payload).
    Completed,
    /// Superseded by a newer admission before completing.
    Cancelled,
}

/// Outcome of handing a result to the scheduler.
///
/// Failure payloads travel inside `T` (a completed request carrying an
/// error is still `Delivered`); `Stale` is reserved for supersession.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery<T> {
    /// The handle's generation is current; render the payload.
    Delivered(T),
    /// A newer generation was admitted first; discard silently.
    Stale,
}

impl<T> Delivery<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Delivery::Stale)
    }
}

#[derive(Debug, Default)]
struct DocumentSlot {
    /// Latest admitted generation; 0 means nothing admitted yet.
    generation: u64,
    /// Generation of the in-flight request, if any.
    pending: Option<u64>,
    /// Most recent generation whose result was delivered.
    completed: Option<u64>,
}

/// Per-document generation counters and pending-request bookkeeping.
#[derive(Debug, Default)]
pub struct RequestScheduler {
    slots: Mutex<HashMap<String, DocumentSlot>>,
}

impl RequestScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new completion attempt for a document.
    ///
    /// Increments the document's generation counter and returns the new
    /// handle. Any still-pending older handle is cancelled by this call:
    /// at most one handle per document is ever `Pending`.
    pub fn admit(&self, document_id: &str) -> RequestHandle {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.entry(document_id.to_string()).or_default();
        slot.generation += 1;
        slot.pending = Some(slot.generation);
        RequestHandle {
            document_id: document_id.to_string(),
            generation: slot.generation,
        }
    }

    /// Hand a finished request's payload to the scheduler.
    ///
    /// If the handle's generation is still the document's latest, the
    /// handle transitions to `Completed` and the payload is returned for
    /// rendering. Otherwise the payload is dropped as [`Delivery::Stale`]
    /// — a no-op from the renderer's point of view.
    pub fn complete<T>(&self, handle: &RequestHandle, payload: T) -> Delivery<T> {
        let mut slots = self.slots.lock().unwrap();
        let slot = match slots.get_mut(&handle.document_id) {
            Some(slot) => slot,
            None => return Delivery::Stale,
        };

        if handle.generation != slot.generation {
            return Delivery::Stale;
        }

        slot.pending = None;
        slot.completed = Some(handle.generation);
        Delivery::Delivered(payload)
    }

    /// Current state of a previously admitted handle.
    pub fn state(&self, handle: &RequestHandle) -> RequestState {
        let slots = self.slots.lock().unwrap();
        match slots.get(&handle.document_id) {
            Some(slot) if slot.pending == Some(handle.generation) => RequestState::Pending,
            Some(slot) if slot.completed == Some(handle.generation) => RequestState::Completed,
            _ => RequestState::Cancelled,
        }
    }

    /// Latest admitted generation for a document (0 if none).
    pub fn current_generation(&self, document_id: &str) -> u64 {
        let slots = self.slots.lock().unwrap();
        slots.get(document_id).map(|s| s.generation).unwrap_or(0)
    }

    /// Whether a request is currently in flight for a document.
    pub fn has_pending(&self, document_id: &str) -> bool {
        let slots = self.slots.lock().unwrap();
        slots
            .get(document_id)
            .map(|s| s.pending.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_are_monotonic() {
        let scheduler = RequestScheduler::new();
        let h1 = scheduler.admit("doc1");
        let h2 = scheduler.admit("doc1");
        let h3 = scheduler.admit("doc1");
        assert_eq!(h1.generation, 1);
        assert_eq!(h2.generation, 2);
        assert_eq!(h3.generation, 3);
    }

    #[test]
    fn test_documents_count_independently() {
        let scheduler = RequestScheduler::new();
        scheduler.admit("doc1");
        scheduler.admit("doc1");
        let other = scheduler.admit("doc2");
        assert_eq!(other.generation, 1);
        assert_eq!(scheduler.current_generation("doc1"), 2);
    }

    #[test]
    fn test_at_most_one_pending_per_document() {
        let scheduler = RequestScheduler::new();
        let h1 = scheduler.admit("doc1");
        assert_eq!(scheduler.state(&h1), RequestState::Pending);

        let h2 = scheduler.admit("doc1");
        assert_eq!(scheduler.state(&h1), RequestState::Cancelled);
        assert_eq!(scheduler.state(&h2), RequestState::Pending);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let scheduler = RequestScheduler::new();
        let h1 = scheduler.admit("doc1");
        let h2 = scheduler.admit("doc1");

        // g=1 finishes late; its payload must not reach the renderer.
        assert!(scheduler.complete(&h1, "old").is_stale());
        assert_eq!(scheduler.state(&h1), RequestState::Cancelled);

        // g=2 is current and delivers.
        assert_eq!(scheduler.complete(&h2, "new"), Delivery::Delivered("new"));
        assert_eq!(scheduler.state(&h2), RequestState::Completed);
    }

    #[test]
    fn test_monotonic_wins_regardless_of_completion_order() {
        let scheduler = RequestScheduler::new();
        let h1 = scheduler.admit("doc1");
        let h2 = scheduler.admit("doc1");

        // Later admission completes first, then the earlier one trickles in.
        assert_eq!(scheduler.complete(&h2, 2), Delivery::Delivered(2));
        assert!(scheduler.complete(&h1, 1).is_stale());
    }

    #[test]
    fn test_completed_handle_frees_the_document() {
        let scheduler = RequestScheduler::new();
        let h1 = scheduler.admit("doc1");
        scheduler.complete(&h1, ());
        assert!(!scheduler.has_pending("doc1"));

        let h2 = scheduler.admit("doc1");
        assert_eq!(h2.generation, 2);
        assert_eq!(scheduler.complete(&h2, ()), Delivery::Delivered(()));
    }

    #[test]
    fn test_unknown_document_result_is_stale() {
        let scheduler = RequestScheduler::new();
        let handle = RequestHandle {
            document_id: "ghost".to_string(),
            generation: 1,
        };
        assert!(scheduler.complete(&handle, ()).is_stale());
    }

    #[test]
    fn test_error_payload_still_delivers() {
        // Failure is a completed request carrying an error, not a
        // cancellation.
        let scheduler = RequestScheduler::new();
        let h = scheduler.admit("doc1");
        let payload: Result<&str, &str> = Err("engine timed out");
        assert_eq!(
            scheduler.complete(&h, payload),
            Delivery::Delivered(Err("engine timed out"))
        );
        assert_eq!(scheduler.state(&h), RequestState::Completed);
    }
}
