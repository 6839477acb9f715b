//! Transaction boundary around a single aggregate mutation.
//!
//! Commit is two-phase within one process: events are appended to the
//! [`EventLog`] (durable) and then dispatched to subscribers. A log-append
//! failure rolls back cleanly (nothing was buffered to disk or to
//! subscribers); a dispatch failure after a successful append surfaces an
//! error but the events remain durable — rollback at that point is advisory
//! only, since the log is append-only and cannot un-append.

use std::sync::Arc;

use ldp_core::{PodError, ResourceId};
use tracing::warn;

use crate::dispatcher::EventDispatcher;
use crate::envelope::{Event, EventEnvelope};
use crate::event_log::EventLog;

/// Buffers events for one aggregate and commits them atomically (persist,
/// then dispatch). Each service call constructs a fresh `UnitOfWork`; it is
/// not reused across calls.
pub struct UnitOfWork {
    log: Arc<dyn EventLog>,
    dispatcher: Arc<EventDispatcher>,
    pending: Vec<Event>,
}

impl UnitOfWork {
    pub fn new(log: Arc<dyn EventLog>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            log,
            dispatcher,
            pending: Vec::new(),
        }
    }

    /// Buffer events for commit. Does not persist or dispatch them yet.
    pub fn register_events(&mut self, events: Vec<Event>) {
        self.pending.extend(events);
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Persist then dispatch the buffered events for `aggregate_id`.
    ///
    /// On append failure, no events were durably recorded and the caller may
    /// treat this as a clean rollback. On dispatch failure, the events are
    /// already durable in the log; this is logged at warn level because the
    /// materialized repository may now be behind the log.
    pub fn commit(mut self, aggregate_id: &ResourceId) -> Result<Vec<EventEnvelope>, PodError> {
        let events = std::mem::take(&mut self.pending);
        if events.is_empty() {
            return Ok(vec![]);
        }

        let envelopes = self.log.append(aggregate_id, events)?;

        if let Err(err) = self.dispatcher.dispatch_all(&envelopes) {
            warn!(
                aggregate_id = %aggregate_id,
                error = %err,
                "event dispatch failed after a durable log append; materialized repository may be stale"
            );
            return Err(PodError::event_commit_failed(
                "UnitOfWork::commit",
                format!("dispatch failed after durable append: {err}"),
            ));
        }

        Ok(envelopes)
    }

    /// Discard buffered events without persisting or dispatching them.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }
}
