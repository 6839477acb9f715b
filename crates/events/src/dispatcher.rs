//! In-process pub/sub event dispatcher.
//!
//! Unlike the bus abstraction this supersedes (channel-based, type-erased by
//! payload type `M`), subscribers here register by **event type string** and
//! are invoked synchronously and in registration order on the committing
//! thread — the shape the materialized-repository handlers in this pod
//! actually need, since read-after-write consistency for containers depends
//! on dispatch completing before the service call returns.

use std::sync::{Arc, RwLock};

use ldp_core::PodError;

use crate::envelope::EventEnvelope;

/// A subscriber that reconciles a materialized repository from dispatched events.
///
/// Handlers are expected to be idempotent: at-least-once delivery is possible
/// after a durable log write whose dispatch subsequently fails (see the Unit
/// of Work's two-phase commit).
pub trait EventHandler: Send + Sync {
    fn handle(&self, envelope: &EventEnvelope) -> Result<(), PodError>;
}

/// Subscribes handlers by event type and dispatches committed envelopes to them.
///
/// The subscription table is write-once at startup and read-only at steady
/// state, per the concurrency model; `subscribe`/`subscribe_all` are intended
/// to be called only during wiring.
#[derive(Default)]
pub struct EventDispatcher {
    by_type: RwLock<std::collections::HashMap<&'static str, Vec<Arc<dyn EventHandler>>>>,
    wildcard: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to a specific event type.
    pub fn subscribe(&self, event_type: &'static str, handler: Arc<dyn EventHandler>) -> Result<(), PodError> {
        self.by_type
            .write()
            .map_err(|_| PodError::storage_failed("EventDispatcher::subscribe", "subscription lock poisoned"))?
            .entry(event_type)
            .or_default()
            .push(handler);
        Ok(())
    }

    /// Subscribe a handler to every event type, invoked before type-specific handlers.
    pub fn subscribe_all(&self, handler: Arc<dyn EventHandler>) -> Result<(), PodError> {
        self.wildcard
            .write()
            .map_err(|_| PodError::storage_failed("EventDispatcher::subscribe_all", "subscription lock poisoned"))?
            .push(handler);
        Ok(())
    }

    /// Dispatch one envelope to wildcard handlers, then to handlers subscribed
    /// to this event's type, both in registration order. The first handler
    /// error short-circuits delivery to the remaining handlers.
    pub fn dispatch(&self, envelope: &EventEnvelope) -> Result<(), PodError> {
        let wildcard = self
            .wildcard
            .read()
            .map_err(|_| PodError::storage_failed("EventDispatcher::dispatch", "wildcard lock poisoned"))?;
        for handler in wildcard.iter() {
            handler.handle(envelope)?;
        }
        drop(wildcard);

        let event_type = envelope.event().event_type;
        let by_type = self
            .by_type
            .read()
            .map_err(|_| PodError::storage_failed("EventDispatcher::dispatch", "by_type lock poisoned"))?;
        if let Some(handlers) = by_type.get(event_type) {
            for handler in handlers {
                handler.handle(envelope)?;
            }
        }

        Ok(())
    }

    /// Dispatch a batch of envelopes in order, stopping at the first error.
    pub fn dispatch_all(&self, envelopes: &[EventEnvelope]) -> Result<(), PodError> {
        for envelope in envelopes {
            self.dispatch(envelope)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{EntityType, Event};
    use ldp_core::ResourceId;
    use std::sync::Mutex;

    struct Recorder {
        order: Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
        fail: bool,
    }

    impl EventHandler for Recorder {
        fn handle(&self, _envelope: &EventEnvelope) -> Result<(), PodError> {
            self.order.lock().unwrap().push(self.name);
            if self.fail {
                return Err(PodError::event_commit_failed("test", "boom"));
            }
            Ok(())
        }
    }

    fn envelope() -> EventEnvelope {
        let event = Event::new(
            EntityType::Resource,
            "resource.created",
            ResourceId::new("r1").unwrap(),
            1,
            serde_json::json!({}),
        );
        EventEnvelope::new(uuid::Uuid::now_v7(), chrono::Utc::now(), event)
    }

    #[test]
    fn wildcard_handlers_run_before_type_specific_ones() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        dispatcher.subscribe_all(Arc::new(Recorder { order: order.clone(), name: "wildcard", fail: false })).unwrap();
        dispatcher
            .subscribe(
                "resource.created",
                Arc::new(Recorder { order: order.clone(), name: "specific", fail: false }),
            )
            .unwrap();

        dispatcher.dispatch(&envelope()).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["wildcard", "specific"]);
    }

    #[test]
    fn registration_order_is_preserved_within_a_type() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        dispatcher.subscribe("resource.created", Arc::new(Recorder { order: order.clone(), name: "first", fail: false })).unwrap();
        dispatcher.subscribe("resource.created", Arc::new(Recorder { order: order.clone(), name: "second", fail: false })).unwrap();

        dispatcher.dispatch(&envelope()).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn first_error_short_circuits_remaining_handlers() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        dispatcher.subscribe("resource.created", Arc::new(Recorder { order: order.clone(), name: "failing", fail: true })).unwrap();
        dispatcher.subscribe("resource.created", Arc::new(Recorder { order: order.clone(), name: "never", fail: false })).unwrap();

        let result = dispatcher.dispatch(&envelope());
        assert!(result.is_err());
        assert_eq!(*order.lock().unwrap(), vec!["failing"]);
    }
}
