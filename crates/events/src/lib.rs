//! Event-sourced mutation pipeline: domain events, the append-only log, the
//! in-process dispatcher, and the unit of work that ties them together.

pub mod dispatcher;
pub mod envelope;
pub mod event;
pub mod event_log;
pub mod file_log;
pub mod persistence_handler;
pub mod unit_of_work;

pub use dispatcher::{EventDispatcher, EventHandler};
pub use envelope::{EntityType, Event, EventEnvelope};
pub use event::DomainEvent;
pub use event_log::{EventLog, InMemoryEventLog};
pub use file_log::FileEventLog;
pub use persistence_handler::{to_activity_stream, EventPersistenceHandler};
pub use unit_of_work::UnitOfWork;
