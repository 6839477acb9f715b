use chrono::{DateTime, Utc};

/// A domain event emitted by a resource or container aggregate.
///
/// Events represent **facts that happened** in the pod - they are immutable,
/// versioned, and designed to be append-only.
///
/// ## Event Sourcing Philosophy
///
/// Events are the **source of truth** in event sourcing:
///
/// - **Immutable**: Events represent facts that occurred - they cannot be changed or deleted
/// - **Versioned**: Events have schema versions to support evolution over time
/// - **Append-only**: New events are appended to streams; old events are never modified
/// - **Replayable**: Materialized repositories can be rebuilt by replaying events in order
///
/// ## Event Versioning
///
/// The `version()` method enables schema evolution. When event schemas change:
///
/// 1. Create a new event variant/version (e.g., `ResourceCreatedV2`)
/// 2. Implement both versions in deserialization (backward compatibility)
/// 3. Migrate handlers to process both versions
/// 4. Eventually deprecate old versions
///
/// ## Design Constraints
///
/// Events must be:
/// - **Serializable**: Events are serialized to JSON for the event log and handlers
/// - **Cloneable**: Events are copied when building envelopes
/// - **Send + Sync**: Events cross thread boundaries (dispatcher, handlers)
/// - **'static**: Events don't contain borrowed data (must own all data)
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event type identifier (e.g., `"resource.created"`, `"container.member_added"`).
    ///
    /// Convention: `{aggregate}.{action}` (snake_case action). This identifier is
    /// used for dispatcher routing and must never change once events exist in
    /// a durable log.
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type. Starts at 1, only ever increases.
    fn version(&self) -> u32;

    /// When the event occurred, in business time (not log-append time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
