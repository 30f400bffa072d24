//! Outbound port for domain events.

use std::future::Future;

use vesync_hub_domain::error::HubError;
use vesync_hub_domain::event::Event;

/// Sink for the events the services emit (`EntityCreated`, `StateChanged`,
/// `ServiceCalled`, ...).
///
/// Publishing never waits for subscribers; an error means the sink itself
/// is broken.
pub trait EventPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send;
}
