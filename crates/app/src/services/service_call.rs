//! Service-call flow shared by every integration context.
//!
//! [`ServiceContext::call_service`](crate::services::integration_context::ServiceContext::call_service)
//! checks ownership against storage and then runs [`call_service`].

use serde_json::json;

use vesync_hub_domain::entity::Entity;
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::event::{Event, EventType};
use vesync_hub_domain::id::EntityId;
use vesync_hub_domain::service::Service;

use crate::ports::{Integration, IntegrationContext};

/// Call `service` on `entity_id` through `integration`.
///
/// A `ServiceCalled` event is published first. The snapshot the integration
/// returns is persisted through `ctx`, so a state change made by the call
/// also produces a `StateChanged` event.
///
/// # Errors
///
/// Returns whatever the integration or the persistence layer reports.
#[tracing::instrument(skip(integration, ctx), fields(integration = integration.name()))]
pub async fn call_service<I, C>(
    integration: &I,
    ctx: &C,
    entity_id: EntityId,
    service: Service,
) -> Result<Entity, HubError>
where
    I: Integration + Sync,
    C: IntegrationContext,
{
    ctx.publish(Event::new(
        EventType::ServiceCalled,
        Some(entity_id),
        json!({ "service": service.as_str(), "integration": integration.name() }),
    ))
    .await?;

    let entity = integration.handle_service_call(entity_id, service).await?;
    ctx.upsert_entity(entity).await
}
