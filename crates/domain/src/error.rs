//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! at port boundaries.

/// Top-level error returned by services and ports.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// Persistence layer failure (boxed adapter error).
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Device integration failure (boxed adapter error).
    #[error("integration error")]
    Integration(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("entity_id must not be empty")]
    EmptyEntityId,

    #[error("entity_id `{0}` must have the form `<platform>.<object_id>`")]
    MalformedEntityId(String),

    #[error("integration must not be empty")]
    EmptyIntegration,

    #[error("unique_id must not be empty")]
    EmptyUniqueId,

    #[error("unknown service `{0}`")]
    UnknownService(String),

    #[error("service `{service}` is not supported by `{entity_id}`")]
    UnsupportedService { entity_id: String, service: String },
}

/// A lookup did not match any stored record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_hub_error() {
        let err: HubError = ValidationError::EmptyName.into();
        assert!(matches!(err, HubError::Validation(ValidationError::EmptyName)));
    }

    #[test]
    fn should_display_not_found_with_kind_and_id() {
        let err = NotFoundError {
            entity: "Entity",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Entity `abc` not found");
    }

    #[test]
    fn should_display_unsupported_service() {
        let err = ValidationError::UnsupportedService {
            entity_id: "binary_sensor.humidifier_water_lacks".to_string(),
            service: "turn_on".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "service `turn_on` is not supported by `binary_sensor.humidifier_water_lacks`"
        );
    }

    #[test]
    fn should_keep_boxed_source_for_integration_errors() {
        let io = std::io::Error::other("socket closed");
        let err = HubError::Integration(Box::new(io));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "socket closed");
    }
}
