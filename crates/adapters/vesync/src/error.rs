//! VeSync adapter error types.

use std::path::PathBuf;

use vesync_hub_domain::error::HubError;

/// Errors reported by a vendor device-management client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The device snapshot file could not be read.
    #[error("failed to read device snapshot {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device snapshot is not valid JSON or misses required fields.
    #[error("failed to parse device snapshot")]
    Parse(#[source] serde_json::Error),

    /// Two devices in one snapshot share a `cid`.
    #[error("duplicate device cid `{0}` in snapshot")]
    DuplicateCid(String),

    /// A command was sent to a device that is not reachable.
    #[error("device `{cid}` is offline")]
    Offline { cid: String },
}

/// Errors specific to the VeSync adapter.
#[derive(Debug, thiserror::Error)]
pub enum VeSyncError {
    /// The vendor client failed.
    #[error("VeSync client error")]
    Client(#[from] ClientError),

    /// A blocking worker running a vendor call panicked or was cancelled.
    #[error("VeSync worker task failed")]
    Worker(#[from] tokio::task::JoinError),

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] HubError),
}

impl VeSyncError {
    /// Convert into a [`HubError`] for propagation across port boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubError {
        match self {
            Self::Domain(err) => err,
            other => HubError::Integration(Box::new(other)),
        }
    }
}

impl From<VeSyncError> for HubError {
    fn from(err: VeSyncError) -> Self {
        err.into_domain()
    }
}

impl From<HubError> for VeSyncError {
    fn from(err: HubError) -> Self {
        Self::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesync_hub_domain::error::ValidationError;

    #[test]
    fn should_display_offline_error() {
        let err = ClientError::Offline {
            cid: "vsaq1".to_string(),
        };
        assert_eq!(err.to_string(), "device `vsaq1` is offline");
    }

    #[test]
    fn should_display_read_error_with_path() {
        let err = ClientError::Read {
            path: PathBuf::from("/tmp/devices.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(
            err.to_string(),
            "failed to read device snapshot /tmp/devices.json"
        );
    }

    #[test]
    fn should_convert_client_error_to_integration_error() {
        let err: HubError = VeSyncError::from(ClientError::DuplicateCid("a".to_string())).into();
        assert!(matches!(err, HubError::Integration(_)));
    }

    #[test]
    fn should_convert_domain_error_back_to_domain() {
        let err = VeSyncError::Domain(HubError::Validation(ValidationError::EmptyName));
        let back: HubError = err.into();
        assert!(matches!(back, HubError::Validation(ValidationError::EmptyName)));
    }
}
