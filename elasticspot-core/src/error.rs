//! Reconciliation error types

use thiserror::Error;

use crate::api::ApiError;
use crate::event::DecodeError;

/// Errors that can occur while converging an elastic IP onto an instance
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The event payload could not be turned into a request
    #[error("failed to decode event detail")]
    Decode(#[from] DecodeError),

    /// `DescribeInstances` returned no instance for the ID
    #[error("error fetching instance {instance_id}: no instance found for the given id")]
    InstanceNotFound { instance_id: String },

    /// No VPC elastic IP matches the desired address
    #[error(
        "error fetching elastic ip address: elastic ip address {address} not found in region {}",
        region_label(.region)
    )]
    AddressNotFound {
        address: String,
        region: Option<String>,
    },

    /// `AssociateAddress` failed
    #[error("error associating elastic ip address with {instance_id:?}")]
    AssociationFailed {
        instance_id: String,
        #[source]
        source: ApiError,
    },

    /// A read-only lookup failed
    #[error("{operation} failed")]
    DescribeFailed {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    /// The invocation was cancelled before the next API call
    #[error("invocation cancelled before {operation}")]
    Cancelled { operation: &'static str },
}

impl ReconcileError {
    pub fn instance_not_found(instance_id: impl Into<String>) -> Self {
        Self::InstanceNotFound {
            instance_id: instance_id.into(),
        }
    }

    pub fn address_not_found(address: impl Into<String>, region: Option<&str>) -> Self {
        Self::AddressNotFound {
            address: address.into(),
            region: region.map(String::from),
        }
    }

    pub fn association_failed(instance_id: impl Into<String>, source: ApiError) -> Self {
        Self::AssociationFailed {
            instance_id: instance_id.into(),
            source,
        }
    }

    /// This error followed by each of its causes, separated by `: `
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }

    /// Whether re-running the whole invocation may succeed
    ///
    /// Instance lookups race with EC2's eventual consistency right after
    /// launch, and API failures are usually transient. A missing elastic IP
    /// or a bad payload will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InstanceNotFound { .. }
                | Self::AssociationFailed { .. }
                | Self::DescribeFailed { .. }
        )
    }
}

fn region_label(region: &Option<String>) -> String {
    match region {
        Some(region) => format!("{:?}", region),
        None => "unknown region".to_string(),
    }
}
