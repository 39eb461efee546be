//! Api - Trait abstracting the EC2 calls the reconciler depends on
//!
//! An `Ec2Api` implementation turns each operation into an actual API call
//! (or, in tests, into an in-memory lookup).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::address::{AddressAllocation, AddressFilter, Association, InstanceRecord};

/// Error type for EC2 API operations
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The three EC2 operations needed to keep an elastic IP in place
///
/// `describe_instances` and `describe_addresses` are read-only;
/// `associate_address` is the only call that changes anything.
pub trait Ec2Api: Send + Sync {
    /// Instances matching the `instance-id` filter, in API order
    fn describe_instances(
        &self,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Vec<InstanceRecord>>>;

    /// Elastic IPs matching the domain and public IP in `filter`, in API order
    fn describe_addresses(
        &self,
        filter: &AddressFilter,
    ) -> BoxFuture<'_, ApiResult<Vec<AddressAllocation>>>;

    /// Bind the allocation to the instance
    ///
    /// If the allocation is bound elsewhere, EC2 moves it.
    fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Association>>;
}

/// Enables dynamic dispatch for `Ec2Api`
impl Ec2Api for Box<dyn Ec2Api> {
    fn describe_instances(
        &self,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Vec<InstanceRecord>>> {
        (**self).describe_instances(instance_id)
    }

    fn describe_addresses(
        &self,
        filter: &AddressFilter,
    ) -> BoxFuture<'_, ApiResult<Vec<AddressAllocation>>> {
        (**self).describe_addresses(filter)
    }

    fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Association>> {
        (**self).associate_address(allocation_id, instance_id)
    }
}

impl<T: Ec2Api + ?Sized> Ec2Api for Arc<T> {
    fn describe_instances(
        &self,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Vec<InstanceRecord>>> {
        (**self).describe_instances(instance_id)
    }

    fn describe_addresses(
        &self,
        filter: &AddressFilter,
    ) -> BoxFuture<'_, ApiResult<Vec<AddressAllocation>>> {
        (**self).describe_addresses(filter)
    }

    fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Association>> {
        (**self).associate_address(allocation_id, instance_id)
    }
}
