//! In-memory `Ec2Api` for tests
//!
//! Filters like EC2 does, counts every call, and moves the elastic IP onto the
//! instance when an association succeeds so repeated reconciles converge.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::address::{AddressAllocation, AddressDomain, AddressFilter, Association, InstanceRecord};
use crate::api::{ApiError, ApiResult, BoxFuture, Ec2Api};

/// Operation selector for injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOperation {
    DescribeInstances,
    DescribeAddresses,
    AssociateAddress,
}

#[derive(Default)]
struct MockState {
    instances: Vec<InstanceRecord>,
    addresses: Vec<(AddressDomain, AddressAllocation)>,
    associations: Vec<(String, String)>,
    address_filters: Vec<AddressFilter>,
}

#[derive(Default)]
pub struct MockEc2 {
    state: Mutex<MockState>,
    association_id: Option<String>,
    failure: Option<(MockOperation, String)>,
    describe_instances_calls: AtomicUsize,
    describe_addresses_calls: AtomicUsize,
    associate_address_calls: AtomicUsize,
}

impl MockEc2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, instance: InstanceRecord) -> Self {
        self.update(|state| state.instances.push(instance));
        self
    }

    /// Add a VPC elastic IP
    pub fn with_address(self, address: AddressAllocation) -> Self {
        self.with_address_in(AddressDomain::Vpc, address)
    }

    pub fn with_address_in(self, domain: AddressDomain, address: AddressAllocation) -> Self {
        self.update(|state| state.addresses.push((domain, address)));
        self
    }

    /// Association ID returned by every successful `associate_address`
    ///
    /// Without it, IDs are generated as `eipassoc-<n>`.
    pub fn with_association_id(mut self, association_id: impl Into<String>) -> Self {
        self.association_id = Some(association_id.into());
        self
    }

    /// Make `operation` fail with `message`
    pub fn failing(mut self, operation: MockOperation, message: impl Into<String>) -> Self {
        self.failure = Some((operation, message.into()));
        self
    }

    pub fn describe_instances_calls(&self) -> usize {
        self.describe_instances_calls.load(Ordering::SeqCst)
    }

    pub fn describe_addresses_calls(&self) -> usize {
        self.describe_addresses_calls.load(Ordering::SeqCst)
    }

    pub fn associate_address_calls(&self) -> usize {
        self.associate_address_calls.load(Ordering::SeqCst)
    }

    /// `(allocation_id, instance_id)` pairs of successful associations
    pub fn associations(&self) -> Vec<(String, String)> {
        self.read(|state| state.associations.clone())
    }

    /// Filters received by `describe_addresses`, in call order
    pub fn address_filters(&self) -> Vec<AddressFilter> {
        self.read(|state| state.address_filters.clone())
    }

    /// Current public IP of an instance
    pub fn public_ip(&self, instance_id: &str) -> Option<String> {
        self.read(|state| {
            state
                .instances
                .iter()
                .find(|i| i.id == instance_id)
                .and_then(|i| i.public_ip.clone())
        })
    }

    fn update(&self, f: impl FnOnce(&mut MockState)) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state);
    }

    fn read<T>(&self, f: impl FnOnce(&MockState) -> T) -> T {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    fn check_failure(&self, operation: MockOperation) -> ApiResult<()> {
        match &self.failure {
            Some((op, message)) if *op == operation => Err(ApiError::new(message.clone())),
            _ => Ok(()),
        }
    }

    fn find_instances(&self, instance_id: &str) -> ApiResult<Vec<InstanceRecord>> {
        self.describe_instances_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(MockOperation::DescribeInstances)?;

        Ok(self.read(|state| {
            state
                .instances
                .iter()
                .filter(|i| i.id == instance_id)
                .cloned()
                .collect()
        }))
    }

    fn find_addresses(&self, filter: AddressFilter) -> ApiResult<Vec<AddressAllocation>> {
        self.describe_addresses_calls.fetch_add(1, Ordering::SeqCst);
        self.update(|state| state.address_filters.push(filter.clone()));
        self.check_failure(MockOperation::DescribeAddresses)?;

        Ok(self.read(|state| {
            state
                .addresses
                .iter()
                .filter(|(domain, a)| *domain == filter.domain && a.public_ip == filter.public_ip)
                .map(|(_, a)| a.clone())
                .collect()
        }))
    }

    fn associate(&self, allocation_id: &str, instance_id: &str) -> ApiResult<Association> {
        let call = self.associate_address_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.check_failure(MockOperation::AssociateAddress)?;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let public_ip = state
            .addresses
            .iter()
            .find(|(_, a)| a.allocation_id == allocation_id)
            .map(|(_, a)| a.public_ip.clone())
            .ok_or_else(|| {
                ApiError::new(format!(
                    "InvalidAllocationID.NotFound: The allocation ID '{}' does not exist",
                    allocation_id
                ))
            })?;

        // EC2 moves the address off any previous holder
        for instance in state.instances.iter_mut() {
            if instance.id == instance_id {
                instance.public_ip = Some(public_ip.clone());
            } else if instance.public_ip.as_deref() == Some(public_ip.as_str()) {
                instance.public_ip = None;
            }
        }
        state
            .associations
            .push((allocation_id.to_string(), instance_id.to_string()));

        let association_id = self
            .association_id
            .clone()
            .unwrap_or_else(|| format!("eipassoc-{}", call));
        Ok(Association::new(association_id))
    }
}

impl Ec2Api for MockEc2 {
    fn describe_instances(
        &self,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Vec<InstanceRecord>>> {
        let instance_id = instance_id.to_string();
        Box::pin(async move { self.find_instances(&instance_id) })
    }

    fn describe_addresses(
        &self,
        filter: &AddressFilter,
    ) -> BoxFuture<'_, ApiResult<Vec<AddressAllocation>>> {
        let filter = filter.clone();
        Box::pin(async move { self.find_addresses(filter) })
    }

    fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Association>> {
        let allocation_id = allocation_id.to_string();
        let instance_id = instance_id.to_string();
        Box::pin(async move { self.associate(&allocation_id, &instance_id) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filters_by_domain_and_ip() {
        let mock = MockEc2::new()
            .with_address_in(
                AddressDomain::Standard,
                AddressAllocation::new("eipalloc-classic", "192.0.0.1"),
            )
            .with_address(AddressAllocation::new("eipalloc-vpc", "192.0.0.1"))
            .with_address(AddressAllocation::new("eipalloc-other", "192.0.0.2"));

        let found = mock
            .describe_addresses(&AddressFilter::vpc("192.0.0.1"))
            .await
            .unwrap();
        assert_eq!(found, vec![AddressAllocation::new("eipalloc-vpc", "192.0.0.1")]);
        assert_eq!(mock.describe_addresses_calls(), 1);
    }

    #[tokio::test]
    async fn test_association_moves_address() {
        let mock = MockEc2::new()
            .with_instance(InstanceRecord::new("i-old").with_public_ip("192.0.0.1"))
            .with_instance(InstanceRecord::new("i-new").with_public_ip("10.0.0.5"))
            .with_address(AddressAllocation::new("eipalloc-1", "192.0.0.1"));

        let association = mock.associate_address("eipalloc-1", "i-new").await.unwrap();
        assert_eq!(association.association_id, "eipassoc-1");
        assert_eq!(mock.public_ip("i-new").as_deref(), Some("192.0.0.1"));
        assert_eq!(mock.public_ip("i-old"), None);
    }

    #[tokio::test]
    async fn test_unknown_allocation() {
        let mock = MockEc2::new().with_instance(InstanceRecord::new("i-1"));
        let err = mock.associate_address("eipalloc-404", "i-1").await.unwrap_err();
        assert!(err.message.starts_with("InvalidAllocationID.NotFound"));
        assert!(mock.associations().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mock = MockEc2::new()
            .with_instance(InstanceRecord::new("i-1"))
            .failing(MockOperation::DescribeInstances, "RequestLimitExceeded");
        let err = mock.describe_instances("i-1").await.unwrap_err();
        assert_eq!(err.to_string(), "RequestLimitExceeded");
        assert_eq!(mock.describe_instances_calls(), 1);
    }
}
