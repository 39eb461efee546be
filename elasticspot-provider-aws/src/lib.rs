//! Elasticspot AWS Provider
//!
//! `Ec2Api` implementation backed by the AWS SDK for Rust

use aws_config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{Address, Filter, Reservation};
use elasticspot_core::address::{AddressAllocation, AddressFilter, Association, InstanceRecord};
use elasticspot_core::api::{ApiError, ApiResult, BoxFuture, Ec2Api};
use tracing::debug;

/// EC2 client wrapper
pub struct AwsEc2 {
    ec2_client: Ec2Client,
    region: Option<String>,
}

impl AwsEc2 {
    /// Create a client from the default credential and region chain
    ///
    /// `region` overrides whatever the chain would pick.
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        Self {
            region: config.region().map(|r| r.to_string()),
            ec2_client: Ec2Client::new(&config),
        }
    }

    /// Create with a specific client (for testing)
    pub fn with_client(ec2_client: Ec2Client, region: Option<String>) -> Self {
        Self { ec2_client, region }
    }

    /// Region the client talks to, if one was resolved
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    async fn find_instances(&self, instance_id: &str) -> ApiResult<Vec<InstanceRecord>> {
        let filter = Filter::builder()
            .name("instance-id")
            .values(instance_id)
            .build();

        let result = self
            .ec2_client
            .describe_instances()
            .filters(filter)
            .send()
            .await
            .map_err(|e| {
                ApiError::new(format!("Failed to describe instances: {}", DisplayErrorContext(&e)))
            })?;

        let instances = instances_from_reservations(result.reservations());
        debug!(instance_id, matches = instances.len(), "described instances");
        Ok(instances)
    }

    async fn find_addresses(&self, filter: &AddressFilter) -> ApiResult<Vec<AddressAllocation>> {
        let domain = Filter::builder()
            .name("domain")
            .values(filter.domain.as_str())
            .build();

        let result = self
            .ec2_client
            .describe_addresses()
            .filters(domain)
            .public_ips(&filter.public_ip)
            .send()
            .await
            .map_err(|e| {
                ApiError::new(format!("Failed to describe addresses: {}", DisplayErrorContext(&e)))
            })?;

        let addresses = allocations_from_addresses(result.addresses());
        debug!(
            public_ip = %filter.public_ip,
            domain = %filter.domain,
            matches = addresses.len(),
            "described addresses"
        );
        Ok(addresses)
    }

    async fn associate(&self, allocation_id: &str, instance_id: &str) -> ApiResult<Association> {
        let result = self
            .ec2_client
            .associate_address()
            .allocation_id(allocation_id)
            .instance_id(instance_id)
            .send()
            .await
            .map_err(|e| {
                ApiError::new(format!("Failed to associate address: {}", DisplayErrorContext(&e)))
            })?;

        let association_id = result
            .association_id()
            .ok_or_else(|| ApiError::new("Address associated but no association ID returned"))?;

        Ok(Association::new(association_id))
    }
}

impl Ec2Api for AwsEc2 {
    fn describe_instances(
        &self,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Vec<InstanceRecord>>> {
        let instance_id = instance_id.to_string();
        Box::pin(async move { self.find_instances(&instance_id).await })
    }

    fn describe_addresses(
        &self,
        filter: &AddressFilter,
    ) -> BoxFuture<'_, ApiResult<Vec<AddressAllocation>>> {
        let filter = filter.clone();
        Box::pin(async move { self.find_addresses(&filter).await })
    }

    fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
    ) -> BoxFuture<'_, ApiResult<Association>> {
        let allocation_id = allocation_id.to_string();
        let instance_id = instance_id.to_string();
        Box::pin(async move { self.associate(&allocation_id, &instance_id).await })
    }
}

/// Flatten reservations into instance records, keeping API order
///
/// Instances without an ID are skipped.
fn instances_from_reservations(reservations: &[Reservation]) -> Vec<InstanceRecord> {
    reservations
        .iter()
        .flat_map(|r| r.instances())
        .filter_map(|instance| {
            let id = instance.instance_id()?;
            let mut record = InstanceRecord::new(id);
            record.public_ip = instance.public_ip_address().map(String::from);
            Some(record)
        })
        .collect()
}

/// Convert addresses into allocations, keeping API order
///
/// Addresses without an allocation ID (EC2-Classic) cannot be associated by
/// allocation and are skipped.
fn allocations_from_addresses(addresses: &[Address]) -> Vec<AddressAllocation> {
    addresses
        .iter()
        .filter_map(|address| {
            let allocation_id = address.allocation_id()?;
            let public_ip = address.public_ip().unwrap_or_default();
            Some(AddressAllocation::new(allocation_id, public_ip))
        })
        .collect()
}
