//! Reconciler - Converge an elastic IP onto an instance
//!
//! The sequence is: look up the instance, stop if it already has the
//! address, look up the elastic IP allocation, associate. Only the last step
//! mutates anything, and a repeated run after a success stops at the second
//! step, so the whole sequence is safe to retry.
//!
//! When a lookup matches more than one instance or address, the first one
//! returned by the API wins.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::address::{AddressAllocation, AddressFilter, AssociationOutcome, InstanceRecord};
use crate::api::Ec2Api;
use crate::error::ReconcileError;

const DESCRIBE_INSTANCES: &str = "DescribeInstances";
const DESCRIBE_ADDRESSES: &str = "DescribeAddresses";
const ASSOCIATE_ADDRESS: &str = "AssociateAddress";

pub struct Reconciler<A> {
    api: A,
    region: Option<String>,
}

impl<A: Ec2Api> Reconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api, region: None }
    }

    /// Region reported when the elastic IP cannot be found
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Make `desired` the public address of `instance_id`
    pub async fn associate(
        &self,
        desired: &str,
        instance_id: &str,
    ) -> Result<AssociationOutcome, ReconcileError> {
        self.associate_with_cancel(desired, instance_id, &CancellationToken::new())
            .await
    }

    /// Like [`Reconciler::associate`], but gives up before the next API call
    /// once `cancel` fires
    pub async fn associate_with_cancel(
        &self,
        desired: &str,
        instance_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AssociationOutcome, ReconcileError> {
        ensure_live(cancel, DESCRIBE_INSTANCES)?;
        let instance = self.find_instance(instance_id).await?;

        if instance.has_public_ip(desired) {
            info!(
                instance_id,
                elastic_ip = desired,
                "elastic ip already associated"
            );
            return Ok(AssociationOutcome::already_associated());
        }

        debug!(
            instance_id,
            current_ip = instance.public_ip.as_deref().unwrap_or("none"),
            elastic_ip = desired,
            "instance does not have the elastic ip"
        );

        ensure_live(cancel, DESCRIBE_ADDRESSES)?;
        let address = self.find_address(desired).await?;

        ensure_live(cancel, ASSOCIATE_ADDRESS)?;
        let association = self
            .api
            .associate_address(&address.allocation_id, instance_id)
            .await
            .map_err(|e| {
                warn!(instance_id, error = %e, "unable to associate elastic ip");
                ReconcileError::association_failed(instance_id, e)
            })?;

        info!(
            instance_id,
            elastic_ip = desired,
            allocation_id = %address.allocation_id,
            association_id = %association.association_id,
            "associated elastic ip"
        );

        Ok(AssociationOutcome::associated(
            address.allocation_id,
            association.association_id,
        ))
    }

    async fn find_instance(&self, instance_id: &str) -> Result<InstanceRecord, ReconcileError> {
        let instances = self
            .api
            .describe_instances(instance_id)
            .await
            .map_err(|source| ReconcileError::DescribeFailed {
                operation: DESCRIBE_INSTANCES,
                source,
            })?;

        if instances.len() > 1 {
            debug!(
                instance_id,
                matches = instances.len(),
                "multiple instances matched, using the first"
            );
        }

        instances.into_iter().next().ok_or_else(|| {
            warn!(instance_id, "no instance found");
            ReconcileError::instance_not_found(instance_id)
        })
    }

    async fn find_address(&self, desired: &str) -> Result<AddressAllocation, ReconcileError> {
        let addresses = self
            .api
            .describe_addresses(&AddressFilter::vpc(desired))
            .await
            .map_err(|source| ReconcileError::DescribeFailed {
                operation: DESCRIBE_ADDRESSES,
                source,
            })?;

        if addresses.len() > 1 {
            debug!(
                elastic_ip = desired,
                matches = addresses.len(),
                "multiple addresses matched, using the first"
            );
        }

        addresses.into_iter().next().ok_or_else(|| {
            warn!(
                elastic_ip = desired,
                region = self.region.as_deref().unwrap_or("unknown"),
                "no elastic ip found"
            );
            ReconcileError::address_not_found(desired, self.region.as_deref())
        })
    }
}

fn ensure_live(cancel: &CancellationToken, operation: &'static str) -> Result<(), ReconcileError> {
    if cancel.is_cancelled() {
        return Err(ReconcileError::Cancelled { operation });
    }
    Ok(())
}
