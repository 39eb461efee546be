//! Handler - One invocation, from event to result
//!
//! Decodes the event, runs the reconciler against the configured elastic IP
//! and shapes the outcome. Errors are logged and returned unchanged; turning
//! them into a failure signal is up to the caller.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::Ec2Api;
use crate::config::Config;
use crate::error::ReconcileError;
use crate::event::{CloudWatchEvent, ReconcileRequest};
use crate::reconciler::Reconciler;
use crate::response::ReconcileResult;

pub struct Handler<A> {
    reconciler: Reconciler<A>,
    elastic_ip: String,
}

impl<A: Ec2Api> Handler<A> {
    pub fn new(api: A, config: &Config) -> Self {
        Self {
            reconciler: Reconciler::new(api).with_region(config.region.clone()),
            elastic_ip: config.elastic_ip.clone(),
        }
    }

    pub fn reconciler(&self) -> &Reconciler<A> {
        &self.reconciler
    }

    pub fn elastic_ip(&self) -> &str {
        &self.elastic_ip
    }

    /// Handle an EventBridge event
    pub async fn handle(
        &self,
        event: &CloudWatchEvent,
        cancel: &CancellationToken,
    ) -> Result<ReconcileResult, ReconcileError> {
        info!(
            event_id = %event.id,
            detail_type = %event.detail_type,
            source = %event.source,
            "received event"
        );
        let request = event.request().inspect_err(|e| {
            error!(event_id = %event.id, error = %e, "failed to decode event detail");
        })?;
        self.handle_request(&request, cancel).await
    }

    /// Handle a bare event detail payload
    pub async fn handle_detail(
        &self,
        detail: &str,
        cancel: &CancellationToken,
    ) -> Result<ReconcileResult, ReconcileError> {
        let request = ReconcileRequest::from_detail(detail).inspect_err(|e| {
            error!(error = %e, "failed to decode event detail");
        })?;
        self.handle_request(&request, cancel).await
    }

    pub async fn handle_request(
        &self,
        request: &ReconcileRequest,
        cancel: &CancellationToken,
    ) -> Result<ReconcileResult, ReconcileError> {
        let outcome = self
            .reconciler
            .associate_with_cancel(&self.elastic_ip, &request.instance_id, cancel)
            .await
            .inspect_err(|e| {
                error!(
                    instance_id = %request.instance_id,
                    elastic_ip = %self.elastic_ip,
                    retryable = e.is_retryable(),
                    error = %e.report(),
                    "reconcile failed"
                );
            })?;

        let result =
            ReconcileResult::from_outcome(&request.instance_id, &self.elastic_ip, &outcome);
        info!(instance_id = %request.instance_id, "{}", result.message.trim_end());
        Ok(result)
    }
}
