//! Event - Decoding inbound lifecycle events into reconcile requests
//!
//! Events arrive as EventBridge (CloudWatch Events) envelopes. The `detail`
//! payload of an ECS container instance state change carries many fields; only
//! `ec2InstanceId` is read.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

/// Field of the event detail naming the instance
pub const INSTANCE_ID_FIELD: &str = "ec2InstanceId";

/// Errors raised while decoding an event
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON or has the wrong shape
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),

    /// Required field is absent, null or empty
    #[error("missing or empty required field {0}")]
    MissingField(&'static str),
}

/// EventBridge envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CloudWatchEvent {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub detail_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub resources: Vec<String>,
    /// Kept undecoded until a request is extracted
    pub detail: Box<RawValue>,
}

impl CloudWatchEvent {
    /// Decode an envelope from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Extract the reconcile request from the detail payload
    pub fn request(&self) -> Result<ReconcileRequest, DecodeError> {
        ReconcileRequest::from_detail(self.detail.get())
    }
}

/// The one thing an invocation needs from its event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub instance_id: String,
}

#[derive(Deserialize)]
struct InstanceDetail {
    #[serde(rename = "ec2InstanceId", default)]
    ec2_instance_id: Option<String>,
}

impl ReconcileRequest {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }

    /// Decode the detail JSON, ignoring every field but `ec2InstanceId`
    pub fn from_detail(detail: &str) -> Result<Self, DecodeError> {
        let detail: InstanceDetail = serde_json::from_str(detail)?;
        match detail.ec2_instance_id {
            Some(id) if !id.is_empty() => Ok(Self::new(id)),
            _ => Err(DecodeError::MissingField(INSTANCE_ID_FIELD)),
        }
    }
}
