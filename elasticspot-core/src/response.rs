//! Caller-facing result of an invocation

use serde::{Deserialize, Serialize};

use crate::address::AssociationOutcome;

/// Message returned when the instance already has the elastic IP
pub const ALREADY_ASSOCIATED_MESSAGE: &str = "elastic ip already associated with instance id";

/// Serialized as `{ "instanceID", "elasticIP", "message" }`, empty fields omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    #[serde(
        rename = "instanceID",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub instance_id: String,
    #[serde(rename = "elasticIP", default, skip_serializing_if = "String::is_empty")]
    pub elastic_ip: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ReconcileResult {
    pub fn from_outcome(instance_id: &str, elastic_ip: &str, outcome: &AssociationOutcome) -> Self {
        let message = if outcome.already_associated {
            ALREADY_ASSOCIATED_MESSAGE.to_string()
        } else {
            associated_message(
                elastic_ip,
                instance_id,
                outcome.allocation_id.as_deref().unwrap_or_default(),
                outcome.association_id.as_deref().unwrap_or_default(),
            )
        };

        Self {
            instance_id: instance_id.to_string(),
            elastic_ip: elastic_ip.to_string(),
            message,
        }
    }
}

/// Message returned after a new association
pub fn associated_message(
    elastic_ip: &str,
    instance_id: &str,
    allocation_id: &str,
    association_id: &str,
) -> String {
    format!(
        "Successfully allocated {} with instance {}.\n\tallocation id: {}, association id: {}\n",
        elastic_ip, instance_id, allocation_id, association_id
    )
}
