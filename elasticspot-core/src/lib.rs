//! Elasticspot Core
//!
//! Keeps a fixed elastic IP associated with the instance named by an
//! instance lifecycle event. The EC2 API is reached through the [`api::Ec2Api`]
//! trait so the reconciliation logic can run against any implementation.

pub mod address;
pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
#[cfg(test)]
mod mock;
pub mod reconciler;
pub mod response;

pub use address::{
    AddressAllocation, AddressDomain, AddressFilter, Association, AssociationOutcome,
    InstanceRecord,
};
pub use api::{ApiError, ApiResult, BoxFuture, Ec2Api};
pub use config::{Config, ConfigError};
pub use error::ReconcileError;
pub use event::{CloudWatchEvent, DecodeError, ReconcileRequest};
pub use handler::Handler;
pub use reconciler::Reconciler;
pub use response::ReconcileResult;
