//! Address - Instances, elastic IP allocations and their associations

use std::fmt;

/// Read-only view of an EC2 instance as returned by `DescribeInstances`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    /// Instance ID (e.g., i-0123456789abcdef0)
    pub id: String,
    /// Public IPv4 address currently bound to the instance, if any
    pub public_ip: Option<String>,
}

impl InstanceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public_ip: None,
        }
    }

    pub fn with_public_ip(mut self, public_ip: impl Into<String>) -> Self {
        self.public_ip = Some(public_ip.into());
        self
    }

    /// Returns true if the instance already answers on `address`
    pub fn has_public_ip(&self, address: &str) -> bool {
        self.public_ip.as_deref() == Some(address)
    }
}

/// Read-only view of an elastic IP as returned by `DescribeAddresses`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressAllocation {
    /// Allocation ID (e.g., eipalloc-xxx)
    pub allocation_id: String,
    /// The public IP the allocation represents
    pub public_ip: String,
}

impl AddressAllocation {
    pub fn new(allocation_id: impl Into<String>, public_ip: impl Into<String>) -> Self {
        Self {
            allocation_id: allocation_id.into(),
            public_ip: public_ip.into(),
        }
    }
}

/// Network domain an elastic IP belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressDomain {
    /// Addresses allocated for use in a VPC
    #[default]
    Vpc,
    /// EC2-Classic addresses
    Standard,
}

impl AddressDomain {
    /// Value used for the EC2 `domain` filter
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressDomain::Vpc => "vpc",
            AddressDomain::Standard => "standard",
        }
    }
}

impl fmt::Display for AddressDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter passed to `DescribeAddresses`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFilter {
    pub domain: AddressDomain,
    pub public_ip: String,
}

impl AddressFilter {
    /// Match a VPC elastic IP by its public address
    pub fn vpc(public_ip: impl Into<String>) -> Self {
        Self {
            domain: AddressDomain::Vpc,
            public_ip: public_ip.into(),
        }
    }
}

/// Result of a successful `AssociateAddress` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Association ID (e.g., eipassoc-xxx)
    pub association_id: String,
}

impl Association {
    pub fn new(association_id: impl Into<String>) -> Self {
        Self {
            association_id: association_id.into(),
        }
    }
}

/// What the reconciler did for one request
///
/// `allocation_id` and `association_id` are set only when a new association
/// was created.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssociationOutcome {
    pub already_associated: bool,
    pub allocation_id: Option<String>,
    pub association_id: Option<String>,
}

impl AssociationOutcome {
    /// The instance already had the desired address; nothing was changed
    pub fn already_associated() -> Self {
        Self {
            already_associated: true,
            allocation_id: None,
            association_id: None,
        }
    }

    /// A new association was created
    pub fn associated(allocation_id: impl Into<String>, association_id: impl Into<String>) -> Self {
        Self {
            already_associated: false,
            allocation_id: Some(allocation_id.into()),
            association_id: Some(association_id.into()),
        }
    }
}
