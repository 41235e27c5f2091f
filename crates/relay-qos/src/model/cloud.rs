//! Clouds, relays and access classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a cloud, compared case-insensitively on both parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudId {
    pub operator: String,
    pub name: String,
}

impl CloudId {
    pub fn new(operator: impl Into<String>, name: impl Into<String>) -> Self {
        Self { operator: operator.into(), name: name.into() }
    }

    /// Case-insensitive match against a raw operator/name pair
    pub fn matches(&self, operator: &str, name: &str) -> bool {
        self.operator.eq_ignore_ascii_case(operator) && self.name.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for CloudId {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.operator, &other.name)
    }
}

impl Eq for CloudId {}

impl Hash for CloudId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.operator.to_ascii_lowercase().hash(state);
        self.name.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for CloudId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.operator)
    }
}

/// Kind of link between a relay and a cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayType {
    GatekeeperRelay,
    GatewayRelay,
}

/// A relay node as reported by the gatekeeper
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relay {
    pub address: String,
    pub port: u16,
    pub secure: bool,
    pub exclusive: bool,
    #[serde(rename = "type")]
    pub relay_type: RelayType,
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// A known cloud together with its relay links
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloud {
    pub operator: String,
    pub name: String,
    pub secure: bool,
    pub neighbor: bool,
    pub own_cloud: bool,
    #[serde(default)]
    pub gatekeeper_relays: Vec<Relay>,
    #[serde(default)]
    pub gateway_relays: Vec<Relay>,
}

impl Cloud {
    pub fn id(&self) -> CloudId {
        CloudId::new(&self.operator, &self.name)
    }

    /// Request form of this cloud, without its relay links
    pub fn descriptor(&self) -> CloudDescriptor {
        CloudDescriptor {
            operator: self.operator.clone(),
            name: self.name.clone(),
            secure: self.secure,
            neighbor: self.neighbor,
        }
    }

    /// Relays eligible for relay echo tests
    pub fn echo_relays(&self) -> impl Iterator<Item = &Relay> {
        self.gatekeeper_relays.iter().filter(|relay| relay.relay_type == RelayType::GatekeeperRelay)
    }
}

/// Cloud as it is sent to other systems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDescriptor {
    pub operator: String,
    pub name: String,
    pub secure: bool,
    pub neighbor: bool,
}

impl CloudDescriptor {
    pub fn id(&self) -> CloudId {
        CloudId::new(&self.operator, &self.name)
    }
}

/// Whether a cloud can be reached without relaying
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccess {
    pub cloud_operator: String,
    pub cloud_name: String,
    pub direct_access: bool,
}
