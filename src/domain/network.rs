// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Topology Value Objects with Validation Invariants
//!
//! An isolated network is an IPv4 address range carved into subnet groups
//! (public or private-isolated, one subnet per availability zone) plus a set
//! of named traffic groups. A topology is assembled once through
//! [`NetworkTopologyBuilder`] and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0}")]
    InvalidPrefixLength(u8),

    #[error("Address has host bits set for its prefix: {0}")]
    HostBitsSet(String),

    #[error("Address range {range} cannot fit another /{prefix} subnet")]
    AddressSpaceExhausted { range: String, prefix: u8 },

    #[error("Availability zone count must be between 1 and 6, got {0}")]
    InvalidAzCount(usize),

    #[error("Network needs at least one subnet group")]
    NoSubnetGroups,

    #[error("Duplicate subnet group: {0}")]
    DuplicateSubnetGroup(String),

    #[error("Duplicate traffic group: {0}")]
    DuplicateTrafficGroup(String),

    #[error("Traffic rule references unknown group: {0}")]
    UnknownTrafficGroup(String),

    #[error("Traffic group {0} cannot admit traffic from itself")]
    SelfReferencingRule(String),

    #[error("Rule for {protocol} in group {group} needs a non-zero port")]
    InvalidPort { group: String, protocol: TrafficProtocol },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - No host bits set below the prefix
///
/// # Examples
///
/// ```rust
/// use igdb_stacks::domain::Ipv4Block;
///
/// let range = Ipv4Block::new("10.10.0.0/16").unwrap();
/// let first = range.subnet(24, 0).unwrap();
/// assert_eq!(first.to_string(), "10.10.0.0/24");
/// assert!(range.contains(&first));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Block {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl Ipv4Block {
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }
        if u32::from(address) & !Self::mask(prefix_length) != 0 {
            return Err(NetworkError::HostBitsSet(format!(
                "{address}/{prefix_length}"
            )));
        }
        Ok(Self {
            address,
            prefix_length,
        })
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &Ipv4Block) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.address) & Self::mask(self.prefix_length) == u32::from(self.address)
    }

    pub fn overlaps(&self, other: &Ipv4Block) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// The `index`-th sub-block of length `prefix_length`
    pub fn subnet(&self, prefix_length: u8, index: u32) -> Result<Self, NetworkError> {
        if prefix_length < self.prefix_length || prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }
        let count = 1u64 << (prefix_length - self.prefix_length);
        if u64::from(index) >= count {
            return Err(NetworkError::AddressSpaceExhausted {
                range: self.to_string(),
                prefix: prefix_length,
            });
        }
        let step = 1u64 << (32 - u32::from(prefix_length));
        let offset = u64::from(index) * step;
        let address = Ipv4Addr::from((u64::from(u32::from(self.address)) + offset) as u32);
        Self::from_parts(address, prefix_length)
    }
}

impl fmt::Display for Ipv4Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for Ipv4Block {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Block {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Block> for String {
    fn from(block: Ipv4Block) -> Self {
        block.to_string()
    }
}

/// Subnet reachability class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    /// Routed to an internet gateway
    Public,
    /// No route leaves the network
    PrivateIsolated,
}

impl SubnetType {
    pub fn routes_to_internet(&self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Subnet group replicated once per availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetGroup {
    pub name: String,
    pub subnet_type: SubnetType,
    pub cidr_mask: u8,
}

impl SubnetGroup {
    pub fn new(name: impl Into<String>, subnet_type: SubnetType, cidr_mask: u8) -> Self {
        Self {
            name: name.into(),
            subnet_type,
            cidr_mask,
        }
    }
}

/// Default route of a subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultRoute {
    InternetGateway,
}

/// One concrete subnet in one availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub group: String,
    pub subnet_type: SubnetType,
    pub availability_zone: String,
    pub cidr: Ipv4Block,
}

impl Subnet {
    /// Private-isolated subnets never get a default route
    pub fn default_route(&self) -> Option<DefaultRoute> {
        self.subnet_type
            .routes_to_internet()
            .then_some(DefaultRoute::InternetGateway)
    }
}

/// Transport protocol of an allow-rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficProtocol {
    Tcp,
    Udp,
    All,
}

impl fmt::Display for TrafficProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
            Self::All => f.write_str("all"),
        }
    }
}

/// Allow-rule: traffic from another named group on a protocol/port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficRule {
    pub source: String,
    pub protocol: TrafficProtocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Named firewall boundary
///
/// Ingress is only ever admitted from another named group of the same
/// topology; a group without rules admits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficGroup {
    pub name: String,
    pub description: String,
    pub allow_all_outbound: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ingress: Vec<TrafficRule>,
}

impl TrafficGroup {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            allow_all_outbound: true,
            ingress: Vec::new(),
        }
    }

    pub fn with_outbound(mut self, allow_all_outbound: bool) -> Self {
        self.allow_all_outbound = allow_all_outbound;
        self
    }

    pub fn allow_tcp_from(self, source: impl Into<String>, port: u16) -> Self {
        self.allow_from(source, TrafficProtocol::Tcp, Some(port))
    }

    pub fn allow_from(
        mut self,
        source: impl Into<String>,
        protocol: TrafficProtocol,
        port: Option<u16>,
    ) -> Self {
        self.ingress.push(TrafficRule {
            source: source.into(),
            protocol,
            port,
        });
        self
    }

    /// Whether a member of `source` may open a `protocol` connection on `port`
    pub fn permits(&self, source: &str, protocol: TrafficProtocol, port: u16) -> bool {
        self.ingress.iter().any(|rule| {
            rule.source == source
                && (rule.protocol == TrafficProtocol::All
                    || (rule.protocol == protocol && rule.port == Some(port)))
        })
    }
}

/// Isolated network: address range, per-AZ subnets and traffic groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkTopology {
    address_range: Ipv4Block,
    availability_zones: Vec<String>,
    subnet_groups: Vec<SubnetGroup>,
    subnets: Vec<Subnet>,
    traffic_groups: BTreeMap<String, TrafficGroup>,
}

impl NetworkTopology {
    pub fn builder(address_range: Ipv4Block) -> NetworkTopologyBuilder {
        NetworkTopologyBuilder::new(address_range)
    }

    pub fn address_range(&self) -> Ipv4Block {
        self.address_range
    }

    pub fn availability_zones(&self) -> &[String] {
        &self.availability_zones
    }

    pub fn subnet_groups(&self) -> &[SubnetGroup] {
        &self.subnet_groups
    }

    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn subnets_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Subnet> + 'a {
        self.subnets.iter().filter(move |s| s.group == group)
    }

    pub fn subnets_of_type(&self, subnet_type: SubnetType) -> impl Iterator<Item = &Subnet> + '_ {
        self.subnets
            .iter()
            .filter(move |s| s.subnet_type == subnet_type)
    }

    pub fn subnet_group(&self, name: &str) -> Option<&SubnetGroup> {
        self.subnet_groups.iter().find(|g| g.name == name)
    }

    pub fn traffic_group(&self, name: &str) -> Option<&TrafficGroup> {
        self.traffic_groups.get(name)
    }

    pub fn traffic_groups(&self) -> impl Iterator<Item = &TrafficGroup> {
        self.traffic_groups.values()
    }

    /// Whether a member of group `from` can reach a member of group `to`
    pub fn can_reach(&self, from: &str, to: &str, protocol: TrafficProtocol, port: u16) -> bool {
        self.traffic_groups
            .get(to)
            .is_some_and(|group| group.permits(from, protocol, port))
    }
}

/// Builder that allocates subnets and validates traffic groups
#[derive(Debug, Clone)]
pub struct NetworkTopologyBuilder {
    address_range: Ipv4Block,
    availability_zones: Vec<String>,
    subnet_groups: Vec<SubnetGroup>,
    traffic_groups: Vec<TrafficGroup>,
}

impl NetworkTopologyBuilder {
    pub const MAX_AZS: usize = 6;

    fn new(address_range: Ipv4Block) -> Self {
        Self {
            address_range,
            availability_zones: Vec::new(),
            subnet_groups: Vec::new(),
            traffic_groups: Vec::new(),
        }
    }

    /// Use the first `count` zones of `region` (`{region}a`, `{region}b`, ...)
    pub fn availability_zones(mut self, region: &str, count: usize) -> Self {
        self.availability_zones = (b'a'..=b'z')
            .take(count)
            .map(|suffix| format!("{region}{}", suffix as char))
            .collect();
        self
    }

    pub fn subnet_group(mut self, group: SubnetGroup) -> Self {
        self.subnet_groups.push(group);
        self
    }

    pub fn traffic_group(mut self, group: TrafficGroup) -> Self {
        self.traffic_groups.push(group);
        self
    }

    pub fn build(self) -> Result<NetworkTopology, NetworkError> {
        let az_count = self.availability_zones.len();
        if az_count == 0 || az_count > Self::MAX_AZS {
            return Err(NetworkError::InvalidAzCount(az_count));
        }
        if self.subnet_groups.is_empty() {
            return Err(NetworkError::NoSubnetGroups);
        }

        for (i, group) in self.subnet_groups.iter().enumerate() {
            if self.subnet_groups[..i].iter().any(|g| g.name == group.name) {
                return Err(NetworkError::DuplicateSubnetGroup(group.name.clone()));
            }
        }

        let subnets = self.allocate_subnets()?;

        let mut traffic_groups = BTreeMap::new();
        for group in &self.traffic_groups {
            if traffic_groups
                .insert(group.name.clone(), group.clone())
                .is_some()
            {
                return Err(NetworkError::DuplicateTrafficGroup(group.name.clone()));
            }
        }
        for group in traffic_groups.values() {
            for rule in &group.ingress {
                if rule.source == group.name {
                    return Err(NetworkError::SelfReferencingRule(group.name.clone()));
                }
                if !traffic_groups.contains_key(&rule.source) {
                    return Err(NetworkError::UnknownTrafficGroup(rule.source.clone()));
                }
                if rule.protocol != TrafficProtocol::All && matches!(rule.port, None | Some(0)) {
                    return Err(NetworkError::InvalidPort {
                        group: group.name.clone(),
                        protocol: rule.protocol,
                    });
                }
            }
        }

        Ok(NetworkTopology {
            address_range: self.address_range,
            availability_zones: self.availability_zones,
            subnet_groups: self.subnet_groups,
            subnets,
            traffic_groups,
        })
    }

    /// Allocate group by group, zone by zone, each block aligned to its own size
    fn allocate_subnets(&self) -> Result<Vec<Subnet>, NetworkError> {
        let range = self.address_range;
        let mut cursor: u64 = 0;
        let mut subnets = Vec::new();

        for group in &self.subnet_groups {
            if group.cidr_mask < range.prefix_length() || group.cidr_mask > 32 {
                return Err(NetworkError::InvalidPrefixLength(group.cidr_mask));
            }
            let block_size = 1u64 << (32 - u32::from(group.cidr_mask));
            for zone in &self.availability_zones {
                cursor = cursor.div_ceil(block_size) * block_size;
                let index = u32::try_from(cursor / block_size).map_err(|_| {
                    NetworkError::AddressSpaceExhausted {
                        range: range.to_string(),
                        prefix: group.cidr_mask,
                    }
                })?;
                let cidr = range.subnet(group.cidr_mask, index)?;
                cursor += block_size;
                subnets.push(Subnet {
                    group: group.name.clone(),
                    subnet_type: group.subnet_type,
                    availability_zone: zone.clone(),
                    cidr,
                });
            }
        }

        Ok(subnets)
    }
}
