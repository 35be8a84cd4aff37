// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Stack
//!
//! One isolated network, `10.10.0.0/16`, with a public and a
//! private-isolated subnet group in each of two zones and two traffic
//! groups: the database, and the clients allowed to reach it on 5432.

use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

use super::pascal_case;
use crate::composition::{ResourceRef, StackUnit, Token};
use crate::domain::{
    Ipv4Block, NetworkError, NetworkTopology, ResourceType, StackName, SubnetGroup, SubnetType,
    TrafficGroup, TrafficProtocol,
};
use crate::errors::StackResult;

pub const ADDRESS_RANGE: &str = "10.10.0.0/16";
pub const AVAILABILITY_ZONES: usize = 2;
pub const PUBLIC_SUBNETS: &str = "Public";
pub const PRIVATE_SUBNETS: &str = "Private";
pub const DATABASE_GROUP: &str = "database";
pub const CLIENT_GROUP: &str = "database-clients";
pub const POSTGRES_PORT: u16 = 5432;

/// Demo topology for `region`
pub fn demo_topology(region: &str) -> Result<NetworkTopology, NetworkError> {
    NetworkTopology::builder(Ipv4Block::new(ADDRESS_RANGE)?)
        .availability_zones(region, AVAILABILITY_ZONES)
        .subnet_group(SubnetGroup::new(PUBLIC_SUBNETS, SubnetType::Public, 24))
        .subnet_group(SubnetGroup::new(
            PRIVATE_SUBNETS,
            SubnetType::PrivateIsolated,
            24,
        ))
        .traffic_group(TrafficGroup::new(
            CLIENT_GROUP,
            "Compute allowed to connect to the database",
        ))
        .traffic_group(
            TrafficGroup::new(DATABASE_GROUP, "PostgreSQL instance")
                .allow_tcp_from(CLIENT_GROUP, POSTGRES_PORT),
        )
        .build()
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetProperties {
    vpc_id: Token,
    cidr_block: Ipv4Block,
    availability_zone: String,
    map_public_ip_on_launch: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IngressRule {
    ip_protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_port: Option<u16>,
    source_security_group_id: Token,
}

/// Network unit plus handles for its subnets and traffic groups
#[derive(Debug, Clone)]
pub struct NetworkStack {
    pub unit: StackUnit,
    topology: NetworkTopology,
    vpc: ResourceRef,
    subnets: BTreeMap<String, Vec<ResourceRef>>,
    traffic_groups: BTreeMap<String, ResourceRef>,
}

impl NetworkStack {
    pub fn new(name: StackName, topology: NetworkTopology) -> StackResult<Self> {
        let mut unit = StackUnit::new(name, "CDK Lab pgvector IGDB VPC Stack");

        let vpc = unit.add_resource(
            "VPC",
            ResourceType::Vpc,
            &json!({
                "CidrBlock": topology.address_range(),
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
            }),
        )?;
        let gateway = unit.add_resource(
            "InternetGateway",
            ResourceType::InternetGateway,
            &json!({ "VpcId": vpc.reference() }),
        )?;

        let mut subnets: BTreeMap<String, Vec<ResourceRef>> = BTreeMap::new();
        for group in topology.subnet_groups() {
            for (i, subnet) in topology.subnets_in_group(&group.name).enumerate() {
                let id = format!("{}Subnet{}", pascal_case(&group.name), i + 1);
                let subnet_ref = unit.add_resource(
                    &id,
                    ResourceType::Subnet,
                    &SubnetProperties {
                        vpc_id: vpc.reference(),
                        cidr_block: subnet.cidr,
                        availability_zone: subnet.availability_zone.clone(),
                        map_public_ip_on_launch: subnet.subnet_type.routes_to_internet(),
                    },
                )?;

                let routes = match subnet.default_route() {
                    Some(_) => json!([{
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "GatewayId": gateway.reference(),
                    }]),
                    None => json!([]),
                };
                unit.add_resource(
                    &format!("{id}RouteTable"),
                    ResourceType::RouteTable,
                    &json!({
                        "VpcId": vpc.reference(),
                        "SubnetId": subnet_ref.reference(),
                        "Routes": routes,
                    }),
                )?;
                subnets.entry(group.name.clone()).or_default().push(subnet_ref);
            }
        }

        // Sources first, so rules can reference them
        let mut traffic_groups = BTreeMap::new();
        let mut pending: Vec<&TrafficGroup> = topology.traffic_groups().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for group in pending {
                if group
                    .ingress
                    .iter()
                    .all(|rule| traffic_groups.contains_key(&rule.source))
                {
                    let sg = Self::declare_traffic_group(&mut unit, &vpc, group, &traffic_groups)?;
                    traffic_groups.insert(group.name.clone(), sg);
                } else {
                    deferred.push(group);
                }
            }
            if deferred.len() == before {
                let stuck = deferred
                    .first()
                    .map(|g| g.name.clone())
                    .unwrap_or_default();
                return Err(NetworkError::UnknownTrafficGroup(stuck).into());
            }
            pending = deferred;
        }

        unit.add_output("VPCId", vpc.reference())?;
        unit.add_output("VPCARN", vpc.attr("VpcArn"))?;

        debug!(
            subnets = topology.subnets().len(),
            traffic_groups = traffic_groups.len(),
            "network stack declared"
        );
        Ok(Self {
            unit,
            topology,
            vpc,
            subnets,
            traffic_groups,
        })
    }

    fn declare_traffic_group(
        unit: &mut StackUnit,
        vpc: &ResourceRef,
        group: &TrafficGroup,
        declared: &BTreeMap<String, ResourceRef>,
    ) -> StackResult<ResourceRef> {
        let ingress: Vec<IngressRule> = group
            .ingress
            .iter()
            .filter_map(|rule| {
                declared.get(&rule.source).map(|source| IngressRule {
                    ip_protocol: match rule.protocol {
                        TrafficProtocol::All => "-1".to_string(),
                        other => other.to_string(),
                    },
                    from_port: rule.port,
                    to_port: rule.port,
                    source_security_group_id: source.attr("GroupId"),
                })
            })
            .collect();
        let egress = if group.allow_all_outbound {
            json!([{ "IpProtocol": "-1", "CidrIp": "0.0.0.0/0" }])
        } else {
            json!([])
        };

        let id = format!("{}SecurityGroup", pascal_case(&group.name));
        Ok(unit.add_resource(
            &id,
            ResourceType::SecurityGroup,
            &json!({
                "GroupDescription": group.description,
                "VpcId": vpc.reference(),
                "SecurityGroupIngress": ingress,
                "SecurityGroupEgress": egress,
            }),
        )?)
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn vpc(&self) -> &ResourceRef {
        &self.vpc
    }

    /// Subnet id tokens of one subnet group, in zone order
    pub fn subnet_ids(&self, group: &str) -> Vec<Token> {
        self.subnets
            .get(group)
            .map(|refs| refs.iter().map(ResourceRef::reference).collect())
            .unwrap_or_default()
    }

    /// Security-group id token of a traffic group
    pub fn traffic_group_id(&self, group: &str) -> Option<Token> {
        self.traffic_groups.get(group).map(|sg| sg.attr("GroupId"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> NetworkStack {
        NetworkStack::new(
            StackName::new("lab-pgvector-igdb-vpc").unwrap(),
            demo_topology("us-east-1").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_demo_topology() {
        let t = demo_topology("us-east-1").unwrap();
        let cidrs: Vec<String> = t.subnets().iter().map(|s| s.cidr.to_string()).collect();
        assert_eq!(
            cidrs,
            vec!["10.10.0.0/24", "10.10.1.0/24", "10.10.2.0/24", "10.10.3.0/24"]
        );
        assert!(t.can_reach(CLIENT_GROUP, DATABASE_GROUP, TrafficProtocol::Tcp, 5432));
        assert!(!t.can_reach(CLIENT_GROUP, DATABASE_GROUP, TrafficProtocol::Tcp, 22));
        assert!(!t.can_reach(DATABASE_GROUP, CLIENT_GROUP, TrafficProtocol::Tcp, 5432));
    }

    #[test]
    fn test_resources_declared() {
        let stack = stack();
        assert_eq!(stack.unit.resources_of(ResourceType::Subnet).count(), 4);
        assert_eq!(stack.unit.resources_of(ResourceType::SecurityGroup).count(), 2);
        assert_eq!(stack.subnet_ids(PRIVATE_SUBNETS).len(), 2);
        assert!(stack.subnet_ids("Missing").is_empty());
        assert!(stack.traffic_group_id(DATABASE_GROUP).is_some());
        assert!(stack.unit.references().is_empty());
    }

    #[test]
    fn test_private_subnets_have_no_route_out() {
        let stack = stack();
        let private = stack.unit.resource("PrivateSubnet1RouteTable").unwrap();
        assert_eq!(private.properties()["Routes"], json!([]));
        let public = stack.unit.resource("PublicSubnet1RouteTable").unwrap();
        assert_eq!(public.properties()["Routes"][0]["DestinationCidrBlock"], "0.0.0.0/0");
    }

    #[test]
    fn test_database_ingress_from_clients_only() {
        let stack = stack();
        let sg = stack.unit.resource("DatabaseSecurityGroup").unwrap();
        let ingress = &sg.properties()["SecurityGroupIngress"];
        assert_eq!(ingress.as_array().unwrap().len(), 1);
        assert_eq!(ingress[0]["FromPort"], 5432);
        assert_eq!(
            ingress[0]["SourceSecurityGroupId"],
            "${Token[lab-pgvector-igdb-vpc/DatabaseClientsSecurityGroup.GroupId]}"
        );
        let clients = stack.unit.resource("DatabaseClientsSecurityGroup").unwrap();
        assert_eq!(clients.properties()["SecurityGroupIngress"], json!([]));
    }
}
