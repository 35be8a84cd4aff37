// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Descriptor Invariants
//!
//! Business rules every resource descriptor must satisfy before it is
//! declared in a stack unit. All functions are pure (no I/O, no mutation)
//! and return a detailed [`ValidationError`].
//!
//! # Invariant Categories
//!
//! 1. **Naming**: reserved names and identifier rules
//! 2. **Placement**: which subnets and traffic groups a resource may use
//! 3. **Sizing**: service-imposed ranges (memory, concurrency, timeouts)

use crate::domain::{NetworkTopology, SubnetType};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Name collides with a name the engine reserves
    #[error("{kind} {name:?} is reserved")]
    ReservedName { kind: &'static str, name: String },

    /// Identifier does not follow the engine's rules
    #[error("Invalid {kind}: {reason}")]
    InvalidIdentifier { kind: &'static str, reason: String },

    /// Port outside the allowed range
    #[error("Port {port} outside {min}-{max}")]
    PortOutOfRange { port: u16, min: u16, max: u16 },

    /// Resource placed in a subnet group the topology does not have
    #[error("Unknown subnet group: {0}")]
    UnknownSubnetGroup(String),

    /// Resource placed in a subnet group of the wrong type
    #[error("Subnet group {group} must be {required:?}")]
    WrongSubnetType {
        group: String,
        required: SubnetType,
    },

    /// Resource joins a traffic group the topology does not have
    #[error("Unknown traffic group: {0}")]
    UnknownTrafficGroup(String),

    /// Value outside a service-imposed range
    #[error("{field} = {value} is outside {allowed}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        allowed: String,
    },

    /// Required setting is empty
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Database names the engine will not create
pub const RESERVED_DATABASE_NAMES: [&str; 4] = ["db", "template0", "template1", "rdsadmin"];

/// Master usernames the engine will not accept
pub const RESERVED_USERNAMES: [&str; 2] = ["rdsadmin", "rdsrepladmin"];

/// Validate a database name
///
/// # Rules
/// - 1-63 characters, starting with a letter
/// - Letters, digits and underscores only
/// - Not one of [`RESERVED_DATABASE_NAMES`]
pub fn validate_database_name(name: &str) -> ValidationResult {
    if RESERVED_DATABASE_NAMES.contains(&name) {
        return Err(ValidationError::ReservedName {
            kind: "database name",
            name: name.to_string(),
        });
    }
    validate_sql_identifier("database name", name)
}

/// Validate a master username
///
/// # Rules
/// - 1-63 characters, starting with a letter
/// - Letters, digits and underscores only
/// - Not one of [`RESERVED_USERNAMES`]
pub fn validate_master_username(username: &str) -> ValidationResult {
    if RESERVED_USERNAMES.contains(&username) {
        return Err(ValidationError::ReservedName {
            kind: "master username",
            name: username.to_string(),
        });
    }
    validate_sql_identifier("master username", username)
}

fn validate_sql_identifier(kind: &'static str, value: &str) -> ValidationResult {
    let invalid = |reason: &str| ValidationError::InvalidIdentifier {
        kind,
        reason: format!("{value:?} {reason}"),
    };
    if value.is_empty() || value.len() > 63 {
        return Err(invalid("must be 1-63 characters"));
    }
    if !value.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid("must start with a letter"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("may only contain letters, digits and underscores"));
    }
    Ok(())
}

/// Validate the database listener port (1150-65535)
pub fn validate_database_port(port: u16) -> ValidationResult {
    const MIN: u16 = 1150;
    const MAX: u16 = 65535;
    if port < MIN {
        return Err(ValidationError::PortOutOfRange {
            port,
            min: MIN,
            max: MAX,
        });
    }
    Ok(())
}

/// Validate that `group` exists and is of `required` type
pub fn validate_subnet_placement(
    topology: &NetworkTopology,
    group: &str,
    required: SubnetType,
) -> ValidationResult {
    let subnet_group = topology
        .subnet_group(group)
        .ok_or_else(|| ValidationError::UnknownSubnetGroup(group.to_string()))?;
    if subnet_group.subnet_type != required {
        return Err(ValidationError::WrongSubnetType {
            group: group.to_string(),
            required,
        });
    }
    Ok(())
}

/// Validate that every named traffic group exists
pub fn validate_traffic_groups<'a>(
    topology: &NetworkTopology,
    groups: impl IntoIterator<Item = &'a str>,
) -> ValidationResult {
    for group in groups {
        if topology.traffic_group(group).is_none() {
            return Err(ValidationError::UnknownTrafficGroup(group.to_string()));
        }
    }
    Ok(())
}

/// Validate a value lies in `min..=max`
pub fn validate_range(field: &'static str, value: u32, min: u32, max: u32) -> ValidationResult {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            allowed: format!("{min}..={max}"),
        });
    }
    Ok(())
}

/// Validate a value is one of `allowed`
pub fn validate_one_of(field: &'static str, value: u32, allowed: &[u32]) -> ValidationResult {
    if !allowed.contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            allowed: format!("{allowed:?}"),
        });
    }
    Ok(())
}

/// Validate a setting is non-empty
pub fn validate_non_empty(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ipv4Block, SubnetGroup, TrafficGroup};
    use test_case::test_case;

    fn topology() -> NetworkTopology {
        NetworkTopology::builder(Ipv4Block::new("10.10.0.0/16").unwrap())
            .availability_zones("us-east-1", 2)
            .subnet_group(SubnetGroup::new("Public", SubnetType::Public, 24))
            .subnet_group(SubnetGroup::new("Private", SubnetType::PrivateIsolated, 24))
            .traffic_group(TrafficGroup::new("database", "db"))
            .build()
            .unwrap()
    }

    #[test_case("postgres", true ; "default name")]
    #[test_case("igdb_demo", true ; "underscore")]
    #[test_case("db", false ; "reserved db")]
    #[test_case("template1", false ; "reserved template")]
    #[test_case("1games", false ; "leading digit")]
    #[test_case("games-db", false ; "hyphen")]
    fn test_database_names(name: &str, ok: bool) {
        assert_eq!(validate_database_name(name).is_ok(), ok);
    }

    #[test_case("admin", true ; "admin")]
    #[test_case("postgres", true ; "postgres")]
    #[test_case("rdsadmin", false ; "reserved")]
    #[test_case("", false ; "empty")]
    fn test_master_usernames(name: &str, ok: bool) {
        assert_eq!(validate_master_username(name).is_ok(), ok);
    }

    #[test]
    fn test_database_port() {
        assert!(validate_database_port(5432).is_ok());
        assert_eq!(
            validate_database_port(80),
            Err(ValidationError::PortOutOfRange {
                port: 80,
                min: 1150,
                max: 65535
            })
        );
    }

    #[test]
    fn test_subnet_placement() {
        let t = topology();
        assert!(validate_subnet_placement(&t, "Private", SubnetType::PrivateIsolated).is_ok());
        assert_eq!(
            validate_subnet_placement(&t, "Public", SubnetType::PrivateIsolated),
            Err(ValidationError::WrongSubnetType {
                group: "Public".to_string(),
                required: SubnetType::PrivateIsolated
            })
        );
        assert!(matches!(
            validate_subnet_placement(&t, "Nope", SubnetType::Public),
            Err(ValidationError::UnknownSubnetGroup(_))
        ));
    }

    #[test]
    fn test_traffic_groups() {
        let t = topology();
        assert!(validate_traffic_groups(&t, ["database"]).is_ok());
        assert!(validate_traffic_groups(&t, ["database", "other"]).is_err());
    }

    #[test]
    fn test_ranges() {
        assert!(validate_range("timeout", 60, 1, 900).is_ok());
        assert!(validate_range("timeout", 0, 1, 900).is_err());
        assert!(validate_one_of("memory", 2048, &[1024, 2048]).is_ok());
        assert!(validate_one_of("memory", 1500, &[1024, 2048]).is_err());
        assert!(validate_non_empty("image", "  ").is_err());
    }
}
