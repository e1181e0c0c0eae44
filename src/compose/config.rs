//! Docker Compose configuration types
//!
//! Only the subset of the compose schema that the `container` CLI can express
//! is modelled here. Unknown keys are ignored on decode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Docker Compose file configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Compose file version
    #[serde(default)]
    pub version: Option<String>,
    /// Project name
    #[serde(default)]
    pub name: Option<String>,
    /// Services, keyed (and therefore ordered) by name
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Image name
    #[serde(default)]
    pub image: Option<String>,
    /// Platform in `os/arch` form
    #[serde(default)]
    pub platform: Option<String>,
    /// Working directory
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Environment variables
    #[serde(default)]
    pub environment: Option<EnvironmentConfig>,
    /// Command to run
    #[serde(default)]
    pub command: Option<CommandConfig>,
    /// Volume mounts in short syntax
    #[serde(default)]
    pub volumes: Option<Vec<String>>,
    /// Port mappings
    #[serde(default)]
    pub ports: Option<Vec<PortConfig>>,
    /// Deploy configuration
    #[serde(default)]
    pub deploy: Option<DeployConfig>,
    /// Legacy memory limit (compose v2)
    #[serde(default)]
    pub mem_limit: Option<String>,
}

impl ServiceConfig {
    /// Memory limit, preferring `deploy.resources.limits.memory` over `mem_limit`
    pub fn memory_limit(&self) -> Option<&str> {
        self.deploy
            .as_ref()
            .and_then(|d| d.resources.as_ref())
            .and_then(|r| r.limits.as_ref())
            .and_then(|l| l.memory.as_deref())
            .or(self.mem_limit.as_deref())
            .filter(|m| !m.is_empty())
    }
}

/// Command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandConfig {
    /// Shell command string
    Shell(String),
    /// Exec form array
    Exec(Vec<String>),
}

/// Environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentConfig {
    /// Array of KEY=value strings
    Array(Vec<String>),
    /// Map of key to scalar value, in declaration order
    Map(serde_yaml::Mapping),
}

impl EnvironmentConfig {
    /// Flatten into `KEY=value` entries in declaration order.
    ///
    /// Map entries with a null value become a bare `KEY`.
    pub fn to_entries(&self) -> Vec<String> {
        match self {
            EnvironmentConfig::Array(arr) => arr.clone(),
            EnvironmentConfig::Map(map) => map
                .iter()
                .filter_map(|(key, value)| {
                    let key = scalar_to_string(key)?;
                    Some(match scalar_to_string(value) {
                        Some(v) => format!("{}={}", key, v),
                        None => key,
                    })
                })
                .collect(),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        other => serde_yaml::to_string(other)
            .ok()
            .map(|s| s.trim_end().to_string()),
    }
}

/// Port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortConfig {
    /// Short syntax: "8080:80"
    Short(String),
    /// Bare container port: 80
    Number(u16),
    /// Long syntax
    Long(PortConfigLong),
}

impl std::fmt::Display for PortConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortConfig::Short(s) => write!(f, "{}", s),
            PortConfig::Number(n) => write!(f, "{}", n),
            PortConfig::Long(long) => match &long.published {
                Some(published) => write!(f, "{}:{}", published, long.target),
                None => write!(f, "{}", long.target),
            },
        }
    }
}

/// Long port configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortConfigLong {
    /// Target port in container
    pub target: u16,
    /// Published port on host
    pub published: Option<String>,
    /// Protocol (tcp/udp)
    pub protocol: Option<String>,
}

/// Deploy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Resource limits and reservations
    pub resources: Option<ResourcesConfig>,
}

/// Resources configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Resource limits
    pub limits: Option<ResourceSpec>,
    /// Resource reservations
    pub reservations: Option<ResourceSpec>,
}

/// Resource specification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// CPU limit/reservation
    pub cpus: Option<String>,
    /// Memory limit/reservation
    pub memory: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_map_flattens_in_declared_order() {
        let yaml = r#"
B: 2
A: one
DEBUG: true
EMPTY:
"#;
        let env: EnvironmentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(env.to_entries(), vec!["B=2", "A=one", "DEBUG=true", "EMPTY"]);
    }

    #[test]
    fn test_service_environment_map_keeps_order() {
        let service: ServiceConfig =
            serde_yaml::from_str("image: x\nenvironment:\n  ZED: 1\n  ALPHA: 2\n").unwrap();
        assert_eq!(
            service.environment.unwrap().to_entries(),
            vec!["ZED=1", "ALPHA=2"]
        );
    }

    #[test]
    fn test_environment_array_kept_verbatim() {
        let env: EnvironmentConfig = serde_yaml::from_str("[\"A=1\", \"NOEQ\"]").unwrap();
        assert_eq!(env.to_entries(), vec!["A=1", "NOEQ"]);
    }

    #[test]
    fn test_memory_limit_prefers_deploy() {
        let yaml = r#"
image: nginx
mem_limit: 1g
deploy:
  resources:
    limits:
      memory: 512m
"#;
        let service: ServiceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(service.memory_limit(), Some("512m"));

        let legacy: ServiceConfig = serde_yaml::from_str("image: nginx\nmem_limit: 1g\n").unwrap();
        assert_eq!(legacy.memory_limit(), Some("1g"));
    }

    #[test]
    fn test_port_forms_display() {
        let yaml = r#"
- "8080:80"
- 443
- target: 53
  published: "5353"
  protocol: udp
"#;
        let ports: Vec<PortConfig> = serde_yaml::from_str(yaml).unwrap();
        let rendered: Vec<String> = ports.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["8080:80", "443", "5353:53"]);
    }
}
