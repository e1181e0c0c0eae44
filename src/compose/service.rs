//! Normalized service model
//!
//! A [`ServiceSpec`] is built once per invocation from the decoded compose
//! file and is never mutated afterwards.

use super::config::{CommandConfig, ComposeConfig, ServiceConfig};
use crate::error::{QuayError, Result};
use std::path::Path;

/// OS prefix understood by the `--arch` flag
const LINUX_PLATFORM_PREFIX: &str = "linux/";

/// Command of a service.
///
/// Shell form is split on whitespace with no quoting support: an argument
/// containing spaces cannot be expressed in shell form and must use the exec
/// (list) form instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Single string, split on whitespace
    Shell(String),
    /// Explicit token list
    Exec(Vec<String>),
}

impl From<CommandConfig> for CommandSpec {
    fn from(config: CommandConfig) -> Self {
        match config {
            CommandConfig::Shell(s) => CommandSpec::Shell(s),
            CommandConfig::Exec(arr) => CommandSpec::Exec(arr),
        }
    }
}

/// One declared service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Service name (the compose mapping key)
    pub name: String,
    /// Image reference
    pub image: String,
    /// Platform in `os/arch` form
    pub platform: Option<String>,
    /// Working directory inside the container
    pub working_dir: Option<String>,
    /// `KEY=VALUE` entries in declaration order
    pub environment: Vec<String>,
    /// Command override
    pub command: Option<CommandSpec>,
    /// Mount specs in declaration order
    pub volumes: Vec<String>,
    /// Memory limit, e.g. `512m`
    pub memory_limit: Option<String>,
    /// Port mappings. Not supported by the runtime; see
    /// [`TranslationWarning::PortsIgnored`](crate::runtime::TranslationWarning).
    pub ports: Vec<String>,
}

impl ServiceSpec {
    /// Create a service with just a name and image
    pub fn new(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            ..Default::default()
        }
    }

    /// Build from a decoded compose service
    pub fn from_config(name: &str, config: ServiceConfig) -> Self {
        let memory_limit = config.memory_limit().map(str::to_string);

        Self {
            name: name.to_string(),
            image: config.image.unwrap_or_default(),
            platform: config.platform,
            working_dir: config.working_dir.filter(|w| !w.is_empty()),
            environment: config
                .environment
                .map(|e| e.to_entries())
                .unwrap_or_default(),
            command: config.command.map(CommandSpec::from),
            volumes: config.volumes.unwrap_or_default(),
            memory_limit,
            ports: config
                .ports
                .unwrap_or_default()
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Command tokens regardless of the declared form
    pub fn normalized_command(&self) -> Vec<String> {
        match &self.command {
            Some(CommandSpec::Shell(s)) => s.split_whitespace().map(str::to_string).collect(),
            Some(CommandSpec::Exec(arr)) => arr.clone(),
            None => Vec::new(),
        }
    }

    /// Mount specs with relative host paths resolved against `cwd`.
    ///
    /// One leading `./` is stripped from the host side, then a host side that
    /// is still relative is joined onto `cwd`. The container side and mode
    /// suffix are kept as written.
    pub fn normalized_volumes(&self, cwd: &Path) -> Vec<String> {
        self.volumes
            .iter()
            .map(|volume| normalize_volume(volume, cwd))
            .collect()
    }

    /// Architecture token for `--arch`, if a platform is declared
    pub fn normalized_arch(&self) -> Option<&str> {
        self.platform
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| p.strip_prefix(LINUX_PLATFORM_PREFIX).unwrap_or(p))
    }
}

fn normalize_volume(volume: &str, cwd: &Path) -> String {
    let (host, rest) = match volume.split_once(':') {
        Some((host, rest)) => (host, Some(rest)),
        None => (volume, None),
    };

    let host = host.strip_prefix("./").unwrap_or(host);
    let host = if Path::new(host).is_absolute() {
        host.to_string()
    } else {
        cwd.join(host).display().to_string()
    };

    match rest {
        Some(rest) => format!("{}:{}", host, rest),
        None => host,
    }
}

/// The ordered set of services declared by one compose file
#[derive(Debug, Clone, Default)]
pub struct ComposeProject {
    /// Project name, if declared
    pub name: Option<String>,
    services: Vec<ServiceSpec>,
}

impl ComposeProject {
    /// Build from a decoded compose file. Services are ordered by name.
    pub fn from_config(config: ComposeConfig) -> Self {
        Self {
            name: config.name,
            services: config
                .services
                .into_iter()
                .map(|(name, service)| ServiceSpec::from_config(&name, service))
                .collect(),
        }
    }

    /// Build from an explicit service list, sorting by name.
    ///
    /// Service names must be unique.
    pub fn from_services(mut services: Vec<ServiceSpec>) -> Result<Self> {
        services.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = services.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(QuayError::InvalidConfig(format!(
                "duplicate service name '{}'",
                pair[0].name
            )));
        }

        Ok(Self {
            name: None,
            services,
        })
    }

    /// All services, ordered by name
    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    /// Find a service by name
    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }
}
