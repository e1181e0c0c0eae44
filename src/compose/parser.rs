//! Docker Compose file parser

use super::config::{CommandConfig, ComposeConfig, EnvironmentConfig, PortConfig};
use super::service::ComposeProject;
use crate::error::{QuayError, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Default compose file name
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Compose file names searched for in a directory, in order
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yaml",
    "compose.yml",
];

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Find compose file in directory
    pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
        DEFAULT_COMPOSE_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Parse compose file from path
    pub fn parse_file(path: &Path) -> Result<ComposeConfig> {
        if !path.exists() {
            return Err(QuayError::ComposeNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QuayError::ComposeParse(format!("Failed to read file: {}", e)))?;

        Self::parse_str(&content)
    }

    /// Parse compose file from string
    pub fn parse_str(content: &str) -> Result<ComposeConfig> {
        if content.trim().is_empty() {
            return Ok(ComposeConfig::default());
        }

        serde_yaml::from_str(content)
            .map_err(|e| QuayError::ComposeParse(format!("Failed to parse YAML: {}", e)))
    }

    /// Read, interpolate and validate a compose file, producing the ordered
    /// service set.
    pub fn load_project(path: &Path, env: &HashMap<String, String>) -> Result<ComposeProject> {
        let mut config = Self::parse_file(path)?;
        Self::interpolate(&mut config, env);

        for warning in Self::validate(&config)? {
            tracing::warn!("{}", warning);
        }

        tracing::debug!(
            "Loaded {} services from {}",
            config.services.len(),
            path.display()
        );

        Ok(ComposeProject::from_config(config))
    }

    /// Validate compose configuration
    pub fn validate(config: &ComposeConfig) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if config.services.is_empty() {
            warnings.push("No services declared".to_string());
        }

        for (name, service) in &config.services {
            if name.trim().is_empty() {
                return Err(QuayError::InvalidConfig(
                    "Service names must not be empty".to_string(),
                ));
            }

            if service.image.as_deref().map_or(true, |i| i.trim().is_empty()) {
                return Err(QuayError::InvalidConfig(format!(
                    "Service '{}' must have an 'image' specified",
                    name
                )));
            }

            if let Some(platform) = service.platform.as_deref().filter(|p| !p.is_empty()) {
                if !platform_pattern().is_match(platform) {
                    warnings.push(format!(
                        "Service '{}' platform '{}' is not in os/arch form (passed through verbatim)",
                        name, platform
                    ));
                }
            }
        }

        Ok(warnings)
    }

    /// Interpolate environment variables in config
    pub fn interpolate(config: &mut ComposeConfig, env: &HashMap<String, String>) {
        for service in config.services.values_mut() {
            for field in [
                &mut service.image,
                &mut service.platform,
                &mut service.working_dir,
                &mut service.mem_limit,
            ]
            .into_iter()
            .flatten()
            {
                *field = interpolate_string(field, env);
            }

            if let Some(ref mut volumes) = service.volumes {
                for volume in volumes.iter_mut() {
                    *volume = interpolate_string(volume, env);
                }
            }

            match service.command {
                Some(CommandConfig::Shell(ref mut s)) => *s = interpolate_string(s, env),
                Some(CommandConfig::Exec(ref mut arr)) => {
                    for item in arr.iter_mut() {
                        *item = interpolate_string(item, env);
                    }
                }
                None => {}
            }

            match service.environment {
                Some(EnvironmentConfig::Array(ref mut arr)) => {
                    for item in arr.iter_mut() {
                        *item = interpolate_string(item, env);
                    }
                }
                Some(EnvironmentConfig::Map(ref mut map)) => {
                    for (_, value) in map.iter_mut() {
                        if let serde_yaml::Value::String(s) = value {
                            *s = interpolate_string(s, env);
                        }
                    }
                }
                None => {}
            }

            if let Some(ref mut ports) = service.ports {
                for port in ports.iter_mut() {
                    match port {
                        PortConfig::Short(s) => *s = interpolate_string(s, env),
                        PortConfig::Long(long) => {
                            if let Some(ref mut published) = long.published {
                                *published = interpolate_string(published, env);
                            }
                        }
                        PortConfig::Number(_) => {}
                    }
                }
            }

            if let Some(resources) = service.deploy.as_mut().and_then(|d| d.resources.as_mut()) {
                for spec in [&mut resources.limits, &mut resources.reservations]
                    .into_iter()
                    .flatten()
                {
                    for field in [&mut spec.memory, &mut spec.cpus].into_iter().flatten() {
                        *field = interpolate_string(field, env);
                    }
                }
            }
        }
    }
}

fn platform_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^/\s]+/[^/\s]+(/[^/\s]+)?$").expect("valid platform pattern")
    })
}

fn interpolation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\$(?:(\$)|\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?-)([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))",
        )
        .expect("valid interpolation pattern")
    })
}

/// Interpolate `$VAR`, `${VAR}`, `${VAR:-default}` and `${VAR-default}`.
///
/// `$$` yields a literal `$`. Unset variables without a default expand to an
/// empty string.
fn interpolate_string(s: &str, env: &HashMap<String, String>) -> String {
    interpolation_pattern()
        .replace_all(s, |caps: &Captures| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }

            let var = caps
                .get(2)
                .or_else(|| caps.get(5))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let value = env.get(var);

            match (caps.get(3).map(|m| m.as_str()), caps.get(4)) {
                (Some(":-"), Some(default)) => match value {
                    Some(v) if !v.is_empty() => v.clone(),
                    _ => default.as_str().to_string(),
                },
                (Some(_), Some(default)) => value
                    .cloned()
                    .unwrap_or_else(|| default.as_str().to_string()),
                _ => value.cloned().unwrap_or_else(|| {
                    tracing::warn!("Variable {} is not set, defaulting to a blank string", var);
                    String::new()
                }),
            }
        })
        .into_owned()
}
