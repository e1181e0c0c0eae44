//! Translation of services into `container` CLI argument vectors
//!
//! Nothing here executes a process. The translator is a pure function of the
//! service, the intent, and the host working directory it was built with.
//!
//! Flag spelling for `run`:
//!
//! | service field | flag |
//! |---|---|
//! | name | `--name <name>` |
//! | (always) | `--rm`, `--dns-domain test` |
//! | detached | `--detach` |
//! | platform | `--arch <arch>` |
//! | working_dir | `--workdir <dir>` |
//! | memory_limit | `--memory <limit>` |
//! | environment | `--env <KEY=VALUE>` per entry |
//! | volumes | `--volume <mount>` per entry |

use crate::compose::ServiceSpec;
use std::fmt;
use std::path::{Path, PathBuf};

/// DNS domain every container is placed in
pub const DNS_DOMAIN: &str = "test";

/// What to do with a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Launch a container
    Start {
        /// Run in the background
        detached: bool,
        /// Arguments appended after the command tokens
        extra_args: Vec<String>,
    },
    /// Stop the named container
    Stop,
    /// Query the named container
    Inspect,
}

impl Intent {
    /// Detached start with no extra arguments
    pub fn start_detached() -> Self {
        Intent::Start {
            detached: true,
            extra_args: Vec::new(),
        }
    }

    /// Attached start forwarding `extra_args`
    pub fn start_attached(extra_args: Vec<String>) -> Self {
        Intent::Start {
            detached: false,
            extra_args,
        }
    }
}

/// A declared field the runtime cannot express
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationWarning {
    /// `ports` was declared but no port flag exists
    PortsIgnored { service: String, ports: Vec<String> },
}

impl fmt::Display for TranslationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationWarning::PortsIgnored { service, ports } => write!(
                f,
                "Service {} declares ports [{}], which are not supported and were not applied",
                service,
                ports.join(", ")
            ),
        }
    }
}

/// A translated command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Arguments passed to the runtime binary
    pub args: Vec<String>,
    /// Declared fields that produced no arguments
    pub warnings: Vec<TranslationWarning>,
}

impl Invocation {
    fn new(args: Vec<String>) -> Self {
        Self {
            args,
            warnings: Vec::new(),
        }
    }

    /// Render as a command line for logging
    pub fn display(&self, program: &str) -> String {
        std::iter::once(program)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builds argument vectors for the runtime binary
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    /// Host directory relative volume paths are resolved against
    cwd: PathBuf,
}

impl CommandTranslator {
    /// Create a translator resolving relative mounts against `cwd`
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Host working directory
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Translate a service and intent into an invocation
    pub fn translate(&self, service: &ServiceSpec, intent: &Intent) -> Invocation {
        match intent {
            Intent::Start {
                detached,
                extra_args,
            } => self.start(service, *detached, extra_args),
            Intent::Stop => Invocation::new(vec!["stop".to_string(), service.name.clone()]),
            Intent::Inspect => Invocation::new(vec!["inspect".to_string(), service.name.clone()]),
        }
    }

    fn start(&self, service: &ServiceSpec, detached: bool, extra_args: &[String]) -> Invocation {
        let mut args: Vec<String> = vec![
            "run".into(),
            "--name".into(),
            service.name.clone(),
            "--rm".into(),
            "--dns-domain".into(),
            DNS_DOMAIN.into(),
        ];

        if detached {
            args.push("--detach".into());
        }

        if let Some(arch) = service.normalized_arch() {
            args.extend(["--arch".into(), arch.to_string()]);
        }

        if let Some(ref workdir) = service.working_dir {
            args.extend(["--workdir".into(), workdir.clone()]);
        }

        if let Some(ref memory) = service.memory_limit {
            args.extend(["--memory".into(), memory.clone()]);
        }

        for env in &service.environment {
            args.extend(["--env".into(), env.clone()]);
        }

        for volume in service.normalized_volumes(&self.cwd) {
            args.extend(["--volume".into(), volume]);
        }

        args.push(service.image.clone());
        args.extend(service.normalized_command());
        args.extend(extra_args.iter().cloned());

        let mut invocation = Invocation::new(args);
        if !service.ports.is_empty() {
            invocation.warnings.push(TranslationWarning::PortsIgnored {
                service: service.name.clone(),
                ports: service.ports.clone(),
            });
        }

        invocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::CommandSpec;

    fn translator() -> CommandTranslator {
        CommandTranslator::new("/work")
    }

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_minimal_start() {
        let service = ServiceSpec::new("web", "nginx");
        let invocation = translator().translate(&service, &Intent::start_detached());

        assert_eq!(
            invocation.args,
            args(&["run", "--name", "web", "--rm", "--dns-domain", "test", "--detach", "nginx"])
        );
        assert!(invocation.warnings.is_empty());
    }

    #[test]
    fn test_full_start_order() {
        let mut service = ServiceSpec::new("api", "node:20");
        service.platform = Some("linux/arm64".to_string());
        service.working_dir = Some("/app".to_string());
        service.memory_limit = Some("256m".to_string());
        service.environment = args(&["A=1", "B=2"]);
        service.volumes = args(&["./src:/app/src", "/tmp:/tmp"]);
        service.command = Some(CommandSpec::Shell("npm run dev".to_string()));

        let intent = Intent::start_attached(args(&["--inspect"]));
        let invocation = translator().translate(&service, &intent);

        assert_eq!(
            invocation.args,
            args(&[
                "run", "--name", "api", "--rm", "--dns-domain", "test",
                "--arch", "arm64",
                "--workdir", "/app",
                "--memory", "256m",
                "--env", "A=1",
                "--env", "B=2",
                "--volume", "/work/src:/app/src",
                "--volume", "/tmp:/tmp",
                "node:20",
                "npm", "run", "dev",
                "--inspect",
            ])
        );
    }

    #[test]
    fn test_memory_then_env_relative_order() {
        let mut service = ServiceSpec::new("api", "node");
        service.memory_limit = Some("256m".to_string());
        service.environment = args(&["A=1", "B=2"]);

        let joined = translator()
            .translate(&service, &Intent::start_detached())
            .args
            .join(" ");
        assert!(joined.contains("--memory 256m --env A=1 --env B=2"));
    }

    #[test]
    fn test_empty_platform_has_no_arch_flag() {
        let mut service = ServiceSpec::new("web", "nginx");
        service.platform = Some(String::new());

        let invocation = translator().translate(&service, &Intent::start_detached());
        assert!(!invocation.args.contains(&"--arch".to_string()));
    }

    #[test]
    fn test_env_without_equals_passed_through() {
        let mut service = ServiceSpec::new("web", "nginx");
        service.environment = args(&["HOME"]);

        let invocation = translator().translate(&service, &Intent::start_detached());
        assert!(invocation.args.windows(2).any(|w| w == ["--env", "HOME"]));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let mut service = ServiceSpec::new("web", "nginx");
        service.environment = args(&["A=1"]);
        service.volumes = args(&["./data:/data"]);
        let intent = Intent::start_detached();

        assert_eq!(
            translator().translate(&service, &intent),
            translator().translate(&service, &intent)
        );
    }

    #[test]
    fn test_ports_produce_warning_not_flags() {
        let mut service = ServiceSpec::new("web", "nginx");
        service.ports = args(&["8080:80"]);

        let invocation = translator().translate(&service, &Intent::start_detached());

        assert!(!invocation.args.iter().any(|a| a.contains("8080")));
        assert_eq!(
            invocation.warnings,
            vec![TranslationWarning::PortsIgnored {
                service: "web".to_string(),
                ports: args(&["8080:80"]),
            }]
        );
    }

    #[test]
    fn test_stop_and_inspect() {
        let mut service = ServiceSpec::new("web", "nginx");
        service.ports = args(&["80"]);

        let stop = translator().translate(&service, &Intent::Stop);
        assert_eq!(stop.args, args(&["stop", "web"]));
        assert!(stop.warnings.is_empty());

        let inspect = translator().translate(&service, &Intent::Inspect);
        assert_eq!(inspect.args, args(&["inspect", "web"]));
    }

    #[test]
    fn test_display() {
        let service = ServiceSpec::new("web", "nginx");
        let invocation = translator().translate(&service, &Intent::Stop);
        assert_eq!(invocation.display("container"), "container stop web");
    }
}
