//! Docker Compose orchestrator
//!
//! Drives `start`, `status`, `stop` and `run` across the services of a
//! project, one service at a time in name order.

use super::service::{ComposeProject, ServiceSpec};
use crate::error::{QuayError, Result};
use crate::runtime::{
    parse_inspect_output, CommandTranslator, ContainerRuntime, InspectData, Intent, Invocation,
};
use std::fmt;
use std::path::PathBuf;

/// Result of one service within a batch
#[derive(Debug)]
pub enum ServiceOutcome {
    /// Container launched
    Started,
    /// Container was already running; nothing launched
    AlreadyRunning,
    /// Container stopped
    Stopped,
    /// Status reported by the runtime
    Status(String),
    /// Runtime knows no container of that name
    NotFound,
    /// Operation failed for this service
    Failed(QuayError),
}

impl ServiceOutcome {
    /// Whether this outcome counts against the batch
    pub fn is_failure(&self) -> bool {
        matches!(self, ServiceOutcome::Failed(_))
    }
}

impl fmt::Display for ServiceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceOutcome::Started => write!(f, "started"),
            ServiceOutcome::AlreadyRunning => write!(f, "already running"),
            ServiceOutcome::Stopped => write!(f, "stopped"),
            ServiceOutcome::Status(status) => write!(f, "{}", status),
            ServiceOutcome::NotFound => write!(f, "not found"),
            ServiceOutcome::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Per-service results of one batch operation, in processing order
#[derive(Debug, Default)]
pub struct BatchOutcome {
    results: Vec<(String, ServiceOutcome)>,
}

impl BatchOutcome {
    fn record(&mut self, service: &str, outcome: ServiceOutcome) {
        self.results.push((service.to_string(), outcome));
    }

    /// All results
    pub fn results(&self) -> &[(String, ServiceOutcome)] {
        &self.results
    }

    /// Outcome for one service
    pub fn get(&self, service: &str) -> Option<&ServiceOutcome> {
        self.results
            .iter()
            .find(|(name, _)| name == service)
            .map(|(_, outcome)| outcome)
    }

    /// Failed services and their errors
    pub fn failures(&self) -> impl Iterator<Item = (&str, &QuayError)> {
        self.results.iter().filter_map(|(name, outcome)| match outcome {
            ServiceOutcome::Failed(e) => Some((name.as_str(), e)),
            _ => None,
        })
    }

    /// Whether any service failed
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|(_, outcome)| outcome.is_failure())
    }

    /// `Err(BatchFailed)` if any service failed
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failures().count();
        if failed > 0 {
            return Err(QuayError::BatchFailed {
                failed,
                total: self.results.len(),
            });
        }
        Ok(self)
    }
}

/// Compose orchestrator
pub struct ComposeOrchestrator<R> {
    /// Declared services
    project: ComposeProject,
    /// Runtime binary
    runtime: R,
    /// Argument vector builder
    translator: CommandTranslator,
}

impl<R: ContainerRuntime> ComposeOrchestrator<R> {
    /// Create a new orchestrator.
    ///
    /// Relative volume paths resolve against `working_dir`, which is not
    /// necessarily the process working directory: the CLI passes the
    /// directory holding the compose file.
    pub fn new(project: ComposeProject, runtime: R, working_dir: PathBuf) -> Self {
        Self {
            project,
            runtime,
            translator: CommandTranslator::new(working_dir),
        }
    }

    /// Declared services
    pub fn project(&self) -> &ComposeProject {
        &self.project
    }

    /// Start every service that is not already running.
    ///
    /// A failed launch is recorded and the remaining services are still
    /// attempted.
    pub async fn start(&self) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for service in self.project.services() {
            match self.inspect(service).await {
                Ok(Some(data)) if data.is_running() => {
                    tracing::info!("Service {} is already running", service.name);
                    outcome.record(&service.name, ServiceOutcome::AlreadyRunning);
                    continue;
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("{}; assuming not running", e),
            }

            tracing::info!("Starting service {}", service.name);
            let result = match self.launch_detached(service).await {
                Ok(()) => ServiceOutcome::Started,
                Err(e) => ServiceOutcome::Failed(e),
            };

            if let ServiceOutcome::Failed(ref e) = result {
                tracing::error!("{}", e);
            }
            outcome.record(&service.name, result);
        }

        outcome
    }

    /// Query every service once and report what the runtime says
    pub async fn status(&self) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for service in self.project.services() {
            let result = match self.inspect(service).await {
                Ok(Some(data)) => ServiceOutcome::Status(data.status),
                Ok(None) => ServiceOutcome::NotFound,
                Err(e) => ServiceOutcome::Failed(e),
            };

            tracing::info!("Service {}: {}", service.name, result);
            outcome.record(&service.name, result);
        }

        outcome
    }

    /// Stop every service, aborting on the first failure
    pub async fn stop(&self) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        for service in self.project.services() {
            tracing::info!("Stopping service {}", service.name);

            let invocation = self.translator.translate(service, &Intent::Stop);
            let output = self
                .runtime
                .capture(&invocation.args)
                .await
                .map_err(|e| QuayError::Stop {
                    service: service.name.clone(),
                    reason: e.to_string(),
                })?;

            if !output.success() {
                return Err(QuayError::Stop {
                    service: service.name.clone(),
                    reason: exit_reason(output.code),
                });
            }

            outcome.record(&service.name, ServiceOutcome::Stopped);
        }

        Ok(outcome)
    }

    /// Run one service attached to our terminal, forwarding `extra_args`.
    ///
    /// Returns the exit code of the runtime process.
    pub async fn run(&self, name: &str, extra_args: Vec<String>) -> Result<i32> {
        let service = self
            .project
            .get(name)
            .ok_or_else(|| QuayError::ServiceNotFound(name.to_string()))?;

        tracing::info!("Running service {}", service.name);
        let invocation = self
            .translator
            .translate(service, &Intent::start_attached(extra_args));
        self.log_invocation(&invocation);

        let code = self
            .runtime
            .execute(&invocation.args)
            .await
            .map_err(|e| launch_error(service, e.to_string()))?;

        match code {
            Some(code) => {
                tracing::info!("Service {} exited with status {}", service.name, code);
                Ok(code)
            }
            None => Err(launch_exit_error(service, None)),
        }
    }

    /// Inspect one service. `Ok(None)` means the runtime has no such container.
    pub async fn inspect(&self, service: &ServiceSpec) -> Result<Option<InspectData>> {
        let inspection_error = |reason: String| QuayError::Inspection {
            service: service.name.clone(),
            reason,
        };

        let invocation = self.translator.translate(service, &Intent::Inspect);
        let output = self
            .runtime
            .capture(&invocation.args)
            .await
            .map_err(|e| inspection_error(e.to_string()))?;

        if !output.success() {
            return Err(inspection_error(exit_reason(output.code)));
        }

        parse_inspect_output(&output.stdout).map_err(|e| inspection_error(e.to_string()))
    }

    /// Launch in the background. Output is captured, not passed through.
    async fn launch_detached(&self, service: &ServiceSpec) -> Result<()> {
        let invocation = self.translator.translate(service, &Intent::start_detached());
        self.log_invocation(&invocation);

        let output = self
            .runtime
            .capture(&invocation.args)
            .await
            .map_err(|e| launch_error(service, e.to_string()))?;

        if !output.success() {
            return Err(launch_exit_error(service, output.code));
        }

        let id = String::from_utf8_lossy(&output.stdout);
        let id = id.trim();
        if !id.is_empty() {
            tracing::info!("Service {} started: {}", service.name, id);
        }

        Ok(())
    }

    fn log_invocation(&self, invocation: &Invocation) {
        for warning in &invocation.warnings {
            tracing::warn!("{}", warning);
        }
        tracing::info!("{}", invocation.display(self.runtime.program()));
    }
}

fn exit_reason(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn launch_error(service: &ServiceSpec, reason: String) -> QuayError {
    QuayError::Launch {
        service: service.name.clone(),
        reason,
    }
}

fn launch_exit_error(service: &ServiceSpec, code: Option<i32>) -> QuayError {
    launch_error(service, exit_reason(code))
}
