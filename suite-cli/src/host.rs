//! In-memory host used by `suite run`.
//!
//! Implements every host collaborator trait over a [`Manifest`] and records
//! each call in a journal so a run can be inspected after the fact.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use suite_core::error::HostError;
use suite_core::event::{DeployDeployment, GenerateDeployment, UndeployDeployment};
use suite_core::host::{
    BoxFuture, ClassContext, ContainerRegistry, DeploymentGenerator, DeploymentOperations,
    HostBindings,
};
use suite_core::types::{ClassRef, Container, DeploymentScenario, TargetId};

use crate::manifest::Manifest;

/// One host call observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JournalEntry {
    Activate {
        class: String,
    },
    Deactivate {
        class: String,
    },
    Generate {
        class: String,
    },
    Deploy {
        deployment: String,
        container: String,
        /// Class context active when the operation ran.
        scope: Option<String>,
        ok: bool,
    },
    Undeploy {
        deployment: String,
        container: String,
        scope: Option<String>,
        ok: bool,
    },
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate { class } => write!(f, "activate   {class}"),
            Self::Deactivate { class } => write!(f, "deactivate {class}"),
            Self::Generate { class } => write!(f, "generate   {class}"),
            Self::Deploy {
                deployment,
                container,
                scope,
                ok,
            } => write_operation(f, "deploy", deployment, container, scope, *ok),
            Self::Undeploy {
                deployment,
                container,
                scope,
                ok,
            } => write_operation(f, "undeploy", deployment, container, scope, *ok),
        }
    }
}

fn write_operation(
    f: &mut fmt::Formatter<'_>,
    verb: &str,
    deployment: &str,
    container: &str,
    scope: &Option<String>,
    ok: bool,
) -> fmt::Result {
    write!(f, "{verb:<10} {deployment} -> {container}")?;
    match scope {
        Some(class) => write!(f, " [scope {class}]")?,
        None => write!(f, " [no scope]")?,
    }
    if !ok {
        write!(f, " FAILED")?;
    }
    Ok(())
}

/// Manifest-backed host.
pub struct SimulatedHost {
    manifest: Manifest,
    journal: Mutex<Vec<JournalEntry>>,
    active: Mutex<Option<ClassRef>>,
    failing_deploys: HashSet<String>,
    failing_undeploys: HashSet<String>,
    failing_generation: HashSet<String>,
}

impl SimulatedHost {
    pub fn new(manifest: Manifest) -> Arc<Self> {
        let failing_deploys = manifest.failures.deploy.iter().cloned().collect();
        let failing_undeploys = manifest.failures.undeploy.iter().cloned().collect();
        let failing_generation = manifest.failures.generate.iter().cloned().collect();
        Arc::new(Self {
            manifest,
            journal: Mutex::new(Vec::new()),
            active: Mutex::new(None),
            failing_deploys,
            failing_undeploys,
            failing_generation,
        })
    }

    /// Collaborator bundle handed to the suite deployer.
    pub fn bindings(self: &Arc<Self>) -> HostBindings {
        HostBindings::new(
            Arc::clone(self) as Arc<dyn ClassContext>,
            Arc::clone(self) as Arc<dyn ContainerRegistry>,
            Arc::clone(self) as Arc<dyn DeploymentGenerator>,
            Arc::clone(self) as Arc<dyn DeploymentOperations>,
        )
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Snapshot of every recorded call.
    pub fn journal(&self) -> Vec<JournalEntry> {
        lock(&self.journal).clone()
    }

    /// The host's own behaviour when no suite deployer is installed:
    /// deploy the class's managed deployments inside its own scope.
    pub async fn native_deploy(&self, class: &ClassRef) -> Result<(), HostError> {
        let scenario = self.class_scenario(class)?;
        self.activate(class)?;
        let mut outcome = Ok(());
        for deployment in scenario.managed_deployments_in_deploy_order() {
            let container = match self.container(deployment.target()) {
                Ok(container) => container,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            };
            let event = DeployDeployment::with_trace(container, deployment.clone(), class.name());
            if let Err(e) = self.deploy(event).await {
                outcome = Err(e);
                break;
            }
        }
        let released = self.deactivate();
        outcome.and(released)
    }

    /// Per-class undeploy counterpart of [`Self::native_deploy`].
    pub async fn native_undeploy(&self, class: &ClassRef) -> Result<(), HostError> {
        let scenario = self.class_scenario(class)?;
        self.activate(class)?;
        let mut outcome = Ok(());
        let mut managed = scenario.managed_deployments_in_deploy_order();
        managed.reverse();
        for deployment in managed {
            let container = match self.container(deployment.target()) {
                Ok(container) => container,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            };
            let event =
                UndeployDeployment::with_trace(container, deployment.clone(), class.name());
            if let Err(e) = self.undeploy(event).await {
                outcome = Err(e);
                break;
            }
        }
        let released = self.deactivate();
        outcome.and(released)
    }

    fn class_scenario(&self, class: &ClassRef) -> Result<DeploymentScenario, HostError> {
        match self.manifest.class(class) {
            Some(spec) => spec
                .scenario()
                .map_err(|e| HostError::GenerationFailed(e.to_string())),
            None => Ok(DeploymentScenario::new()),
        }
    }

    fn record(&self, entry: JournalEntry) {
        debug!(entry = %entry, "host call");
        lock(&self.journal).push(entry);
    }

    fn scope(&self) -> Option<String> {
        lock(&self.active).as_ref().map(|c| c.name().to_owned())
    }
}

/// Recovers the guard from a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ClassContext for SimulatedHost {
    fn activate(&self, class: &ClassRef) -> Result<(), HostError> {
        self.record(JournalEntry::Activate {
            class: class.name().to_owned(),
        });
        *lock(&self.active) = Some(class.clone());
        Ok(())
    }

    fn deactivate(&self) -> Result<(), HostError> {
        let previous = lock(&self.active).take();
        match previous {
            Some(class) => {
                self.record(JournalEntry::Deactivate {
                    class: class.name().to_owned(),
                });
                Ok(())
            }
            None => Err(HostError::Context("no class context is active".to_owned())),
        }
    }

    fn is_active(&self) -> bool {
        lock(&self.active).is_some()
    }

    fn active_class(&self) -> Option<ClassRef> {
        lock(&self.active).clone()
    }
}

impl ContainerRegistry for SimulatedHost {
    fn container(&self, target: &TargetId) -> Result<Container, HostError> {
        let spec = if target.is_default() {
            self.manifest.default_container()
        } else {
            self.manifest
                .containers
                .iter()
                .find(|c| c.name == target.as_str())
        };
        spec.map(|c| Container {
            name: c.name.clone(),
            properties: c.properties.clone(),
        })
        .ok_or_else(|| HostError::ContainerNotFound {
            target: target.to_string(),
        })
    }
}

impl DeploymentGenerator for SimulatedHost {
    fn generate(
        &self,
        request: GenerateDeployment,
    ) -> BoxFuture<'_, Result<DeploymentScenario, HostError>> {
        Box::pin(async move {
            self.record(JournalEntry::Generate {
                class: request.class.name().to_owned(),
            });
            if self.failing_generation.contains(request.class.name()) {
                return Err(HostError::GenerationFailed(format!(
                    "deployment method of {} failed",
                    request.class
                )));
            }
            self.class_scenario(&request.class)
        })
    }
}

impl DeploymentOperations for SimulatedHost {
    fn deploy(&self, event: DeployDeployment) -> BoxFuture<'_, Result<(), HostError>> {
        Box::pin(async move {
            let deployment = event.deployment.name().to_owned();
            let ok = !self.failing_deploys.contains(&deployment);
            self.record(JournalEntry::Deploy {
                deployment: deployment.clone(),
                container: event.container.name.clone(),
                scope: self.scope(),
                ok,
            });
            if ok {
                Ok(())
            } else {
                Err(HostError::OperationFailed {
                    operation: "deploy".to_owned(),
                    deployment,
                    reason: format!("container {} rejected the archive", event.container),
                })
            }
        })
    }

    fn undeploy(&self, event: UndeployDeployment) -> BoxFuture<'_, Result<(), HostError>> {
        Box::pin(async move {
            let deployment = event.deployment.name().to_owned();
            let ok = !self.failing_undeploys.contains(&deployment);
            self.record(JournalEntry::Undeploy {
                deployment: deployment.clone(),
                container: event.container.name.clone(),
                scope: self.scope(),
                ok,
            });
            if ok {
                Ok(())
            } else {
                Err(HostError::OperationFailed {
                    operation: "undeploy".to_owned(),
                    deployment,
                    reason: format!("container {} did not respond", event.container),
                })
            }
        })
    }
}
