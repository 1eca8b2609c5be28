//! `suite run` command handler
//!
//! Drives one simulated suite against [`SimulatedHost`]: registration,
//! `EnvironmentStarted`, per-class generate/deploy/undeploy events, then
//! `EnvironmentStopping`. If the suite environment fails to come up no test
//! class runs; the run goes straight to teardown, which undeploys whatever did
//! deploy.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use suite_core::config::SuiteConfig;
use suite_core::error::LifecycleOperationError;
use suite_core::event::{
    Decision, DeployManagedDeployments, EnvironmentStarted, EnvironmentStopping,
    GenerateDeployment, MODULE_HOST, UndeployManagedDeployments,
};
use suite_core::host::ContainerRegistry;
use suite_core::types::{ClassRef, DeploymentScenario, SuitePhase};
use suite_deployer::{
    DiagnosticsSnapshot, Registration, SequencerState, SuiteDeployer, SuiteExtension,
};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::host::{JournalEntry, SimulatedHost};
use crate::manifest::Manifest;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// # Errors
///
/// Returns `CliError::DuplicateMarker` if registration fails and `CliError::Lifecycle`
/// with the first lifecycle failure once the report has been rendered.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = load_config(config_path).await?;
    if args.debug {
        config.diagnostics.debug = true;
    }

    info!(
        manifest = %args.manifest.display(),
        debug = config.diagnostics.debug,
        "starting simulated suite run"
    );
    let manifest = Manifest::load(&args.manifest).await?;
    let mut report = simulate(manifest, &config).await?;
    writer.render(&report)?;

    match report.take_failure() {
        Some(failure) => Err(CliError::Lifecycle(failure)),
        None => Ok(()),
    }
}

/// A missing config file means defaults; any other load error is reported.
async fn load_config(config_path: &Path) -> Result<SuiteConfig, CliError> {
    if tokio::fs::try_exists(config_path).await.unwrap_or(false) {
        return Ok(SuiteConfig::load(config_path).await?);
    }
    info!(path = %config_path.display(), "config file not found, using defaults");
    let mut config = SuiteConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Run one suite against a simulated host built from `manifest`.
///
/// # Errors
///
/// Only registration failures (duplicate markers) are returned as errors.
pub async fn simulate(manifest: Manifest, config: &SuiteConfig) -> Result<RunReport, CliError> {
    let classes = manifest.class_refs();
    let catalog = manifest.candidates();
    let host = SimulatedHost::new(manifest);

    let registration = SuiteExtension::register(&catalog, config, host.bindings())?;
    let mut run = match &registration {
        Registration::Enabled(deployer) => suite_run(deployer, &host, &classes).await,
        Registration::Disabled => per_class_run(&host, &classes).await,
    };
    run.journal = host.journal();
    Ok(run)
}

async fn suite_run(
    deployer: &SuiteDeployer,
    host: &Arc<SimulatedHost>,
    classes: &[ClassRef],
) -> RunReport {
    let mut run = RunReport::new(RunMode::Suite);
    run.marker = Some(deployer.marker_class().name().to_owned());

    let started = EnvironmentStarted::new();
    if let Err(e) = deployer.on_environment_started(&started).await {
        run.fail(e);
        run.aborted = true;
        warn!(
            skipped = classes.len(),
            "suite environment failed to start, skipping test classes"
        );
    }

    let provider = deployer.scenario_provider();
    let runnable: &[ClassRef] = if run.aborted { &[] } else { classes };
    for class in runnable {
        let generate = GenerateDeployment::new(MODULE_HOST, class.clone());
        let generate = deployer.on_generate_deployment(&generate);
        let deploy = deployer.on_deploy_managed(&DeployManagedDeployments::new(class.clone()));
        if deploy.is_forward() {
            if let Err(e) = host.native_deploy(class).await {
                run.fail(LifecycleOperationError::new(SuitePhase::Deploy, e));
            }
        }
        let undeploy =
            deployer.on_undeploy_managed(&UndeployManagedDeployments::new(class.clone()));
        if undeploy.is_forward() {
            if let Err(e) = host.native_undeploy(class).await {
                run.fail(LifecycleOperationError::new(SuitePhase::Undeploy, e));
            }
        }

        run.classes.push(ClassReport {
            class: class.name().to_owned(),
            generate,
            deploy,
            undeploy,
            visible_deployments: provider.scenario_for(class).map(|s| s.len()),
        });
    }

    let stopping = EnvironmentStopping::new();
    if let Err(e) = deployer.undeploy(&stopping).await {
        run.fail(e);
    }

    run.state = Some(deployer.state().await);
    run.diagnostics = Some(deployer.diagnostics());
    if let Some(scenario) = deployer.scenario() {
        run.scenario = scenario
            .managed_deployments_in_deploy_order()
            .iter()
            .map(|d| d.name().to_owned())
            .collect();
        run.containers = target_containers(host, &scenario);
    }
    run
}

/// Containers the scenario's targets resolve to, sorted and deduplicated.
/// Unresolvable targets are left out; they already failed the deploy phase.
fn target_containers(host: &SimulatedHost, scenario: &DeploymentScenario) -> Vec<String> {
    let mut names: Vec<String> = scenario
        .targets()
        .into_iter()
        .filter_map(|target| host.container(target).ok())
        .map(|container| container.name)
        .collect();
    names.sort();
    names.dedup();
    names
}

async fn per_class_run(host: &Arc<SimulatedHost>, classes: &[ClassRef]) -> RunReport {
    let mut run = RunReport::new(RunMode::PerClass);
    for class in classes {
        if let Err(e) = host.native_deploy(class).await {
            run.fail(LifecycleOperationError::new(SuitePhase::Deploy, e));
        }
        if let Err(e) = host.native_undeploy(class).await {
            run.fail(LifecycleOperationError::new(SuitePhase::Undeploy, e));
        }
        run.classes.push(ClassReport {
            class: class.name().to_owned(),
            generate: Decision::Forward,
            deploy: Decision::Forward,
            undeploy: Decision::Forward,
            visible_deployments: None,
        });
    }
    run
}

// ─── Report ──────────────────────────────────────────────────────────

/// How deployments were driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// One marker class deployed once for the whole suite.
    Suite,
    /// No marker; the host deployed each class itself.
    PerClass,
}

/// Gate decisions observed for one test class.
#[derive(Debug, Serialize)]
pub struct ClassReport {
    pub class: String,
    pub generate: Decision,
    pub deploy: Decision,
    pub undeploy: Decision,
    /// Size of the scenario the host sees for this class through the suite context.
    pub visible_deployments: Option<usize>,
}

/// Result of a simulated run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub marker: Option<String>,
    /// Captured suite scenario in deploy order.
    pub scenario: Vec<String>,
    /// Containers the captured scenario deploys into.
    pub containers: Vec<String>,
    pub classes: Vec<ClassReport>,
    /// The suite environment failed to start and no test class ran.
    pub aborted: bool,
    pub journal: Vec<JournalEntry>,
    pub state: Option<SequencerState>,
    pub diagnostics: Option<DiagnosticsSnapshot>,
    pub failures: Vec<String>,
    #[serde(skip)]
    first_failure: Option<LifecycleOperationError>,
}

impl RunReport {
    fn new(mode: RunMode) -> Self {
        Self {
            mode,
            marker: None,
            scenario: Vec::new(),
            containers: Vec::new(),
            classes: Vec::new(),
            aborted: false,
            journal: Vec::new(),
            state: None,
            diagnostics: None,
            failures: Vec::new(),
            first_failure: None,
        }
    }

    fn fail(&mut self, error: LifecycleOperationError) {
        warn!(error = %error, "lifecycle operation failed");
        self.failures.push(error.to_string());
        if self.first_failure.is_none() {
            self.first_failure = Some(error);
        }
    }

    /// Whether every lifecycle operation succeeded.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Take the first lifecycle failure, leaving the rendered messages in place.
    pub fn take_failure(&mut self) -> Option<LifecycleOperationError> {
        self.first_failure.take()
    }

    /// Names of deployments as they were deployed, successful calls only.
    pub fn deployed(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Deploy {
                    deployment,
                    ok: true,
                    ..
                } => Some(deployment.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of deployments as they were undeployed, successful calls only.
    pub fn undeployed(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Undeploy {
                    deployment,
                    ok: true,
                    ..
                } => Some(deployment.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match (&self.mode, &self.marker) {
            (RunMode::Suite, Some(marker)) => {
                writeln!(w, "Suite run: {} ({})", marker.bold(), "suite".cyan())?
            }
            _ => writeln!(w, "Suite run: {}", "per-class".yellow())?,
        }
        if let Some(state) = self.state {
            writeln!(w, "  State: {}", state)?;
        }
        if self.mode == RunMode::Suite {
            if self.scenario.is_empty() {
                writeln!(w, "  Scenario: {}", "(empty)".dimmed())?;
            } else {
                writeln!(w, "  Scenario: {}", self.scenario.join(", "))?;
            }
            if !self.containers.is_empty() {
                writeln!(w, "  Containers: {}", self.containers.join(", "))?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "{:<40} {:<10} {:<10} {:<10}",
            "Class", "Generate", "Deploy", "Undeploy"
        )?;
        writeln!(w, "{}", "-".repeat(72))?;
        if self.aborted {
            writeln!(
                w,
                "  {}",
                "(skipped: suite environment failed to start)".red()
            )?;
        }
        for class in &self.classes {
            writeln!(
                w,
                "{:<40} {:<10} {:<10} {:<10}",
                class.class,
                class.generate.to_string(),
                class.deploy.to_string(),
                class.undeploy.to_string()
            )?;
        }

        writeln!(w)?;
        writeln!(w, "Journal:")?;
        if self.journal.is_empty() {
            writeln!(w, "  (no host calls)")?;
        }
        for entry in &self.journal {
            writeln!(w, "  {}", entry)?;
        }

        if let Some(diagnostics) = self.diagnostics {
            writeln!(w)?;
            writeln!(
                w,
                "Diagnostics: consumed={} forwarded={} deploys={} undeploys={}{}",
                diagnostics.events_consumed,
                diagnostics.events_forwarded,
                diagnostics.deploys_issued,
                diagnostics.undeploys_issued,
                if diagnostics.debug { " (debug)" } else { "" }
            )?;
        }

        writeln!(w)?;
        if self.succeeded() {
            writeln!(w, "Result: {}", "OK".green().bold())?;
        } else {
            writeln!(w, "Result: {}", "FAILED".red().bold())?;
            for failure in &self.failures {
                writeln!(w, "  Error: {}", failure.red())?;
            }
        }

        Ok(())
    }
}
