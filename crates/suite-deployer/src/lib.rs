//! Suite-wide deployment coordinator.
//!
//! Turns the host orchestrator's per-class deployment model into a per-suite one:
//! one environment is provisioned before the first test class and torn down after the
//! last, while the host's own per-class deploy/undeploy events are vetoed.
//!
//! # Module Structure
//!
//! - [`resolver`]: Marker class election (`MarkerResolver`)
//! - [`gate`]: Per-class lifecycle event filtering (`EventGate`)
//! - [`scope`]: Class scope guard and suite context (`ClassScopeGuard`, `ExtendedSuiteContext`)
//! - [`sequencer`]: Generate/deploy/undeploy state machine (`DeploymentSequencer`)
//! - [`diagnostics`]: Debug-toggled decision/action logging and counters (`Diagnostics`)
//! - [`extension`]: Registration entry point (`SuiteExtension`, `SuiteDeployer`)
//!
//! # Architecture
//!
//! ```text
//! EnvironmentStarted ──(-100)──> DeploymentSequencer.on_startup()
//!                                     |  GenerateDeployment(marker) ──> EventGate (latch)
//!                                     |                             ──> DeploymentGenerator
//!                                     v
//!                               ExtendedSuiteContext (scenario published)
//! EnvironmentStarted ──(-200)──> DeploymentSequencer.on_environment_start()
//!                                     └── DeployDeployment ──> DeploymentOperations
//! EnvironmentStopping ─────────> DeploymentSequencer.on_environment_stop()
//!                                     └── UndeployDeployment ──> DeploymentOperations
//! Deploy/UndeployManagedDeployments ──> EventGate ──> Consume
//! ```

pub mod diagnostics;
pub mod extension;
pub mod gate;
pub mod resolver;
pub mod scope;
pub mod sequencer;

// --- Public API Re-exports ---

// Registration
pub use extension::{
    DEFAULT_PRECEDENCE, DEPLOY_PRECEDENCE, ObserverBinding, Registration, STARTUP_PRECEDENCE,
    SuiteDeployer, SuiteExtension,
};

// Components
pub use gate::EventGate;
pub use resolver::MarkerResolver;
pub use scope::{ClassScopeGuard, ExtendedSuiteContext};
pub use sequencer::{DeploymentSequencer, SequencerState};

// Diagnostics
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
