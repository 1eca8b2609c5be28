//! Integration tests for `suite resolve` and `suite run`.
//!
//! Manifests are written to temp files and loaded the same way the binary does.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use suite_cli::commands::resolve::build_resolve_report;
use suite_cli::commands::run::{RunMode, simulate};
use suite_cli::error::CliError;
use suite_cli::host::JournalEntry;
use suite_cli::manifest::Manifest;
use suite_core::config::SuiteConfig;
use suite_core::event::Decision;
use suite_deployer::SequencerState;

fn write_manifest(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("suite-manifest.toml");
    fs::write(&path, content).expect("should write manifest");
    path
}

async fn run(content: &str) -> suite_cli::commands::run::RunReport {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_manifest(&dir, content);
    let manifest = Manifest::load(&path).await.expect("manifest should load");
    simulate(manifest, &SuiteConfig::default())
        .await
        .expect("registration should succeed")
}

const ORDERED: &str = r#"
[[containers]]
name = "wildfly"
default = true

[[containers]]
name = "db"

[[classes]]
name = "org.acme.it.Deployments"
markers = ["suite-deployment"]

[[classes.deployments]]
name = "A"
order = 1

[[classes.deployments]]
name = "B"
order = 2
undeploy_order = 0

[[classes.deployments]]
name = "C"
target = "db"
order = 0

[[classes]]
name = "org.acme.it.FirstIT"

[[classes]]
name = "org.acme.it.SecondIT"
"#;

#[tokio::test]
async fn example_manifest_runs_clean() {
    let example = Path::new(env!("CARGO_MANIFEST_DIR")).join("../suite-manifest.toml.example");
    let manifest = Manifest::load(&example)
        .await
        .expect("example manifest should load");

    let resolved = build_resolve_report(&manifest).expect("example has one marker");
    assert!(resolved.marker.is_some());

    let report = simulate(manifest, &SuiteConfig::default())
        .await
        .expect("example should register");
    assert_eq!(report.mode, RunMode::Suite);
    assert!(report.succeeded(), "failures: {:?}", report.failures);
    assert_eq!(report.state, Some(SequencerState::TornDown));
}

#[tokio::test]
async fn deploy_order_is_ascending_and_undeploy_follows_scenario() {
    let report = run(ORDERED).await;

    assert_eq!(report.deployed(), vec!["C", "A", "B"]);
    assert_eq!(report.containers, vec!["db", "wildfly"]);
    // explicit undeploy_order first, the rest by descending order
    assert_eq!(report.undeployed(), vec!["B", "A", "C"]);
}

#[tokio::test]
async fn deployments_resolve_their_target_container() {
    let report = run(ORDERED).await;

    let containers: Vec<(String, String)> = report
        .journal
        .iter()
        .filter_map(|entry| match entry {
            JournalEntry::Deploy {
                deployment,
                container,
                ..
            } => Some((deployment.clone(), container.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        containers,
        vec![
            ("C".to_owned(), "db".to_owned()),
            ("A".to_owned(), "wildfly".to_owned()),
            ("B".to_owned(), "wildfly".to_owned()),
        ]
    );
}

#[tokio::test]
async fn every_operation_runs_in_marker_scope() {
    let report = run(ORDERED).await;

    for entry in &report.journal {
        match entry {
            JournalEntry::Deploy { scope, .. } | JournalEntry::Undeploy { scope, .. } => {
                assert_eq!(scope.as_deref(), Some("org.acme.it.Deployments"));
            }
            JournalEntry::Activate { class } | JournalEntry::Deactivate { class } => {
                assert_eq!(class, "org.acme.it.Deployments");
            }
            JournalEntry::Generate { .. } => {}
        }
    }

    let activations = report
        .journal
        .iter()
        .filter(|e| matches!(e, JournalEntry::Activate { .. }))
        .count();
    let deactivations = report
        .journal
        .iter()
        .filter(|e| matches!(e, JournalEntry::Deactivate { .. }))
        .count();
    assert_eq!(activations, 3, "generate, deploy and undeploy phases");
    assert_eq!(activations, deactivations);
}

#[tokio::test]
async fn generation_happens_once_and_class_events_are_consumed() {
    let report = run(ORDERED).await;

    let generations = report
        .journal
        .iter()
        .filter(|e| matches!(e, JournalEntry::Generate { .. }))
        .count();
    assert_eq!(generations, 1);

    assert_eq!(report.classes.len(), 3);
    for class in &report.classes {
        assert_eq!(class.generate, Decision::Consume);
        assert_eq!(class.deploy, Decision::Consume);
        assert_eq!(class.undeploy, Decision::Consume);
        assert_eq!(class.visible_deployments, Some(3));
    }

    let diagnostics = report.diagnostics.expect("suite run has diagnostics");
    assert_eq!(diagnostics.events_forwarded, 1);
    assert_eq!(diagnostics.events_consumed, 9);
}

#[tokio::test]
async fn missing_container_fails_deploy_and_releases_scope() {
    let report = run(
        r#"
[[classes]]
name = "a.Deployments"
markers = ["suite-deployment"]

[[classes.deployments]]
name = "web"
"#,
    )
    .await;

    assert!(!report.succeeded());
    assert!(report.failures[0].contains("container not found"));
    assert!(report.deployed().is_empty());
    assert!(report.undeployed().is_empty());

    let activations = report
        .journal
        .iter()
        .filter(|e| matches!(e, JournalEntry::Activate { .. }))
        .count();
    let deactivations = report
        .journal
        .iter()
        .filter(|e| matches!(e, JournalEntry::Deactivate { .. }))
        .count();
    assert_eq!(activations, deactivations);
}

#[tokio::test]
async fn failed_deploy_stops_the_run_before_any_class() {
    let mut report = run(&format!("{ORDERED}\n[failures]\ndeploy = [\"A\"]\n")).await;

    assert!(report.aborted);
    assert!(report.classes.is_empty());
    // C went up before A failed; teardown takes it back down
    assert_eq!(report.deployed(), vec!["C"]);
    assert_eq!(report.undeployed(), vec!["C"]);
    assert_eq!(report.state, Some(SequencerState::TornDown));

    let generations = report
        .journal
        .iter()
        .filter(|e| matches!(e, JournalEntry::Generate { .. }))
        .count();
    assert_eq!(generations, 1, "class generation events never fire");

    let failure = report.take_failure().expect("deploy failure kept");
    assert_eq!(failure.phase, suite_core::types::SuitePhase::Deploy);
    assert_eq!(CliError::Lifecycle(failure).exit_code(), 4);
}

#[tokio::test]
async fn generation_failure_runs_with_empty_scenario() {
    let report = run(&format!(
        "{ORDERED}\n[failures]\ngenerate = [\"org.acme.it.Deployments\"]\n"
    ))
    .await;

    assert!(report.succeeded(), "generation failure is not a lifecycle failure");
    assert!(report.scenario.is_empty());
    assert!(report.deployed().is_empty());
    assert!(report.undeployed().is_empty());
    assert_eq!(report.state, Some(SequencerState::TornDown));
}

#[tokio::test]
async fn undeploy_failure_is_reported() {
    let mut report = run(&format!("{ORDERED}\n[failures]\nundeploy = [\"B\"]\n")).await;

    assert!(!report.succeeded());
    let failure = report.take_failure().expect("failure kept for exit code");
    assert_eq!(failure.phase, suite_core::types::SuitePhase::Undeploy);
    assert!(report.undeployed().is_empty());
}

#[tokio::test]
async fn no_marker_falls_back_to_per_class() {
    let report = run(
        r#"
[[containers]]
name = "wildfly"
default = true

[[classes]]
name = "a.OneIT"
[[classes.deployments]]
name = "one"
"#,
    )
    .await;

    assert_eq!(report.mode, RunMode::PerClass);
    assert_eq!(report.deployed(), vec!["one"]);
    assert_eq!(report.undeployed(), vec!["one"]);
    assert!(report.diagnostics.is_none());
}

#[tokio::test]
async fn duplicate_markers_fail_registration() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_manifest(
        &dir,
        r#"
[[classes]]
name = "a.One"
markers = ["suit-deployment"]

[[classes]]
name = "a.Two"
markers = ["suit-deployment"]
"#,
    );
    let manifest = Manifest::load(&path).await.expect("manifest should load");

    let err = simulate(manifest, &SuiteConfig::default())
        .await
        .expect_err("duplicate markers are fatal");
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("a.One"));
    assert!(err.to_string().contains("a.Two"));
}

#[tokio::test]
async fn missing_manifest_is_a_manifest_error() {
    let err = Manifest::load("/nonexistent/suite-manifest.toml")
        .await
        .expect_err("missing manifest");
    assert_eq!(err.exit_code(), 2);
}
