//! Suite manifest: the test classes, containers and failure injection a simulated run uses.
//!
//! The manifest plays the role of the host's class catalog and deployment methods.
//! See `suite-manifest.toml.example` at the workspace root for the format.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use suite_core::types::{CandidateClass, ClassRef, DeploymentDescription, DeploymentScenario, MarkerKind};

use crate::error::CliError;

/// Top-level manifest structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Containers known to the simulated registry.
    pub containers: Vec<ContainerSpec>,
    /// Test classes in declaration order.
    pub classes: Vec<ClassSpec>,
    /// Failure injection.
    pub failures: FailureSpec,
}

/// A container entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    /// Resolves the `_DEFAULT_` target when true.
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A test class entry with its markers and the deployments it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub markers: Vec<MarkerKind>,
    #[serde(default)]
    pub deployments: Vec<DeploymentDescription>,
}

/// Operations the simulated host should fail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureSpec {
    /// Deployment names whose deploy operation fails.
    pub deploy: Vec<String>,
    /// Deployment names whose undeploy operation fails.
    pub undeploy: Vec<String>,
    /// Class names whose deployment generation fails.
    pub generate: Vec<String>,
}

impl Manifest {
    /// Load and validate a manifest file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CliError::Manifest(format!("manifest not found: {}", path.display()))
            } else {
                CliError::Io(e)
            }
        })?;
        let manifest = Self::parse(&content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse a manifest from a TOML string without validating it.
    pub fn parse(toml_str: &str) -> Result<Self, CliError> {
        toml::from_str(toml_str)
            .map_err(|e| CliError::Manifest(format!("failed to parse manifest: {e}")))
    }

    /// Check names are unique and each class describes a well-formed scenario.
    ///
    /// Deployment targets are not checked against the container list: an unknown
    /// target is a host failure the run is expected to surface.
    pub fn validate(&self) -> Result<(), CliError> {
        let mut containers = HashSet::new();
        for container in &self.containers {
            if container.name.trim().is_empty() {
                return Err(CliError::Manifest("container name must not be empty".to_owned()));
            }
            if !containers.insert(container.name.as_str()) {
                return Err(CliError::Manifest(format!(
                    "duplicate container '{}'",
                    container.name
                )));
            }
        }

        let defaults = self.containers.iter().filter(|c| c.default).count();
        if defaults > 1 {
            return Err(CliError::Manifest(format!(
                "at most one default container allowed, found {defaults}"
            )));
        }

        let mut classes = HashSet::new();
        for class in &self.classes {
            if class.name.trim().is_empty() {
                return Err(CliError::Manifest("class name must not be empty".to_owned()));
            }
            if !classes.insert(class.name.as_str()) {
                return Err(CliError::Manifest(format!("duplicate class '{}'", class.name)));
            }
            class.scenario().map_err(|e| {
                CliError::Manifest(format!("class '{}': {e}", class.name))
            })?;
        }

        Ok(())
    }

    /// The catalog view handed to the marker resolver.
    pub fn candidates(&self) -> Vec<CandidateClass> {
        self.classes
            .iter()
            .map(|class| CandidateClass {
                class: ClassRef::new(&class.name),
                markers: class.markers.clone(),
            })
            .collect()
    }

    /// Look up a class entry by name.
    pub fn class(&self, class: &ClassRef) -> Option<&ClassSpec> {
        self.classes.iter().find(|c| c.name == class.name())
    }

    /// Classes in declaration order.
    pub fn class_refs(&self) -> Vec<ClassRef> {
        self.classes.iter().map(|c| ClassRef::new(&c.name)).collect()
    }

    /// The container resolving the `_DEFAULT_` target.
    pub fn default_container(&self) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.default)
    }
}

impl ClassSpec {
    /// Build the deployment scenario this class describes.
    pub fn scenario(&self) -> Result<DeploymentScenario, suite_core::error::ScenarioError> {
        DeploymentScenario::from_descriptions(self.deployments.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[containers]]
name = "wildfly"
default = true

[[containers]]
name = "db"

[[classes]]
name = "org.acme.it.Deployments"
markers = ["suite-deployment"]

[[classes.deployments]]
name = "web"
order = 1

[[classes.deployments]]
name = "schema"
target = "db"
order = 0
undeploy_order = 5

[[classes]]
name = "org.acme.it.OrderIT"

[failures]
deploy = ["web"]
"#;

    #[test]
    fn parse_sample_manifest() {
        let manifest = Manifest::parse(SAMPLE).expect("sample should parse");
        manifest.validate().expect("sample should validate");

        assert_eq!(manifest.containers.len(), 2);
        assert_eq!(manifest.default_container().map(|c| c.name.as_str()), Some("wildfly"));
        assert_eq!(manifest.classes.len(), 2);
        assert_eq!(manifest.failures.deploy, vec!["web".to_owned()]);
        assert!(manifest.failures.generate.is_empty());

        let marker = &manifest.classes[0];
        assert_eq!(marker.markers, vec![MarkerKind::SuiteDeployment]);
        let schema = &marker.deployments[1];
        assert_eq!(schema.target.as_str(), "db");
        assert_eq!(schema.undeploy_order, Some(5));
        assert!(schema.managed);
        assert!(marker.deployments[0].target.is_default());
    }

    #[test]
    fn candidates_keep_declaration_order_and_markers() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let candidates = manifest.candidates();
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].has_marker(MarkerKind::SuiteDeployment));
        assert!(candidates[1].markers.is_empty());
        assert_eq!(candidates[1].class.name(), "org.acme.it.OrderIT");
    }

    #[test]
    fn legacy_alias_is_parsed() {
        let manifest = Manifest::parse(
            r#"
[[classes]]
name = "a.Old"
markers = ["suit-deployment"]
"#,
        )
        .unwrap();
        assert!(manifest.classes[0].markers.contains(&MarkerKind::LegacySuitDeployment));
    }

    #[test]
    fn empty_manifest_is_valid() {
        let manifest = Manifest::parse("").unwrap();
        manifest.validate().unwrap();
        assert!(manifest.candidates().is_empty());
        assert!(manifest.default_container().is_none());
    }

    #[test]
    fn duplicate_class_rejected() {
        let manifest = Manifest::parse(
            r#"
[[classes]]
name = "a.One"
[[classes]]
name = "a.One"
"#,
        )
        .unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate class 'a.One'"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn two_default_containers_rejected() {
        let manifest = Manifest::parse(
            r#"
[[containers]]
name = "a"
default = true
[[containers]]
name = "b"
default = true
"#,
        )
        .unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn duplicate_deployment_name_rejected() {
        let manifest = Manifest::parse(
            r#"
[[classes]]
name = "a.One"
[[classes.deployments]]
name = "web"
[[classes.deployments]]
name = "web"
"#,
        )
        .unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("a.One"));
        assert!(err.to_string().contains("web"));
    }

    #[test]
    fn unknown_marker_rejected() {
        let result = Manifest::parse(
            r#"
[[classes]]
name = "a.One"
markers = ["deployment"]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_target_is_not_a_validation_error() {
        let manifest = Manifest::parse(
            r#"
[[classes]]
name = "a.One"
[[classes.deployments]]
name = "web"
target = "missing"
"#,
        )
        .unwrap();
        manifest.validate().unwrap();
    }
}
