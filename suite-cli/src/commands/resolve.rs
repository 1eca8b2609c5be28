//! `suite resolve` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use suite_core::types::MarkerKind;
use suite_deployer::MarkerResolver;

use crate::cli::ResolveArgs;
use crate::error::CliError;
use crate::manifest::Manifest;
use crate::output::{OutputWriter, Render};

/// Execute the `resolve` command.
///
/// # Errors
///
/// Returns `CliError::DuplicateMarker` when several classes carry the same marker kind.
pub async fn execute(args: ResolveArgs, writer: &OutputWriter) -> Result<(), CliError> {
    info!(manifest = %args.manifest.display(), "resolving suite marker class");

    let manifest = Manifest::load(&args.manifest).await?;
    let report = build_resolve_report(&manifest)?;
    writer.render(&report)?;

    Ok(())
}

/// Run the marker resolver over the manifest's classes.
pub fn build_resolve_report(manifest: &Manifest) -> Result<ResolveReport, CliError> {
    let candidates = manifest.candidates();
    let marker = MarkerResolver::resolve_candidates(&candidates)?;

    let marker_kind = marker.as_ref().and_then(|class| {
        let candidate = candidates.iter().find(|c| &c.class == class)?;
        MarkerKind::PRECEDENCE
            .into_iter()
            .find(|kind| candidate.has_marker(*kind))
    });

    let deployments = marker
        .as_ref()
        .and_then(|class| manifest.class(class))
        .map(|spec| spec.deployments.iter().map(|d| d.name.clone()).collect())
        .unwrap_or_default();

    Ok(ResolveReport {
        classes_scanned: candidates.len(),
        marker: marker.map(|class| class.name().to_owned()),
        marker_kind,
        deployments,
    })
}

/// Marker resolution result.
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub classes_scanned: usize,
    /// Elected marker class, `None` when the suite falls back to per-class deployments.
    pub marker: Option<String>,
    pub marker_kind: Option<MarkerKind>,
    /// Deployments the marker class describes, in declaration order.
    pub deployments: Vec<String>,
}

impl Render for ResolveReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Classes scanned: {}", self.classes_scanned)?;
        match (&self.marker, self.marker_kind) {
            (Some(marker), Some(kind)) => {
                writeln!(w, "Suite marker: {} ({})", marker.bold(), kind.annotation())?;
                if kind == MarkerKind::LegacySuitDeployment {
                    writeln!(
                        w,
                        "  {}",
                        "warning: @SuitDeployment is deprecated, use @SuiteDeployment".yellow()
                    )?;
                }
            }
            (Some(marker), None) => writeln!(w, "Suite marker: {}", marker.bold())?,
            _ => {
                writeln!(w, "Suite marker: {}", "none".dimmed())?;
                writeln!(w, "  Deployments run per class.")?;
                return Ok(());
            }
        }

        if self.deployments.is_empty() {
            writeln!(w, "  Deployments: (none)")?;
        } else {
            writeln!(w, "  Deployments: {}", self.deployments.join(", "))?;
        }

        Ok(())
    }
}
