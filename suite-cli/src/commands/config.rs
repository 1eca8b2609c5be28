//! `suite config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use suite_core::config::SuiteConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
pub const SECTIONS: [&str; 2] = ["general", "diagnostics"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (parse errors, unknown log level or format).
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = validation_report(config_path).await;
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Load the configuration and describe whether it is valid.
pub async fn validation_report(config_path: &Path) -> ConfigValidationReport {
    let source = config_path.display().to_string();
    match SuiteConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source,
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source,
            valid: false,
            errors: vec![e.to_string()],
        },
    }
}

/// Execute the config show subcommand.
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` if the section name is invalid.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = SuiteConfig::load(config_path).await?;
    let report = show_report(&config, config_path, section.as_deref())?;
    writer.render(&report)?;

    Ok(())
}

/// Build the report for `config show`, optionally narrowed to one section.
pub fn show_report(
    config: &SuiteConfig,
    config_path: &Path,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    let config_toml = match section {
        None => to_toml(config),
        Some("general") => to_toml(&config.general),
        Some("diagnostics") => to_toml(&config.diagnostics),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    };

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section: section.map(str::to_owned),
        config_toml,
    })
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {})", e))
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &impl Render) -> String {
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn show_report_full_config() {
        let config = SuiteConfig::default();
        let report = show_report(&config, Path::new("suite.toml"), None).unwrap();

        assert!(report.section.is_none());
        assert!(report.config_toml.contains("[general]"));
        assert!(report.config_toml.contains("[diagnostics]"));

        let output = render(&report);
        assert!(output.contains("Configuration"));
        assert!(output.contains("suite.toml"));
        assert!(output.contains("log_level = \"info\""));
    }

    #[test]
    fn show_report_diagnostics_section() {
        let mut config = SuiteConfig::default();
        config.diagnostics.debug = true;
        let report = show_report(&config, Path::new("suite.toml"), Some("diagnostics")).unwrap();

        assert_eq!(report.section.as_deref(), Some("diagnostics"));
        assert!(report.config_toml.contains("debug = true"));
        assert!(!report.config_toml.contains("log_level"));
        assert!(render(&report).contains("[diagnostics]"));
    }

    #[test]
    fn show_report_unknown_section_rejected() {
        let config = SuiteConfig::default();
        let err = show_report(&config, Path::new("suite.toml"), Some("ebpf")).unwrap_err();
        assert!(err.to_string().contains("unknown section: ebpf"));
        assert!(err.to_string().contains("general, diagnostics"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn config_report_json_skips_toml_body() {
        let report = ConfigReport {
            source: "/etc/suite.toml".to_owned(),
            section: Some("general".to_owned()),
            config_toml: "log_level = \"debug\"\n".to_owned(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "/etc/suite.toml");
        assert_eq!(json["section"], "general");
        assert!(json.get("config_toml").is_none());
    }

    #[test]
    fn validation_report_valid_render() {
        let report = ConfigValidationReport {
            source: "suite.toml".to_owned(),
            valid: true,
            errors: Vec::new(),
        };
        let output = render(&report);
        assert!(output.contains("Config Validation"));
        assert!(output.contains("VALID"));
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn validation_report_invalid_render_lists_errors() {
        let report = ConfigValidationReport {
            source: "suite.toml".to_owned(),
            valid: false,
            errors: vec!["invalid config value for 'general.log_level'".to_owned()],
        };
        let output = render(&report);
        assert!(output.contains("INVALID"));
        assert!(output.contains("general.log_level"));
    }

    #[tokio::test]
    async fn validation_report_missing_file_is_invalid() {
        let report = validation_report(Path::new("/nonexistent/suite.toml")).await;
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("not found"));
    }
}
