//! CLI-specific error types and exit code mapping

use suite_core::error::{LifecycleOperationError, MarkerError, SuiteError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Manifest loading or validation failure.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// More than one class carries the same suite marker.
    #[error("{0}")]
    DuplicateMarker(#[from] MarkerError),

    /// Deploy/undeploy phase failed against the host.
    #[error("{0}")]
    Lifecycle(#[from] LifecycleOperationError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from suite-core.
    #[error("{0}")]
    Core(#[from] SuiteError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                      |
    /// |------|------------------------------|
    /// | 0    | Success                      |
    /// | 1    | General / command error      |
    /// | 2    | Configuration error          |
    /// | 3    | Duplicate suite marker       |
    /// | 4    | Lifecycle operation failure  |
    /// | 10   | IO error                     |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Manifest(_) => 2,
            Self::DuplicateMarker(_) => 3,
            Self::Lifecycle(_) => 4,
            Self::Io(_) => 10,
            Self::Core(e) => match e {
                SuiteError::Config(_) => 2,
                SuiteError::Marker(_) => 3,
                SuiteError::Lifecycle(_) => 4,
                SuiteError::Io(_) => 10,
                _ => 1,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suite_core::error::{ConfigError, HostError};
    use suite_core::types::SuitePhase;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_manifest_error() {
        let err = CliError::Manifest("no classes".to_owned());
        assert_eq!(err.exit_code(), 2, "manifest error should return exit code 2");
    }

    #[test]
    fn test_exit_code_duplicate_marker() {
        let err = CliError::from(MarkerError::Duplicate {
            annotation: "@SuiteDeployment".to_owned(),
            classes: vec!["a.One".to_owned(), "a.Two".to_owned()],
        });
        assert_eq!(err.exit_code(), 3, "duplicate marker should return exit code 3");
        assert!(err.to_string().contains("a.One"));
    }

    #[test]
    fn test_exit_code_lifecycle_error() {
        let err = CliError::from(LifecycleOperationError::new(
            SuitePhase::Deploy,
            HostError::ContainerNotFound {
                target: "wildfly".to_owned(),
            },
        ));
        assert_eq!(err.exit_code(), 4, "lifecycle error should return exit code 4");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(err.exit_code(), 1, "command error should return exit code 1");
    }

    #[test]
    fn test_exit_code_core_config_error() {
        let err = CliError::from(SuiteError::Config(ConfigError::FileNotFound {
            path: "suite.toml".to_owned(),
        }));
        assert_eq!(err.exit_code(), 2, "core config error should map to 2");
    }

    #[test]
    fn test_error_display_config() {
        let err = CliError::Config("invalid TOML syntax".to_owned());
        let display_str = format!("{}", err);
        assert!(display_str.contains("configuration error"));
        assert!(display_str.contains("invalid TOML syntax"));
    }

    #[test]
    fn test_error_display_command() {
        let err = CliError::Command("execution failed".to_owned());
        assert_eq!(format!("{}", err), "execution failed");
    }
}
