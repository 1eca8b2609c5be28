//! 설정 관리 — suite.toml 파싱 및 런타임 설정
//!
//! [`SuiteConfig`]는 로깅 설정과 진단 토글을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SUITE_DIAGNOSTICS_DEBUG=true` 형식)
//! 3. 설정 파일 (`suite.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), suite_core::error::SuiteError> {
//! use suite_core::config::SuiteConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SuiteConfig::load("suite.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SuiteConfig::parse("[diagnostics]\ndebug = true")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SuiteError};

/// 진단 토글 환경변수
pub const ENV_DIAGNOSTICS_DEBUG: &str = "SUITE_DIAGNOSTICS_DEBUG";
/// 로그 레벨 환경변수
pub const ENV_GENERAL_LOG_LEVEL: &str = "SUITE_GENERAL_LOG_LEVEL";
/// 로그 형식 환경변수
pub const ENV_GENERAL_LOG_FORMAT: &str = "SUITE_GENERAL_LOG_FORMAT";

/// suite 배포 통합 설정
///
/// `suite.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 진단 설정
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl SuiteConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SuiteError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SuiteError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SuiteError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SuiteError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SuiteError> {
        toml::from_str(toml_str).map_err(|e| {
            SuiteError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SUITE_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, ENV_GENERAL_LOG_LEVEL);
        override_string(&mut self.general.log_format, ENV_GENERAL_LOG_FORMAT);
        override_bool(&mut self.diagnostics.debug, ENV_DIAGNOSTICS_DEBUG);
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SuiteError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 진단 설정
///
/// `debug`가 켜져 있으면 차단/전달된 모든 이벤트와
/// 모든 배포/해제 동작을 진단 채널로 출력합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// 진단 출력 활성화 여부
    pub debug: bool,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}
