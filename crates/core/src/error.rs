//! 에러 타입 — 도메인별 에러 정의

use crate::types::SuitePhase;

/// suite 배포 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 마커 클래스 구성 에러 (치명적)
    #[error("marker error: {0}")]
    Marker(#[from] MarkerError),

    /// 배포 시나리오 구성 에러
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// 배포 시나리오 생성 에러
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// 배포/해제 생명주기 에러
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleOperationError),

    /// 호스트 collaborator 에러
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 마커 클래스 에러
///
/// 사용자가 고쳐야 하는 구성 실수이며 재시도하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    /// 같은 종류의 마커가 둘 이상의 클래스에 붙어 있음
    #[error("duplicated classes annotated with {annotation}: {}", .classes.join(", "))]
    Duplicate {
        /// 중복된 마커 어노테이션
        annotation: String,
        /// 마커가 붙은 모든 클래스 이름
        classes: Vec<String>,
    },
}

/// 배포 시나리오 구성 에러
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// 같은 이름의 배포가 이미 존재
    #[error("cannot add multiple deployments with the same name: {name}")]
    DuplicateDeployment { name: String },

    /// 배포 이름이 비어 있음
    #[error("deployment name must not be empty")]
    EmptyName,
}

/// 배포 시나리오 생성 실패
///
/// 로그로만 남기고 전파하지 않습니다. suite는 빈 시나리오로 계속 진행합니다.
#[derive(Debug, thiserror::Error)]
#[error("failed to generate suite deployment for {class}")]
pub struct GenerationError {
    /// 마커 클래스 이름
    pub class: String,
    /// 원인
    #[source]
    pub source: HostError,
}

/// 배포/해제 생명주기 실패
///
/// 레지스트리 조회, 배포/해제 연산, 클래스 스코프 활성화 실패를 하나로 감싸
/// 호스트에 다시 던집니다. 스코프 해제까지 실패했다면 원래 원인을 유지한 채
/// 해제 실패를 `release_failure`에 덧붙입니다.
#[derive(Debug, thiserror::Error)]
#[error("could not invoke {phase} operation: {source}{}", release_suffix(.release_failure))]
pub struct LifecycleOperationError {
    /// 실패한 단계
    pub phase: SuitePhase,
    /// 원래 원인
    #[source]
    pub source: HostError,
    /// 함께 발생한 클래스 스코프 해제 실패
    pub release_failure: Option<HostError>,
}

impl LifecycleOperationError {
    /// 원인 에러를 감싸 생성합니다.
    pub fn new(phase: SuitePhase, source: HostError) -> Self {
        Self {
            phase,
            source,
            release_failure: None,
        }
    }

    /// 스코프 해제 실패를 덧붙입니다.
    pub fn with_release_failure(mut self, failure: HostError) -> Self {
        self.release_failure = Some(failure);
        self
    }
}

fn release_suffix(failure: &Option<HostError>) -> String {
    match failure {
        Some(err) => format!(" (scope release also failed: {err})"),
        None => String::new(),
    }
}

/// 호스트 collaborator 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// 대상 컨테이너를 찾을 수 없음
    #[error("container not found for target '{target}'")]
    ContainerNotFound { target: String },

    /// 배포/해제 연산 실패
    #[error("{operation} of '{deployment}' failed: {reason}")]
    OperationFailed {
        /// 연산 이름 (deploy, undeploy)
        operation: String,
        /// 배포 이름
        deployment: String,
        /// 실패 사유
        reason: String,
    },

    /// 배포 시나리오 생성 실패
    #[error("deployment generation failed: {0}")]
    GenerationFailed(String),

    /// 클래스 컨텍스트 활성화/비활성화 실패
    #[error("class context error: {0}")]
    Context(String),
}
