//! 이벤트 시스템 — 호스트와 suite-deployer 사이의 생명주기 이벤트
//!
//! 호스트 오케스트레이터가 발생시키는 이벤트(환경 시작/정지, 클래스별 배포/해제,
//! 배포 생성 요청)와 suite-deployer가 발생시키는 이벤트(배포/해제 연산)를 정의합니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::{ClassRef, Container, Deployment};

// --- 모듈명 상수 ---

/// 호스트 오케스트레이터 모듈명
pub const MODULE_HOST: &str = "host";
/// suite-deployer 모듈명
pub const MODULE_SUITE_DEPLOYER: &str = "suite-deployer";

// --- 이벤트 타입 상수 ---

/// 환경 시작 이벤트 타입
pub const EVENT_TYPE_ENVIRONMENT_STARTED: &str = "environment_started";
/// 환경 정지 이벤트 타입
pub const EVENT_TYPE_ENVIRONMENT_STOPPING: &str = "environment_stopping";
/// 클래스별 관리 배포 이벤트 타입
pub const EVENT_TYPE_DEPLOY_MANAGED: &str = "deploy_managed_deployments";
/// 클래스별 관리 해제 이벤트 타입
pub const EVENT_TYPE_UNDEPLOY_MANAGED: &str = "undeploy_managed_deployments";
/// 배포 생성 요청 이벤트 타입
pub const EVENT_TYPE_GENERATE_DEPLOYMENT: &str = "generate_deployment";
/// 배포 연산 이벤트 타입
pub const EVENT_TYPE_DEPLOY_DEPLOYMENT: &str = "deploy_deployment";
/// 해제 연산 이벤트 타입
pub const EVENT_TYPE_UNDEPLOY_DEPLOYMENT: &str = "undeploy_deployment";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
///
/// 같은 생명주기 신호에서 파생된 이벤트는 같은 trace_id를 공유합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명 (예: "host", "suite-deployer")
    pub source_module: String,
    /// 추적 ID — 같은 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

macro_rules! impl_event {
    ($ty:ty, $event_type:expr) => {
        impl Event for $ty {
            fn event_id(&self) -> &str {
                &self.id
            }

            fn metadata(&self) -> &EventMetadata {
                &self.metadata
            }

            fn event_type(&self) -> &str {
                $event_type
            }
        }
    };
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

// ─── 호스트가 발생시키는 이벤트 ──────────────────────────────────────

/// 환경(컨테이너) 시작 완료 신호
///
/// suite-deployer는 이 이벤트에 두 개의 observer를 등록합니다:
/// 시나리오 생성(우선순위 높음)과 배포(우선순위 낮음).
#[derive(Debug, Clone)]
pub struct EnvironmentStarted {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
}

impl EnvironmentStarted {
    /// 새로운 trace를 시작하는 환경 시작 이벤트를 생성합니다.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::with_new_trace(MODULE_HOST),
        }
    }
}

impl Default for EnvironmentStarted {
    fn default() -> Self {
        Self::new()
    }
}

impl_event!(EnvironmentStarted, EVENT_TYPE_ENVIRONMENT_STARTED);

impl fmt::Display for EnvironmentStarted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvironmentStarted[{}]", short_id(&self.id))
    }
}

/// 환경(컨테이너) 정지 직전 신호
#[derive(Debug, Clone)]
pub struct EnvironmentStopping {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
}

impl EnvironmentStopping {
    /// 새로운 trace를 시작하는 환경 정지 이벤트를 생성합니다.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::with_new_trace(MODULE_HOST),
        }
    }
}

impl Default for EnvironmentStopping {
    fn default() -> Self {
        Self::new()
    }
}

impl_event!(EnvironmentStopping, EVENT_TYPE_ENVIRONMENT_STOPPING);

impl fmt::Display for EnvironmentStopping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvironmentStopping[{}]", short_id(&self.id))
    }
}

/// 테스트 클래스 단위 관리 배포 요청
#[derive(Debug, Clone)]
pub struct DeployManagedDeployments {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 대상 테스트 클래스
    pub class: ClassRef,
}

impl DeployManagedDeployments {
    /// 클래스별 관리 배포 이벤트를 생성합니다.
    pub fn new(class: ClassRef) -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::with_new_trace(MODULE_HOST),
            class,
        }
    }
}

impl_event!(DeployManagedDeployments, EVENT_TYPE_DEPLOY_MANAGED);

impl fmt::Display for DeployManagedDeployments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeployManagedDeployments[{}] class={}",
            short_id(&self.id),
            self.class
        )
    }
}

/// 테스트 클래스 단위 관리 해제 요청
#[derive(Debug, Clone)]
pub struct UndeployManagedDeployments {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 대상 테스트 클래스
    pub class: ClassRef,
}

impl UndeployManagedDeployments {
    /// 클래스별 관리 해제 이벤트를 생성합니다.
    pub fn new(class: ClassRef) -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::with_new_trace(MODULE_HOST),
            class,
        }
    }
}

impl_event!(UndeployManagedDeployments, EVENT_TYPE_UNDEPLOY_MANAGED);

impl fmt::Display for UndeployManagedDeployments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UndeployManagedDeployments[{}] class={}",
            short_id(&self.id),
            self.class
        )
    }
}

/// 배포 시나리오 생성 요청
///
/// 호스트가 클래스마다 발생시키기도 하고, suite-deployer가 마커 클래스에 대해
/// 정확히 한 번 발생시키기도 합니다.
#[derive(Debug, Clone)]
pub struct GenerateDeployment {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 배포를 기술하는 테스트 클래스
    pub class: ClassRef,
}

impl GenerateDeployment {
    /// 새로운 trace를 시작하는 생성 요청을 만듭니다.
    pub fn new(source_module: impl Into<String>, class: ClassRef) -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::with_new_trace(source_module),
            class,
        }
    }

    /// 기존 trace에 연결된 생성 요청을 만듭니다.
    pub fn with_trace(
        source_module: impl Into<String>,
        class: ClassRef,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::new(source_module, trace_id),
            class,
        }
    }
}

impl_event!(GenerateDeployment, EVENT_TYPE_GENERATE_DEPLOYMENT);

impl fmt::Display for GenerateDeployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GenerateDeployment[{}] class={}",
            short_id(&self.id),
            self.class
        )
    }
}

// ─── suite-deployer가 발생시키는 이벤트 ──────────────────────────────

/// 단일 배포 연산 — 컨테이너에 배포 하나를 올립니다.
#[derive(Debug, Clone)]
pub struct DeployDeployment {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 대상 컨테이너
    pub container: Container,
    /// 배포 단위
    pub deployment: Deployment,
}

impl DeployDeployment {
    /// 기존 trace에 연결된 배포 연산을 생성합니다.
    pub fn with_trace(
        container: Container,
        deployment: Deployment,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::new(MODULE_SUITE_DEPLOYER, trace_id),
            container,
            deployment,
        }
    }
}

impl_event!(DeployDeployment, EVENT_TYPE_DEPLOY_DEPLOYMENT);

impl fmt::Display for DeployDeployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeployDeployment[{}] container={} deployment={}",
            short_id(&self.id),
            self.container,
            self.deployment.name()
        )
    }
}

/// 단일 해제 연산 — 컨테이너에서 배포 하나를 내립니다.
#[derive(Debug, Clone)]
pub struct UndeployDeployment {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 대상 컨테이너
    pub container: Container,
    /// 배포 단위
    pub deployment: Deployment,
}

impl UndeployDeployment {
    /// 기존 trace에 연결된 해제 연산을 생성합니다.
    pub fn with_trace(
        container: Container,
        deployment: Deployment,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            metadata: EventMetadata::new(MODULE_SUITE_DEPLOYER, trace_id),
            container,
            deployment,
        }
    }
}

impl_event!(UndeployDeployment, EVENT_TYPE_UNDEPLOY_DEPLOYMENT);

impl fmt::Display for UndeployDeployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UndeployDeployment[{}] container={} deployment={}",
            short_id(&self.id),
            self.container,
            self.deployment.name()
        )
    }
}

// ─── 게이트 판정 ─────────────────────────────────────────────────────

/// 이벤트 게이트가 가로채는 이벤트
#[derive(Debug, Clone)]
pub enum InterceptedEvent {
    /// 클래스별 관리 배포
    DeployManaged(DeployManagedDeployments),
    /// 클래스별 관리 해제
    UndeployManaged(UndeployManagedDeployments),
    /// 배포 생성 요청
    Generate(GenerateDeployment),
}

impl InterceptedEvent {
    /// 가로챈 이벤트를 `Event`로 봅니다.
    pub fn as_event(&self) -> &dyn Event {
        match self {
            Self::DeployManaged(e) => e,
            Self::UndeployManaged(e) => e,
            Self::Generate(e) => e,
        }
    }
}

impl fmt::Display for InterceptedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeployManaged(e) => fmt::Display::fmt(e, f),
            Self::UndeployManaged(e) => fmt::Display::fmt(e, f),
            Self::Generate(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// 핸들러의 판정 — 이벤트를 버리거나 다음 observer로 넘깁니다.
///
/// 디스패처는 `Consume`을 받으면 이벤트를 더 이상 전파하지 않아야 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// 이벤트를 소비 (전파 중단)
    Consume,
    /// 이벤트를 그대로 전달
    Forward,
}

impl Decision {
    /// 전달 판정인지 반환합니다.
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consume => write!(f, "consume"),
            Self::Forward => write!(f, "forward"),
        }
    }
}

fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}
