//! suite-core — suite 단위 배포 조정기의 공통 타입, host trait, 이벤트, 에러, 설정
//!
//! - [`types`]: 마커 클래스, 컨테이너, 배포 시나리오
//! - [`event`]: 호스트/suite-deployer 생명주기 이벤트와 게이트 판정
//! - [`host`]: 호스트 collaborator trait
//! - [`error`]: 도메인 에러
//! - [`config`]: `suite.toml` 설정
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    ConfigError, GenerationError, HostError, LifecycleOperationError, MarkerError, ScenarioError,
    SuiteError,
};

// 설정
pub use config::{DiagnosticsConfig, GeneralConfig, SuiteConfig};

// 이벤트
pub use event::{
    Decision, DeployDeployment, DeployManagedDeployments, EnvironmentStarted, EnvironmentStopping,
    Event, EventMetadata, GenerateDeployment, InterceptedEvent, UndeployDeployment,
    UndeployManagedDeployments,
};

// host trait
pub use host::{
    BoxFuture, ClassCatalog, ClassContext, ContainerRegistry, DeploymentGenerator,
    DeploymentOperations, HostBindings, ScenarioProvider,
};

// 도메인 타입
pub use types::{
    CandidateClass, ClassRef, Container, Deployment, DeploymentDescription, DeploymentScenario,
    MarkerKind, SuitePhase, TargetId,
};
