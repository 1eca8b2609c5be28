//! 확장 등록 — 호스트가 로드 시 한 번 호출하는 진입점
//!
//! 등록 시점에 마커 해석을 동기적으로 수행합니다.
//! 마커 클래스가 없으면 경고 한 번만 남기고 아무것도 설치하지 않으며,
//! 있으면 [`SuiteDeployer`]가 게이트/시퀀서/suite 컨텍스트를 소유한 채 반환됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use suite_deployer::{Registration, SuiteExtension};
//!
//! match SuiteExtension::register(&catalog, &config, host)? {
//!     Registration::Enabled(deployer) => {
//!         for binding in deployer.observers() {
//!             dispatcher.bind(binding.event_type, binding.handler, binding.precedence);
//!         }
//!     }
//!     Registration::Disabled => { /* 호스트 기본 동작 */ }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use suite_core::config::SuiteConfig;
use suite_core::error::{LifecycleOperationError, MarkerError};
use suite_core::event::{
    Decision, DeployManagedDeployments, EVENT_TYPE_DEPLOY_MANAGED, EVENT_TYPE_ENVIRONMENT_STARTED,
    EVENT_TYPE_ENVIRONMENT_STOPPING, EVENT_TYPE_GENERATE_DEPLOYMENT, EVENT_TYPE_UNDEPLOY_MANAGED,
    EnvironmentStarted, EnvironmentStopping, GenerateDeployment, InterceptedEvent,
    UndeployManagedDeployments,
};
use suite_core::host::{ClassCatalog, HostBindings, ScenarioProvider};
use suite_core::types::{ClassRef, DeploymentScenario};

use crate::diagnostics::{Diagnostics, DiagnosticsSnapshot};
use crate::gate::EventGate;
use crate::resolver::MarkerResolver;
use crate::scope::ExtendedSuiteContext;
use crate::sequencer::{DeploymentSequencer, SequencerState};

/// 시나리오 생성 observer 우선순위
pub const STARTUP_PRECEDENCE: i32 = -100;
/// 배포 observer 우선순위 (생성 이후 실행)
pub const DEPLOY_PRECEDENCE: i32 = -200;
/// 해제 및 게이트 observer 우선순위
pub const DEFAULT_PRECEDENCE: i32 = 0;

/// observer 핸들러 이름
pub mod handlers {
    /// 시나리오 생성
    pub const STARTUP: &str = "startup";
    /// 배포
    pub const DEPLOY: &str = "deploy";
    /// 해제
    pub const UNDEPLOY: &str = "undeploy";
    /// 클래스별 관리 배포 차단
    pub const BLOCK_DEPLOY_MANAGED: &str = "block_deploy_managed_deployments";
    /// 클래스별 관리 해제 차단
    pub const BLOCK_UNDEPLOY_MANAGED: &str = "block_undeploy_managed_deployments";
    /// 생성 요청 1회 전달
    pub const BLOCK_GENERATE_DEPLOYMENT: &str = "block_generate_deployment";
}

/// 호스트 디스패처에 바인딩할 observer 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObserverBinding {
    /// 핸들러 이름
    pub handler: &'static str,
    /// 관찰하는 이벤트 타입
    pub event_type: &'static str,
    /// 우선순위 (높을수록 먼저 실행)
    pub precedence: i32,
}

/// 등록 결과
#[derive(Debug)]
pub enum Registration {
    /// 마커 클래스가 없어 아무것도 설치하지 않음
    Disabled,
    /// suite 배포 활성화
    Enabled(SuiteDeployer),
}

impl Registration {
    /// 활성화된 deployer를 반환합니다.
    pub fn deployer(&self) -> Option<&SuiteDeployer> {
        match self {
            Self::Enabled(deployer) => Some(deployer),
            Self::Disabled => None,
        }
    }

    /// 활성화 여부
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

/// 확장 진입점
#[derive(Debug, Default, Clone, Copy)]
pub struct SuiteExtension;

impl SuiteExtension {
    /// 확장을 등록합니다.
    ///
    /// # Errors
    /// 같은 종류의 마커가 여러 클래스에 있으면 [`MarkerError`] (치명적, 재시도 불가)
    pub fn register(
        catalog: &dyn ClassCatalog,
        config: &SuiteConfig,
        host: HostBindings,
    ) -> Result<Registration, MarkerError> {
        match MarkerResolver::resolve(catalog)? {
            Some(marker) => {
                info!(marker = %marker, "suite deployment enabled");
                Ok(Registration::Enabled(SuiteDeployer::new(marker, config, host)))
            }
            None => {
                warn!("no suite deployment marker found, falling back to per-class deployments");
                Ok(Registration::Disabled)
            }
        }
    }
}

/// 활성화된 suite deployer — 게이트, 시퀀서, suite 컨텍스트를 소유합니다.
pub struct SuiteDeployer {
    gate: Arc<EventGate>,
    sequencer: DeploymentSequencer,
    suite_context: Arc<ExtendedSuiteContext>,
    diagnostics: Arc<Diagnostics>,
}

impl SuiteDeployer {
    /// 마커 클래스가 결정된 deployer를 생성합니다.
    pub fn new(marker: ClassRef, config: &SuiteConfig, host: HostBindings) -> Self {
        let diagnostics = Arc::new(Diagnostics::from_config(&config.diagnostics));
        let gate = Arc::new(EventGate::new(Arc::clone(&diagnostics)));
        let suite_context = Arc::new(ExtendedSuiteContext::new(marker.clone()));
        let sequencer = DeploymentSequencer::new(
            marker,
            host,
            Arc::clone(&gate),
            Arc::clone(&suite_context),
            Arc::clone(&diagnostics),
        );
        Self {
            gate,
            sequencer,
            suite_context,
            diagnostics,
        }
    }

    /// 마커 클래스
    pub fn marker_class(&self) -> &ClassRef {
        self.sequencer.marker()
    }

    /// 호스트 디스패처에 바인딩할 observer 목록
    pub fn observers(&self) -> Vec<ObserverBinding> {
        vec![
            ObserverBinding {
                handler: handlers::STARTUP,
                event_type: EVENT_TYPE_ENVIRONMENT_STARTED,
                precedence: STARTUP_PRECEDENCE,
            },
            ObserverBinding {
                handler: handlers::DEPLOY,
                event_type: EVENT_TYPE_ENVIRONMENT_STARTED,
                precedence: DEPLOY_PRECEDENCE,
            },
            ObserverBinding {
                handler: handlers::UNDEPLOY,
                event_type: EVENT_TYPE_ENVIRONMENT_STOPPING,
                precedence: DEFAULT_PRECEDENCE,
            },
            ObserverBinding {
                handler: handlers::BLOCK_DEPLOY_MANAGED,
                event_type: EVENT_TYPE_DEPLOY_MANAGED,
                precedence: DEFAULT_PRECEDENCE,
            },
            ObserverBinding {
                handler: handlers::BLOCK_UNDEPLOY_MANAGED,
                event_type: EVENT_TYPE_UNDEPLOY_MANAGED,
                precedence: DEFAULT_PRECEDENCE,
            },
            ObserverBinding {
                handler: handlers::BLOCK_GENERATE_DEPLOYMENT,
                event_type: EVENT_TYPE_GENERATE_DEPLOYMENT,
                precedence: DEFAULT_PRECEDENCE,
            },
        ]
    }

    // --- 게이트 핸들러 ---

    /// 클래스별 관리 배포 이벤트 판정
    pub fn on_deploy_managed(&self, event: &DeployManagedDeployments) -> Decision {
        self.gate.on_deploy_managed(event)
    }

    /// 클래스별 관리 해제 이벤트 판정
    pub fn on_undeploy_managed(&self, event: &UndeployManagedDeployments) -> Decision {
        self.gate.on_undeploy_managed(event)
    }

    /// 생성 요청 이벤트 판정
    pub fn on_generate_deployment(&self, event: &GenerateDeployment) -> Decision {
        self.gate.on_generate_deployment(event)
    }

    /// 가로챈 이벤트 판정
    pub fn intercept(&self, event: &InterceptedEvent) -> Decision {
        self.gate.intercept(event)
    }

    // --- 생명주기 핸들러 ---

    /// suite 시작 (우선순위 [`STARTUP_PRECEDENCE`])
    pub async fn startup(&self, event: &EnvironmentStarted) -> Result<(), LifecycleOperationError> {
        self.sequencer.on_startup(event).await
    }

    /// 환경 시작 후 배포 (우선순위 [`DEPLOY_PRECEDENCE`])
    pub async fn deploy(&self, event: &EnvironmentStarted) -> Result<(), LifecycleOperationError> {
        self.sequencer.on_environment_start(event).await
    }

    /// 환경 시작 신호를 두 observer 순서대로 처리합니다.
    pub async fn on_environment_started(
        &self,
        event: &EnvironmentStarted,
    ) -> Result<(), LifecycleOperationError> {
        self.startup(event).await?;
        self.deploy(event).await
    }

    /// 환경 정지 전 해제
    pub async fn undeploy(&self, event: &EnvironmentStopping) -> Result<(), LifecycleOperationError> {
        self.sequencer.on_environment_stop(event).await
    }

    // --- 조회 ---

    /// 호스트에 선언하는 suite 컨텍스트
    pub fn suite_context(&self) -> Arc<ExtendedSuiteContext> {
        Arc::clone(&self.suite_context)
    }

    /// 호스트에 제공하는 시나리오 조회 계약
    pub fn scenario_provider(&self) -> Arc<dyn ScenarioProvider> {
        self.suite_context.clone()
    }

    /// 캡처된 시나리오
    pub fn scenario(&self) -> Option<Arc<DeploymentScenario>> {
        self.sequencer.scenario()
    }

    /// 시퀀서 상태
    pub async fn state(&self) -> SequencerState {
        self.sequencer.state().await
    }

    /// 진단 카운터 스냅샷
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}

impl fmt::Debug for SuiteDeployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteDeployer")
            .field("marker", self.marker_class())
            .field("generation_forwarded", &self.gate.generation_forwarded())
            .field("suite_context_active", &self.suite_context.is_active())
            .finish()
    }
}
