//! 배포 시퀀서 — suite 배포 시나리오 생성, 배포, 해제
//!
//! # 상태 전이
//! ```text
//! Uninitialized ──startup──> Generating ──> Generated ──env start──> Deployed ──env stop──> TornDown
//! ```
//!
//! 모든 단계는 마커 클래스의 클래스 스코프 안에서 실행되며, 스코프는 성공/실패와 무관하게
//! 반드시 해제됩니다. 신호 처리는 내부 `Mutex`로 직렬화되므로 호스트가 여러 스레드에서
//! 신호를 보내더라도 생성 → 배포 → 해제 순서가 섞이지 않습니다.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use suite_core::error::{GenerationError, HostError, LifecycleOperationError};
use suite_core::event::{
    DeployDeployment, EnvironmentStarted, EnvironmentStopping, GenerateDeployment,
    MODULE_SUITE_DEPLOYER, UndeployDeployment,
};
use suite_core::host::HostBindings;
use suite_core::metrics as m;
use suite_core::types::{ClassRef, DeploymentScenario, SuitePhase};

use crate::diagnostics::Diagnostics;
use crate::gate::EventGate;
use crate::scope::{ClassScopeGuard, ExtendedSuiteContext};

/// 시퀀서 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    /// 시작 신호 대기
    Uninitialized,
    /// 시나리오 생성 중
    Generating,
    /// 시나리오 캡처 완료
    Generated,
    /// 배포 완료
    Deployed,
    /// 해제 완료
    TornDown,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Generating => write!(f, "generating"),
            Self::Generated => write!(f, "generated"),
            Self::Deployed => write!(f, "deployed"),
            Self::TornDown => write!(f, "torn_down"),
        }
    }
}

/// 배포 시퀀서
pub struct DeploymentSequencer {
    marker: ClassRef,
    host: HostBindings,
    gate: Arc<EventGate>,
    suite_context: Arc<ExtendedSuiteContext>,
    diagnostics: Arc<Diagnostics>,
    state: Mutex<SequencerState>,
}

impl DeploymentSequencer {
    /// 새 시퀀서를 생성합니다.
    pub fn new(
        marker: ClassRef,
        host: HostBindings,
        gate: Arc<EventGate>,
        suite_context: Arc<ExtendedSuiteContext>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            marker,
            host,
            gate,
            suite_context,
            diagnostics,
            state: Mutex::new(SequencerState::Uninitialized),
        }
    }

    /// 마커 클래스
    pub fn marker(&self) -> &ClassRef {
        &self.marker
    }

    /// 현재 상태를 반환합니다.
    pub async fn state(&self) -> SequencerState {
        *self.state.lock().await
    }

    /// 캡처된 시나리오를 반환합니다. 생성 전이거나 생성이 실패했으면 `None`입니다.
    pub fn scenario(&self) -> Option<Arc<DeploymentScenario>> {
        self.suite_context.scenario()
    }

    /// suite 시작 신호 — 시나리오를 한 번 생성하고 suite 컨텍스트에 게시합니다.
    ///
    /// 두 번째 이후 호출은 아무 일도 하지 않습니다.
    /// 생성 실패는 경고 로그만 남기고 빈 시나리오로 진행합니다.
    ///
    /// # Errors
    /// 클래스 스코프 활성화/해제가 실패하면 [`LifecycleOperationError`]
    pub async fn on_startup(&self, event: &EnvironmentStarted) -> Result<(), LifecycleOperationError> {
        let mut state = self.state.lock().await;
        let current = *state;
        if current != SequencerState::Uninitialized {
            debug!(state = %current, "suite deployment already generated, skipping startup");
            return Ok(());
        }
        *state = SequencerState::Generating;

        let trace_id = event.metadata.trace_id.clone();
        let generated = self
            .in_class_scope(SuitePhase::Generate, async {
                Ok::<_, HostError>(self.generate(trace_id).await)
            })
            .await?;

        // 활성 상태를 본 쪽이 시나리오도 보도록 게시가 먼저입니다.
        match generated {
            Some(scenario) => {
                info!(
                    marker = %self.marker,
                    deployments = scenario.len(),
                    "suite deployment scenario captured"
                );
                self.suite_context.publish_scenario(Arc::new(scenario));
            }
            None => warn!(marker = %self.marker, "no suite deployment scenario captured"),
        }
        self.suite_context.activate();
        *state = SequencerState::Generated;
        Ok(())
    }

    /// 환경 시작 신호 — 관리 배포를 배포 순서대로 올립니다.
    ///
    /// 이미 배포된 단위는 건너뜁니다. 시나리오가 없으면 연산을 하나도 발행하지 않습니다.
    ///
    /// # Errors
    /// 컨테이너 조회나 배포 연산이 실패하면 [`LifecycleOperationError`]
    pub async fn on_environment_start(
        &self,
        event: &EnvironmentStarted,
    ) -> Result<(), LifecycleOperationError> {
        let mut state = self.state.lock().await;
        let scenario = self.scenario();
        let trace_id = event.metadata.trace_id.as_str();

        self.in_class_scope(SuitePhase::Deploy, async {
            let deployed = match scenario.as_deref() {
                Some(scenario) => self.deploy_all(scenario, trace_id).await,
                None => {
                    debug!(marker = %self.marker, "no scenario to deploy");
                    Ok(())
                }
            };
            // 일부 컨테이너 어댑터가 suite 컨텍스트를 비활성 상태로 남기는 경우에 대한 보정
            if !self.suite_context.is_active() {
                self.suite_context.deactivate();
            }
            deployed
        })
        .await?;

        if matches!(*state, SequencerState::Generated | SequencerState::Deployed) {
            *state = SequencerState::Deployed;
        }
        Ok(())
    }

    /// 환경 정지 신호 — 배포된 단위를 시나리오의 해제 순서대로 내립니다.
    ///
    /// # Errors
    /// 컨테이너 조회나 해제 연산이 실패하면 [`LifecycleOperationError`]
    pub async fn on_environment_stop(
        &self,
        event: &EnvironmentStopping,
    ) -> Result<(), LifecycleOperationError> {
        let mut state = self.state.lock().await;
        let scenario = self.scenario();
        let trace_id = event.metadata.trace_id.as_str();

        self.in_class_scope(SuitePhase::Undeploy, async {
            match scenario.as_deref() {
                Some(scenario) => self.undeploy_all(scenario, trace_id).await,
                None => Ok(()),
            }
        })
        .await?;

        if *state != SequencerState::Uninitialized {
            *state = SequencerState::TornDown;
        }
        Ok(())
    }

    async fn generate(&self, trace_id: String) -> Option<DeploymentScenario> {
        let request =
            GenerateDeployment::with_trace(MODULE_SUITE_DEPLOYER, self.marker.clone(), trace_id);
        if !self.gate.on_generate_deployment(&request).is_forward() {
            warn!(marker = %self.marker, "generation request was consumed before suite startup");
            return None;
        }

        match self.host.generator.generate(request).await {
            Ok(scenario) => Some(scenario),
            Err(source) => {
                let err = GenerationError {
                    class: self.marker.name().to_owned(),
                    source,
                };
                metrics::counter!(m::SEQUENCER_GENERATION_FAILURES_TOTAL).increment(1);
                warn!(error = %err, cause = ?err.source, "could not generate suite deployment, continuing without it");
                None
            }
        }
    }

    async fn deploy_all(&self, scenario: &DeploymentScenario, trace_id: &str) -> Result<(), HostError> {
        for deployment in scenario.managed_deployments_in_deploy_order() {
            if deployment.is_deployed() {
                debug!(deployment = deployment.name(), "already deployed, skipping");
                continue;
            }
            let container = self.host.registry.container(deployment.target())?;
            let operation = DeployDeployment::with_trace(container, deployment.clone(), trace_id);
            self.diagnostics.deploy(&operation);

            let result = self.host.operations.deploy(operation).await;
            self.diagnostics
                .operation_result(m::SEQUENCER_DEPLOYMENTS_TOTAL, result.is_ok());
            result?;
            deployment.mark_deployed();
        }
        Ok(())
    }

    async fn undeploy_all(&self, scenario: &DeploymentScenario, trace_id: &str) -> Result<(), HostError> {
        for deployment in scenario.deployed_deployments_in_undeploy_order() {
            let container = self.host.registry.container(deployment.target())?;
            let operation = UndeployDeployment::with_trace(container, deployment.clone(), trace_id);
            self.diagnostics.undeploy(&operation);

            let result = self.host.operations.undeploy(operation).await;
            self.diagnostics
                .operation_result(m::SEQUENCER_UNDEPLOYMENTS_TOTAL, result.is_ok());
            result?;
            deployment.mark_undeployed();
        }
        Ok(())
    }

    /// 마커 클래스의 클래스 스코프 안에서 `body`를 실행합니다.
    ///
    /// 본문 에러와 스코프 해제 에러가 함께 나면 본문 에러가 원인으로 남고
    /// 해제 에러는 `release_failure`로 덧붙습니다.
    async fn in_class_scope<T, F>(&self, phase: SuitePhase, body: F) -> Result<T, LifecycleOperationError>
    where
        F: Future<Output = Result<T, HostError>>,
    {
        let guard = ClassScopeGuard::activate(self.host.class_context.as_ref(), &self.marker)
            .map_err(|e| LifecycleOperationError::new(phase, e))?;
        let outcome = body.await;
        let released = guard.release();

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release)) => Err(LifecycleOperationError::new(phase, release)),
            (Err(source), Ok(())) => Err(LifecycleOperationError::new(phase, source)),
            (Err(source), Err(release)) => {
                Err(LifecycleOperationError::new(phase, source).with_release_failure(release))
            }
        }
    }
}

impl fmt::Debug for DeploymentSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentSequencer")
            .field("marker", &self.marker)
            .field("suite_context", &self.suite_context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use suite_core::error::HostError;
    use suite_core::host::{
        BoxFuture, ClassContext, ContainerRegistry, DeploymentGenerator, DeploymentOperations,
    };
    use suite_core::types::{Container, DeploymentDescription, TargetId};

    #[derive(Default)]
    struct StubHost {
        log: StdMutex<Vec<String>>,
        deactivate_fails: AtomicBool,
        generate_fails: bool,
        deploy_fails_for: Option<&'static str>,
    }

    impl StubHost {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn push(&self, entry: String) {
            self.log.lock().unwrap().push(entry);
        }
    }

    impl ClassContext for StubHost {
        fn activate(&self, class: &ClassRef) -> Result<(), HostError> {
            self.push(format!("activate:{class}"));
            Ok(())
        }
        fn deactivate(&self) -> Result<(), HostError> {
            self.push("deactivate".to_owned());
            if self.deactivate_fails.load(Ordering::SeqCst) {
                return Err(HostError::Context("stuck".to_owned()));
            }
            Ok(())
        }
        fn is_active(&self) -> bool {
            false
        }
        fn active_class(&self) -> Option<ClassRef> {
            None
        }
    }

    impl ContainerRegistry for StubHost {
        fn container(&self, target: &TargetId) -> Result<Container, HostError> {
            Ok(Container::new(target.as_str()))
        }
    }

    impl DeploymentGenerator for StubHost {
        fn generate(
            &self,
            request: GenerateDeployment,
        ) -> BoxFuture<'_, Result<DeploymentScenario, HostError>> {
            Box::pin(async move {
                self.push(format!("generate:{}", request.class));
                if self.generate_fails {
                    return Err(HostError::GenerationFailed("broken descriptor".to_owned()));
                }
                Ok(DeploymentScenario::from_descriptions(vec![
                    DeploymentDescription::new("web", 0),
                    DeploymentDescription::new("db", 1),
                ])
                .unwrap())
            })
        }
    }

    impl DeploymentOperations for StubHost {
        fn deploy(&self, event: DeployDeployment) -> BoxFuture<'_, Result<(), HostError>> {
            Box::pin(async move {
                let name = event.deployment.name().to_owned();
                self.push(format!("deploy:{name}"));
                if self.deploy_fails_for == Some(name.as_str()) {
                    return Err(HostError::OperationFailed {
                        operation: "deploy".to_owned(),
                        deployment: name,
                        reason: "boom".to_owned(),
                    });
                }
                Ok(())
            })
        }
        fn undeploy(&self, event: UndeployDeployment) -> BoxFuture<'_, Result<(), HostError>> {
            Box::pin(async move {
                self.push(format!("undeploy:{}", event.deployment.name()));
                Ok(())
            })
        }
    }

    fn sequencer(host: Arc<StubHost>) -> DeploymentSequencer {
        let marker = ClassRef::new("a.M");
        let diagnostics = Arc::new(Diagnostics::new(false));
        DeploymentSequencer::new(
            marker.clone(),
            HostBindings::new(host.clone(), host.clone(), host.clone(), host),
            Arc::new(EventGate::new(Arc::clone(&diagnostics))),
            Arc::new(ExtendedSuiteContext::new(marker)),
            diagnostics,
        )
    }

    #[tokio::test]
    async fn full_lifecycle_walks_every_state() {
        let host = Arc::new(StubHost::default());
        let seq = sequencer(Arc::clone(&host));
        assert_eq!(seq.state().await, SequencerState::Uninitialized);

        let started = EnvironmentStarted::new();
        seq.on_startup(&started).await.unwrap();
        assert_eq!(seq.state().await, SequencerState::Generated);
        assert_eq!(seq.scenario().unwrap().len(), 2);

        seq.on_environment_start(&started).await.unwrap();
        assert_eq!(seq.state().await, SequencerState::Deployed);

        seq.on_environment_stop(&EnvironmentStopping::new()).await.unwrap();
        assert_eq!(seq.state().await, SequencerState::TornDown);

        assert_eq!(
            host.log(),
            vec![
                "activate:a.M",
                "generate:a.M",
                "deactivate",
                "activate:a.M",
                "deploy:web",
                "deploy:db",
                "deactivate",
                "activate:a.M",
                "undeploy:db",
                "undeploy:web",
                "deactivate",
            ]
        );
    }

    #[tokio::test]
    async fn repeated_startup_generates_once() {
        let host = Arc::new(StubHost::default());
        let seq = sequencer(Arc::clone(&host));
        let started = EnvironmentStarted::new();

        seq.on_startup(&started).await.unwrap();
        seq.on_startup(&started).await.unwrap();

        let generations = host.log().iter().filter(|e| e.starts_with("generate")).count();
        assert_eq!(generations, 1);
    }

    #[tokio::test]
    async fn repeated_environment_start_deploys_each_unit_once() {
        let host = Arc::new(StubHost::default());
        let seq = sequencer(Arc::clone(&host));
        let started = EnvironmentStarted::new();

        seq.on_startup(&started).await.unwrap();
        seq.on_environment_start(&started).await.unwrap();
        seq.on_environment_start(&started).await.unwrap();

        let deploys = host.log().iter().filter(|e| e.starts_with("deploy:")).count();
        assert_eq!(deploys, 2);
    }

    #[tokio::test]
    async fn generation_failure_is_swallowed_and_deploys_nothing() {
        let host = Arc::new(StubHost {
            generate_fails: true,
            ..Default::default()
        });
        let seq = sequencer(Arc::clone(&host));
        let started = EnvironmentStarted::new();

        seq.on_startup(&started).await.unwrap();
        assert!(seq.scenario().is_none());
        assert_eq!(seq.state().await, SequencerState::Generated);

        seq.on_environment_start(&started).await.unwrap();
        seq.on_environment_stop(&EnvironmentStopping::new()).await.unwrap();
        assert!(!host.log().iter().any(|e| e.contains("deploy:")));
    }

    #[tokio::test]
    async fn deploy_before_startup_issues_no_operations() {
        let host = Arc::new(StubHost::default());
        let seq = sequencer(Arc::clone(&host));

        seq.on_environment_start(&EnvironmentStarted::new()).await.unwrap();
        assert_eq!(seq.state().await, SequencerState::Uninitialized);
        assert!(!host.log().iter().any(|e| e.starts_with("deploy:")));
    }

    #[tokio::test]
    async fn operation_failure_keeps_original_cause_and_releases_scope() {
        let host = Arc::new(StubHost {
            deploy_fails_for: Some("db"),
            ..Default::default()
        });
        let seq = sequencer(Arc::clone(&host));
        let started = EnvironmentStarted::new();
        seq.on_startup(&started).await.unwrap();

        let err = seq.on_environment_start(&started).await.unwrap_err();
        assert_eq!(err.phase, SuitePhase::Deploy);
        assert!(matches!(err.source, HostError::OperationFailed { .. }));
        assert!(err.release_failure.is_none());
        assert_eq!(host.log().last().unwrap(), "deactivate");

        let scenario = seq.scenario().unwrap();
        assert!(scenario.deployment("web").unwrap().is_deployed());
        assert!(!scenario.deployment("db").unwrap().is_deployed());
    }

    #[tokio::test]
    async fn release_failure_is_chained_not_replacing() {
        let host = Arc::new(StubHost {
            deploy_fails_for: Some("web"),
            ..Default::default()
        });
        let seq = sequencer(Arc::clone(&host));
        let started = EnvironmentStarted::new();
        seq.on_startup(&started).await.unwrap();

        host.deactivate_fails.store(true, Ordering::SeqCst);
        let err = seq.on_environment_start(&started).await.unwrap_err();
        assert!(matches!(err.source, HostError::OperationFailed { .. }));
        assert!(matches!(err.release_failure, Some(HostError::Context(_))));
        assert!(err.to_string().contains("scope release also failed"));
    }

    #[tokio::test]
    async fn release_failure_alone_surfaces_as_lifecycle_error() {
        let host = Arc::new(StubHost {
            deactivate_fails: AtomicBool::new(true),
            ..Default::default()
        });
        let seq = sequencer(Arc::clone(&host));

        let err = seq.on_startup(&EnvironmentStarted::new()).await.unwrap_err();
        assert_eq!(err.phase, SuitePhase::Generate);
        assert!(matches!(err.source, HostError::Context(_)));
        assert!(err.release_failure.is_none());
    }
}
