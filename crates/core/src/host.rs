//! 호스트 collaborator trait — suite-deployer 확장 포인트 정의
//!
//! 호스트 오케스트레이터는 이 trait들을 구현하여 클래스 카탈로그, 클래스 컨텍스트,
//! 컨테이너 레지스트리, 배포 생성기, 배포 연산을 제공합니다.
//! suite-deployer는 반대로 [`ScenarioProvider`]를 구현하여 호스트에 시나리오를 노출합니다.
//!
//! 모든 trait은 dyn-compatible 합니다. 비동기 연산은 [`BoxFuture`]를 반환하므로
//! `Arc<dyn DeploymentOperations>` 형태로 주입할 수 있습니다.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::HostError;
use crate::event::{DeployDeployment, GenerateDeployment, UndeployDeployment};
use crate::types::{CandidateClass, ClassRef, Container, DeploymentScenario, TargetId};

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 후보 테스트 클래스 카탈로그
///
/// 등록 시점에 한 번 열거되며, 마커 판정은 suite-deployer가 수행합니다.
pub trait ClassCatalog: Send + Sync {
    /// 모든 후보 테스트 클래스를 반환합니다.
    fn candidates(&self) -> Vec<CandidateClass>;
}

impl ClassCatalog for Vec<CandidateClass> {
    fn candidates(&self) -> Vec<CandidateClass> {
        self.clone()
    }
}

/// 클래스 단위 활성화 컨텍스트
///
/// 호스트는 배포/해제가 항상 클래스 컨텍스트 안에서 일어난다고 가정합니다.
/// `activate`가 성공하면 반드시 `deactivate`가 한 번 호출됩니다.
pub trait ClassContext: Send + Sync {
    /// 클래스 컨텍스트를 활성화합니다.
    fn activate(&self, class: &ClassRef) -> Result<(), HostError>;

    /// 현재 활성 클래스 컨텍스트를 비활성화합니다.
    fn deactivate(&self) -> Result<(), HostError>;

    /// 클래스 컨텍스트가 활성 상태인지 반환합니다.
    fn is_active(&self) -> bool;

    /// 현재 활성 클래스를 반환합니다.
    fn active_class(&self) -> Option<ClassRef>;
}

/// 컨테이너 레지스트리
pub trait ContainerRegistry: Send + Sync {
    /// 대상 qualifier를 컨테이너로 해석합니다.
    fn container(&self, target: &TargetId) -> Result<Container, HostError>;
}

/// 배포 시나리오 생성기
///
/// 마커 클래스가 기술하는 배포를 시나리오로 만듭니다.
pub trait DeploymentGenerator: Send + Sync {
    /// 생성 요청을 처리하여 시나리오를 반환합니다.
    fn generate(
        &self,
        request: GenerateDeployment,
    ) -> BoxFuture<'_, Result<DeploymentScenario, HostError>>;
}

/// 컨테이너 배포/해제 연산
///
/// 타임아웃과 재시도는 구현체의 책임입니다.
pub trait DeploymentOperations: Send + Sync {
    /// 배포 하나를 컨테이너에 올립니다.
    fn deploy(&self, event: DeployDeployment) -> BoxFuture<'_, Result<(), HostError>>;

    /// 배포 하나를 컨테이너에서 내립니다.
    fn undeploy(&self, event: UndeployDeployment) -> BoxFuture<'_, Result<(), HostError>>;
}

/// 호스트에 제공하는 시나리오 조회 계약
///
/// 호스트의 리소스 주입 등은 "현재 클래스의 배포 시나리오"를 이 trait으로 조회합니다.
pub trait ScenarioProvider: Send + Sync {
    /// 클래스에 해당하는 배포 시나리오를 반환합니다.
    fn scenario_for(&self, class: &ClassRef) -> Option<Arc<DeploymentScenario>>;
}

/// suite-deployer가 사용하는 호스트 collaborator 묶음
#[derive(Clone)]
pub struct HostBindings {
    /// 클래스 컨텍스트
    pub class_context: Arc<dyn ClassContext>,
    /// 컨테이너 레지스트리
    pub registry: Arc<dyn ContainerRegistry>,
    /// 배포 시나리오 생성기
    pub generator: Arc<dyn DeploymentGenerator>,
    /// 배포/해제 연산
    pub operations: Arc<dyn DeploymentOperations>,
}

impl HostBindings {
    /// collaborator 묶음을 생성합니다.
    pub fn new(
        class_context: Arc<dyn ClassContext>,
        registry: Arc<dyn ContainerRegistry>,
        generator: Arc<dyn DeploymentGenerator>,
        operations: Arc<dyn DeploymentOperations>,
    ) -> Self {
        Self {
            class_context,
            registry,
            generator,
            operations,
        }
    }
}

impl std::fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBindings")
            .field("class_context_active", &self.class_context.is_active())
            .finish_non_exhaustive()
    }
}
