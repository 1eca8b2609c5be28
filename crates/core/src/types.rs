//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 마커 클래스, 컨테이너, 배포 단위, 배포 시나리오를 정의합니다.
//! 호스트 collaborator와 suite-deployer는 이 타입들로 데이터를 교환합니다.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

// ─── ClassRef ────────────────────────────────────────────────────────

/// 테스트 클래스 식별자 (fully-qualified 이름)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassRef(String);

impl ClassRef {
    /// 클래스 이름으로 식별자를 생성합니다.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 클래스 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── MarkerKind ──────────────────────────────────────────────────────

/// suite 배포 마커 종류
///
/// 정식 마커와, 하위 호환을 위해 남겨둔 오타 별칭 두 가지를 모두 인식합니다.
/// 정식 마커가 하나라도 있으면 별칭은 무시됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    /// 정식 마커 (`@SuiteDeployment`)
    SuiteDeployment,
    /// deprecated 오타 별칭 (`@SuitDeployment`)
    #[serde(rename = "suit-deployment")]
    LegacySuitDeployment,
}

impl MarkerKind {
    /// 검사 우선순위 순서 (정식 마커 → 별칭)
    pub const PRECEDENCE: [MarkerKind; 2] =
        [MarkerKind::SuiteDeployment, MarkerKind::LegacySuitDeployment];

    /// 로그/에러 메시지에 사용하는 어노테이션 표기
    pub fn annotation(&self) -> &'static str {
        match self {
            Self::SuiteDeployment => "@SuiteDeployment",
            Self::LegacySuitDeployment => "@SuitDeployment",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuiteDeployment => write!(f, "suite-deployment"),
            Self::LegacySuitDeployment => write!(f, "suit-deployment"),
        }
    }
}

/// 카탈로그가 제공하는 후보 테스트 클래스
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateClass {
    /// 클래스 식별자
    pub class: ClassRef,
    /// 클래스에 붙은 마커 목록
    #[serde(default)]
    pub markers: Vec<MarkerKind>,
}

impl CandidateClass {
    /// 마커 없는 후보 클래스를 생성합니다.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: ClassRef::new(class),
            markers: Vec::new(),
        }
    }

    /// 마커를 추가합니다.
    pub fn with_marker(mut self, marker: MarkerKind) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    /// 해당 마커를 가지고 있는지 검사합니다.
    pub fn has_marker(&self, marker: MarkerKind) -> bool {
        self.markers.contains(&marker)
    }
}

// ─── Container ───────────────────────────────────────────────────────

/// 배포 대상 컨테이너 qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// 기본 컨테이너를 가리키는 qualifier
    pub const DEFAULT: &'static str = "_DEFAULT_";

    /// qualifier로 대상을 생성합니다.
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    /// qualifier 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 기본 컨테이너 대상인지 검사합니다.
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 컨테이너 레지스트리가 돌려주는 컨테이너 핸들
///
/// suite-deployer는 이름 외의 내용을 해석하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// 컨테이너 이름
    pub name: String,
    /// 컨테이너별 속성
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Container {
    /// 속성 없는 컨테이너 핸들을 생성합니다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ─── Deployment ──────────────────────────────────────────────────────

/// 배포 단위 기술자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDescription {
    /// 배포 이름
    pub name: String,
    /// 대상 컨테이너
    #[serde(default)]
    pub target: TargetId,
    /// 배포 순서 (오름차순으로 배포)
    #[serde(default)]
    pub order: i32,
    /// 명시적 해제 순서 (없으면 배포 순서의 역순)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undeploy_order: Option<i32>,
    /// 관리 배포 여부 (false면 테스트가 직접 배포)
    #[serde(default = "default_managed")]
    pub managed: bool,
    /// 컨테이너별 설정
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

fn default_managed() -> bool {
    true
}

impl DeploymentDescription {
    /// 기본 컨테이너를 대상으로 하는 관리 배포를 생성합니다.
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            target: TargetId::default(),
            order,
            undeploy_order: None,
            managed: true,
            config: BTreeMap::new(),
        }
    }

    /// 대상 컨테이너를 지정합니다.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = TargetId::new(target);
        self
    }

    /// 명시적 해제 순서를 지정합니다.
    pub fn with_undeploy_order(mut self, order: i32) -> Self {
        self.undeploy_order = Some(order);
        self
    }

    /// 비관리 배포로 표시합니다.
    pub fn unmanaged(mut self) -> Self {
        self.managed = false;
        self
    }
}

/// 시나리오 안의 배포 단위
///
/// 시나리오는 캡처 후 `Arc`로 공유되므로 배포 상태는 원자적 플래그로 추적합니다.
#[derive(Debug)]
pub struct Deployment {
    description: DeploymentDescription,
    deployed: AtomicBool,
}

impl Deployment {
    /// 아직 배포되지 않은 배포 단위를 생성합니다.
    pub fn new(description: DeploymentDescription) -> Self {
        Self {
            description,
            deployed: AtomicBool::new(false),
        }
    }

    /// 배포 기술자를 반환합니다.
    pub fn description(&self) -> &DeploymentDescription {
        &self.description
    }

    /// 배포 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// 대상 컨테이너를 반환합니다.
    pub fn target(&self) -> &TargetId {
        &self.description.target
    }

    /// 배포 순서를 반환합니다.
    pub fn order(&self) -> i32 {
        self.description.order
    }

    /// 현재 배포되어 있는지 반환합니다.
    pub fn is_deployed(&self) -> bool {
        self.deployed.load(Ordering::Acquire)
    }

    /// 배포 완료로 표시합니다.
    pub fn mark_deployed(&self) {
        self.deployed.store(true, Ordering::Release);
    }

    /// 배포 해제로 표시합니다.
    pub fn mark_undeployed(&self) {
        self.deployed.store(false, Ordering::Release);
    }
}

impl Clone for Deployment {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            deployed: AtomicBool::new(self.is_deployed()),
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (target={}, order={})",
            self.description.name, self.description.target, self.description.order
        )
    }
}

// ─── DeploymentScenario ──────────────────────────────────────────────

/// 배포 시나리오 — 한 번의 suite 실행에서 배포할 단위들의 순서 있는 집합
///
/// 배포 순서와 해제 순서는 각각 시나리오가 정의하며,
/// 서로 정확한 역순일 필요는 없습니다.
#[derive(Debug, Clone, Default)]
pub struct DeploymentScenario {
    deployments: Vec<Deployment>,
}

impl DeploymentScenario {
    /// 빈 시나리오를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기술자 목록으로 시나리오를 생성합니다.
    ///
    /// 이름이 비었거나 중복된 배포가 있으면 에러를 반환합니다.
    pub fn from_descriptions(
        descriptions: impl IntoIterator<Item = DeploymentDescription>,
    ) -> Result<Self, ScenarioError> {
        let mut scenario = Self::new();
        for description in descriptions {
            scenario.add_deployment(description)?;
        }
        Ok(scenario)
    }

    /// 배포를 추가합니다. 선언 순서가 보존됩니다.
    pub fn add_deployment(&mut self, description: DeploymentDescription) -> Result<(), ScenarioError> {
        if description.name.trim().is_empty() {
            return Err(ScenarioError::EmptyName);
        }
        if self.deployment(&description.name).is_some() {
            return Err(ScenarioError::DuplicateDeployment {
                name: description.name,
            });
        }
        self.deployments.push(Deployment::new(description));
        Ok(())
    }

    /// 선언 순서대로 모든 배포를 반환합니다.
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    /// 이름으로 배포를 조회합니다.
    pub fn deployment(&self, name: &str) -> Option<&Deployment> {
        self.deployments.iter().find(|d| d.name() == name)
    }

    /// 배포 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    /// 배포가 하나도 없는지 반환합니다.
    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    /// 시나리오가 참조하는 대상 컨테이너 집합
    pub fn targets(&self) -> HashSet<&TargetId> {
        self.deployments.iter().map(|d| d.target()).collect()
    }

    /// 관리 배포를 배포 순서(order 오름차순)로 반환합니다.
    ///
    /// 같은 order는 선언 순서를 유지합니다 (stable sort).
    pub fn managed_deployments_in_deploy_order(&self) -> Vec<&Deployment> {
        let mut managed: Vec<&Deployment> = self
            .deployments
            .iter()
            .filter(|d| d.description.managed)
            .collect();
        managed.sort_by_key(|d| d.order());
        managed
    }

    /// 배포된 단위를 해제 순서로 반환합니다.
    ///
    /// `undeploy_order`가 지정된 배포가 먼저(오름차순), 나머지는 order 내림차순입니다.
    pub fn deployed_deployments_in_undeploy_order(&self) -> Vec<&Deployment> {
        let mut deployed: Vec<&Deployment> =
            self.deployments.iter().filter(|d| d.is_deployed()).collect();
        deployed.sort_by_key(|d| match d.description.undeploy_order {
            Some(explicit) => (0, i64::from(explicit)),
            None => (1, -i64::from(d.order())),
        });
        deployed
    }
}

// ─── SuitePhase ──────────────────────────────────────────────────────

/// suite 생명주기 단계 — 에러와 진단 로그에서 단계 이름으로 사용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuitePhase {
    /// 배포 시나리오 생성
    Generate,
    /// 배포
    Deploy,
    /// 배포 해제
    Undeploy,
}

impl fmt::Display for SuitePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Deploy => write!(f, "deploy"),
            Self::Undeploy => write!(f, "undeploy"),
        }
    }
}
