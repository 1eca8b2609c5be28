//! 진단 출력 — 게이트 판정과 배포/해제 동작 기록
//!
//! 디버그 토글이 켜져 있으면 모든 판정과 동작을 `suite_deployer::diagnostics`
//! target으로 `info` 레벨에 출력합니다. 카운터와 메트릭은 토글과 무관하게 항상 기록됩니다.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::info;

use suite_core::config::DiagnosticsConfig;
use suite_core::event::{DeployDeployment, Event, UndeployDeployment};
use suite_core::metrics as m;

/// 진단 출력 target
pub const DIAGNOSTICS_TARGET: &str = "suite_deployer::diagnostics";

/// 진단 기록기
#[derive(Debug, Default)]
pub struct Diagnostics {
    debug: bool,
    consumed: AtomicU64,
    forwarded: AtomicU64,
    deploys: AtomicU64,
    undeploys: AtomicU64,
}

impl Diagnostics {
    /// 디버그 토글을 지정하여 생성합니다.
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    /// 설정에서 생성합니다.
    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self::new(config.debug)
    }

    /// 진단 출력이 켜져 있는지 반환합니다.
    pub fn is_enabled(&self) -> bool {
        self.debug
    }

    /// 게이트가 이벤트를 소비했음을 기록합니다.
    pub fn event_consumed(&self, event: &dyn Event) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            m::GATE_EVENTS_CONSUMED_TOTAL,
            m::LABEL_EVENT_TYPE => event.event_type().to_owned()
        )
        .increment(1);

        if self.debug {
            info!(
                target: DIAGNOSTICS_TARGET,
                event_type = event.event_type(),
                event_id = event.event_id(),
                trace_id = %event.metadata().trace_id,
                "blocked event"
            );
        }
    }

    /// 게이트가 이벤트를 전달했음을 기록합니다.
    pub fn event_forwarded(&self, event: &dyn Event) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            m::GATE_EVENTS_FORWARDED_TOTAL,
            m::LABEL_EVENT_TYPE => event.event_type().to_owned()
        )
        .increment(1);

        if self.debug {
            info!(
                target: DIAGNOSTICS_TARGET,
                event_type = event.event_type(),
                event_id = event.event_id(),
                trace_id = %event.metadata().trace_id,
                "forwarded event"
            );
        }
    }

    /// 배포 연산 발행을 기록합니다.
    pub fn deploy(&self, event: &DeployDeployment) {
        self.deploys.fetch_add(1, Ordering::Relaxed);
        if self.debug {
            info!(
                target: DIAGNOSTICS_TARGET,
                container = %event.container,
                deployment = event.deployment.name(),
                order = event.deployment.order(),
                trace_id = %event.metadata.trace_id,
                "deploying"
            );
        }
    }

    /// 해제 연산 발행을 기록합니다.
    pub fn undeploy(&self, event: &UndeployDeployment) {
        self.undeploys.fetch_add(1, Ordering::Relaxed);
        if self.debug {
            info!(
                target: DIAGNOSTICS_TARGET,
                container = %event.container,
                deployment = event.deployment.name(),
                trace_id = %event.metadata.trace_id,
                "undeploying"
            );
        }
    }

    /// 연산 결과를 메트릭에 기록합니다.
    pub(crate) fn operation_result(&self, metric: &'static str, success: bool) {
        let result = if success { "success" } else { "failure" };
        metrics::counter!(metric, m::LABEL_RESULT => result).increment(1);
    }

    /// 현재 카운터 스냅샷을 반환합니다.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            debug: self.debug,
            events_consumed: self.consumed.load(Ordering::Relaxed),
            events_forwarded: self.forwarded.load(Ordering::Relaxed),
            deploys_issued: self.deploys.load(Ordering::Relaxed),
            undeploys_issued: self.undeploys.load(Ordering::Relaxed),
        }
    }
}

/// 진단 카운터 스냅샷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSnapshot {
    /// 진단 출력 활성화 여부
    pub debug: bool,
    /// 소비된 이벤트 수
    pub events_consumed: u64,
    /// 전달된 이벤트 수
    pub events_forwarded: u64,
    /// 발행된 배포 연산 수
    pub deploys_issued: u64,
    /// 발행된 해제 연산 수
    pub undeploys_issued: u64,
}
