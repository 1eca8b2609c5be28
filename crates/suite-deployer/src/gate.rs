//! 이벤트 게이트 — 클래스별 생명주기 이벤트 차단
//!
//! 호스트가 클래스마다 발생시키는 관리 배포/해제 이벤트는 항상 소비합니다.
//! 배포 생성 요청은 처음 한 번만 전달하고 이후에는 프로세스 수명 동안 소비합니다.
//!
//! 판정은 [`Decision`]으로 반환되며, 디스패처가 이를 존중해야 합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use suite_core::event::{
    Decision, DeployManagedDeployments, Event, GenerateDeployment, InterceptedEvent,
    UndeployManagedDeployments,
};

use crate::diagnostics::Diagnostics;

/// 이벤트 게이트
#[derive(Debug)]
pub struct EventGate {
    /// 생성 요청 래치 (한 번 설정되면 되돌리지 않음)
    generation_latch: AtomicBool,
    diagnostics: Arc<Diagnostics>,
}

impl EventGate {
    /// 새 게이트를 생성합니다.
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            generation_latch: AtomicBool::new(false),
            diagnostics,
        }
    }

    /// 클래스별 관리 배포 이벤트 — 항상 소비
    pub fn on_deploy_managed(&self, event: &DeployManagedDeployments) -> Decision {
        self.record(event, Decision::Consume)
    }

    /// 클래스별 관리 해제 이벤트 — 항상 소비
    pub fn on_undeploy_managed(&self, event: &UndeployManagedDeployments) -> Decision {
        self.record(event, Decision::Consume)
    }

    /// 배포 생성 요청 — 처음 한 번만 전달
    pub fn on_generate_deployment(&self, event: &GenerateDeployment) -> Decision {
        let already_forwarded = self.generation_latch.swap(true, Ordering::AcqRel);
        let decision = if already_forwarded {
            Decision::Consume
        } else {
            Decision::Forward
        };
        self.record(event, decision)
    }

    /// 가로챈 이벤트를 종류별 핸들러로 보냅니다.
    pub fn intercept(&self, event: &InterceptedEvent) -> Decision {
        match event {
            InterceptedEvent::DeployManaged(e) => self.on_deploy_managed(e),
            InterceptedEvent::UndeployManaged(e) => self.on_undeploy_managed(e),
            InterceptedEvent::Generate(e) => self.on_generate_deployment(e),
        }
    }

    /// 생성 요청이 이미 한 번 전달되었는지 반환합니다.
    pub fn generation_forwarded(&self) -> bool {
        self.generation_latch.load(Ordering::Acquire)
    }

    fn record(&self, event: &dyn Event, decision: Decision) -> Decision {
        match decision {
            Decision::Consume => self.diagnostics.event_consumed(event),
            Decision::Forward => self.diagnostics.event_forwarded(event),
        }
        decision
    }
}
