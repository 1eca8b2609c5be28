//! suite 배포 스코프 — 클래스 컨텍스트 활성화 guard와 suite 컨텍스트
//!
//! - [`ClassScopeGuard`]: 마커 클래스의 클래스 컨텍스트를 활성화하고,
//!   `release` 또는 drop 시점에 반드시 한 번 비활성화합니다.
//! - [`ExtendedSuiteContext`]: suite 전체 컨텍스트의 활성 상태와
//!   캡처된 배포 시나리오를 보관하며 호스트에 [`ScenarioProvider`]로 노출됩니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use suite_core::error::HostError;
use suite_core::host::{ClassContext, ScenarioProvider};
use suite_core::types::{ClassRef, DeploymentScenario};

// ─── ClassScopeGuard ─────────────────────────────────────────────────

/// 클래스 컨텍스트 활성화 guard
///
/// 활성화에 성공한 경우에만 생성되므로, guard가 존재하면 비활성화가 정확히 한 번 일어납니다.
/// 해제 에러를 받아야 하면 [`release`](Self::release)를 호출하고,
/// 그렇지 않은 경로(panic, 조기 반환)에서는 `Drop`이 비활성화를 수행합니다.
#[must_use = "dropping the guard deactivates the class context immediately"]
pub struct ClassScopeGuard<'a> {
    context: &'a dyn ClassContext,
    class: ClassRef,
    released: bool,
}

impl<'a> ClassScopeGuard<'a> {
    /// 클래스 컨텍스트를 활성화하고 guard를 반환합니다.
    ///
    /// 활성화가 실패하면 비활성화할 것이 없으므로 guard를 만들지 않습니다.
    pub fn activate(context: &'a dyn ClassContext, class: &ClassRef) -> Result<Self, HostError> {
        context.activate(class)?;
        debug!(class = %class, "class scope activated");
        Ok(Self {
            context,
            class: class.clone(),
            released: false,
        })
    }

    /// 클래스 컨텍스트를 비활성화하고 결과를 반환합니다.
    pub fn release(mut self) -> Result<(), HostError> {
        self.released = true;
        let result = self.context.deactivate();
        debug!(class = %self.class, ok = result.is_ok(), "class scope released");
        result
    }
}

impl Drop for ClassScopeGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.context.deactivate() {
            warn!(class = %self.class, error = %e, "failed to deactivate class scope on drop");
        }
    }
}

impl std::fmt::Debug for ClassScopeGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassScopeGuard")
            .field("class", &self.class)
            .field("released", &self.released)
            .finish()
    }
}

// ─── ExtendedSuiteContext ────────────────────────────────────────────

/// suite 전체 컨텍스트
///
/// 마커 클래스에 묶인 단일 컨텍스트로, suite 실행 내내 활성 상태를 유지합니다.
/// 시나리오는 한 번만 게시되며 (`OnceLock`), 게시 이후 읽는 쪽은 항상 완성된 값을 봅니다.
#[derive(Debug)]
pub struct ExtendedSuiteContext {
    marker: ClassRef,
    active: AtomicBool,
    scenario: OnceLock<Arc<DeploymentScenario>>,
}

impl ExtendedSuiteContext {
    /// 마커 클래스에 묶인 비활성 컨텍스트를 생성합니다.
    pub fn new(marker: ClassRef) -> Self {
        Self {
            marker,
            active: AtomicBool::new(false),
            scenario: OnceLock::new(),
        }
    }

    /// 컨텍스트가 묶인 마커 클래스
    pub fn marker(&self) -> &ClassRef {
        &self.marker
    }

    /// 컨텍스트를 활성화합니다.
    pub fn activate(&self) {
        if !self.active.swap(true, Ordering::AcqRel) {
            debug!(marker = %self.marker, "suite context activated");
        }
    }

    /// 컨텍스트를 비활성화합니다. 이미 비활성이면 아무 일도 하지 않습니다.
    pub fn deactivate(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            debug!(marker = %self.marker, "suite context deactivated");
        }
    }

    /// 활성 상태인지 반환합니다.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// 시나리오를 게시합니다.
    ///
    /// 먼저 게시된 시나리오가 유지되며, 이후 호출은 `false`를 반환합니다.
    pub fn publish_scenario(&self, scenario: Arc<DeploymentScenario>) -> bool {
        self.scenario.set(scenario).is_ok()
    }

    /// 게시된 시나리오를 반환합니다.
    pub fn scenario(&self) -> Option<Arc<DeploymentScenario>> {
        self.scenario.get().cloned()
    }
}

impl ScenarioProvider for ExtendedSuiteContext {
    /// 활성 상태에서는 어떤 클래스가 물어도 suite 시나리오를 돌려줍니다.
    fn scenario_for(&self, _class: &ClassRef) -> Option<Arc<DeploymentScenario>> {
        if self.is_active() {
            self.scenario()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use suite_core::types::DeploymentDescription;

    /// activate/deactivate 호출을 기록하는 컨텍스트
    #[derive(Default)]
    struct RecordingContext {
        calls: Mutex<Vec<String>>,
        fail_activate: bool,
        fail_deactivate: bool,
    }

    impl ClassContext for RecordingContext {
        fn activate(&self, class: &ClassRef) -> Result<(), HostError> {
            self.calls.lock().unwrap().push(format!("activate:{class}"));
            if self.fail_activate {
                return Err(HostError::Context("activate refused".to_owned()));
            }
            Ok(())
        }

        fn deactivate(&self) -> Result<(), HostError> {
            self.calls.lock().unwrap().push("deactivate".to_owned());
            if self.fail_deactivate {
                return Err(HostError::Context("deactivate refused".to_owned()));
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

    #[test]
    fn release_deactivates_once() {
        let ctx = RecordingContext::default();
        let guard = ClassScopeGuard::activate(&ctx, &ClassRef::new("a.M")).unwrap();
        guard.release().unwrap();
        assert_eq!(*ctx.calls.lock().unwrap(), vec!["activate:a.M", "deactivate"]);
    }

    #[test]
    fn drop_deactivates_when_not_released() {
        let ctx = RecordingContext::default();
        {
            let _guard = ClassScopeGuard::activate(&ctx, &ClassRef::new("a.M")).unwrap();
        }
        assert_eq!(*ctx.calls.lock().unwrap(), vec!["activate:a.M", "deactivate"]);
    }

    #[test]
    fn failed_activation_does_not_deactivate() {
        let ctx = RecordingContext {
            fail_activate: true,
            ..Default::default()
        };
        let result = ClassScopeGuard::activate(&ctx, &ClassRef::new("a.M"));
        assert!(result.is_err());
        assert_eq!(*ctx.calls.lock().unwrap(), vec!["activate:a.M"]);
    }

    #[test]
    fn release_surfaces_deactivate_failure() {
        let ctx = RecordingContext {
            fail_deactivate: true,
            ..Default::default()
        };
        let guard = ClassScopeGuard::activate(&ctx, &ClassRef::new("a.M")).unwrap();
        assert!(matches!(guard.release(), Err(HostError::Context(_))));
        // release 후 drop에서 다시 비활성화하지 않음
        assert_eq!(ctx.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn suite_context_activation_is_idempotent() {
        let ctx = ExtendedSuiteContext::new(ClassRef::new("a.M"));
        assert!(!ctx.is_active());
        ctx.activate();
        ctx.activate();
        assert!(ctx.is_active());
        ctx.deactivate();
        ctx.deactivate();
        assert!(!ctx.is_active());
    }

    #[test]
    fn first_published_scenario_wins() {
        let ctx = ExtendedSuiteContext::new(ClassRef::new("a.M"));
        let first =
            DeploymentScenario::from_descriptions(vec![DeploymentDescription::new("web", 0)])
                .unwrap();
        assert!(ctx.publish_scenario(Arc::new(first)));
        assert!(!ctx.publish_scenario(Arc::new(DeploymentScenario::new())));
        assert_eq!(ctx.scenario().unwrap().len(), 1);
    }

    #[test]
    fn provider_serves_scenario_only_while_active() {
        let ctx = ExtendedSuiteContext::new(ClassRef::new("a.M"));
        ctx.publish_scenario(Arc::new(DeploymentScenario::new()));
        let other = ClassRef::new("a.FooIT");

        assert!(ctx.scenario_for(&other).is_none());
        ctx.activate();
        assert!(ctx.scenario_for(&other).is_some());
        assert!(ctx.scenario_for(ctx.marker()).is_some());
    }
}
