//! 메트릭 상수
//!
//! suite-deployer가 기록하는 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `suite_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(suite_core::metrics::GATE_EVENTS_CONSUMED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 이벤트 타입 레이블 키
pub const LABEL_EVENT_TYPE: &str = "event_type";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Event Gate 메트릭 ─────────────────────────────────────────────

/// Gate: 소비된 이벤트 수 (counter, label: event_type)
pub const GATE_EVENTS_CONSUMED_TOTAL: &str = "suite_gate_events_consumed_total";

/// Gate: 전달된 이벤트 수 (counter, label: event_type)
pub const GATE_EVENTS_FORWARDED_TOTAL: &str = "suite_gate_events_forwarded_total";

// ─── Sequencer 메트릭 ──────────────────────────────────────────────

/// Sequencer: 배포 연산 수 (counter, label: result)
pub const SEQUENCER_DEPLOYMENTS_TOTAL: &str = "suite_sequencer_deployments_total";

/// Sequencer: 해제 연산 수 (counter, label: result)
pub const SEQUENCER_UNDEPLOYMENTS_TOTAL: &str = "suite_sequencer_undeployments_total";

/// Sequencer: 시나리오 생성 실패 수 (counter)
pub const SEQUENCER_GENERATION_FAILURES_TOTAL: &str = "suite_sequencer_generation_failures_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_follow_convention() {
        for name in [
            GATE_EVENTS_CONSUMED_TOTAL,
            GATE_EVENTS_FORWARDED_TOTAL,
            SEQUENCER_DEPLOYMENTS_TOTAL,
            SEQUENCER_UNDEPLOYMENTS_TOTAL,
            SEQUENCER_GENERATION_FAILURES_TOTAL,
        ] {
            assert!(name.starts_with("suite_"), "{name} should use suite_ prefix");
            assert!(name.ends_with("_total"), "{name} should be a counter");
        }
    }
}
