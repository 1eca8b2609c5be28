//! 마커 해석기 — suite 배포를 기술하는 단일 클래스 선택
//!
//! 카탈로그의 후보 클래스 중 마커를 가진 클래스를 찾습니다.
//! 정식 마커를 먼저 검사하고, 정식 마커가 하나도 없을 때만 deprecated 별칭을 검사합니다.

use tracing::error;

use suite_core::error::MarkerError;
use suite_core::host::ClassCatalog;
use suite_core::types::{CandidateClass, ClassRef, MarkerKind};

/// 마커 해석기
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerResolver;

impl MarkerResolver {
    /// 카탈로그에서 마커 클래스를 해석합니다.
    ///
    /// # Returns
    /// - `Ok(Some(class))`: 마커 클래스가 정확히 하나
    /// - `Ok(None)`: 어떤 종류의 마커도 없음
    ///
    /// # Errors
    /// 같은 종류의 마커가 둘 이상의 클래스에 있으면 [`MarkerError::Duplicate`]
    pub fn resolve(catalog: &dyn ClassCatalog) -> Result<Option<ClassRef>, MarkerError> {
        Self::resolve_candidates(&catalog.candidates())
    }

    /// 후보 목록에서 마커 클래스를 해석합니다.
    pub fn resolve_candidates(
        candidates: &[CandidateClass],
    ) -> Result<Option<ClassRef>, MarkerError> {
        for marker in MarkerKind::PRECEDENCE {
            let mut matches: Vec<&ClassRef> = candidates
                .iter()
                .filter(|c| c.has_marker(marker))
                .map(|c| &c.class)
                .collect();

            match matches.len() {
                0 => continue,
                1 => return Ok(Some(matches[0].clone())),
                _ => {
                    matches.sort();
                    matches.dedup();
                    if matches.len() == 1 {
                        return Ok(Some(matches[0].clone()));
                    }
                    for class in &matches {
                        error!(
                            annotation = marker.annotation(),
                            class = %class,
                            "duplicated class annotated with suite marker"
                        );
                    }
                    return Err(MarkerError::Duplicate {
                        annotation: marker.annotation().to_owned(),
                        classes: matches.iter().map(|c| c.name().to_owned()).collect(),
                    });
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(name: &str) -> CandidateClass {
        CandidateClass::new(name).with_marker(MarkerKind::SuiteDeployment)
    }

    fn legacy(name: &str) -> CandidateClass {
        CandidateClass::new(name).with_marker(MarkerKind::LegacySuitDeployment)
    }

    #[test]
    fn no_markers_resolves_to_none() {
        let candidates = vec![CandidateClass::new("a.FooIT"), CandidateClass::new("a.BarIT")];
        assert_eq!(MarkerResolver::resolve_candidates(&candidates).unwrap(), None);
    }

    #[test]
    fn empty_catalog_resolves_to_none() {
        assert_eq!(MarkerResolver::resolve_candidates(&[]).unwrap(), None);
    }

    #[test]
    fn single_canonical_marker_is_selected() {
        let candidates = vec![CandidateClass::new("a.FooIT"), canonical("a.Deployments")];
        assert_eq!(
            MarkerResolver::resolve_candidates(&candidates).unwrap(),
            Some(ClassRef::new("a.Deployments"))
        );
    }

    #[test]
    fn canonical_wins_over_legacy_aliases() {
        let candidates = vec![legacy("a.Old1"), canonical("a.New"), legacy("a.Old2")];
        assert_eq!(
            MarkerResolver::resolve_candidates(&candidates).unwrap(),
            Some(ClassRef::new("a.New"))
        );
    }

    #[test]
    fn single_legacy_marker_is_selected_without_canonical() {
        let candidates = vec![CandidateClass::new("a.FooIT"), legacy("a.Old")];
        assert_eq!(
            MarkerResolver::resolve_candidates(&candidates).unwrap(),
            Some(ClassRef::new("a.Old"))
        );
    }

    #[test]
    fn duplicate_canonical_markers_fail() {
        let candidates = vec![canonical("b.Second"), canonical("a.First")];
        let err = MarkerResolver::resolve_candidates(&candidates).unwrap_err();
        let MarkerError::Duplicate {
            annotation,
            classes,
        } = err;
        assert_eq!(annotation, MarkerKind::SuiteDeployment.annotation());
        assert_eq!(classes, vec!["a.First", "b.Second"]);
    }

    #[test]
    fn duplicate_legacy_markers_fail_when_canonical_absent() {
        let candidates = vec![legacy("a.Old1"), legacy("a.Old2"), legacy("a.Old3")];
        let err = MarkerResolver::resolve_candidates(&candidates).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a.Old1"));
        assert!(message.contains("a.Old2"));
        assert!(message.contains("a.Old3"));
    }

    #[test]
    fn class_carrying_both_markers_counts_once() {
        let candidates = vec![
            CandidateClass::new("a.Both")
                .with_marker(MarkerKind::SuiteDeployment)
                .with_marker(MarkerKind::LegacySuitDeployment),
        ];
        assert_eq!(
            MarkerResolver::resolve_candidates(&candidates).unwrap(),
            Some(ClassRef::new("a.Both"))
        );
    }
}
