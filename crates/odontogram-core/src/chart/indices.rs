//! CPO / ceo computation.
//!
//! Both indices are pure reads of the tooth mapping and are recomputed on
//! every call.

use super::config::IndexPolicy;
use crate::models::{CeoIndex, CpoIndex, Dentition, TeethMap};

/// CPO over the permanent dentition. A permanent tooth absent from the
/// mapping counts as missing; the `extraction` flag does not.
pub fn compute_cpo(teeth: &TeethMap, policy: IndexPolicy) -> CpoIndex {
    let (mut decayed, mut missing, mut filled) = (0, 0, 0);

    for id in Dentition::Permanent.teeth() {
        let Some(state) = teeth.get(id) else {
            missing += 1;
            continue;
        };
        match policy {
            IndexPolicy::PerTooth => {
                if state.caries {
                    decayed += 1;
                } else if state.restored {
                    filled += 1;
                }
            }
            IndexPolicy::PerFlag => {
                decayed += u32::from(state.caries);
                filled += u32::from(state.restored);
            }
        }
    }

    CpoIndex::new(decayed, missing, filled)
}

/// ceo over the temporary dentition. Temporary teeth are shed naturally, so
/// absence is not counted; only the `extraction` flag feeds `extracted`.
pub fn compute_ceo(teeth: &TeethMap, policy: IndexPolicy) -> CeoIndex {
    let (mut decayed, mut extracted, mut filled) = (0, 0, 0);

    let present = Dentition::Temporary
        .teeth()
        .iter()
        .filter_map(|id| teeth.get(id));

    for state in present {
        match policy {
            IndexPolicy::PerTooth => {
                if state.extraction {
                    extracted += 1;
                } else if state.caries {
                    decayed += 1;
                } else if state.restored {
                    filled += 1;
                }
            }
            IndexPolicy::PerFlag => {
                decayed += u32::from(state.caries);
                extracted += u32::from(state.extraction);
                filled += u32::from(state.restored);
            }
        }
    }

    CeoIndex::new(decayed, extracted, filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ToothFlag, ToothId, ToothState};

    fn full_mapping() -> TeethMap {
        ToothId::all().map(|id| (id, ToothState::new(id))).collect()
    }

    fn flag(teeth: &mut TeethMap, code: &str, flag: ToothFlag) {
        let id: ToothId = code.parse().unwrap();
        teeth.get_mut(&id).unwrap().set_flag(flag, true);
    }

    #[test]
    fn test_empty_chart_scores_zero() {
        let teeth = full_mapping();
        assert_eq!(compute_cpo(&teeth, IndexPolicy::PerTooth), CpoIndex::default());
        assert_eq!(compute_ceo(&teeth, IndexPolicy::PerTooth), CeoIndex::default());
    }

    #[test]
    fn test_missing_counts_only_permanent_absence() {
        let mut teeth = full_mapping();
        teeth.remove(&"36".parse().unwrap());
        teeth.remove(&"55".parse().unwrap());

        assert_eq!(compute_cpo(&teeth, IndexPolicy::PerTooth), CpoIndex::new(0, 1, 0));
        assert_eq!(compute_ceo(&teeth, IndexPolicy::PerTooth), CeoIndex::default());
    }

    #[test]
    fn test_permanent_extraction_flag_is_not_missing() {
        let mut teeth = full_mapping();
        flag(&mut teeth, "46", ToothFlag::Extraction);
        assert_eq!(compute_cpo(&teeth, IndexPolicy::PerTooth), CpoIndex::default());
    }

    #[test]
    fn test_temporary_flags_do_not_leak_into_cpo() {
        let mut teeth = full_mapping();
        flag(&mut teeth, "54", ToothFlag::Caries);
        flag(&mut teeth, "84", ToothFlag::Restored);

        assert_eq!(compute_cpo(&teeth, IndexPolicy::PerTooth), CpoIndex::default());
        assert_eq!(compute_ceo(&teeth, IndexPolicy::PerTooth), CeoIndex::new(1, 0, 1));
    }

    #[test]
    fn test_overlapping_flags_by_policy() {
        let mut teeth = full_mapping();
        flag(&mut teeth, "16", ToothFlag::Caries);
        flag(&mut teeth, "16", ToothFlag::Restored);
        flag(&mut teeth, "65", ToothFlag::Caries);
        flag(&mut teeth, "65", ToothFlag::Extraction);

        assert_eq!(compute_cpo(&teeth, IndexPolicy::PerTooth), CpoIndex::new(1, 0, 0));
        assert_eq!(compute_cpo(&teeth, IndexPolicy::PerFlag), CpoIndex::new(1, 0, 1));
        assert_eq!(compute_ceo(&teeth, IndexPolicy::PerTooth), CeoIndex::new(0, 1, 0));
        assert_eq!(compute_ceo(&teeth, IndexPolicy::PerFlag), CeoIndex::new(1, 1, 0));
    }

    #[test]
    fn test_empty_mapping_is_all_missing() {
        let teeth = TeethMap::new();
        assert_eq!(compute_cpo(&teeth, IndexPolicy::PerTooth).missing, 32);
        assert_eq!(compute_ceo(&teeth, IndexPolicy::PerTooth).total, 0);
    }
}
