//! Property tests for the chart engine.

use odontogram_core::chart::{Chart, ChartConfig, ChartError, IndexPolicy};
use odontogram_core::models::{Dentition, TeethMap, ToothFlag, ToothId};
use proptest::prelude::*;

fn any_tooth() -> impl Strategy<Value = ToothId> {
    prop::sample::select(ToothId::all().collect::<Vec<_>>())
}

fn any_flag() -> impl Strategy<Value = ToothFlag> {
    prop::sample::select(ToothFlag::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum Edit {
    Flag(ToothId, ToothFlag, bool),
    Mobility(ToothId, i64),
    Recession(ToothId, i64),
    Reset(ToothId),
    Remove(ToothId),
    Restore(ToothId),
}

fn any_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any_tooth(), any_flag(), any::<bool>()).prop_map(|(t, f, v)| Edit::Flag(t, f, v)),
        (any_tooth(), -2i64..6).prop_map(|(t, v)| Edit::Mobility(t, v)),
        (any_tooth(), -3i64..12).prop_map(|(t, v)| Edit::Recession(t, v)),
        any_tooth().prop_map(Edit::Reset),
        any_tooth().prop_map(Edit::Remove),
        any_tooth().prop_map(Edit::Restore),
    ]
}

/// Apply an edit, ignoring rejected ones.
fn apply(chart: &mut Chart, edit: &Edit) {
    let _ = match *edit {
        Edit::Flag(t, f, v) => chart.set_flag(t, f, v),
        Edit::Mobility(t, v) => chart.set_mobility(t, v),
        Edit::Recession(t, v) => chart.set_recession(t, v),
        Edit::Reset(t) => chart.reset_tooth(t),
        Edit::Remove(t) => {
            chart.remove_tooth(t);
            Ok(())
        }
        Edit::Restore(t) => {
            chart.restore_tooth(t);
            Ok(())
        }
    };
}

proptest! {
    #[test]
    fn zoom_stays_within_bounds(steps in prop::collection::vec(any::<bool>(), 0..40)) {
        let mut chart = Chart::new();
        for zoom_in in steps {
            let zoom = if zoom_in { chart.zoom_in() } else { chart.zoom_out() };
            prop_assert!((0.7..=1.3).contains(&zoom));
            prop_assert_eq!(zoom, chart.zoom());
        }
    }

    #[test]
    fn selecting_another_tooth_moves_selection(tooth in any_tooth(), other in any_tooth()) {
        prop_assume!(tooth != other);
        let mut chart = Chart::new();
        chart.select_tooth(other);
        prop_assert_eq!(chart.select_tooth(tooth), Some(tooth));
        prop_assert_eq!(chart.select_tooth(tooth), None);
    }

    #[test]
    fn double_select_clears(tooth in any_tooth()) {
        let mut chart = Chart::new();
        prop_assert_eq!(chart.select_tooth(tooth), Some(tooth));
        prop_assert_eq!(chart.select_tooth(tooth), None);
        prop_assert_eq!(chart.selected(), None);
    }

    #[test]
    fn flag_set_then_cleared_restores_tooth(tooth in any_tooth(), flag in any_flag()) {
        let mut chart = Chart::new();
        let before = chart.clone();
        chart.set_flag(tooth, flag, true).unwrap();
        prop_assert!(chart.tooth(tooth).unwrap().flag(flag));
        chart.set_flag(tooth, flag, false).unwrap();
        prop_assert_eq!(chart, before);
    }

    #[test]
    fn out_of_range_edits_leave_chart_unchanged(
        edits in prop::collection::vec(any_edit(), 0..30),
        tooth in any_tooth(),
        mobility in prop_oneof![i64::MIN..0, 4i64..i64::MAX],
        recession in i64::MIN..0,
    ) {
        let mut chart = Chart::new();
        for edit in &edits {
            apply(&mut chart, edit);
        }
        let before = chart.clone();

        let is_range_or_absent = |r: Result<(), ChartError>| {
            matches!(r, Err(ChartError::OutOfRange { .. }) | Err(ChartError::ToothAbsent(_)))
        };
        prop_assert!(is_range_or_absent(chart.set_mobility(tooth, mobility)));
        prop_assert!(is_range_or_absent(chart.set_recession(tooth, recession)));
        prop_assert_eq!(chart, before);
    }

    #[test]
    fn indices_are_consistent(edits in prop::collection::vec(any_edit(), 0..60)) {
        let mut chart = Chart::new();
        for edit in &edits {
            apply(&mut chart, edit);
        }

        let cpo = chart.compute_cpo();
        let ceo = chart.compute_ceo();
        prop_assert_eq!(cpo.total, cpo.decayed + cpo.missing + cpo.filled);
        prop_assert_eq!(ceo.total, ceo.decayed + ceo.extracted + ceo.filled);
        prop_assert!(cpo.total <= Dentition::Permanent.tooth_count() as u32);
        prop_assert!(ceo.total <= Dentition::Temporary.tooth_count() as u32);

        let absent_permanent = chart
            .missing_teeth()
            .iter()
            .filter(|id| id.dentition() == Dentition::Permanent)
            .count() as u32;
        prop_assert_eq!(cpo.missing, absent_permanent);
    }

    #[test]
    fn per_flag_never_counts_less(edits in prop::collection::vec(any_edit(), 0..60)) {
        let mut chart = Chart::new();
        for edit in &edits {
            apply(&mut chart, edit);
        }
        let per_flag_config = ChartConfig {
            index_policy: IndexPolicy::PerFlag,
            ..ChartConfig::default()
        };
        let per_flag =
            Chart::from_teeth_with_config(chart.teeth().clone(), per_flag_config).unwrap();

        prop_assert!(per_flag.compute_cpo().total >= chart.compute_cpo().total);
        prop_assert!(per_flag.compute_ceo().total >= chart.compute_ceo().total);
        prop_assert_eq!(per_flag.compute_cpo().missing, chart.compute_cpo().missing);
    }

    #[test]
    fn teeth_survive_json(edits in prop::collection::vec(any_edit(), 0..40)) {
        let mut chart = Chart::new();
        for edit in &edits {
            apply(&mut chart, edit);
        }

        let json = serde_json::to_string(chart.teeth()).unwrap();
        let loaded: TeethMap = serde_json::from_str(&json).unwrap();
        let reloaded = Chart::from_teeth(loaded).unwrap();

        prop_assert_eq!(reloaded.teeth(), chart.teeth());
        prop_assert_eq!(reloaded.compute_cpo(), chart.compute_cpo());
        prop_assert_eq!(reloaded.compute_ceo(), chart.compute_ceo());
    }

    #[test]
    fn form_input_always_lands_in_range(tooth in any_tooth(), input in "\\PC{0,8}") {
        let mut chart = Chart::new();
        let mobility = chart.set_mobility_input(tooth, &input).unwrap();
        prop_assert!(mobility <= 3);
        let recession = chart.set_recession_input(tooth, &input).unwrap();
        prop_assert_eq!(chart.tooth(tooth).unwrap().recession(), recession);
    }
}

#[test]
fn full_zoom_sweep_hits_both_bounds() {
    let mut chart = Chart::new();
    let ups: Vec<f64> = (0..5).map(|_| chart.zoom_in()).collect();
    assert_eq!(ups, vec![1.1, 1.2, 1.3, 1.3, 1.3]);

    let downs: Vec<f64> = (0..8).map(|_| chart.zoom_out()).collect();
    assert_eq!(downs, vec![1.2, 1.1, 1.0, 0.9, 0.8, 0.7, 0.7, 0.7]);
}

#[test]
fn unknown_codes_never_parse() {
    for code in ["99", "00", "19", "56", "86", "0", "111", "", "ab"] {
        assert!(
            matches!(code.parse::<ToothId>(), Err(ChartError::UnknownTooth(_))),
            "{code} should be rejected"
        );
    }
}
