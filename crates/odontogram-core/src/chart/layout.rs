//! Fixed dentition layout.
//!
//! Rows are in chart order (viewer's left to right). The universe is these
//! 52 identifiers and never changes at runtime.

use crate::models::ToothId;

const fn t(code: u8) -> ToothId {
    ToothId::from_code(code)
}

const PERMANENT: [[ToothId; 8]; 4] = [
    [t(18), t(17), t(16), t(15), t(14), t(13), t(12), t(11)],
    [t(21), t(22), t(23), t(24), t(25), t(26), t(27), t(28)],
    [t(38), t(37), t(36), t(35), t(34), t(33), t(32), t(31)],
    [t(41), t(42), t(43), t(44), t(45), t(46), t(47), t(48)],
];

const TEMPORARY: [[ToothId; 5]; 4] = [
    [t(55), t(54), t(53), t(52), t(51)],
    [t(61), t(62), t(63), t(64), t(65)],
    [t(75), t(74), t(73), t(72), t(71)],
    [t(81), t(82), t(83), t(84), t(85)],
];

/// Permanent quadrants 1-4, each in chart order.
pub static PERMANENT_QUADRANTS: [[ToothId; 8]; 4] = PERMANENT;

/// Temporary quadrants 5-8, each in chart order.
pub static TEMPORARY_QUADRANTS: [[ToothId; 5]; 4] = TEMPORARY;

/// All 32 permanent teeth, quadrant by quadrant.
pub static PERMANENT_TEETH: [ToothId; 32] = flatten8(PERMANENT);

/// All 20 temporary teeth, quadrant by quadrant.
pub static TEMPORARY_TEETH: [ToothId; 20] = flatten5(TEMPORARY);

const fn flatten8(quadrants: [[ToothId; 8]; 4]) -> [ToothId; 32] {
    let mut out = [t(11); 32];
    let mut i = 0;
    while i < 32 {
        out[i] = quadrants[i / 8][i % 8];
        i += 1;
    }
    out
}

const fn flatten5(quadrants: [[ToothId; 5]; 4]) -> [ToothId; 20] {
    let mut out = [t(51); 20];
    let mut i = 0;
    while i < 20 {
        out[i] = quadrants[i / 5][i % 5];
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dentition, Quadrant};
    use std::collections::HashSet;

    #[test]
    fn test_universe_is_distinct() {
        let all: HashSet<ToothId> = ToothId::all().collect();
        assert_eq!(all.len(), 52);
    }

    #[test]
    fn test_quadrants_hold_their_own_teeth() {
        for dentition in [Dentition::Permanent, Dentition::Temporary] {
            for quadrant in dentition.quadrants() {
                let teeth = quadrant.teeth_in_chart_order();
                assert_eq!(teeth.len(), usize::from(quadrant.max_position()));
                assert!(teeth.iter().all(|t| t.quadrant() == quadrant));
                assert!(teeth.iter().all(|t| t.dentition() == dentition));
            }
        }
    }

    #[test]
    fn test_chart_order() {
        let codes = |q: u8| -> Vec<String> {
            Quadrant::new(q)
                .unwrap()
                .teeth_in_chart_order()
                .iter()
                .map(ToString::to_string)
                .collect()
        };

        assert_eq!(codes(1), ["18", "17", "16", "15", "14", "13", "12", "11"]);
        assert_eq!(codes(2), ["21", "22", "23", "24", "25", "26", "27", "28"]);
        assert_eq!(codes(3).first().map(String::as_str), Some("38"));
        assert_eq!(codes(4).first().map(String::as_str), Some("41"));
        assert_eq!(codes(5), ["55", "54", "53", "52", "51"]);
        assert_eq!(codes(8), ["81", "82", "83", "84", "85"]);
    }

    #[test]
    fn test_every_table_entry_parses() {
        for tooth in ToothId::all() {
            assert_eq!(tooth.to_string().parse::<ToothId>().unwrap(), tooth);
        }
    }
}
