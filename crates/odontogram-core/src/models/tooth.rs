//! Tooth identifiers and per-tooth clinical state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chart::{layout, ChartError, ChartResult};

/// Highest mobility grade (Miller scale).
pub const MAX_MOBILITY: u8 = 3;

/// Similarity above which an unknown flag name gets a suggestion.
const FLAG_SUGGESTION_THRESHOLD: f64 = 0.8;

// =========================================================================
// Identifiers
// =========================================================================

/// Permanent or temporary (deciduous) dentition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dentition {
    Permanent,
    Temporary,
}

impl Dentition {
    /// The four quadrants of this dentition, in FDI order.
    pub fn quadrants(self) -> [Quadrant; 4] {
        match self {
            Dentition::Permanent => [Quadrant(1), Quadrant(2), Quadrant(3), Quadrant(4)],
            Dentition::Temporary => [Quadrant(5), Quadrant(6), Quadrant(7), Quadrant(8)],
        }
    }

    /// Every tooth of this dentition in chart order.
    pub fn teeth(self) -> &'static [ToothId] {
        match self {
            Dentition::Permanent => &layout::PERMANENT_TEETH,
            Dentition::Temporary => &layout::TEMPORARY_TEETH,
        }
    }

    /// Number of teeth in a complete dentition (32 or 20).
    pub fn tooth_count(self) -> usize {
        self.teeth().len()
    }
}

/// One jaw-half of a dentition (FDI quadrant 1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quadrant(u8);

impl Quadrant {
    /// Look up a quadrant by its FDI digit.
    pub fn new(number: u8) -> Option<Self> {
        (1..=8).contains(&number).then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn dentition(self) -> Dentition {
        if self.0 <= 4 {
            Dentition::Permanent
        } else {
            Dentition::Temporary
        }
    }

    /// Teeth per quadrant: 8 permanent, 5 temporary.
    pub fn max_position(self) -> u8 {
        match self.dentition() {
            Dentition::Permanent => 8,
            Dentition::Temporary => 5,
        }
    }

    /// Upper jaw (maxilla) quadrants are 1, 2, 5 and 6.
    pub fn is_upper(self) -> bool {
        matches!(self.0, 1 | 2 | 5 | 6)
    }

    /// Teeth of this quadrant as laid out on the chart, left to right.
    ///
    /// The upper row shows quadrant 1 then 2, the lower row quadrant 3 then
    /// 4 (5, 6 and 7, 8 for the temporary dentition). Odd quadrants are drawn
    /// distal→mesial, even ones mesial→distal.
    pub fn teeth_in_chart_order(self) -> &'static [ToothId] {
        let index = usize::from((self.0 - 1) % 4);
        match self.dentition() {
            Dentition::Permanent => &layout::PERMANENT_QUADRANTS[index],
            Dentition::Temporary => &layout::TEMPORARY_QUADRANTS[index],
        }
    }
}

/// FDI two-digit tooth identifier.
///
/// Only members of the fixed 52-tooth universe can be constructed. At every
/// text boundary (JSON keys, FFI) the identifier is the two-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToothId {
    quadrant: u8,
    position: u8,
}

impl ToothId {
    /// Build from an FDI code known to be valid. Used for the layout tables.
    pub(crate) const fn from_code(code: u8) -> Self {
        Self {
            quadrant: code / 10,
            position: code % 10,
        }
    }

    /// Build from quadrant and position, if the pair is in the universe.
    pub fn new(quadrant: u8, position: u8) -> Option<Self> {
        let q = Quadrant::new(quadrant)?;
        (1..=q.max_position())
            .contains(&position)
            .then_some(Self { quadrant, position })
    }

    pub fn quadrant(self) -> Quadrant {
        Quadrant(self.quadrant)
    }

    /// Position from the midline (1 = central incisor).
    pub fn position(self) -> u8 {
        self.position
    }

    pub fn dentition(self) -> Dentition {
        self.quadrant().dentition()
    }

    pub fn is_upper(self) -> bool {
        self.quadrant().is_upper()
    }

    /// The whole universe in chart order, permanent teeth first.
    pub fn all() -> impl Iterator<Item = ToothId> {
        layout::PERMANENT_TEETH
            .iter()
            .chain(layout::TEMPORARY_TEETH.iter())
            .copied()
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.quadrant, self.position)
    }
}

impl FromStr for ToothId {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ChartError::UnknownTooth(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(unknown());
        }
        ToothId::new(bytes[0] - b'0', bytes[1] - b'0').ok_or_else(unknown)
    }
}

impl Serialize for ToothId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ToothId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

// =========================================================================
// Conditions
// =========================================================================

/// Boolean clinical conditions recorded per tooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToothFlag {
    /// Active caries
    Caries,
    /// Filling / restoration
    Restored,
    /// Root canal treatment
    Endodontic,
    Crown,
    /// Indicated for extraction
    Extraction,
    /// Pit and fissure sealant
    Sealant,
    /// Part of a total (full) prosthesis
    Total,
}

impl ToothFlag {
    pub const ALL: [ToothFlag; 7] = [
        ToothFlag::Caries,
        ToothFlag::Restored,
        ToothFlag::Endodontic,
        ToothFlag::Crown,
        ToothFlag::Extraction,
        ToothFlag::Sealant,
        ToothFlag::Total,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToothFlag::Caries => "caries",
            ToothFlag::Restored => "restored",
            ToothFlag::Endodontic => "endodontic",
            ToothFlag::Crown => "crown",
            ToothFlag::Extraction => "extraction",
            ToothFlag::Sealant => "sealant",
            ToothFlag::Total => "total",
        }
    }

    /// Closest known flag name to a misspelled one, if any is close enough.
    fn suggest(name: &str) -> Option<&'static str> {
        let lower = name.to_lowercase();
        Self::ALL
            .iter()
            .map(|flag| (flag.name(), strsim::jaro_winkler(&lower, flag.name())))
            .filter(|(_, score)| *score >= FLAG_SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name)
    }
}

impl fmt::Display for ToothFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToothFlag {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|flag| flag.name() == s)
            .ok_or_else(|| ChartError::InvalidFlag {
                name: s.to_string(),
                suggestion: Self::suggest(s),
            })
    }
}

// =========================================================================
// Tooth state
// =========================================================================

/// Clinical state of one tooth.
///
/// A tooth with no findings is a default state, never an absent entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ToothStateRepr", into = "ToothStateRepr")]
pub struct ToothState {
    number: ToothId,
    pub caries: bool,
    pub restored: bool,
    pub endodontic: bool,
    pub crown: bool,
    pub extraction: bool,
    pub sealant: bool,
    pub total: bool,
    mobility: u8,
    recession: u32,
}

impl ToothState {
    /// Default state: no conditions, no mobility, no recession.
    pub fn new(number: ToothId) -> Self {
        Self {
            number,
            caries: false,
            restored: false,
            endodontic: false,
            crown: false,
            extraction: false,
            sealant: false,
            total: false,
            mobility: 0,
            recession: 0,
        }
    }

    pub fn number(&self) -> ToothId {
        self.number
    }

    pub fn mobility(&self) -> u8 {
        self.mobility
    }

    /// Gingival recession in millimetres.
    pub fn recession(&self) -> u32 {
        self.recession
    }

    pub fn flag(&self, flag: ToothFlag) -> bool {
        match flag {
            ToothFlag::Caries => self.caries,
            ToothFlag::Restored => self.restored,
            ToothFlag::Endodontic => self.endodontic,
            ToothFlag::Crown => self.crown,
            ToothFlag::Extraction => self.extraction,
            ToothFlag::Sealant => self.sealant,
            ToothFlag::Total => self.total,
        }
    }

    pub fn set_flag(&mut self, flag: ToothFlag, value: bool) {
        let slot = match flag {
            ToothFlag::Caries => &mut self.caries,
            ToothFlag::Restored => &mut self.restored,
            ToothFlag::Endodontic => &mut self.endodontic,
            ToothFlag::Crown => &mut self.crown,
            ToothFlag::Extraction => &mut self.extraction,
            ToothFlag::Sealant => &mut self.sealant,
            ToothFlag::Total => &mut self.total,
        };
        *slot = value;
    }

    /// Builder form of [`ToothState::set_flag`].
    pub fn with_flag(mut self, flag: ToothFlag, value: bool) -> Self {
        self.set_flag(flag, value);
        self
    }

    /// Flags currently set, in declaration order.
    pub fn flags(&self) -> Vec<ToothFlag> {
        ToothFlag::ALL
            .iter()
            .copied()
            .filter(|flag| self.flag(*flag))
            .collect()
    }

    /// Set mobility grade; rejects anything outside 0..=3.
    pub fn set_mobility(&mut self, value: i64) -> ChartResult<()> {
        self.mobility = check_mobility(value)?;
        Ok(())
    }

    /// Set recession in mm; rejects negative values.
    pub fn set_recession(&mut self, value: i64) -> ChartResult<()> {
        self.recession = check_recession(value)?;
        Ok(())
    }

    /// True if anything differs from the default state.
    pub fn has_findings(&self) -> bool {
        *self != ToothState::new(self.number)
    }

    /// Apply a partial update. Numeric fields are validated before any
    /// field is written, so a rejected update leaves the state untouched.
    pub fn apply(&mut self, update: &ToothUpdate) -> ChartResult<()> {
        let mobility = update.mobility.map(check_mobility).transpose()?;
        let recession = update.recession.map(check_recession).transpose()?;

        for (flag, value) in update.flags() {
            self.set_flag(flag, value);
        }
        if let Some(mobility) = mobility {
            self.mobility = mobility;
        }
        if let Some(recession) = recession {
            self.recession = recession;
        }
        Ok(())
    }
}

pub(crate) fn check_mobility(value: i64) -> ChartResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_MOBILITY)
        .ok_or(ChartError::OutOfRange {
            field: "mobility",
            value,
            min: 0,
            max: Some(i64::from(MAX_MOBILITY)),
        })
}

pub(crate) fn check_recession(value: i64) -> ChartResult<u32> {
    u32::try_from(value).map_err(|_| ChartError::OutOfRange {
        field: "recession",
        value,
        min: 0,
        max: (value >= 0).then_some(i64::from(u32::MAX)),
    })
}

/// Partial edit of a tooth, mirroring how the chart form merges changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToothUpdate {
    pub caries: Option<bool>,
    pub restored: Option<bool>,
    pub endodontic: Option<bool>,
    pub crown: Option<bool>,
    pub extraction: Option<bool>,
    pub sealant: Option<bool>,
    pub total: Option<bool>,
    pub mobility: Option<i64>,
    pub recession: Option<i64>,
}

impl ToothUpdate {
    pub fn with_flag(mut self, flag: ToothFlag, value: bool) -> Self {
        let slot = match flag {
            ToothFlag::Caries => &mut self.caries,
            ToothFlag::Restored => &mut self.restored,
            ToothFlag::Endodontic => &mut self.endodontic,
            ToothFlag::Crown => &mut self.crown,
            ToothFlag::Extraction => &mut self.extraction,
            ToothFlag::Sealant => &mut self.sealant,
            ToothFlag::Total => &mut self.total,
        };
        *slot = Some(value);
        self
    }

    pub fn with_mobility(mut self, value: i64) -> Self {
        self.mobility = Some(value);
        self
    }

    pub fn with_recession(mut self, value: i64) -> Self {
        self.recession = Some(value);
        self
    }

    /// Flags touched by this update.
    fn flags(&self) -> impl Iterator<Item = (ToothFlag, bool)> + '_ {
        [
            (ToothFlag::Caries, self.caries),
            (ToothFlag::Restored, self.restored),
            (ToothFlag::Endodontic, self.endodontic),
            (ToothFlag::Crown, self.crown),
            (ToothFlag::Extraction, self.extraction),
            (ToothFlag::Sealant, self.sealant),
            (ToothFlag::Total, self.total),
        ]
        .into_iter()
        .filter_map(|(flag, value)| value.map(|v| (flag, v)))
    }
}

/// Wire form of [`ToothState`]: the record document's field names, with
/// every condition optional.
#[derive(Serialize, Deserialize)]
struct ToothStateRepr {
    number: ToothId,
    #[serde(default)]
    caries: bool,
    #[serde(default)]
    restored: bool,
    #[serde(default)]
    endodontic: bool,
    #[serde(default)]
    crown: bool,
    #[serde(default)]
    extraction: bool,
    #[serde(default)]
    sealant: bool,
    #[serde(default)]
    total: bool,
    #[serde(default)]
    mobility: i64,
    #[serde(default)]
    recession: i64,
}

impl TryFrom<ToothStateRepr> for ToothState {
    type Error = ChartError;

    fn try_from(repr: ToothStateRepr) -> Result<Self, Self::Error> {
        Ok(ToothState {
            number: repr.number,
            caries: repr.caries,
            restored: repr.restored,
            endodontic: repr.endodontic,
            crown: repr.crown,
            extraction: repr.extraction,
            sealant: repr.sealant,
            total: repr.total,
            mobility: check_mobility(repr.mobility)?,
            recession: check_recession(repr.recession)?,
        })
    }
}

impl From<ToothState> for ToothStateRepr {
    fn from(state: ToothState) -> Self {
        ToothStateRepr {
            number: state.number,
            caries: state.caries,
            restored: state.restored,
            endodontic: state.endodontic,
            crown: state.crown,
            extraction: state.extraction,
            sealant: state.sealant,
            total: state.total,
            mobility: i64::from(state.mobility),
            recession: i64::from(state.recession),
        }
    }
}
