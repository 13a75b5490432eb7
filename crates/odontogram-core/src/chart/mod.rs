//! Dental chart (odontogram) engine.
//!
//! A [`Chart`] owns the tooth-state mapping plus the transient view state
//! (selection and zoom). Edits go through `&mut self` methods that validate
//! first and mutate second, so a failed call leaves the chart as it was.
//! The engine does no I/O; callers hand the mapping to whatever store owns
//! the clinical record.

mod config;
mod indices;
pub mod layout;

pub use config::*;
pub use indices::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    CeoIndex, CpoIndex, TeethMap, ToothFlag, ToothId, ToothState, ToothUpdate, MAX_MOBILITY,
};

/// Chart errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("Unknown tooth: {0:?}")]
    UnknownTooth(String),

    #[error("Invalid flag: {name:?}{}", suggestion_hint(.suggestion))]
    InvalidFlag {
        name: String,
        suggestion: Option<&'static str>,
    },

    #[error("{field} value {value} out of range {}", range_text(.min, .max))]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: Option<i64>,
    },

    #[error("Tooth {0} is not in the chart")]
    ToothAbsent(ToothId),

    #[error("Entry {key} holds the state of tooth {number}")]
    MismatchedTooth { key: ToothId, number: ToothId },
}

fn suggestion_hint(suggestion: &Option<&'static str>) -> String {
    suggestion
        .map(|s| format!(" (did you mean {s:?}?)"))
        .unwrap_or_default()
}

fn range_text(min: &i64, max: &Option<i64>) -> String {
    match max {
        Some(max) => format!("[{min}, {max}]"),
        None => format!("[{min}, ...)"),
    }
}

pub type ChartResult<T> = Result<T, ChartError>;

/// Serializable view of a chart for embedding in a record document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub teeth: TeethMap,
    pub selected: Option<ToothId>,
    pub zoom: f64,
    pub cpo: CpoIndex,
    pub ceo: CeoIndex,
}

/// The odontogram: tooth states plus selection and zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    teeth: TeethMap,
    selected: Option<ToothId>,
    zoom: f64,
    config: ChartConfig,
}

impl Default for Chart {
    fn default() -> Self {
        Self::new()
    }
}

impl Chart {
    /// Full 52-tooth chart, every tooth at its default state.
    pub fn new() -> Self {
        Self::with_config(ChartConfig::default())
    }

    pub fn with_config(config: ChartConfig) -> Self {
        let teeth = ToothId::all().map(|id| (id, ToothState::new(id))).collect();
        Self::build(teeth, config)
    }

    /// Chart over a previously saved mapping. Coverage is not checked, but
    /// every entry must hold the state of the tooth it is keyed by.
    pub fn from_teeth(teeth: TeethMap) -> ChartResult<Self> {
        Self::from_teeth_with_config(teeth, ChartConfig::default())
    }

    pub fn from_teeth_with_config(teeth: TeethMap, config: ChartConfig) -> ChartResult<Self> {
        if let Some((key, state)) = teeth.iter().find(|(key, state)| **key != state.number()) {
            return Err(ChartError::MismatchedTooth {
                key: *key,
                number: state.number(),
            });
        }

        let chart = Self::build(teeth, config);
        let absent = ToothId::all().count() - chart.teeth.len();
        if absent > 0 {
            tracing::debug!(absent, "chart loaded from partial mapping");
        }
        Ok(chart)
    }

    fn build(teeth: TeethMap, config: ChartConfig) -> Self {
        Self {
            teeth,
            selected: None,
            zoom: config.zoom.initial,
            config,
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// The full tooth mapping.
    pub fn teeth(&self) -> &TeethMap {
        &self.teeth
    }

    pub fn into_teeth(self) -> TeethMap {
        self.teeth
    }

    pub fn tooth(&self, id: ToothId) -> Option<&ToothState> {
        self.teeth.get(&id)
    }

    /// Universe members with no entry in the mapping, in chart order.
    pub fn missing_teeth(&self) -> Vec<ToothId> {
        ToothId::all()
            .filter(|id| !self.teeth.contains_key(id))
            .collect()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select a tooth, or clear the selection if it is already selected.
    /// Returns the selection after the call.
    pub fn select_tooth(&mut self, id: ToothId) -> Option<ToothId> {
        self.selected = if self.selected == Some(id) {
            None
        } else {
            Some(id)
        };
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<ToothId> {
        self.selected
    }

    /// State of the selected tooth, if one is selected and charted.
    pub fn selected_state(&self) -> Option<&ToothState> {
        self.selected.and_then(|id| self.teeth.get(&id))
    }

    // =========================================================================
    // Editing
    // =========================================================================

    fn tooth_mut(&mut self, id: ToothId) -> ChartResult<&mut ToothState> {
        self.teeth.get_mut(&id).ok_or(ChartError::ToothAbsent(id))
    }

    pub fn set_flag(&mut self, id: ToothId, flag: ToothFlag, value: bool) -> ChartResult<()> {
        self.tooth_mut(id)?.set_flag(flag, value);
        tracing::debug!(tooth = %id, %flag, value, "flag set");
        Ok(())
    }

    /// Set mobility; values outside 0..=3 are rejected.
    pub fn set_mobility(&mut self, id: ToothId, value: i64) -> ChartResult<()> {
        self.tooth_mut(id)?.set_mobility(value)?;
        tracing::debug!(tooth = %id, value, "mobility set");
        Ok(())
    }

    /// Set recession in mm; negative values are rejected.
    pub fn set_recession(&mut self, id: ToothId, value: i64) -> ChartResult<()> {
        self.tooth_mut(id)?.set_recession(value)?;
        tracing::debug!(tooth = %id, value, "recession set");
        Ok(())
    }

    /// Set mobility from raw form text: non-numeric text becomes 0, numbers
    /// are clamped to 0..=3. Returns the stored value.
    pub fn set_mobility_input(&mut self, id: ToothId, input: &str) -> ChartResult<u8> {
        let value = parse_form_int(input).clamp(0, i64::from(MAX_MOBILITY));
        self.set_mobility(id, value)?;
        Ok(self.tooth_mut(id)?.mobility())
    }

    /// Set recession from raw form text: non-numeric text becomes 0,
    /// negatives become 0. Returns the stored value.
    pub fn set_recession_input(&mut self, id: ToothId, input: &str) -> ChartResult<u32> {
        let value = parse_form_int(input).clamp(0, i64::from(u32::MAX));
        self.set_recession(id, value)?;
        Ok(self.tooth_mut(id)?.recession())
    }

    /// Apply a partial update to one tooth, all or nothing.
    pub fn update_tooth(&mut self, id: ToothId, update: &ToothUpdate) -> ChartResult<()> {
        self.tooth_mut(id)?.apply(update)?;
        tracing::debug!(tooth = %id, ?update, "tooth updated");
        Ok(())
    }

    /// Put a tooth back to its default state. Selection is unaffected.
    pub fn reset_tooth(&mut self, id: ToothId) -> ChartResult<()> {
        *self.tooth_mut(id)? = ToothState::new(id);
        tracing::debug!(tooth = %id, "tooth reset");
        Ok(())
    }

    /// Drop a tooth from the mapping. A removed permanent tooth counts as
    /// missing in the CPO index.
    pub fn remove_tooth(&mut self, id: ToothId) -> Option<ToothState> {
        let removed = self.teeth.remove(&id);
        if removed.is_some() {
            tracing::debug!(tooth = %id, "tooth removed");
        }
        removed
    }

    /// Re-insert an absent tooth at its default state. Returns false if it
    /// was already present.
    pub fn restore_tooth(&mut self, id: ToothId) -> bool {
        if self.teeth.contains_key(&id) {
            return false;
        }
        self.teeth.insert(id, ToothState::new(id));
        tracing::debug!(tooth = %id, "tooth restored");
        true
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.step_zoom(self.config.zoom.step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.step_zoom(-self.config.zoom.step)
    }

    fn step_zoom(&mut self, delta: f64) -> f64 {
        // Two decimals, so repeated 0.1 steps land exactly on the bounds.
        let next = ((self.zoom + delta) * 100.0).round() / 100.0;
        self.zoom = next.clamp(self.config.zoom.min, self.config.zoom.max);
        self.zoom
    }

    // =========================================================================
    // Indices
    // =========================================================================

    pub fn compute_cpo(&self) -> CpoIndex {
        compute_cpo(&self.teeth, self.config.index_policy)
    }

    pub fn compute_ceo(&self) -> CeoIndex {
        compute_ceo(&self.teeth, self.config.index_policy)
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            teeth: self.teeth.clone(),
            selected: self.selected,
            zoom: self.zoom,
            cpo: self.compute_cpo(),
            ceo: self.compute_ceo(),
        }
    }
}

/// Leading integer of a form field, or 0 when there is none.
fn parse_form_int(input: &str) -> i64 {
    let input = input.trim();
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}
