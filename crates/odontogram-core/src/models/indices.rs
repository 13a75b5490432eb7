//! CPO / ceo oral-health index values.

use serde::{Deserialize, Serialize};

/// CPO (DMF) index over the permanent dentition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpoIndex {
    /// C: decayed teeth
    pub decayed: u32,
    /// P: permanent teeth no longer in the record
    pub missing: u32,
    /// O: filled teeth
    pub filled: u32,
    pub total: u32,
}

impl CpoIndex {
    pub fn new(decayed: u32, missing: u32, filled: u32) -> Self {
        Self {
            decayed,
            missing,
            filled,
            total: decayed + missing + filled,
        }
    }
}

/// ceo (def) index over the temporary dentition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeoIndex {
    /// c: decayed teeth
    pub decayed: u32,
    /// e: teeth indicated for extraction
    pub extracted: u32,
    /// o: filled teeth
    pub filled: u32,
    pub total: u32,
}

impl CeoIndex {
    pub fn new(decayed: u32, extracted: u32, filled: u32) -> Self {
        Self {
            decayed,
            extracted,
            filled,
            total: decayed + extracted + filled,
        }
    }
}
