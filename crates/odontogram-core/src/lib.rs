//! Odontogram Core Library
//!
//! Dental chart engine and local clinical-record store for a dental clinic
//! application.
//!
//! # Architecture
//!
//! ```text
//! Host UI (tooth click, checkbox, form field)
//!                 │
//!                 ▼
//!     ┌───────────────────────────┐
//!     │       ChartSession        │   FFI object, string ids and flags
//!     └─────────────┬─────────────┘
//!                   ▼
//!     ┌───────────────────────────┐
//!     │          Chart            │   52 teeth, selection, zoom
//!     │  select / edit / reset    │
//!     │  CPO (permanent)          │
//!     │  ceo (temporary)          │
//!     └─────────────┬─────────────┘
//!                   │ save
//!                   ▼
//!     ┌───────────────────────────┐
//!     │  MedicalRecord (12 secs)  │
//!     │  §7 teeth  §9 CPO/ceo     │──────▶ SQLite (db)
//!     └───────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`chart`]: The chart engine, dentition layout, index computation, config
//! - [`models`]: Domain types (ToothId, ToothState, Patient, MedicalRecord, etc.)
//! - [`db`]: SQLite storage for patients and records

pub mod chart;
pub mod db;
pub mod models;

// Re-export commonly used types
pub use chart::{Chart, ChartConfig, ChartError, ChartSnapshot, IndexPolicy, ZoomConfig};
pub use db::Database;
pub use models::{
    CeoIndex, CpoIndex, Dentition, MedicalRecord, Patient, Quadrant, SessionStatus, TeethMap,
    ToothFlag, ToothId, ToothState, ToothUpdate,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum OdontogramError {
    #[error("Unknown tooth: {0}")]
    UnknownTooth(String),

    #[error("Invalid flag: {0}")]
    InvalidFlag(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Tooth not in chart: {0}")]
    ToothAbsent(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ChartError> for OdontogramError {
    fn from(e: ChartError) -> Self {
        let message = e.to_string();
        match e {
            ChartError::UnknownTooth(_) => OdontogramError::UnknownTooth(message),
            ChartError::InvalidFlag { .. } => OdontogramError::InvalidFlag(message),
            ChartError::OutOfRange { .. } => OdontogramError::OutOfRange(message),
            ChartError::ToothAbsent(_) => OdontogramError::ToothAbsent(message),
            ChartError::MismatchedTooth { .. } => OdontogramError::InvalidInput(message),
        }
    }
}

impl From<db::DbError> for OdontogramError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => OdontogramError::NotFound(what),
            db::DbError::Chart(e) => e.into(),
            other => OdontogramError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for OdontogramError {
    fn from(e: serde_json::Error) -> Self {
        OdontogramError::SerializationError(e.to_string())
    }
}

impl From<chart::ConfigError> for OdontogramError {
    fn from(e: chart::ConfigError) -> Self {
        OdontogramError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for OdontogramError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        OdontogramError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_tooth(id: &str) -> Result<ToothId, OdontogramError> {
    Ok(id.parse()?)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<OdontogramCore>, OdontogramError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(OdontogramCore::new(db)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<OdontogramCore>, OdontogramError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(OdontogramCore::new(db)))
}

/// Install a fmt subscriber. `filter` takes `EnvFilter` syntax; without it
/// `RUST_LOG` is used, then `info`. Returns false if a subscriber was
/// already installed.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init()
        .is_ok()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct OdontogramCore {
    db: Arc<Mutex<Database>>,
    config: Mutex<ChartConfig>,
}

impl OdontogramCore {
    fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Mutex::new(ChartConfig::default()),
        }
    }
}

#[uniffi::export]
impl OdontogramCore {
    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the chart configuration used by `open_chart`.
    pub fn set_chart_config_json(&self, json: String) -> Result<(), OdontogramError> {
        let config = ChartConfig::from_json(&json)?;
        *self.config.lock()? = config;
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(
        &self,
        first_name: String,
        last_name: String,
        identification_number: String,
    ) -> Result<FfiPatient, OdontogramError> {
        if identification_number.trim().is_empty() {
            return Err(OdontogramError::InvalidInput(
                "identification number is required".into(),
            ));
        }
        let db = self.db.lock()?;
        let patient = Patient::new(first_name, last_name, identification_number);
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, local_id: String) -> Result<Option<FfiPatient>, OdontogramError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&local_id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Search patients by name prefix or ID number.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, OdontogramError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Open a new clinical record for a patient.
    pub fn create_record(&self, patient_id: String) -> Result<FfiRecordSummary, OdontogramError> {
        let db = self.db.lock()?;
        let patient = db
            .get_patient(&patient_id)?
            .ok_or_else(|| OdontogramError::NotFound(format!("patient {}", patient_id)))?;
        let record = MedicalRecord::new(&patient, db.next_record_number()?);
        db.insert_record(&record)?;
        Ok(record.into())
    }

    /// Records of a patient, newest first.
    pub fn list_records(&self, patient_id: String) -> Result<Vec<FfiRecordSummary>, OdontogramError> {
        let db = self.db.lock()?;
        let records = db.list_records_for_patient(&patient_id)?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    /// Full record document as JSON.
    pub fn get_record_json(&self, record_id: String) -> Result<Option<String>, OdontogramError> {
        let db = self.db.lock()?;
        let record = db.get_record(&record_id)?;
        Ok(record.map(|r| serde_json::to_string(&r)).transpose()?)
    }

    /// The record's odontogram mapping as JSON, if it has been charted.
    pub fn get_record_teeth_json(
        &self,
        record_id: String,
    ) -> Result<Option<String>, OdontogramError> {
        let db = self.db.lock()?;
        let record = db
            .get_record(&record_id)?
            .ok_or_else(|| OdontogramError::NotFound(format!("medical record {}", record_id)))?;
        Ok(record.teeth.as_ref().map(serde_json::to_string).transpose()?)
    }

    // =========================================================================
    // Chart Operations
    // =========================================================================

    /// Load a record's odontogram into an editing session.
    pub fn open_chart(&self, record_id: String) -> Result<Arc<ChartSession>, OdontogramError> {
        let config = *self.config.lock()?;
        let db = self.db.lock()?;
        let chart = db.load_chart(&record_id, config)?;
        Ok(Arc::new(ChartSession::wrap(chart)))
    }

    /// Save a session's teeth into a record and refresh its CPO/ceo.
    pub fn save_chart(
        &self,
        record_id: String,
        session: Arc<ChartSession>,
    ) -> Result<FfiRecordSummary, OdontogramError> {
        let db = self.db.lock()?;
        let chart = session.chart.lock()?;
        let record = db.save_chart(&record_id, &chart)?;
        Ok(record.into())
    }
}

// =========================================================================
// Chart Session
// =========================================================================

/// An odontogram being edited by the host UI.
#[derive(uniffi::Object)]
pub struct ChartSession {
    chart: Mutex<Chart>,
}

impl ChartSession {
    fn wrap(chart: Chart) -> Self {
        Self {
            chart: Mutex::new(chart),
        }
    }
}

#[uniffi::export]
impl ChartSession {
    /// Fresh chart with all 52 teeth at default state.
    #[uniffi::constructor]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::wrap(Chart::new()))
    }

    /// Chart over a saved `teeth` mapping (tooth id → state JSON).
    #[uniffi::constructor]
    pub fn from_teeth_json(json: String) -> Result<Arc<Self>, OdontogramError> {
        let teeth: TeethMap = serde_json::from_str(&json)?;
        Ok(Arc::new(Self::wrap(Chart::from_teeth(teeth)?)))
    }

    // Selection

    /// Toggle selection of a tooth; returns the selection afterwards.
    pub fn select_tooth(&self, id: String) -> Result<Option<String>, OdontogramError> {
        let tooth = parse_tooth(&id)?;
        let mut chart = self.chart.lock()?;
        Ok(chart.select_tooth(tooth).map(|t| t.to_string()))
    }

    pub fn clear_selection(&self) -> Result<(), OdontogramError> {
        self.chart.lock()?.clear_selection();
        Ok(())
    }

    pub fn selected_tooth(&self) -> Result<Option<String>, OdontogramError> {
        Ok(self.chart.lock()?.selected().map(|t| t.to_string()))
    }

    // Editing

    pub fn set_flag(&self, id: String, flag: String, value: bool) -> Result<(), OdontogramError> {
        let tooth = parse_tooth(&id)?;
        let flag: ToothFlag = flag.parse()?;
        self.chart.lock()?.set_flag(tooth, flag, value)?;
        Ok(())
    }

    pub fn set_mobility(&self, id: String, value: i64) -> Result<(), OdontogramError> {
        let tooth = parse_tooth(&id)?;
        self.chart.lock()?.set_mobility(tooth, value)?;
        Ok(())
    }

    pub fn set_recession(&self, id: String, value: i64) -> Result<(), OdontogramError> {
        let tooth = parse_tooth(&id)?;
        self.chart.lock()?.set_recession(tooth, value)?;
        Ok(())
    }

    /// Lenient form-field variant of `set_mobility`.
    pub fn set_mobility_input(&self, id: String, input: String) -> Result<u8, OdontogramError> {
        let tooth = parse_tooth(&id)?;
        Ok(self.chart.lock()?.set_mobility_input(tooth, &input)?)
    }

    /// Lenient form-field variant of `set_recession`.
    pub fn set_recession_input(&self, id: String, input: String) -> Result<u32, OdontogramError> {
        let tooth = parse_tooth(&id)?;
        Ok(self.chart.lock()?.set_recession_input(tooth, &input)?)
    }

    /// Apply several field changes to one tooth, all or nothing.
    pub fn update_tooth(&self, id: String, update: FfiToothUpdate) -> Result<(), OdontogramError> {
        let tooth = parse_tooth(&id)?;
        self.chart.lock()?.update_tooth(tooth, &update.into())?;
        Ok(())
    }

    pub fn reset_tooth(&self, id: String) -> Result<(), OdontogramError> {
        let tooth = parse_tooth(&id)?;
        self.chart.lock()?.reset_tooth(tooth)?;
        Ok(())
    }

    /// Remove a tooth from the chart; returns whether it was present.
    pub fn remove_tooth(&self, id: String) -> Result<bool, OdontogramError> {
        let tooth = parse_tooth(&id)?;
        Ok(self.chart.lock()?.remove_tooth(tooth).is_some())
    }

    /// Re-add a removed tooth; returns whether anything changed.
    pub fn restore_tooth(&self, id: String) -> Result<bool, OdontogramError> {
        let tooth = parse_tooth(&id)?;
        Ok(self.chart.lock()?.restore_tooth(tooth))
    }

    // Reads

    pub fn tooth(&self, id: String) -> Result<Option<FfiToothState>, OdontogramError> {
        let tooth = parse_tooth(&id)?;
        Ok(self.chart.lock()?.tooth(tooth).map(FfiToothState::from))
    }

    pub fn missing_teeth(&self) -> Result<Vec<String>, OdontogramError> {
        let chart = self.chart.lock()?;
        Ok(chart.missing_teeth().iter().map(ToString::to_string).collect())
    }

    pub fn cpo(&self) -> Result<FfiCpoIndex, OdontogramError> {
        Ok(self.chart.lock()?.compute_cpo().into())
    }

    pub fn ceo(&self) -> Result<FfiCeoIndex, OdontogramError> {
        Ok(self.chart.lock()?.compute_ceo().into())
    }

    pub fn teeth_json(&self) -> Result<String, OdontogramError> {
        let chart = self.chart.lock()?;
        Ok(serde_json::to_string(chart.teeth())?)
    }

    pub fn snapshot_json(&self) -> Result<String, OdontogramError> {
        let chart = self.chart.lock()?;
        Ok(serde_json::to_string(&chart.snapshot())?)
    }

    // Zoom

    pub fn zoom(&self) -> Result<f64, OdontogramError> {
        Ok(self.chart.lock()?.zoom())
    }

    pub fn zoom_in(&self) -> Result<f64, OdontogramError> {
        Ok(self.chart.lock()?.zoom_in())
    }

    pub fn zoom_out(&self) -> Result<f64, OdontogramError> {
        Ok(self.chart.lock()?.zoom_out())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe tooth state.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiToothState {
    pub number: String,
    pub caries: bool,
    pub restored: bool,
    pub endodontic: bool,
    pub crown: bool,
    pub extraction: bool,
    pub sealant: bool,
    pub total: bool,
    pub mobility: u8,
    pub recession: u32,
}

impl From<&ToothState> for FfiToothState {
    fn from(state: &ToothState) -> Self {
        Self {
            number: state.number().to_string(),
            caries: state.caries,
            restored: state.restored,
            endodontic: state.endodontic,
            crown: state.crown,
            extraction: state.extraction,
            sealant: state.sealant,
            total: state.total,
            mobility: state.mobility(),
            recession: state.recession(),
        }
    }
}

/// FFI-safe partial tooth edit; `None` fields are left as they are.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiToothUpdate {
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

impl From<FfiToothUpdate> for ToothUpdate {
    fn from(update: FfiToothUpdate) -> Self {
        Self {
            caries: update.caries,
            restored: update.restored,
            endodontic: update.endodontic,
            crown: update.crown,
            extraction: update.extraction,
            sealant: update.sealant,
            total: update.total,
            mobility: update.mobility,
            recession: update.recession,
        }
    }
}

/// FFI-safe CPO index.
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct FfiCpoIndex {
    pub decayed: u32,
    pub missing: u32,
    pub filled: u32,
    pub total: u32,
}

impl From<CpoIndex> for FfiCpoIndex {
    fn from(index: CpoIndex) -> Self {
        Self {
            decayed: index.decayed,
            missing: index.missing,
            filled: index.filled,
            total: index.total,
        }
    }
}

/// FFI-safe ceo index.
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct FfiCeoIndex {
    pub decayed: u32,
    pub extracted: u32,
    pub filled: u32,
    pub total: u32,
}

impl From<CeoIndex> for FfiCeoIndex {
    fn from(index: CeoIndex) -> Self {
        Self {
            decayed: index.decayed,
            extracted: index.extracted,
            filled: index.filled,
            total: index.total,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub local_id: String,
    pub first_name: String,
    pub last_name: String,
    pub identification_number: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub last_visit: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            local_id: patient.local_id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            identification_number: patient.identification_number,
            date_of_birth: patient.date_of_birth,
            gender: patient.gender.map(|g| g.code().to_string()),
            phone: patient.phone,
            email: patient.email,
            last_visit: patient.last_visit,
        }
    }
}

/// FFI-safe record header with its stored indices.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordSummary {
    pub record_id: String,
    pub record_number: String,
    pub patient_id: String,
    pub patient_name: String,
    pub cpo: Option<FfiCpoIndex>,
    pub ceo: Option<FfiCeoIndex>,
    pub session_count: u32,
    pub updated_at: String,
}

impl From<MedicalRecord> for FfiRecordSummary {
    fn from(record: MedicalRecord) -> Self {
        Self {
            session_count: record.sections.sessions.len() as u32,
            record_id: record.record_id,
            record_number: record.record_number,
            patient_id: record.patient_id,
            patient_name: record.patient_name,
            cpo: record.cpo_index.map(Into::into),
            ceo: record.ceo_index.map(Into::into),
            updated_at: record.updated_at,
        }
    }
}
