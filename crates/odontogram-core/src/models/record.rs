//! Dental clinical record (historia clínica) and treatment sessions.
//!
//! The record is organised in twelve sections. Section 7 holds the
//! odontogram's tooth mapping; section 9 holds the CPO/ceo values computed
//! from it when the chart was last saved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::indices::{CeoIndex, CpoIndex};
use super::patient::{Gender, Patient};
use super::tooth::{ToothId, ToothState};
use crate::chart::{Chart, ChartConfig, ChartResult};

/// Tooth mapping as stored in a record.
pub type TeethMap = BTreeMap<ToothId, ToothState>;

/// A complete clinical record for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    /// Unique record ID
    pub record_id: String,
    /// Patient local ID
    pub patient_id: String,
    /// Patient display name
    pub patient_name: String,
    /// Human-facing number (e.g., "HC-001")
    pub record_number: String,
    /// Sections 1-6, 8 and 10-12
    #[serde(flatten)]
    pub sections: RecordSections,
    /// Section 7: odontogram
    pub teeth: Option<TeethMap>,
    /// Section 9: CPO snapshot
    pub cpo_index: Option<CpoIndex>,
    /// Section 9: ceo snapshot
    pub ceo_index: Option<CeoIndex>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Free-form clinical sections of a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordSections {
    pub patient_data: PatientData,
    pub consultation_reason: Option<String>,
    pub current_illness: CurrentIllness,
    pub allergies: Allergies,
    pub medical_history: MedicalHistory,
    pub vital_signs: VitalSigns,
    pub examination: StomatognathicExam,
    pub indicators: OralHealthIndicators,
    pub plans: TreatmentPlans,
    pub diagnosis: Diagnosis,
    pub sessions: Vec<TreatmentSession>,
}

/// Section 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientData {
    /// Health establishment name
    pub establishment: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub identification_number: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<u32>,
    pub is_minor: Option<bool>,
}

/// Section 3: current illness or problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrentIllness {
    pub symptoms: Option<String>,
    /// Time since onset
    pub chronology: Option<String>,
    pub location: Option<String>,
    pub intensity: Option<Intensity>,
    pub characteristics: Option<String>,
    pub apparent_cause: Option<String>,
    pub associated_symptoms: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intensity {
    #[serde(rename = "leve")]
    Mild,
    #[serde(rename = "moderada")]
    Moderate,
    #[serde(rename = "severa")]
    Severe,
}

/// Section 4: allergies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Allergies {
    pub antibiotics: Option<String>,
    pub anesthesia: Option<String>,
    pub other: Option<String>,
}

/// Section 4: relevant medical history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MedicalHistory {
    pub hemorrhages: bool,
    pub hiv: bool,
    pub tuberculosis: bool,
    pub asthma: bool,
    pub diabetes: Option<DiabetesType>,
    pub hypertension: bool,
    pub heart_disease: Option<String>,
    pub other: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiabetesType {
    #[serde(rename = "tipo1")]
    Type1,
    #[serde(rename = "tipo2")]
    Type2,
}

/// Section 5.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VitalSigns {
    /// e.g. "120/80"
    pub blood_pressure: Option<String>,
    /// Beats per minute
    pub heart_rate: Option<u32>,
    /// Degrees Celsius
    pub temperature: Option<f64>,
    /// Breaths per minute
    pub respiratory_rate: Option<u32>,
}

/// Section 6: stomatognathic examination findings per structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StomatognathicExam {
    pub lips: Option<String>,
    pub cheeks: Option<String>,
    pub upper_jaw: Option<String>,
    pub lower_jaw: Option<String>,
    pub tongue: Option<String>,
    pub palate: Option<String>,
    pub floor_of_mouth: Option<String>,
    pub buccal_mucosa: Option<String>,
    pub salivary_glands: Option<String>,
    pub oropharynx: Option<String>,
    /// Temporomandibular joint
    pub tmj: Option<String>,
    pub lymph_nodes: Option<String>,
}

/// Section 8.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OralHealthIndicators {
    pub oral_hygiene: Option<OralHygiene>,
    pub periodontal_disease: Option<Severity>,
    pub malocclusion: Option<Malocclusion>,
    pub fluorosis: Option<Severity>,
    /// Plaque index, percent
    pub bacterial_plaque: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OralHygiene {
    #[serde(rename = "buena")]
    Good,
    #[serde(rename = "regular")]
    Fair,
    #[serde(rename = "mala")]
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "ninguna")]
    None,
    #[serde(rename = "leve")]
    Mild,
    #[serde(rename = "moderada")]
    Moderate,
    #[serde(rename = "severa")]
    Severe,
}

/// Angle classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Malocclusion {
    #[serde(rename = "ninguna")]
    None,
    #[serde(rename = "angle1")]
    ClassI,
    #[serde(rename = "angle2")]
    ClassII,
    #[serde(rename = "angle3")]
    ClassIII,
}

/// Section 10.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreatmentPlans {
    pub diagnostic: Option<String>,
    pub therapeutic: Option<String>,
    pub educational: Option<String>,
}

/// Section 11.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Diagnosis {
    pub presumptive: Option<DiagnosisEntry>,
    pub definitive: Option<DiagnosisEntry>,
}

/// A CIE-10 coded diagnosis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosisEntry {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Section 12: one treatment session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentSession {
    pub session_id: String,
    /// 1-based, in creation order
    pub session_number: u32,
    pub date: String,
    pub sheet_code: Option<String>,
    pub diagnosis_and_complications: Option<String>,
    pub procedures_performed: Option<String>,
    pub prescriptions: Vec<Prescription>,
    pub doctor_signature: Option<String>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed,
    Pending,
    Cancelled,
}

/// A medication prescribed during a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub prescription_id: String,
    pub medication: String,
    /// e.g. "500mg"
    pub dosage: String,
    /// e.g. "Cada 8 horas"
    pub frequency: String,
}

impl Prescription {
    pub fn new(medication: String, dosage: String, frequency: String) -> Self {
        Self {
            prescription_id: uuid::Uuid::new_v4().to_string(),
            medication,
            dosage,
            frequency,
        }
    }
}

impl MedicalRecord {
    /// Open a new record for a patient, pre-filling section 1.
    pub fn new(patient: &Patient, record_number: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let sections = RecordSections {
            patient_data: PatientData {
                first_name: Some(patient.first_name.clone()),
                last_name: Some(patient.last_name.clone()),
                identification_number: Some(patient.identification_number.clone()),
                gender: patient.gender,
                ..PatientData::default()
            },
            ..RecordSections::default()
        };

        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient.local_id.clone(),
            patient_name: patient.full_name(),
            record_number,
            sections,
            teeth: None,
            cpo_index: None,
            ceo_index: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Build a chart from section 7, or a fresh one if none was charted yet.
    pub fn chart(&self, config: ChartConfig) -> ChartResult<Chart> {
        match &self.teeth {
            Some(teeth) => Chart::from_teeth_with_config(teeth.clone(), config),
            None => Ok(Chart::with_config(config)),
        }
    }

    /// Store a chart's mapping in section 7 and its indices in section 9.
    pub fn apply_chart(&mut self, chart: &Chart) {
        self.teeth = Some(chart.teeth().clone());
        self.cpo_index = Some(chart.compute_cpo());
        self.ceo_index = Some(chart.compute_ceo());
        self.touch();
    }

    /// Append a session, numbering it after the existing ones.
    pub fn add_session(&mut self, date: String, status: SessionStatus) -> &mut TreatmentSession {
        let session_number = self
            .sections
            .sessions
            .iter()
            .map(|s| s.session_number)
            .max()
            .unwrap_or(0)
            + 1;

        self.sections.sessions.push(TreatmentSession {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_number,
            date,
            sheet_code: None,
            diagnosis_and_complications: None,
            procedures_performed: None,
            prescriptions: Vec::new(),
            doctor_signature: None,
            status,
        });
        self.touch();

        let last = self.sections.sessions.len() - 1;
        &mut self.sections.sessions[last]
    }

    /// Sessions still to be carried out.
    pub fn pending_sessions(&self) -> impl Iterator<Item = &TreatmentSession> {
        self.sections
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Pending)
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToothFlag;

    fn make_patient() -> Patient {
        let mut patient = Patient::new("Ana".into(), "Torres".into(), "1712345678".into());
        patient.gender = Some(Gender::Female);
        patient
    }

    #[test]
    fn test_new_record_prefills_patient_data() {
        let patient = make_patient();
        let record = MedicalRecord::new(&patient, "HC-001".into());

        assert_eq!(record.patient_id, patient.local_id);
        assert_eq!(record.patient_name, "Ana Torres");
        assert_eq!(record.sections.patient_data.gender, Some(Gender::Female));
        assert!(record.teeth.is_none());
        assert_eq!(record.record_id.len(), 36);
    }

    #[test]
    fn test_apply_chart_stores_indices() {
        let mut record = MedicalRecord::new(&make_patient(), "HC-001".into());
        let mut chart = record.chart(ChartConfig::default()).unwrap();
        chart
            .set_flag("16".parse().unwrap(), ToothFlag::Caries, true)
            .unwrap();

        record.apply_chart(&chart);

        assert_eq!(record.teeth.as_ref().map(|t| t.len()), Some(52));
        assert_eq!(record.cpo_index, Some(CpoIndex::new(1, 0, 0)));
        assert_eq!(record.ceo_index, Some(CeoIndex::default()));

        let reloaded = record.chart(ChartConfig::default()).unwrap();
        assert_eq!(reloaded.teeth(), chart.teeth());
    }

    #[test]
    fn test_session_numbering() {
        let mut record = MedicalRecord::new(&make_patient(), "HC-001".into());
        record.add_session("2024-03-01".into(), SessionStatus::Completed);
        let second = record.add_session("2024-03-08".into(), SessionStatus::Pending);
        second.prescriptions.push(Prescription::new(
            "Amoxicilina".into(),
            "500mg".into(),
            "Cada 8 horas".into(),
        ));

        assert_eq!(record.sections.sessions[1].session_number, 2);
        assert_eq!(record.pending_sessions().count(), 1);
    }

    #[test]
    fn test_document_json_uses_clinical_values() {
        let mut record = MedicalRecord::new(&make_patient(), "HC-002".into());
        record.sections.indicators.oral_hygiene = Some(OralHygiene::Fair);
        record.sections.indicators.malocclusion = Some(Malocclusion::ClassII);
        record.sections.medical_history.diabetes = Some(DiabetesType::Type2);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["indicators"]["oral_hygiene"], "regular");
        assert_eq!(json["indicators"]["malocclusion"], "angle2");
        assert_eq!(json["medical_history"]["diabetes"], "tipo2");
        assert_eq!(json["record_number"], "HC-002");

        let back: MedicalRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
