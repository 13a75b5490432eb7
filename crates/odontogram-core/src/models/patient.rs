//! Patient models.

use serde::{Deserialize, Serialize};

/// Administrative gender as captured on the clinical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" | "m" => Some(Gender::Male),
            "F" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Person to call in an emergency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    /// Relationship to the patient (e.g., "Madre", "Esposo")
    pub relationship: String,
}

/// A clinic patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID, generated on creation
    pub local_id: String,
    pub first_name: String,
    pub last_name: String,
    /// National ID (cédula / DNI)
    pub identification_number: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
    /// Date of the most recent visit
    pub last_visit: Option<String>,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(first_name: String, last_name: String, identification_number: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            local_id: uuid::Uuid::new_v4().to_string(),
            first_name,
            last_name,
            identification_number,
            date_of_birth: None,
            gender: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            emergency_contact: None,
            created_at: now.clone(),
            updated_at: now,
            last_visit: None,
        }
    }

    /// "First Last", as shown on the record header.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Age in whole years on `today`, if the date of birth parses.
    pub fn age_on(&self, today: chrono::NaiveDate) -> Option<u32> {
        let dob = self
            .date_of_birth
            .as_deref()
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())?;
        today.years_since(dob)
    }

    /// Minors get the temporary dentition charted alongside the permanent one.
    pub fn is_minor_on(&self, today: chrono::NaiveDate) -> Option<bool> {
        self.age_on(today).map(|age| age < 18)
    }
}
