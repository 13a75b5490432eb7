//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{EmergencyContact, Gender, Patient};

const PATIENT_COLUMNS: &str = r#"
    local_id, first_name, last_name, identification_number, date_of_birth,
    gender, email, phone, address, city, emergency_contact,
    created_at, updated_at, last_visit
"#;

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        let emergency_contact_json = patient
            .emergency_contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            r#"
            INSERT INTO patients (
                local_id, first_name, last_name, identification_number, date_of_birth,
                gender, email, phone, address, city, emergency_contact,
                created_at, updated_at, last_visit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                patient.local_id,
                patient.first_name,
                patient.last_name,
                patient.identification_number,
                patient.date_of_birth,
                patient.gender.map(Gender::code),
                patient.email,
                patient.phone,
                patient.address,
                patient.city,
                emergency_contact_json,
                patient.created_at,
                patient.updated_at,
                patient.last_visit,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let emergency_contact_json = patient
            .emergency_contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                identification_number = ?4,
                date_of_birth = ?5,
                gender = ?6,
                email = ?7,
                phone = ?8,
                address = ?9,
                city = ?10,
                emergency_contact = ?11,
                updated_at = ?12
            WHERE local_id = ?1
            "#,
            params![
                patient.local_id,
                patient.first_name,
                patient.last_name,
                patient.identification_number,
                patient.date_of_birth,
                patient.gender.map(Gender::code),
                patient.email,
                patient.phone,
                patient.address,
                patient.city,
                emergency_contact_json,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, local_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE local_id = ?"),
                [local_id],
                read_patient_row,
            )
            .optional()?
            .map(Patient::try_from)
            .transpose()
    }

    /// Search by name prefix (first or last name) or exact ID number.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query.trim());
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {PATIENT_COLUMNS}
            FROM patients
            WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR identification_number = ?2
            ORDER BY last_name, first_name
            LIMIT ?3
            "#
        ))?;

        let rows = stmt.query_map(
            params![pattern, query.trim(), limit as i64],
            read_patient_row,
        )?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name, first_name"
        ))?;

        let rows = stmt.query_map([], read_patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Delete a patient (and, by cascade, their records).
    pub fn delete_patient(&self, local_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE local_id = ?", [local_id])?;
        Ok(rows_affected > 0)
    }

    /// Record a visit date on the patient.
    pub fn touch_patient_visit(&self, local_id: &str, visit_date: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET last_visit = ?1, updated_at = ?2 WHERE local_id = ?3",
            params![visit_date, chrono::Utc::now().to_rfc3339(), local_id],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    local_id: String,
    first_name: String,
    last_name: String,
    identification_number: String,
    date_of_birth: Option<String>,
    gender: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    emergency_contact: Option<String>,
    created_at: String,
    updated_at: String,
    last_visit: Option<String>,
}

fn read_patient_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        local_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        identification_number: row.get(3)?,
        date_of_birth: row.get(4)?,
        gender: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
        address: row.get(8)?,
        city: row.get(9)?,
        emergency_contact: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        last_visit: row.get(13)?,
    })
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let gender = row
            .gender
            .map(|code| {
                Gender::from_code(&code)
                    .ok_or_else(|| DbError::Constraint(format!("Unknown gender code: {}", code)))
            })
            .transpose()?;
        let emergency_contact: Option<EmergencyContact> = row
            .emergency_contact
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Patient {
            local_id: row.local_id,
            first_name: row.first_name,
            last_name: row.last_name,
            identification_number: row.identification_number,
            date_of_birth: row.date_of_birth,
            gender,
            email: row.email,
            phone: row.phone,
            address: row.address,
            city: row.city,
            emergency_contact,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_visit: row.last_visit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut patient = Patient::new("Ana".into(), "Torres".into(), "1712345678".into());
        patient.gender = Some(Gender::Female);
        patient.emergency_contact = Some(EmergencyContact {
            name: "Rosa Torres".into(),
            phone: "0991234567".into(),
            relationship: "Madre".into(),
        });

        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.local_id).unwrap().unwrap();
        assert_eq!(retrieved, patient);
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = Patient::new("Ana".into(), "Torres".into(), "1712345678".into());
        db.insert_patient(&patient).unwrap();

        patient.phone = Some("0998887766".into());
        patient.city = Some("Quito".into());
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(&patient.local_id).unwrap().unwrap();
        assert_eq!(retrieved.phone, Some("0998887766".into()));
        assert_eq!(retrieved.city, Some("Quito".into()));
        assert!(chrono::DateTime::parse_from_rfc3339(&retrieved.updated_at).is_ok());
    }

    #[test]
    fn test_list_patients_sorted_by_name() {
        let db = setup_db();
        db.insert_patient(&Patient::new("Luis".into(), "Vera".into(), "0101".into()))
            .unwrap();
        db.insert_patient(&Patient::new("Maria".into(), "Lopez".into(), "0202".into()))
            .unwrap();
        db.insert_patient(&Patient::new("Ana".into(), "Lopez".into(), "0303".into()))
            .unwrap();

        let names: Vec<String> = db
            .list_patients()
            .unwrap()
            .iter()
            .map(Patient::full_name)
            .collect();
        assert_eq!(names, vec!["Ana Lopez", "Maria Lopez", "Luis Vera"]);
    }

    #[test]
    fn test_duplicate_identification_rejected() {
        let db = setup_db();
        db.insert_patient(&Patient::new("Ana".into(), "Torres".into(), "1712345678".into()))
            .unwrap();
        let result =
            db.insert_patient(&Patient::new("Eva".into(), "Paz".into(), "1712345678".into()));
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();

        let patient1 = Patient::new("Maria".into(), "Lopez".into(), "0101".into());
        let patient2 = Patient::new("Mario".into(), "Vera".into(), "0202".into());
        let patient3 = Patient::new("Luis".into(), "Maldonado".into(), "0303".into());
        let patient4 = Patient::new("Jorge".into(), "Suarez".into(), "0404".into());

        db.insert_patient(&patient1).unwrap();
        db.insert_patient(&patient2).unwrap();
        db.insert_patient(&patient3).unwrap();
        db.insert_patient(&patient4).unwrap();

        let results = db.search_patients("Mar", 10).unwrap();
        assert_eq!(results.len(), 2);

        let results = db.search_patients("Ma", 10).unwrap();
        assert_eq!(results.len(), 3);

        let results = db.search_patients("0404", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].first_name, "Jorge");

        let results = db.search_patients("Ma", 1).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_touch_visit_and_delete() {
        let db = setup_db();
        let patient = Patient::new("Ana".into(), "Torres".into(), "1712345678".into());
        db.insert_patient(&patient).unwrap();

        assert!(db.touch_patient_visit(&patient.local_id, "2024-05-02").unwrap());
        let retrieved = db.get_patient(&patient.local_id).unwrap().unwrap();
        assert_eq!(retrieved.last_visit, Some("2024-05-02".into()));
        assert!(chrono::DateTime::parse_from_rfc3339(&retrieved.updated_at).is_ok());

        assert!(db.delete_patient(&patient.local_id).unwrap());
        assert!(db.get_patient(&patient.local_id).unwrap().is_none());
        assert!(!db.delete_patient(&patient.local_id).unwrap());
    }
}
