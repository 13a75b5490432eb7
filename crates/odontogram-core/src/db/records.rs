//! Medical record database operations, including chart load/save.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::chart::{Chart, ChartConfig};
use crate::models::{CeoIndex, CpoIndex, MedicalRecord, RecordSections, TeethMap};

const RECORD_COLUMNS: &str = r#"
    record_id, patient_id, record_number, patient_name, sections,
    teeth, cpo_index, ceo_index, created_at, updated_at
"#;

/// Prefix of human-facing record numbers.
const RECORD_NUMBER_PREFIX: &str = "HC-";

impl Database {
    /// Insert a new medical record.
    pub fn insert_record(&self, record: &MedicalRecord) -> DbResult<()> {
        let columns = RecordColumns::encode(record)?;

        self.conn.execute(
            r#"
            INSERT INTO medical_records (
                record_id, patient_id, record_number, patient_name, sections,
                teeth, cpo_index, ceo_index, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.record_id,
                record.patient_id,
                record.record_number,
                record.patient_name,
                columns.sections,
                columns.teeth,
                columns.cpo_index,
                columns.ceo_index,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing record.
    pub fn update_record(&self, record: &MedicalRecord) -> DbResult<bool> {
        let columns = RecordColumns::encode(record)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE medical_records SET
                patient_name = ?2,
                sections = ?3,
                teeth = ?4,
                cpo_index = ?5,
                ceo_index = ?6,
                updated_at = ?7
            WHERE record_id = ?1
            "#,
            params![
                record.record_id,
                record.patient_name,
                columns.sections,
                columns.teeth,
                columns.cpo_index,
                columns.ceo_index,
                record.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a record by ID.
    pub fn get_record(&self, record_id: &str) -> DbResult<Option<MedicalRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM medical_records WHERE record_id = ?"),
                [record_id],
                read_record_row,
            )
            .optional()?
            .map(MedicalRecord::try_from)
            .transpose()
    }

    /// Get a record by its human-facing number.
    pub fn get_record_by_number(&self, record_number: &str) -> DbResult<Option<MedicalRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM medical_records WHERE record_number = ?"),
                [record_number],
                read_record_row,
            )
            .optional()?
            .map(MedicalRecord::try_from)
            .transpose()
    }

    /// All records of a patient, newest first.
    pub fn list_records_for_patient(&self, patient_id: &str) -> DbResult<Vec<MedicalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM medical_records
            WHERE patient_id = ?
            ORDER BY created_at DESC, record_number DESC
            "#
        ))?;

        let rows = stmt.query_map([patient_id], read_record_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Delete a record.
    pub fn delete_record(&self, record_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM medical_records WHERE record_id = ?", [record_id])?;
        Ok(rows_affected > 0)
    }

    /// Next free record number: HC-001, HC-002, ...
    pub fn next_record_number(&self) -> DbResult<String> {
        let mut stmt = self
            .conn
            .prepare("SELECT record_number FROM medical_records WHERE record_number LIKE 'HC-%'")?;
        let numbers = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut highest = 0u32;
        for number in numbers {
            let number = number?;
            if let Some(n) = number
                .strip_prefix(RECORD_NUMBER_PREFIX)
                .and_then(|n| n.parse::<u32>().ok())
            {
                highest = highest.max(n);
            }
        }
        let next = highest
            .checked_add(1)
            .ok_or_else(|| DbError::Constraint("record numbers exhausted".into()))?;
        Ok(format!("{}{:03}", RECORD_NUMBER_PREFIX, next))
    }

    // =========================================================================
    // Chart bridge
    // =========================================================================

    /// Build a chart from a record's odontogram section.
    pub fn load_chart(&self, record_id: &str, config: ChartConfig) -> DbResult<Chart> {
        let record = self
            .get_record(record_id)?
            .ok_or_else(|| DbError::NotFound(format!("medical record {}", record_id)))?;

        let chart = record.chart(config)?;
        let missing = chart.missing_teeth();
        if record.teeth.is_some() && !missing.is_empty() {
            tracing::warn!(
                record_id,
                missing = missing.len(),
                "stored odontogram does not cover the full dentition"
            );
        }
        Ok(chart)
    }

    /// Write a chart back into a record, refreshing the stored indices.
    /// The read and the write run in one transaction.
    pub fn save_chart(&self, record_id: &str, chart: &Chart) -> DbResult<MedicalRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let mut record = self
            .get_record(record_id)?
            .ok_or_else(|| DbError::NotFound(format!("medical record {}", record_id)))?;

        record.apply_chart(chart);
        self.update_record(&record)?;
        tx.commit()?;

        tracing::info!(
            record_id,
            cpo = record.cpo_index.map(|i| i.total),
            ceo = record.ceo_index.map(|i| i.total),
            "chart saved"
        );
        Ok(record)
    }
}

/// JSON-encoded columns of a record.
struct RecordColumns {
    sections: String,
    teeth: Option<String>,
    cpo_index: Option<String>,
    ceo_index: Option<String>,
}

impl RecordColumns {
    fn encode(record: &MedicalRecord) -> DbResult<Self> {
        Ok(Self {
            sections: serde_json::to_string(&record.sections)?,
            teeth: record.teeth.as_ref().map(serde_json::to_string).transpose()?,
            cpo_index: record.cpo_index.as_ref().map(serde_json::to_string).transpose()?,
            ceo_index: record.ceo_index.as_ref().map(serde_json::to_string).transpose()?,
        })
    }
}

/// Intermediate row struct for database mapping.
struct RecordRow {
    record_id: String,
    patient_id: String,
    record_number: String,
    patient_name: String,
    sections: String,
    teeth: Option<String>,
    cpo_index: Option<String>,
    ceo_index: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_record_row(row: &Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        record_id: row.get(0)?,
        patient_id: row.get(1)?,
        record_number: row.get(2)?,
        patient_name: row.get(3)?,
        sections: row.get(4)?,
        teeth: row.get(5)?,
        cpo_index: row.get(6)?,
        ceo_index: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl TryFrom<RecordRow> for MedicalRecord {
    type Error = DbError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let sections: RecordSections = serde_json::from_str(&row.sections)?;
        let teeth: Option<TeethMap> = row.teeth.as_deref().map(serde_json::from_str).transpose()?;
        let cpo_index: Option<CpoIndex> =
            row.cpo_index.as_deref().map(serde_json::from_str).transpose()?;
        let ceo_index: Option<CeoIndex> =
            row.ceo_index.as_deref().map(serde_json::from_str).transpose()?;

        Ok(MedicalRecord {
            record_id: row.record_id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            record_number: row.record_number,
            sections,
            teeth,
            cpo_index,
            ceo_index,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
