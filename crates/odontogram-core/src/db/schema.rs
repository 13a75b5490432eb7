//! SQLite schema definition.

/// Complete database schema for the clinic core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    local_id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    identification_number TEXT NOT NULL UNIQUE,   -- cédula / DNI
    date_of_birth TEXT,
    gender TEXT CHECK (gender IN ('M', 'F')),
    email TEXT,
    phone TEXT,
    address TEXT,
    city TEXT,
    emergency_contact TEXT,                       -- JSON object {name, phone, relationship}
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    last_visit TEXT
);

CREATE INDEX IF NOT EXISTS idx_patients_last_name ON patients(last_name);
CREATE INDEX IF NOT EXISTS idx_patients_first_name ON patients(first_name);

-- ============================================================================
-- Medical Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_records (
    record_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(local_id) ON DELETE CASCADE,
    record_number TEXT NOT NULL UNIQUE,           -- HC-001, HC-002, ...
    patient_name TEXT NOT NULL,
    sections TEXT NOT NULL DEFAULT '{}',          -- JSON RecordSections
    teeth TEXT,                                   -- JSON map tooth id -> ToothState, NULL until charted
    cpo_index TEXT,                               -- JSON {decayed, missing, filled, total}
    ceo_index TEXT,                               -- JSON {decayed, extracted, filled, total}
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_records_patient ON medical_records(patient_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_gender_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO patients (local_id, first_name, last_name, identification_number, gender)
             VALUES ('p1', 'Ana', 'Torres', '1712345678', 'X')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO patients (local_id, first_name, last_name, identification_number, gender)
             VALUES ('p1', 'Ana', 'Torres', '1712345678', 'F')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_record_requires_patient() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO medical_records (record_id, patient_id, record_number, patient_name)
             VALUES ('r1', 'nobody', 'HC-001', 'Nobody')",
            [],
        );
        assert!(result.is_err());
    }
}
