use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::*;
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, telegram_id, first_name, last_name, middle_name, phone, email,
     birth_date, passport, created_at, updated_at";

struct PatientRow {
    id: String,
    telegram_id: Option<i64>,
    first_name: String,
    last_name: String,
    middle_name: String,
    phone: String,
    email: String,
    birth_date: Option<String>,
    passport: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        middle_name: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        birth_date: row.get(7)?,
        passport: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid("patients.id", &row.id)?,
        telegram_id: row.telegram_id,
        first_name: row.first_name.trim().to_string(),
        last_name: row.last_name.trim().to_string(),
        middle_name: row.middle_name.trim().to_string(),
        phone: row.phone.trim().to_string(),
        email: row.email.trim().to_string(),
        birth_date: row
            .birth_date
            .as_deref()
            .map(|d| parse_date("patients.birth_date", d))
            .transpose()?,
        passport: row.passport.trim().to_string(),
        created_at: parse_timestamp("patients.created_at", &row.created_at)?,
        updated_at: parse_timestamp("patients.updated_at", &row.updated_at)?,
    })
}

fn query_patients(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read_row)?;
    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, telegram_id, first_name, last_name, middle_name, phone, email,
         birth_date, passport, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            patient.id.to_string(),
            patient.telegram_id,
            patient.first_name,
            patient.last_name,
            patient.middle_name,
            patient.phone,
            patient.email,
            patient.birth_date.map(date_to_sql),
            patient.passport,
            timestamp_to_sql(patient.created_at),
            timestamp_to_sql(patient.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(patient_from_row).transpose()
}

pub fn get_patient_by_phone(
    conn: &Connection,
    phone: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE phone = ?1 LIMIT 1");
    let row = conn
        .query_row(&sql, params![phone.trim()], read_row)
        .optional()?;
    row.map(patient_from_row).transpose()
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name, first_name");
    query_patients(conn, &sql, [])
}

/// Escape LIKE wildcards so `%` and `_` in a search term match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match on the trimmed last name.
pub fn search_patients(conn: &Connection, term: &str) -> Result<Vec<Patient>, DatabaseError> {
    let pattern = format!("%{}%", escape_like(&term.trim().to_lowercase()));
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE LOWER(TRIM(last_name)) LIKE ?1 ESCAPE '\\'
         ORDER BY last_name, first_name"
    );
    let mut patients = query_patients(conn, &sql, params![pattern])?;

    // SQLite LOWER() only folds ASCII; re-check with Unicode folding so
    // Cyrillic surnames match regardless of case.
    if term.chars().any(|c| !c.is_ascii()) {
        let needle = term.trim().to_lowercase();
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name, first_name");
        patients = query_patients(conn, &sql, [])?
            .into_iter()
            .filter(|p| p.last_name.to_lowercase().contains(&needle))
            .collect();
    }
    Ok(patients)
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients SET first_name = ?2, last_name = ?3, middle_name = ?4, phone = ?5,
         email = ?6, birth_date = ?7, passport = ?8, updated_at = ?9
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.middle_name,
            patient.phone,
            patient.email,
            patient.birth_date.map(date_to_sql),
            patient.passport,
            timestamp_to_sql(patient.updated_at),
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Patient", patient.id));
    }
    Ok(())
}

pub fn update_patient_telegram_id(
    conn: &Connection,
    id: &Uuid,
    telegram_id: i64,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients SET telegram_id = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), telegram_id, timestamp_to_sql(now_timestamp())],
    )?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

fn count_active_appointments(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE patient_id = ?1 AND status IN ('scheduled', 'confirmed')",
        params![id.to_string()],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

pub fn patient_has_active_appointments(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    Ok(count_active_appointments(conn, id)? > 0)
}

/// Delete a patient together with their notifications, the reviews of
/// their appointments and the appointments themselves.
///
/// Refused while the patient still has a scheduled or confirmed visit.
/// All-or-nothing: any failure rolls the whole cascade back.
pub fn delete_patient(conn: &mut Connection, id: &Uuid) -> Result<PatientDeletion, DatabaseError> {
    let tx = conn.transaction()?;
    let id_str = id.to_string();

    let active = count_active_appointments(&tx, id)?;
    if active > 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Patient has {active} active appointment(s); cancel them before deleting"
        )));
    }

    let notifications = tx.execute(
        "DELETE FROM notifications WHERE patient_id = ?1",
        params![id_str],
    )?;
    let reviews = tx.execute(
        "DELETE FROM reviews WHERE appointment_id IN
         (SELECT id FROM appointments WHERE patient_id = ?1)",
        params![id_str],
    )?;
    let appointments = tx.execute(
        "DELETE FROM appointments WHERE patient_id = ?1",
        params![id_str],
    )?;
    let deleted = tx.execute("DELETE FROM patients WHERE id = ?1", params![id_str])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    tx.commit()?;

    tracing::info!(
        patient_id = %id,
        appointments,
        reviews,
        notifications,
        "Patient deleted with dependent rows"
    );

    Ok(PatientDeletion {
        appointments,
        reviews,
        notifications,
    })
}
