use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::*;
use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str = "id, first_name, last_name, middle_name, specialization,
     license_number, phone, email, is_active, created_at";

struct DoctorRow {
    id: String,
    first_name: String,
    last_name: String,
    middle_name: String,
    specialization: String,
    license_number: String,
    phone: String,
    email: String,
    is_active: bool,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DoctorRow> {
    Ok(DoctorRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        middle_name: row.get(3)?,
        specialization: row.get(4)?,
        license_number: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn doctor_from_row(row: DoctorRow) -> Result<Doctor, DatabaseError> {
    Ok(Doctor {
        id: parse_uuid("doctors.id", &row.id)?,
        first_name: row.first_name,
        last_name: row.last_name,
        middle_name: row.middle_name,
        specialization: row.specialization,
        license_number: row.license_number,
        phone: row.phone,
        email: row.email,
        is_active: row.is_active,
        created_at: parse_timestamp("doctors.created_at", &row.created_at)?,
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, first_name, last_name, middle_name, specialization,
         license_number, phone, email, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            doctor.id.to_string(),
            doctor.first_name,
            doctor.last_name,
            doctor.middle_name,
            doctor.specialization,
            doctor.license_number,
            doctor.phone,
            doctor.email,
            doctor.is_active,
            timestamp_to_sql(doctor.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(doctor_from_row).transpose()
}

/// Doctors ordered by last name, optionally narrowed by specialization
/// and activity.
pub fn list_doctors(conn: &Connection, filter: &DoctorFilter) -> Result<Vec<Doctor>, DatabaseError> {
    let mut sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE 1=1");
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(spec) = &filter.specialization {
        values.push(Box::new(spec.trim().to_string()));
        sql.push_str(&format!(" AND specialization = ?{}", values.len()));
    }
    if filter.active_only {
        sql.push_str(" AND is_active = 1");
    }
    sql.push_str(" ORDER BY last_name, first_name");

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), read_row)?;

    let mut doctors = Vec::new();
    for row in rows {
        doctors.push(doctor_from_row(row?)?);
    }
    Ok(doctors)
}

pub fn list_doctors_by_specialization(
    conn: &Connection,
    specialization: &str,
) -> Result<Vec<Doctor>, DatabaseError> {
    list_doctors(
        conn,
        &DoctorFilter {
            specialization: Some(specialization.to_string()),
            active_only: true,
        },
    )
}

/// Distinct specializations of active doctors, alphabetically.
pub fn list_specializations(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT specialization FROM doctors
         WHERE is_active = 1 ORDER BY specialization",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut specs = Vec::new();
    for row in rows {
        specs.push(row?);
    }
    Ok(specs)
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE doctors SET first_name = ?2, last_name = ?3, middle_name = ?4,
         specialization = ?5, license_number = ?6, phone = ?7, email = ?8, is_active = ?9
         WHERE id = ?1",
        params![
            doctor.id.to_string(),
            doctor.first_name,
            doctor.last_name,
            doctor.middle_name,
            doctor.specialization,
            doctor.license_number,
            doctor.phone,
            doctor.email,
            doctor.is_active,
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Doctor", doctor.id));
    }
    Ok(())
}

/// Delete a doctor and their schedules. Refused while any appointment
/// still references the doctor; deactivate instead.
pub fn delete_doctor(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let referenced: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE doctor_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    if referenced > 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Doctor has {referenced} appointment(s); deactivate instead of deleting"
        )));
    }
    let affected = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Doctor", id));
    }
    Ok(())
}
