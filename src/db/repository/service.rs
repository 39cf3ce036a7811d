use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::*;
use crate::db::DatabaseError;
use crate::models::*;

const SERVICE_COLUMNS: &str = "id, name, description, duration_minutes, price_minor, is_active";

struct ServiceRow {
    id: String,
    name: String,
    description: String,
    duration_minutes: u32,
    price_minor: i64,
    is_active: bool,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ServiceRow> {
    Ok(ServiceRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration_minutes: row.get(3)?,
        price_minor: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn service_from_row(row: ServiceRow) -> Result<Service, DatabaseError> {
    Ok(Service {
        id: parse_uuid("services.id", &row.id)?,
        name: row.name,
        description: row.description,
        duration_minutes: row.duration_minutes,
        price_minor: row.price_minor,
        is_active: row.is_active,
    })
}

pub fn insert_service(conn: &Connection, service: &Service) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO services (id, name, description, duration_minutes, price_minor, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            service.id.to_string(),
            service.name,
            service.description,
            service.duration_minutes,
            service.price_minor,
            service.is_active,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &Uuid) -> Result<Option<Service>, DatabaseError> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(service_from_row).transpose()
}

/// Services ordered by name; `active_only` hides retired ones.
pub fn list_services(conn: &Connection, active_only: bool) -> Result<Vec<Service>, DatabaseError> {
    let sql = if active_only {
        format!("SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 ORDER BY name")
    } else {
        format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY name")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], read_row)?;
    let mut services = Vec::new();
    for row in rows {
        services.push(service_from_row(row?)?);
    }
    Ok(services)
}

pub fn update_service(conn: &Connection, service: &Service) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE services SET name = ?2, description = ?3, duration_minutes = ?4,
         price_minor = ?5, is_active = ?6
         WHERE id = ?1",
        params![
            service.id.to_string(),
            service.name,
            service.description,
            service.duration_minutes,
            service.price_minor,
            service.is_active,
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Service", service.id));
    }
    Ok(())
}

pub fn delete_service(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let referenced: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE service_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    if referenced > 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Service is used by {referenced} appointment(s); deactivate instead of deleting"
        )));
    }
    let affected = conn.execute("DELETE FROM services WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Service", id));
    }
    Ok(())
}
