use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::*;
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "a.id, a.patient_id, a.doctor_id, a.service_id,
     a.appointment_date, a.appointment_time, a.status, a.created_at, a.updated_at";

/// Joined columns appended after `APPOINTMENT_COLUMNS` in listings.
const VIEW_JOIN: &str = "p.last_name, p.first_name, p.middle_name, p.phone,
     d.last_name, d.first_name, d.middle_name, d.specialization, s.name
     FROM appointments a
     JOIN patients p ON p.id = a.patient_id
     JOIN doctors d ON d.id = a.doctor_id
     JOIN services s ON s.id = a.service_id";

struct AppointmentRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    service_id: String,
    appointment_date: String,
    appointment_time: String,
    status: String,
    created_at: String,
    updated_at: String,
}

struct ViewRow {
    appointment: AppointmentRow,
    patient_last: String,
    patient_first: String,
    patient_middle: String,
    patient_phone: String,
    doctor_last: String,
    doctor_first: String,
    doctor_middle: String,
    doctor_specialization: String,
    service_name: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        service_id: row.get(3)?,
        appointment_date: row.get(4)?,
        appointment_time: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn read_view_row(row: &Row<'_>) -> rusqlite::Result<ViewRow> {
    Ok(ViewRow {
        appointment: read_row(row)?,
        patient_last: row.get(9)?,
        patient_first: row.get(10)?,
        patient_middle: row.get(11)?,
        patient_phone: row.get(12)?,
        doctor_last: row.get(13)?,
        doctor_first: row.get(14)?,
        doctor_middle: row.get(15)?,
        doctor_specialization: row.get(16)?,
        service_name: row.get(17)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: parse_uuid("appointments.id", &row.id)?,
        patient_id: parse_uuid("appointments.patient_id", &row.patient_id)?,
        doctor_id: parse_uuid("appointments.doctor_id", &row.doctor_id)?,
        service_id: parse_uuid("appointments.service_id", &row.service_id)?,
        appointment_date: parse_date("appointments.appointment_date", &row.appointment_date)?,
        appointment_time: parse_time("appointments.appointment_time", &row.appointment_time)?,
        status: row.status.parse()?,
        created_at: parse_timestamp("appointments.created_at", &row.created_at)?,
        updated_at: parse_timestamp("appointments.updated_at", &row.updated_at)?,
    })
}

fn view_from_row(row: ViewRow) -> Result<AppointmentView, DatabaseError> {
    Ok(AppointmentView::new(
        appointment_from_row(row.appointment)?,
        crate::models::display::full_name(&row.patient_last, &row.patient_first, &row.patient_middle),
        row.patient_phone,
        crate::models::display::full_name(&row.doctor_last, &row.doctor_first, &row.doctor_middle),
        row.doctor_specialization,
        row.service_name,
    ))
}

pub fn insert_appointment(conn: &Connection, appointment: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, service_id, appointment_date,
         appointment_time, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appointment.id.to_string(),
            appointment.patient_id.to_string(),
            appointment.doctor_id.to_string(),
            appointment.service_id.to_string(),
            date_to_sql(appointment.appointment_date),
            time_to_sql(appointment.appointment_time),
            appointment.status.as_str(),
            timestamp_to_sql(appointment.created_at),
            timestamp_to_sql(appointment.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(appointment_from_row).transpose()
}

pub fn get_appointment_view(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<AppointmentView>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS}, {VIEW_JOIN} WHERE a.id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_view_row)
        .optional()?;
    row.map(view_from_row).transpose()
}

/// Appointment listing with joined names.
///
/// A filter restricted to a patient lists newest first; every other
/// listing is chronological.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let mut sql = format!("SELECT {APPOINTMENT_COLUMNS}, {VIEW_JOIN} WHERE 1=1");
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(patient_id) = &filter.patient_id {
        values.push(Box::new(patient_id.to_string()));
        sql.push_str(&format!(" AND a.patient_id = ?{}", values.len()));
    }
    if let Some(doctor_id) = &filter.doctor_id {
        values.push(Box::new(doctor_id.to_string()));
        sql.push_str(&format!(" AND a.doctor_id = ?{}", values.len()));
    }
    if let Some(from) = filter.date_from {
        values.push(Box::new(date_to_sql(from)));
        sql.push_str(&format!(" AND a.appointment_date >= ?{}", values.len()));
    }
    if let Some(to) = filter.date_to {
        values.push(Box::new(date_to_sql(to)));
        sql.push_str(&format!(" AND a.appointment_date <= ?{}", values.len()));
    }
    if filter.active_only {
        sql.push_str(" AND a.status IN ('scheduled', 'confirmed')");
    }
    if filter.patient_id.is_some() {
        sql.push_str(" ORDER BY a.appointment_date DESC, a.appointment_time DESC");
    } else {
        sql.push_str(" ORDER BY a.appointment_date, a.appointment_time, d.last_name");
    }

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), read_view_row)?;

    let mut views = Vec::new();
    for row in rows {
        views.push(view_from_row(row?)?);
    }
    Ok(views)
}

pub fn list_patient_appointments(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    list_appointments(
        conn,
        &AppointmentFilter {
            patient_id: Some(*patient_id),
            ..Default::default()
        },
    )
}

pub fn list_appointments_by_date(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    list_appointments(conn, &AppointmentFilter::on_date(date))
}

pub fn list_doctor_appointments(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    list_appointments(
        conn,
        &AppointmentFilter {
            doctor_id: Some(*doctor_id),
            ..AppointmentFilter::on_date(date)
        },
    )
}

/// Inclusive date range. `start` after `end` is rejected.
pub fn list_appointments_by_date_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    if start > end {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Range start {start} is after end {end}"
        )));
    }
    list_appointments(
        conn,
        &AppointmentFilter {
            date_from: Some(start),
            date_to: Some(end),
            ..Default::default()
        },
    )
}

/// Start times a doctor already has taken on `date` (scheduled or confirmed).
pub fn booked_times(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<NaiveTime>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT appointment_time FROM appointments
         WHERE doctor_id = ?1 AND appointment_date = ?2
           AND status IN ('scheduled', 'confirmed')
         ORDER BY appointment_time",
    )?;
    let rows = stmt.query_map(params![doctor_id.to_string(), date_to_sql(date)], |row| {
        row.get::<_, String>(0)
    })?;
    let mut times = Vec::new();
    for row in rows {
        times.push(parse_time("appointments.appointment_time", &row?)?);
    }
    Ok(times)
}

/// No active appointment of the doctor at exactly this date and time.
pub fn is_time_slot_available(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<bool, DatabaseError> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM appointments
         WHERE doctor_id = ?1 AND appointment_date = ?2 AND appointment_time = ?3
           AND status IN ('scheduled', 'confirmed'))",
        params![doctor_id.to_string(), date_to_sql(date), time_to_sql(time)],
        |row| row.get(0),
    )?;
    Ok(!taken)
}

/// Move an appointment along its lifecycle. Disallowed transitions
/// (including anything out of a terminal status) are rejected.
pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    next: AppointmentStatus,
) -> Result<Appointment, DatabaseError> {
    let mut appointment =
        get_appointment(conn, id)?.ok_or_else(|| DatabaseError::not_found("Appointment", id))?;

    if appointment.status == next && next == AppointmentStatus::Cancelled {
        return Err(DatabaseError::ConstraintViolation(
            "Appointment is already cancelled".into(),
        ));
    }
    if !appointment.status.can_transition_to(next) {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Cannot change status from {} to {}",
            appointment.status, next
        )));
    }

    appointment.status = next;
    appointment.updated_at = now_timestamp();
    conn.execute(
        "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![
            id.to_string(),
            next.as_str(),
            timestamp_to_sql(appointment.updated_at)
        ],
    )?;
    tracing::info!(appointment_id = %id, status = %next, "Appointment status changed");
    Ok(appointment)
}

pub fn cancel_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, DatabaseError> {
    update_appointment_status(conn, id, AppointmentStatus::Cancelled)
}

/// Delete an appointment and its reviews.
pub fn delete_appointment(conn: &mut Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM reviews WHERE appointment_id = ?1",
        params![id.to_string()],
    )?;
    let affected = tx.execute("DELETE FROM appointments WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::tests::*;
    use crate::db::sqlite::open_memory_database;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    #[test]
    fn insert_get_and_view() {
        let conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        let a = fx.appointment(&conn, "10:30:00", AppointmentStatus::Scheduled);

        assert_eq!(get_appointment(&conn, &a.id).unwrap().unwrap(), a);
        let view = get_appointment_view(&conn, &a.id).unwrap().unwrap();
        assert_eq!(view.patient_full_name, "Ivanov Ivan");
        assert_eq!(view.doctor_full_name, "Smirnova Anna");
        assert_eq!(view.service_name, "Consultation");
        assert_eq!(view.formatted_time, "10:30");
        assert_eq!(view.display_status, "Scheduled");
    }

    #[test]
    fn listings_by_date_doctor_and_patient() {
        let conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        fx.appointment(&conn, "11:00:00", AppointmentStatus::Scheduled);
        fx.appointment(&conn, "09:00:00", AppointmentStatus::Confirmed);
        let other_day = fx.appointment_on(
            &conn,
            fx.date.succ_opt().unwrap(),
            "09:00:00",
            AppointmentStatus::Scheduled,
        );

        let day = list_appointments_by_date(&conn, fx.date).unwrap();
        let times: Vec<&str> = day.iter().map(|v| v.formatted_time.as_str()).collect();
        assert_eq!(times, vec!["09:00", "11:00"]);

        assert_eq!(list_doctor_appointments(&conn, &fx.doctor.id, fx.date).unwrap().len(), 2);
        assert!(list_doctor_appointments(&conn, &Uuid::new_v4(), fx.date)
            .unwrap()
            .is_empty());

        let history = list_patient_appointments(&conn, &fx.patient.id).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].appointment.id, other_day.id);
    }

    #[test]
    fn date_range_is_inclusive_and_ordered() {
        let conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        let next = fx.date.succ_opt().unwrap();
        fx.appointment(&conn, "09:00:00", AppointmentStatus::Scheduled);
        fx.appointment_on(&conn, next, "09:00:00", AppointmentStatus::Scheduled);
        fx.appointment_on(&conn, next.succ_opt().unwrap(), "09:00:00", AppointmentStatus::Scheduled);

        assert_eq!(list_appointments_by_date_range(&conn, fx.date, next).unwrap().len(), 2);
        assert!(matches!(
            list_appointments_by_date_range(&conn, next, fx.date).unwrap_err(),
            DatabaseError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn booked_times_ignore_inactive_statuses() {
        let conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        fx.appointment(&conn, "10:00:00", AppointmentStatus::Scheduled);
        fx.appointment(&conn, "11:00:00", AppointmentStatus::Cancelled);
        fx.appointment(&conn, "12:00:00", AppointmentStatus::Confirmed);
        fx.appointment(&conn, "13:00:00", AppointmentStatus::Completed);

        assert_eq!(
            booked_times(&conn, &fx.doctor.id, fx.date).unwrap(),
            vec![t("10:00:00"), t("12:00:00")]
        );
        assert!(!is_time_slot_available(&conn, &fx.doctor.id, fx.date, t("10:00:00")).unwrap());
        assert!(is_time_slot_available(&conn, &fx.doctor.id, fx.date, t("11:00:00")).unwrap());
    }

    #[test]
    fn status_lifecycle() {
        let conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        let a = fx.appointment(&conn, "10:00:00", AppointmentStatus::Scheduled);

        let confirmed = update_appointment_status(&conn, &a.id, AppointmentStatus::Confirmed).unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        assert!(update_appointment_status(&conn, &a.id, AppointmentStatus::Scheduled).is_err());

        update_appointment_status(&conn, &a.id, AppointmentStatus::Completed).unwrap();
        let err = cancel_appointment(&conn, &a.id).unwrap_err();
        assert!(err.to_string().contains("completed"));
    }

    #[test]
    fn cancel_twice_reports_already_cancelled() {
        let conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        let a = fx.appointment(&conn, "10:00:00", AppointmentStatus::Scheduled);
        cancel_appointment(&conn, &a.id).unwrap();
        let err = cancel_appointment(&conn, &a.id).unwrap_err();
        assert!(err.to_string().contains("already cancelled"));
    }

    #[test]
    fn missing_appointment_is_not_found() {
        let mut conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(
            cancel_appointment(&conn, &id).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
        assert!(matches!(
            delete_appointment(&mut conn, &id).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn delete_removes_reviews() {
        let mut conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        let a = fx.appointment(&conn, "10:00:00", AppointmentStatus::Completed);
        conn.execute(
            "INSERT INTO reviews (id, appointment_id, rating, created_at)
             VALUES (?1, ?2, 4, '2025-01-01 00:00:00')",
            params![Uuid::new_v4().to_string(), a.id.to_string()],
        )
        .unwrap();
        delete_appointment(&mut conn, &a.id).unwrap();
        assert!(get_appointment(&conn, &a.id).unwrap().is_none());
    }
}
