use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::*;
use crate::db::DatabaseError;
use crate::models::*;

const SCHEDULE_COLUMNS: &str = "id, doctor_id, day_of_week, start_time, end_time, is_active";

struct ScheduleRow {
    id: String,
    doctor_id: String,
    day_of_week: u8,
    start_time: String,
    end_time: String,
    is_active: bool,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ScheduleRow> {
    Ok(ScheduleRow {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        day_of_week: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn schedule_from_row(row: ScheduleRow) -> Result<DoctorSchedule, DatabaseError> {
    Ok(DoctorSchedule {
        id: parse_uuid("doctor_schedules.id", &row.id)?,
        doctor_id: parse_uuid("doctor_schedules.doctor_id", &row.doctor_id)?,
        day_of_week: row.day_of_week,
        start_time: parse_time("doctor_schedules.start_time", &row.start_time)?,
        end_time: parse_time("doctor_schedules.end_time", &row.end_time)?,
        is_active: row.is_active,
    })
}

fn query_schedules(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<DoctorSchedule>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read_row)?;
    let mut schedules = Vec::new();
    for row in rows {
        schedules.push(schedule_from_row(row?)?);
    }
    Ok(schedules)
}

fn ensure_doctor_exists(conn: &Connection, doctor_id: &Uuid) -> Result<(), DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM doctors WHERE id = ?1)",
        params![doctor_id.to_string()],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(DatabaseError::not_found("Doctor", doctor_id));
    }
    Ok(())
}

fn day_conflict(day_of_week: u8) -> DatabaseError {
    DatabaseError::ConstraintViolation(format!(
        "Doctor already has a schedule for {}",
        day_name(day_of_week)
    ))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Insert a schedule row. The doctor must exist and must not already
/// have a row for the same weekday.
pub fn insert_schedule(conn: &Connection, schedule: &DoctorSchedule) -> Result<(), DatabaseError> {
    ensure_doctor_exists(conn, &schedule.doctor_id)?;
    conn.execute(
        "INSERT INTO doctor_schedules (id, doctor_id, day_of_week, start_time, end_time, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            schedule.id.to_string(),
            schedule.doctor_id.to_string(),
            schedule.day_of_week,
            time_to_sql(schedule.start_time),
            time_to_sql(schedule.end_time),
            schedule.is_active,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            day_conflict(schedule.day_of_week)
        } else {
            e.into()
        }
    })?;
    Ok(())
}

/// Insert a schedule, or with `replace_existing` overwrite the doctor's
/// row for that weekday in place (keeping its id).
pub fn save_schedule(
    conn: &Connection,
    schedule: &DoctorSchedule,
    replace_existing: bool,
) -> Result<DoctorSchedule, DatabaseError> {
    let existing = list_schedules_by_day(conn, &schedule.doctor_id, schedule.day_of_week)?;
    match existing.into_iter().next() {
        None => {
            insert_schedule(conn, schedule)?;
            Ok(schedule.clone())
        }
        Some(_) if !replace_existing => Err(day_conflict(schedule.day_of_week)),
        Some(current) => {
            let replaced = DoctorSchedule {
                id: current.id,
                ..schedule.clone()
            };
            update_schedule(conn, &replaced)?;
            tracing::info!(
                doctor_id = %schedule.doctor_id,
                day = schedule.day_of_week,
                "Replaced existing schedule"
            );
            Ok(replaced)
        }
    }
}

pub fn get_schedule(conn: &Connection, id: &Uuid) -> Result<Option<DoctorSchedule>, DatabaseError> {
    let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM doctor_schedules WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(schedule_from_row).transpose()
}

pub fn list_schedules(conn: &Connection, doctor_id: &Uuid) -> Result<Vec<DoctorSchedule>, DatabaseError> {
    let sql = format!(
        "SELECT {SCHEDULE_COLUMNS} FROM doctor_schedules
         WHERE doctor_id = ?1 ORDER BY day_of_week, start_time"
    );
    query_schedules(conn, &sql, params![doctor_id.to_string()])
}

pub fn list_schedules_by_day(
    conn: &Connection,
    doctor_id: &Uuid,
    day_of_week: u8,
) -> Result<Vec<DoctorSchedule>, DatabaseError> {
    let sql = format!(
        "SELECT {SCHEDULE_COLUMNS} FROM doctor_schedules
         WHERE doctor_id = ?1 AND day_of_week = ?2 ORDER BY start_time"
    );
    query_schedules(conn, &sql, params![doctor_id.to_string(), day_of_week])
}

/// Active working windows for one weekday, earliest first.
pub fn active_windows(
    conn: &Connection,
    doctor_id: &Uuid,
    day_of_week: u8,
) -> Result<Vec<DoctorSchedule>, DatabaseError> {
    let sql = format!(
        "SELECT {SCHEDULE_COLUMNS} FROM doctor_schedules
         WHERE doctor_id = ?1 AND day_of_week = ?2 AND is_active = 1
         ORDER BY start_time"
    );
    query_schedules(conn, &sql, params![doctor_id.to_string(), day_of_week])
}

pub fn update_schedule(conn: &Connection, schedule: &DoctorSchedule) -> Result<(), DatabaseError> {
    let affected = conn
        .execute(
            "UPDATE doctor_schedules SET day_of_week = ?2, start_time = ?3, end_time = ?4,
             is_active = ?5
             WHERE id = ?1",
            params![
                schedule.id.to_string(),
                schedule.day_of_week,
                time_to_sql(schedule.start_time),
                time_to_sql(schedule.end_time),
                schedule.is_active,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                day_conflict(schedule.day_of_week)
            } else {
                e.into()
            }
        })?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Schedule", schedule.id));
    }
    Ok(())
}

pub fn delete_schedule(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM doctor_schedules WHERE id = ?1",
        params![id.to_string()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::not_found("Schedule", id));
    }
    Ok(())
}

/// Keep a single row per doctor and weekday (the earliest-starting one),
/// deleting the rest. Returns the number of rows removed.
///
/// The unique index prevents new duplicates; this cleans databases
/// created before it existed.
pub fn remove_duplicate_schedules(conn: &Connection) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM doctor_schedules
         WHERE rowid NOT IN (
             SELECT rowid FROM (
                 SELECT rowid, ROW_NUMBER() OVER (
                     PARTITION BY doctor_id, day_of_week ORDER BY start_time, rowid
                 ) AS rn
                 FROM doctor_schedules
             ) WHERE rn = 1
         )",
        [],
    )?;
    if removed > 0 {
        tracing::info!(removed, "Removed duplicate doctor schedules");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::tests::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveTime;

    fn window(doctor_id: Uuid, day: u8, start: &str, end: &str) -> DoctorSchedule {
        DoctorSchedule::new(
            doctor_id,
            ScheduleInput {
                day_of_week: day,
                start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
                end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
                is_active: true,
            },
        )
    }

    #[test]
    fn insert_and_list_ordered_by_day() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        insert_schedule(&conn, &window(d.id, 3, "09:00", "13:00")).unwrap();
        insert_schedule(&conn, &window(d.id, 1, "10:00", "18:00")).unwrap();

        let days: Vec<u8> = list_schedules(&conn, &d.id)
            .unwrap()
            .iter()
            .map(|s| s.day_of_week)
            .collect();
        assert_eq!(days, vec![1, 3]);
    }

    #[test]
    fn unknown_doctor_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = insert_schedule(&conn, &window(Uuid::new_v4(), 1, "09:00", "12:00")).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn second_window_same_day_conflicts() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        insert_schedule(&conn, &window(d.id, 2, "09:00", "12:00")).unwrap();
        let err = insert_schedule(&conn, &window(d.id, 2, "14:00", "18:00")).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(ref m) if m.contains("Tuesday")));
    }

    #[test]
    fn save_with_replace_overwrites_in_place() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        let first = save_schedule(&conn, &window(d.id, 5, "09:00", "12:00"), false).unwrap();

        assert!(save_schedule(&conn, &window(d.id, 5, "13:00", "17:00"), false).is_err());
        let replaced = save_schedule(&conn, &window(d.id, 5, "13:00", "17:00"), true).unwrap();

        assert_eq!(replaced.id, first.id);
        let rows = list_schedules_by_day(&conn, &d.id, 5).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time_range(), "13:00 - 17:00");
    }

    #[test]
    fn inactive_windows_are_not_working_hours() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        let mut s = window(d.id, 4, "09:00", "12:00");
        s.is_active = false;
        insert_schedule(&conn, &s).unwrap();
        assert!(active_windows(&conn, &d.id, 4).unwrap().is_empty());
        assert_eq!(list_schedules_by_day(&conn, &d.id, 4).unwrap().len(), 1);
    }

    #[test]
    fn end_before_start_rejected_by_schema() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        let err = insert_schedule(&conn, &window(d.id, 1, "12:00", "09:00")).unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
    }

    #[test]
    fn deduplicate_keeps_earliest_window() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        conn.execute("DROP INDEX idx_doctor_schedules_day", []).unwrap();
        insert_schedule(&conn, &window(d.id, 1, "14:00", "18:00")).unwrap();
        insert_schedule(&conn, &window(d.id, 1, "09:00", "12:00")).unwrap();
        insert_schedule(&conn, &window(d.id, 2, "09:00", "12:00")).unwrap();

        assert_eq!(remove_duplicate_schedules(&conn).unwrap(), 1);
        let monday = list_schedules_by_day(&conn, &d.id, 1).unwrap();
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].time_range(), "09:00 - 12:00");
        assert_eq!(remove_duplicate_schedules(&conn).unwrap(), 0);
    }

    #[test]
    fn delete_schedule_and_missing() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        let s = window(d.id, 1, "09:00", "12:00");
        insert_schedule(&conn, &s).unwrap();
        delete_schedule(&conn, &s.id).unwrap();
        assert!(get_schedule(&conn, &s.id).unwrap().is_none());
        assert!(matches!(
            delete_schedule(&conn, &s.id).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn deleting_doctor_removes_schedules() {
        let conn = open_memory_database().unwrap();
        let d = make_doctor(&conn, "Smirnova", "Therapist");
        insert_schedule(&conn, &window(d.id, 1, "09:00", "12:00")).unwrap();
        crate::db::delete_doctor(&conn, &d.id).unwrap();
        assert!(list_schedules(&conn, &d.id).unwrap().is_empty());
    }
}
