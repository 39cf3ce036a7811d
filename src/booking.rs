//! Appointment booking.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{weekday_of, Appointment, AppointmentStatus};
use crate::scheduling;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Patient not found: {0}")]
    PatientNotFound(Uuid),

    #[error("Doctor {0} does not exist or is not active")]
    DoctorUnavailable(Uuid),

    #[error("Service {0} does not exist or is not active")]
    ServiceUnavailable(Uuid),

    #[error("Cannot book on {0}: the date is in the past")]
    PastDate(NaiveDate),

    #[error("Cannot book at {0}: the time has already passed")]
    PastTime(NaiveTime),

    #[error("{time} on {date} is outside the doctor's working hours")]
    OutsideWorkingHours { date: NaiveDate, time: NaiveTime },

    #[error("The slot {time} on {date} is already taken")]
    SlotTaken { date: NaiveDate, time: NaiveTime },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Book a new `scheduled` appointment.
///
/// The slot check and the insert share one IMMEDIATE transaction, so two
/// concurrent bookings of the same slot cannot both succeed.
pub fn book_appointment(
    conn: &mut Connection,
    request: &BookingRequest,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    if db::get_patient(conn, &request.patient_id)?.is_none() {
        return Err(BookingError::PatientNotFound(request.patient_id));
    }
    match db::get_doctor(conn, &request.doctor_id)? {
        Some(d) if d.is_active => {}
        _ => return Err(BookingError::DoctorUnavailable(request.doctor_id)),
    }
    match db::get_service(conn, &request.service_id)? {
        Some(s) if s.is_active => {}
        _ => return Err(BookingError::ServiceUnavailable(request.service_id)),
    }

    let today = now.date();
    if request.date < today {
        return Err(BookingError::PastDate(request.date));
    }
    if request.date == today && request.time < now.time() {
        return Err(BookingError::PastTime(request.time));
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;

    let windows = db::active_windows(&tx, &request.doctor_id, weekday_of(request.date))?;
    if !scheduling::within_working_hours(&windows, request.time) {
        return Err(BookingError::OutsideWorkingHours {
            date: request.date,
            time: request.time,
        });
    }
    let slots = scheduling::available_slots_for(&tx, &request.doctor_id, request.date)?;
    if !slots.contains(&request.time)
        || !db::is_time_slot_available(&tx, &request.doctor_id, request.date, request.time)?
    {
        return Err(BookingError::SlotTaken {
            date: request.date,
            time: request.time,
        });
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: request.patient_id,
        doctor_id: request.doctor_id,
        service_id: request.service_id,
        appointment_date: request.date,
        appointment_time: request.time,
        status: AppointmentStatus::Scheduled,
        created_at: now,
        updated_at: now,
    };
    db::insert_appointment(&tx, &appointment)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        appointment_id = %appointment.id,
        doctor_id = %appointment.doctor_id,
        date = %appointment.appointment_date,
        time = %appointment.appointment_time,
        "Appointment booked"
    );
    Ok(appointment)
}
