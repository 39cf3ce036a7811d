use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::display;
use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }

    pub fn formatted_time(&self) -> String {
        display::format_time(self.appointment_time)
    }

    /// "dd.mm.yyyy HH:MM"
    pub fn formatted_date_time(&self) -> String {
        format!(
            "{} {}",
            display::format_date(self.appointment_date),
            self.formatted_time()
        )
    }
}

/// Appointment joined with the names of the people and service involved,
/// as shown in appointment listings.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_full_name: String,
    pub patient_phone: String,
    pub doctor_full_name: String,
    pub doctor_specialization: String,
    pub service_name: String,
    pub formatted_time: String,
    pub formatted_date_time: String,
    pub display_status: &'static str,
}

impl AppointmentView {
    pub fn new(
        appointment: Appointment,
        patient_full_name: String,
        patient_phone: String,
        doctor_full_name: String,
        doctor_specialization: String,
        service_name: String,
    ) -> Self {
        Self {
            formatted_time: appointment.formatted_time(),
            formatted_date_time: appointment.formatted_date_time(),
            display_status: appointment.status.label(),
            appointment,
            patient_full_name,
            patient_phone,
            doctor_full_name,
            doctor_specialization,
            service_name,
        }
    }
}
