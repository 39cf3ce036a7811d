use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Only `scheduled` / `confirmed` rows.
    pub active_only: bool,
}

impl AppointmentFilter {
    pub fn on_date(date: NaiveDate) -> Self {
        Self {
            date_from: Some(date),
            date_to: Some(date),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DoctorFilter {
    pub specialization: Option<String>,
    pub active_only: bool,
}
