//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table; all public functions are re-exported here.

mod appointment;
mod convert;
mod doctor;
mod patient;
mod schedule;
mod service;
mod user;

pub use appointment::*;
pub use convert::now_timestamp;
pub use doctor::*;
pub use patient::*;
pub use schedule::*;
pub use service::*;
pub use user::*;

/// Shared fixtures for repository and service-layer tests.
#[cfg(test)]
pub(crate) mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use rusqlite::Connection;
    use uuid::Uuid;

    use super::*;
    use crate::models::*;

    pub fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    pub fn make_patient(conn: &Connection, last_name: &str, phone: &str) -> Patient {
        let patient = Patient::new(
            PatientInput {
                first_name: "Ivan".into(),
                last_name: last_name.into(),
                phone: phone.into(),
                ..Default::default()
            },
            now_timestamp(),
        );
        insert_patient(conn, &patient).unwrap();
        patient
    }

    pub fn make_doctor(conn: &Connection, last_name: &str, specialization: &str) -> Doctor {
        let doctor = Doctor::new(
            DoctorInput {
                first_name: "Anna".into(),
                last_name: last_name.into(),
                middle_name: String::new(),
                specialization: specialization.into(),
                license_number: "LIC-001".into(),
                phone: String::new(),
                email: String::new(),
                is_active: true,
            },
            ts("2025-01-01 08:00:00"),
        );
        insert_doctor(conn, &doctor).unwrap();
        doctor
    }

    pub fn make_service(conn: &Connection, name: &str) -> Service {
        let service = Service::new(ServiceInput {
            name: name.into(),
            description: String::new(),
            duration_minutes: 30,
            price_minor: 150_000,
            is_active: true,
        });
        insert_service(conn, &service).unwrap();
        service
    }

    pub fn make_user_value(username: &str, role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: "pbkdf2$1$c2FsdA$aGFzaA".into(),
            role,
            full_name: String::new(),
            email: String::new(),
            is_active: true,
            created_at: ts("2025-01-01 08:00:00"),
        }
    }

    pub fn make_user(conn: &Connection, username: &str, role: UserRole) -> User {
        let user = make_user_value(username, role);
        insert_user(conn, &user).unwrap();
        user
    }

    /// A patient, a therapist and a consultation, on a fixed Monday.
    pub struct Fixture {
        pub patient: Patient,
        pub doctor: Doctor,
        pub service: Service,
        pub date: NaiveDate,
    }

    impl Fixture {
        pub fn new(conn: &Connection) -> Self {
            Self {
                patient: make_patient(conn, "Ivanov", "89161234567"),
                doctor: make_doctor(conn, "Smirnova", "Therapist"),
                service: make_service(conn, "Consultation"),
                date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            }
        }

        pub fn appointment(&self, conn: &Connection, time: &str, status: AppointmentStatus) -> Appointment {
            self.appointment_on(conn, self.date, time, status)
        }

        pub fn appointment_on(
            &self,
            conn: &Connection,
            date: NaiveDate,
            time: &str,
            status: AppointmentStatus,
        ) -> Appointment {
            let appointment = Appointment {
                id: Uuid::new_v4(),
                patient_id: self.patient.id,
                doctor_id: self.doctor.id,
                service_id: self.service.id,
                appointment_date: date,
                appointment_time: NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
                status,
                created_at: ts("2025-03-01 09:00:00"),
                updated_at: ts("2025-03-01 09:00:00"),
            };
            insert_appointment(conn, &appointment).unwrap();
            appointment
        }
    }
}
