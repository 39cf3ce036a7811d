use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::display;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub specialization: String,
    pub license_number: String,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub specialization: String,
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Doctor {
    pub fn new(input: DoctorInput, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            middle_name: input.middle_name.trim().to_string(),
            specialization: input.specialization.trim().to_string(),
            license_number: input.license_number.trim().to_string(),
            phone: input.phone.trim().to_string(),
            email: input.email.trim().to_string(),
            is_active: input.is_active,
            created_at: now,
        }
    }

    pub fn apply(&mut self, input: DoctorInput) {
        let updated = Self::new(input, self.created_at);
        *self = Self { id: self.id, ..updated };
    }

    pub fn full_name(&self) -> String {
        display::full_name(&self.last_name, &self.first_name, &self.middle_name)
    }

    pub fn short_name(&self) -> String {
        display::short_name(&self.last_name, &self.first_name, &self.middle_name)
    }

    pub fn full_info(&self) -> String {
        format!("{} - {}", self.full_name(), self.specialization)
    }

    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            full_name: self.full_name(),
            short_name: self.short_name(),
            full_info: self.full_info(),
            display_status: display::active_label(self.is_active),
            doctor: self.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorSummary {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub full_name: String,
    pub short_name: String,
    pub full_info: String,
    pub display_status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn input() -> DoctorInput {
        DoctorInput {
            first_name: "Pavel".into(),
            last_name: "Orlov".into(),
            middle_name: String::new(),
            specialization: " Cardiology ".into(),
            license_number: "LIC-1".into(),
            phone: String::new(),
            email: String::new(),
            is_active: true,
        }
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn derived_names() {
        let d = Doctor::new(input(), ts());
        assert_eq!(d.full_name(), "Orlov Pavel");
        assert_eq!(d.short_name(), "Orlov P.");
        assert_eq!(d.full_info(), "Orlov Pavel - Cardiology");
        assert_eq!(d.summary().display_status, "Active");
    }

    #[test]
    fn apply_keeps_id_and_created_at() {
        let mut d = Doctor::new(input(), ts());
        let id = d.id;
        let mut changed = input();
        changed.specialization = "Neurology".into();
        changed.is_active = false;
        d.apply(changed);
        assert_eq!(d.id, id);
        assert_eq!(d.created_at, ts());
        assert_eq!(d.specialization, "Neurology");
        assert!(!d.is_active);
    }

    #[test]
    fn is_active_defaults_to_true_when_omitted() {
        let input: DoctorInput = serde_json::from_str(
            r#"{"first_name":"A","last_name":"B","specialization":"ENT"}"#,
        )
        .unwrap();
        assert!(input.is_active);
    }
}
