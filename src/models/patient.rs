use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::display;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub telegram_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub phone: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub passport: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable patient fields (registration and update forms).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub passport: String,
}

impl PatientInput {
    /// Copy of the input with surrounding whitespace removed.
    pub fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            middle_name: self.middle_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            birth_date: self.birth_date,
            passport: self.passport.trim().to_string(),
        }
    }
}

impl Patient {
    pub fn new(input: PatientInput, now: NaiveDateTime) -> Self {
        let input = input.trimmed();
        Self {
            id: Uuid::new_v4(),
            telegram_id: None,
            first_name: input.first_name,
            last_name: input.last_name,
            middle_name: input.middle_name,
            phone: input.phone,
            email: input.email,
            birth_date: input.birth_date,
            passport: input.passport,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields, keeping id, telegram link and creation time.
    pub fn apply(&mut self, input: PatientInput, now: NaiveDateTime) {
        let input = input.trimmed();
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.middle_name = input.middle_name;
        self.phone = input.phone;
        self.email = input.email;
        self.birth_date = input.birth_date;
        self.passport = input.passport;
        self.updated_at = now;
    }

    pub fn full_name(&self) -> String {
        display::full_name(&self.last_name, &self.first_name, &self.middle_name)
    }

    pub fn short_name(&self) -> String {
        display::short_name(&self.last_name, &self.first_name, &self.middle_name)
    }

    pub fn formatted_phone(&self) -> String {
        display::format_phone(&self.phone)
    }

    pub fn display_email(&self) -> &str {
        if self.email.trim().is_empty() {
            "not specified"
        } else {
            &self.email
        }
    }

    /// Birth date if it is plausible on `today` (after 1900, not in the future).
    fn known_birth_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.birth_date.filter(|d| d.year() > 1900 && *d <= today)
    }

    pub fn formatted_birth_date_on(&self, today: NaiveDate) -> String {
        self.known_birth_date(today)
            .map(display::format_date)
            .unwrap_or_else(|| display::NOT_SPECIFIED.to_string())
    }

    /// Full years on `today`; 0 when the birth date is unknown.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let Some(birth) = self.known_birth_date(today) else {
            return 0;
        };
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    pub fn summary(&self) -> PatientSummary {
        self.summary_on(Local::now().date_naive())
    }

    pub fn summary_on(&self, today: NaiveDate) -> PatientSummary {
        let formatted_birth_date = self.formatted_birth_date_on(today);
        let age = self.age_on(today);
        PatientSummary {
            full_info: format!(
                "{} | {} | {} ({} y.o.)",
                self.full_name(),
                self.phone,
                formatted_birth_date,
                age
            ),
            full_name: self.full_name(),
            short_name: self.short_name(),
            formatted_phone: self.formatted_phone(),
            display_email: self.display_email().to_string(),
            formatted_birth_date,
            age,
            patient: self.clone(),
        }
    }
}

/// Patient record plus the derived display fields.
#[derive(Debug, Clone, Serialize)]
pub struct PatientSummary {
    #[serde(flatten)]
    pub patient: Patient,
    pub full_name: String,
    pub short_name: String,
    pub formatted_phone: String,
    pub display_email: String,
    pub formatted_birth_date: String,
    pub age: u32,
    pub full_info: String,
}

/// Rows removed by a cascading patient delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientDeletion {
    pub appointments: usize,
    pub reviews: usize,
    pub notifications: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn patient(birth: Option<NaiveDate>) -> Patient {
        Patient::new(
            PatientInput {
                first_name: " Anna ".into(),
                last_name: "Smirnova".into(),
                middle_name: "Olegovna".into(),
                phone: "89161234567".into(),
                email: String::new(),
                birth_date: birth,
                passport: String::new(),
            },
            ts(),
        )
    }

    #[test]
    fn new_trims_input() {
        let p = patient(None);
        assert_eq!(p.first_name, "Anna");
        assert_eq!(p.full_name(), "Smirnova Anna Olegovna");
        assert_eq!(p.short_name(), "Smirnova A. O.");
    }

    #[test]
    fn age_before_and_after_birthday() {
        let p = patient(NaiveDate::from_ymd_opt(1990, 6, 15));
        let before = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(p.age_on(before), 34);
        assert_eq!(p.age_on(on), 35);
    }

    #[test]
    fn implausible_birth_dates_are_unknown() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let old = patient(NaiveDate::from_ymd_opt(1900, 1, 1));
        assert_eq!(old.age_on(today), 0);
        assert_eq!(old.formatted_birth_date_on(today), display::NOT_SPECIFIED);

        let future = patient(NaiveDate::from_ymd_opt(2030, 1, 1));
        assert_eq!(future.age_on(today), 0);

        let missing = patient(None);
        assert_eq!(missing.formatted_birth_date_on(today), display::NOT_SPECIFIED);
    }

    #[test]
    fn summary_carries_derived_fields() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let p = patient(NaiveDate::from_ymd_opt(1985, 2, 1));
        let s = p.summary_on(today);
        assert_eq!(s.formatted_birth_date, "01.02.1985");
        assert_eq!(s.age, 39);
        assert_eq!(s.formatted_phone, "+7 (916) 123-45-67");
        assert_eq!(s.display_email, "not specified");
        assert!(s.full_info.starts_with("Smirnova Anna Olegovna | 89161234567"));

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["last_name"], "Smirnova");
        assert_eq!(json["full_name"], "Smirnova Anna Olegovna");
    }

    #[test]
    fn apply_keeps_identity() {
        let mut p = patient(None);
        let id = p.id;
        let later = ts() + chrono::Duration::hours(1);
        p.apply(
            PatientInput {
                first_name: "Anna".into(),
                last_name: "Kuznetsova".into(),
                phone: "9160000000".into(),
                ..Default::default()
            },
            later,
        );
        assert_eq!(p.id, id);
        assert_eq!(p.last_name, "Kuznetsova");
        assert_eq!(p.created_at, ts());
        assert_eq!(p.updated_at, later);
    }
}
