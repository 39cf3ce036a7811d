//! Input rules checked before anything reaches the database.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use thiserror::Error;

use crate::models::{DoctorInput, PatientInput, ScheduleInput, ServiceInput, UserInput};

pub const MIN_PHONE_DIGITS: usize = 10;
pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Phone number must contain at least {MIN_PHONE_DIGITS} digits")]
    InvalidPhone,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Service duration must be positive")]
    InvalidDuration,

    #[error("Service price cannot be negative")]
    NegativePrice,

    #[error("Day of week must be between 1 and 7, got {0}")]
    InvalidDay(u8),

    #[error("End time {end} must be after start time {start}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Separators and `+` are ignored; only digits count.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits < MIN_PHONE_DIGITS {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(())
}

/// Empty is accepted; anything else must look like an address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if !email.is_empty() && !EMAIL.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

pub fn validate_patient(input: &PatientInput) -> Result<(), ValidationError> {
    require(&input.last_name, "Last name")?;
    require(&input.first_name, "First name")?;
    require(&input.phone, "Phone")?;
    validate_phone(&input.phone)?;
    validate_email(&input.email)
}

pub fn validate_doctor(input: &DoctorInput) -> Result<(), ValidationError> {
    require(&input.last_name, "Last name")?;
    require(&input.first_name, "First name")?;
    require(&input.specialization, "Specialization")?;
    validate_email(&input.email)
}

pub fn validate_service(input: &ServiceInput) -> Result<(), ValidationError> {
    require(&input.name, "Service name")?;
    if input.duration_minutes == 0 {
        return Err(ValidationError::InvalidDuration);
    }
    if input.price_minor < 0 {
        return Err(ValidationError::NegativePrice);
    }
    Ok(())
}

pub fn validate_schedule(input: &ScheduleInput) -> Result<(), ValidationError> {
    if !(1..=7).contains(&input.day_of_week) {
        return Err(ValidationError::InvalidDay(input.day_of_week));
    }
    if input.end_time <= input.start_time {
        return Err(ValidationError::InvalidTimeRange {
            start: input.start_time,
            end: input.end_time,
        });
    }
    Ok(())
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// `creating` makes the password mandatory; on update an absent or
/// empty password means "keep the current one".
pub fn validate_user(input: &UserInput, creating: bool) -> Result<(), ValidationError> {
    require(&input.username, "Username")?;
    match input.password.as_deref().filter(|p| !p.is_empty()) {
        None if creating => Err(ValidationError::Required("Password")),
        Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => {
            Err(ValidationError::PasswordTooShort)
        }
        _ => validate_email(&input.email),
    }
}
