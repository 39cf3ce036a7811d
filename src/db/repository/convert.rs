//! TEXT column codecs shared by the entity repositories.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use uuid::Uuid;

use crate::db::DatabaseError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn time_to_sql(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn timestamp_to_sql(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    // Stored with second precision; truncate so round-trips compare equal.
    now.with_nanosecond(0).unwrap_or(now)
}

fn corrupt(column: &str, value: &str) -> DatabaseError {
    DatabaseError::ConstraintViolation(format!("Corrupt {column} value: {value:?}"))
}

pub fn parse_uuid(column: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| corrupt(column, value))
}

pub fn parse_date(column: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| corrupt(column, value))
}

/// Accepts `HH:MM:SS` and the shorter `HH:MM`.
pub fn parse_time(column: &str, value: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| corrupt(column, value))
}

pub fn parse_timestamp(column: &str, value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| corrupt(column, value))
}
