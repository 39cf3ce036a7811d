use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::display;

/// A weekly recurring working window for one doctor on one weekday.
///
/// `day_of_week` is ISO numbering: Monday = 1 … Sunday = 7.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Name for an ISO weekday number, "Unknown" outside 1..=7.
pub fn day_name(day_of_week: u8) -> &'static str {
    match day_of_week {
        1..=7 => DAY_NAMES[usize::from(day_of_week - 1)],
        _ => "Unknown",
    }
}

/// ISO weekday number of a calendar date.
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

impl DoctorSchedule {
    pub fn new(doctor_id: Uuid, input: ScheduleInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week: input.day_of_week,
            start_time: input.start_time,
            end_time: input.end_time,
            is_active: input.is_active,
        }
    }

    pub fn day_name(&self) -> &'static str {
        day_name(self.day_of_week)
    }

    /// "09:00 - 17:00"
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            display::format_time(self.start_time),
            display::format_time(self.end_time)
        )
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            day_name: self.day_name(),
            time_range: self.time_range(),
            display_status: display::active_label(self.is_active),
            schedule: self.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSummary {
    #[serde(flatten)]
    pub schedule: DoctorSchedule,
    pub day_name: &'static str,
    pub time_range: String,
    pub display_status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn day_names_are_iso_numbered() {
        assert_eq!(day_name(1), "Monday");
        assert_eq!(day_name(7), "Sunday");
        assert_eq!(day_name(0), "Unknown");
        assert_eq!(day_name(8), "Unknown");
    }

    #[test]
    fn weekday_of_sunday_is_seven() {
        // 2025-03-09 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(weekday_of(sunday), 7);
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(weekday_of(monday), 1);
    }

    #[test]
    fn summary_fields() {
        let s = DoctorSchedule::new(
            Uuid::new_v4(),
            ScheduleInput {
                day_of_week: 3,
                start_time: t(9, 0),
                end_time: t(17, 30),
                is_active: false,
            },
        );
        let summary = s.summary();
        assert_eq!(summary.day_name, "Wednesday");
        assert_eq!(summary.time_range, "09:00 - 17:30");
        assert_eq!(summary.display_status, "Inactive");
    }
}
