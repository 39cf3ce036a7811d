//! Available appointment slots for a doctor on a date.
//!
//! A slot is a 30-minute candidate start time inside one of the doctor's
//! active weekly working windows for that weekday. Candidates within one
//! minute of an already booked start time are removed.

use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{weekday_of, DoctorSchedule};

pub const SLOT_MINUTES: i64 = 30;

/// Candidates closer than this to a booked time are taken.
const BOOKED_TOLERANCE_SECS: i64 = 60;

/// Slots for one day given its working windows and booked start times.
///
/// Inactive windows are skipped; the rest are walked in start-time order,
/// emitting `start, start + 30m, ...` while the slot still ends within the
/// window. A window shorter than one slot yields nothing.
pub fn available_slots(windows: &[DoctorSchedule], booked: &[NaiveTime]) -> Vec<NaiveTime> {
    let step = Duration::minutes(SLOT_MINUTES);

    let mut active: Vec<&DoctorSchedule> = windows.iter().filter(|w| w.is_active).collect();
    active.sort_by_key(|w| w.start_time);

    let mut slots = Vec::new();
    for window in active {
        let mut candidate = window.start_time;
        loop {
            let (slot_end, wrapped) = candidate.overflowing_add_signed(step);
            if wrapped != 0 || slot_end > window.end_time {
                break;
            }
            if !is_booked(candidate, booked) {
                slots.push(candidate);
            }
            candidate = slot_end;
        }
    }
    slots
}

fn is_booked(candidate: NaiveTime, booked: &[NaiveTime]) -> bool {
    booked
        .iter()
        .any(|b| (candidate - *b).num_seconds().abs() < BOOKED_TOLERANCE_SECS)
}

/// Whether `time` is one of the generated candidates of any active window,
/// ignoring bookings.
pub fn within_working_hours(windows: &[DoctorSchedule], time: NaiveTime) -> bool {
    available_slots(windows, &[]).contains(&time)
}

/// Load windows and bookings for `doctor_id` on `date` and compute its slots.
pub fn available_slots_for(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<NaiveTime>, DatabaseError> {
    let windows = db::active_windows(conn, doctor_id, weekday_of(date))?;
    let booked = db::booked_times(conn, doctor_id, date)?;
    let slots = available_slots(&windows, &booked);
    tracing::debug!(
        doctor_id = %doctor_id,
        %date,
        windows = windows.len(),
        booked = booked.len(),
        slots = slots.len(),
        "Computed available slots"
    );
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleInput;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .unwrap()
    }

    fn window(start: &str, end: &str) -> DoctorSchedule {
        DoctorSchedule::new(
            Uuid::nil(),
            ScheduleInput {
                day_of_week: 1,
                start_time: t(start),
                end_time: t(end),
                is_active: true,
            },
        )
    }

    fn labels(slots: &[NaiveTime]) -> Vec<String> {
        slots.iter().map(|s| s.format("%H:%M").to_string()).collect()
    }

    #[test]
    fn full_window_without_bookings() {
        let slots = available_slots(&[window("09:00", "11:00")], &[]);
        assert_eq!(labels(&slots), vec!["09:00", "09:30", "10:00", "10:30"]);
    }

    #[test]
    fn last_slot_must_fit_before_end() {
        let slots = available_slots(&[window("09:00", "10:45")], &[]);
        assert_eq!(labels(&slots), vec!["09:00", "09:30", "10:00"]);
    }

    #[test]
    fn window_shorter_than_slot_is_empty() {
        assert!(available_slots(&[window("09:00", "09:20")], &[]).is_empty());
    }

    #[test]
    fn booked_times_are_removed() {
        let slots = available_slots(&[window("09:00", "11:00")], &[t("09:30"), t("10:30")]);
        assert_eq!(labels(&slots), vec!["09:00", "10:00"]);
    }

    #[test]
    fn booking_within_a_minute_blocks_candidate() {
        let slots = available_slots(&[window("09:00", "10:00")], &[t("09:00:59")]);
        assert_eq!(labels(&slots), vec!["09:30"]);
    }

    #[test]
    fn booking_a_full_minute_away_does_not_block() {
        let slots = available_slots(&[window("09:00", "10:00")], &[t("09:01:00")]);
        assert_eq!(labels(&slots), vec!["09:00", "09:30"]);
    }

    #[test]
    fn off_grid_booking_blocks_nothing() {
        let slots = available_slots(&[window("09:00", "10:00")], &[t("09:15")]);
        assert_eq!(labels(&slots), vec!["09:00", "09:30"]);
    }

    #[test]
    fn windows_are_walked_in_start_order() {
        let slots = available_slots(
            &[window("14:00", "15:00"), window("09:00", "10:00")],
            &[t("14:30")],
        );
        assert_eq!(labels(&slots), vec!["09:00", "09:30", "14:00"]);
    }

    #[test]
    fn inactive_windows_are_ignored() {
        let mut off = window("09:00", "12:00");
        off.is_active = false;
        assert!(available_slots(&[off], &[]).is_empty());
    }

    #[test]
    fn window_touching_midnight_stops_without_wrapping() {
        let slots = available_slots(&[window("23:00", "23:59:59")], &[]);
        assert_eq!(labels(&slots), vec!["23:00"]);
    }

    #[test]
    fn unaligned_window_start_keeps_its_own_grid() {
        let slots = available_slots(&[window("09:15", "10:15")], &[]);
        assert_eq!(labels(&slots), vec!["09:15", "09:45"]);
    }

    #[test]
    fn working_hours_check() {
        let w = [window("09:00", "10:00")];
        assert!(within_working_hours(&w, t("09:30")));
        assert!(!within_working_hours(&w, t("09:15")));
        assert!(!within_working_hours(&w, t("10:00")));
    }

    #[test]
    fn loads_windows_and_bookings_from_db() {
        use crate::db::repository::tests::Fixture;
        use crate::db::{insert_schedule, open_memory_database};
        use crate::models::AppointmentStatus;

        let conn = open_memory_database().unwrap();
        let fx = Fixture::new(&conn);
        let mut monday = window("09:00", "10:30");
        monday.doctor_id = fx.doctor.id;
        insert_schedule(&conn, &monday).unwrap();
        fx.appointment(&conn, "09:30:00", AppointmentStatus::Confirmed);
        fx.appointment(&conn, "10:00:00", AppointmentStatus::Cancelled);

        let slots = available_slots_for(&conn, &fx.doctor.id, fx.date).unwrap();
        assert_eq!(labels(&slots), vec!["09:00", "10:00"]);

        let tuesday = fx.date.succ_opt().unwrap();
        assert!(available_slots_for(&conn, &fx.doctor.id, tuesday).unwrap().is_empty());
    }
}
