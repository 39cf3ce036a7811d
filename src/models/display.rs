//! Display-only formatting shared by the entity models.

use chrono::{NaiveDate, NaiveTime};

pub const NOT_SPECIFIED: &str = "Not specified";

/// "Last First Middle", skipping blank parts.
pub fn full_name(last: &str, first: &str, middle: &str) -> String {
    let parts: Vec<&str> = [last, first, middle]
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        parts.join(" ")
    }
}

/// "Last F. M."
pub fn short_name(last: &str, first: &str, middle: &str) -> String {
    let mut parts = Vec::new();
    let last = last.trim();
    if !last.is_empty() {
        parts.push(last.to_string());
    }
    for name in [first, middle] {
        if let Some(initial) = name.trim().chars().next() {
            parts.push(format!("{initial}."));
        }
    }
    if parts.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        parts.join(" ")
    }
}

/// Digits of a phone number, everything else dropped.
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Russian national format `+7 (XXX) XXX-XX-XX` for 10-digit numbers and
/// 11-digit numbers with a 7/8 trunk prefix. Anything else is returned as-is.
pub fn format_phone(phone: &str) -> String {
    if phone.trim().is_empty() {
        return NOT_SPECIFIED.to_string();
    }
    let digits = phone_digits(phone);
    let national = match digits.len() {
        11 if digits.starts_with('7') || digits.starts_with('8') => &digits[1..],
        10 => &digits[..],
        _ => return phone.to_string(),
    };
    format!(
        "+7 ({}) {}-{}-{}",
        &national[0..3],
        &national[3..6],
        &national[6..8],
        &national[8..10]
    )
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn active_label(is_active: bool) -> &'static str {
    if is_active {
        "Active"
    } else {
        "Inactive"
    }
}
