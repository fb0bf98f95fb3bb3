//! Date, time and completion parsing for console input.

use chrono::{Duration, Local, NaiveDate, NaiveTime, Timelike};
use dayrec_core::Prompter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

// 22:39, 22.39, 2239, 9, 22:39:15 (seconds are dropped)
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?:[:.]?(\d{2}))?(?::\d{2})?$").expect("valid time regex")
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Date(String),
    Time(String),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(input) => write!(
                f,
                "cannot read `{input}` as a date (try 2024-05-06, 06/05/2024, today, yesterday)"
            ),
            Self::Time(input) => {
                write!(f, "cannot read `{input}` as a time (try 22:39, 22.39 or 2239)")
            }
        }
    }
}

impl std::error::Error for InputError {}

/// Empty input means `today`.
pub fn parse_day(input: &str, today: NaiveDate) -> Result<NaiveDate, InputError> {
    let trimmed = input.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| InputError::Date(trimmed.to_string()))
}

/// Empty input means `now`. Seconds are always zero.
pub fn parse_time(input: &str, now: NaiveTime) -> Result<NaiveTime, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("now") {
        return NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)
            .ok_or_else(|| InputError::Time(trimmed.to_string()));
    }

    let invalid = || InputError::Time(trimmed.to_string());
    let captures = TIME_RE.captures(trimmed).ok_or_else(invalid)?;
    let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
    let minute: u32 = match captures.get(2) {
        Some(minute) => minute.as_str().parse().map_err(|_| invalid())?,
        None => 0,
    };
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Asks until a date is entered.
pub fn ask_day<P: Prompter + ?Sized>(prompter: &mut P, greeting: &str) -> NaiveDate {
    loop {
        match parse_day(&prompter.ask(greeting), Local::now().date_naive()) {
            Ok(day) => return day,
            Err(err) => prompter.notify(&format!("... {err}")),
        }
    }
}

/// Asks until a time of day is entered.
pub fn ask_time<P: Prompter + ?Sized>(prompter: &mut P, greeting: &str) -> NaiveTime {
    loop {
        match parse_time(&prompter.ask(greeting), Local::now().time()) {
            Ok(time) => return time,
            Err(err) => prompter.notify(&format!("... {err}")),
        }
    }
}

/// Resolves a completion-aware answer against `candidates`.
///
/// A 1-based index or a prefix shared by exactly one candidate picks that
/// candidate; anything else is returned as typed.
pub fn complete_choice(input: &str, candidates: &[String]) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        if (1..=candidates.len()).contains(&index) {
            return candidates[index - 1].clone();
        }
    }
    if candidates.iter().any(|candidate| candidate == trimmed) {
        return trimmed.to_string();
    }

    let mut prefixed = candidates
        .iter()
        .filter(|candidate| candidate.starts_with(trimmed));
    match (prefixed.next(), prefixed.next()) {
        (Some(only), None) => only.clone(),
        _ => trimmed.to_string(),
    }
}
