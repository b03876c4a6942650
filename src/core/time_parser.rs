//! Parsing of catalog time strings such as `"M-TH 1230-1400\n(FULLY ONSITE)"`.

use crate::domain::model::{TimeInterval, Weekday, MINUTES_PER_DAY};
use crate::utils::error::ParseFailure;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn annotation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\([^)]*\)").expect("annotation pattern is valid"))
}

/// 解析時間字串為星期與起訖分鐘
///
/// Unknown day abbreviations are dropped, so the result may carry an empty
/// day set. `end > start` is not checked here; use [`parse_placeable`] when
/// the interval is about to be placed.
pub fn parse(raw: &str) -> Result<TimeInterval, ParseFailure> {
    // 移除括號內的備註 (例如授課方式)
    let cleaned = annotation_pattern().replace_all(raw, "");
    let mut tokens = cleaned.split_whitespace();

    let (day_token, time_token) = match (tokens.next(), tokens.next()) {
        (Some(days), Some(time)) => (days, time),
        _ => {
            return Err(ParseFailure::Malformed {
                raw: raw.to_string(),
            })
        }
    };

    let days = parse_days(day_token);

    let (start, end) = time_token
        .split_once('-')
        .ok_or_else(|| ParseFailure::Malformed {
            raw: raw.to_string(),
        })?;

    Ok(TimeInterval {
        days,
        start_minutes: parse_clock(start)?,
        end_minutes: parse_clock(end)?,
    })
}

/// Parses and rejects intervals that cannot be placed on the grid.
pub fn parse_placeable(raw: &str) -> Result<TimeInterval, ParseFailure> {
    let interval = parse(raw)?;

    if interval.days.is_empty() {
        return Err(ParseFailure::NoDays {
            raw: raw.to_string(),
        });
    }
    if interval.start_minutes >= interval.end_minutes {
        return Err(ParseFailure::EmptyRange {
            start: interval.start_minutes,
            end: interval.end_minutes,
        });
    }

    Ok(interval)
}

/// "M-TH" → {Monday, Thursday}; "W" → {Wednesday}
pub fn parse_days(token: &str) -> BTreeSet<Weekday> {
    let mut days = BTreeSet::new();

    for part in token.split('-') {
        match Weekday::from_abbreviation(part) {
            Some(day) => {
                days.insert(day);
            }
            None => tracing::warn!("Ignoring unknown day abbreviation {:?} in {:?}", part, token),
        }
    }

    days
}

/// Converts a 24-hour clock value to minutes since midnight.
///
/// Accepts the compact `HHMM`/`HMM` form from time strings and the `HH:MM`
/// form used in display labels.
pub fn parse_clock(token: &str) -> Result<u32, ParseFailure> {
    let invalid = || ParseFailure::InvalidClock {
        token: token.to_string(),
    };

    let digits: String = match token.split_once(':') {
        Some((hours, minutes)) if minutes.len() == 2 => format!("{}{}", hours, minutes),
        Some(_) => return Err(invalid()),
        None => token.to_string(),
    };

    if !(3..=4).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let (hours, minutes) = digits.split_at(digits.len() - 2);
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    let total = hours * 60 + minutes;
    if minutes >= 60 || total > MINUTES_PER_DAY {
        return Err(invalid());
    }

    Ok(total)
}
