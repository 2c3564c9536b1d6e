//! Time parsing and formatting utilities

use crate::domain::errors::DomainError;

/// Parse a user supplied time: seconds (`12.5`), `MM:SS[.ms]` or `HH:MM:SS[.ms]`
pub fn parse_time(time_str: &str) -> Result<f64, DomainError> {
    let trimmed = time_str.trim();
    let invalid = || {
        DomainError::validation(format!(
            "Invalid time format: {}. Expected seconds, MM:SS.ms or HH:MM:SS.ms",
            time_str
        ))
    };

    let parts: Vec<&str> = trimmed.split(':').collect();
    let seconds = match parts.as_slice() {
        [seconds] => seconds.parse::<f64>().map_err(|_| invalid())?,
        [minutes, seconds] => {
            let minutes = minutes.parse::<u32>().map_err(|_| invalid())?;
            let seconds = seconds.parse::<f64>().map_err(|_| invalid())?;
            if seconds >= 60.0 {
                return Err(invalid());
            }
            minutes as f64 * 60.0 + seconds
        }
        [hours, minutes, seconds] => {
            let hours = hours.parse::<u32>().map_err(|_| invalid())?;
            let minutes = minutes.parse::<u32>().map_err(|_| invalid())?;
            let seconds = seconds.parse::<f64>().map_err(|_| invalid())?;
            if minutes >= 60 || seconds >= 60.0 {
                return Err(invalid());
            }
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds
        }
        _ => return Err(invalid()),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(DomainError::validation(format!(
            "Time cannot be negative: {}",
            time_str
        )));
    }
    Ok(seconds)
}

/// Parse a transcoder clock value `[-]HH:MM:SS[.ff]` into seconds
pub fn parse_clock(clock: &str) -> Option<f64> {
    let (negative, clock) = match clock.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, clock),
    };
    let mut parts = clock.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    Some(if negative { -total } else { total })
}

/// Render seconds for a transcoder argument, rounded to microseconds
pub fn format_seconds(seconds: f64) -> String {
    let formatted = format!("{:.6}", seconds);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Format seconds as HH:MM:SS.ms for display
pub fn format_hms(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}
