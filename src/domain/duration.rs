//! Countdown strings such as `10s`, `5m`, `1h30m` or `2d`

use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

static DURATION_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)([smhd])").expect("duration pattern is valid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("Invalid time format. Use '10s', '5m', '1h30m', '2d', etc.")]
    InvalidFormat,
}

/// Sums every `<number><unit>` pair found in `input` into seconds.
pub fn parse_time_string(input: &str) -> Result<u64, DurationParseError> {
    let mut total: u64 = 0;
    let mut matched = false;

    for caps in DURATION_PART.captures_iter(input) {
        matched = true;
        let value: u64 = caps[1]
            .parse()
            .map_err(|_| DurationParseError::InvalidFormat)?;
        let unit = match caps[2].to_ascii_lowercase().as_str() {
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            _ => 86_400,
        };
        total = total.saturating_add(value.saturating_mul(unit));
    }

    if matched {
        Ok(total)
    } else {
        Err(DurationParseError::InvalidFormat)
    }
}
