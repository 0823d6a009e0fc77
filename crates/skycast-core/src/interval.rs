//! Parsing of Go-style duration strings used for the collector interval.
//!
//! Accepts one or more `<number><unit>` segments: `500ms`, `30s`, `1m`,
//! `1h30m`, `2h`. Units are `ms`, `s`, `m`, `h`.

use std::time::Duration;

use crate::error::ConfigError;

/// Parse an interval string into a non-zero `Duration`.
pub fn parse_interval(input: &str) -> Result<Duration, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConfigError::Invalid("interval cannot be empty".to_string()));
    }

    let mut total = Duration::ZERO;
    let mut remaining = input;

    while !remaining.is_empty() {
        let digits_len = remaining
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());

        if digits_len == 0 {
            return Err(ConfigError::Invalid(format!("invalid interval: '{}'", input)));
        }

        let num: u64 = remaining[..digits_len]
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid number in interval: '{}'", input)))?;
        remaining = &remaining[digits_len..];

        let unit_len = remaining
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());

        if unit_len == 0 {
            return Err(ConfigError::Invalid(format!(
                "missing unit after '{}' in interval '{}'",
                num, input
            )));
        }

        let segment = match &remaining[..unit_len] {
            "ms" => Duration::from_millis(num),
            "s" => Duration::from_secs(num),
            "m" => Duration::from_secs(num.saturating_mul(60)),
            "h" => Duration::from_secs(num.saturating_mul(3600)),
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unsupported unit '{}' in interval '{}'",
                    other, input
                )))
            }
        };

        total = total.saturating_add(segment);
        remaining = &remaining[unit_len..];
    }

    if total.is_zero() {
        return Err(ConfigError::Invalid("interval must be greater than zero".to_string()));
    }

    Ok(total)
}
