//! Byte-size parsing and human-readable formatting.

use crate::error::{HoldError, Result};

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

/// Parse a size string like "5G", "500M", "1024K" into bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();

    // Try to parse as raw number first
    if let Ok(bytes) = s.parse::<u64>() {
        return Ok(bytes);
    }

    // Otherwise parse with suffix
    let (num_part, suffix) = split_number_suffix(s)?;
    let multiplier = match suffix.trim().to_uppercase().as_str() {
        "B" | "" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        "T" | "TB" | "TIB" => 1024_u64.pow(4),
        _ => {
            return Err(HoldError::InvalidSize(
                s.to_string(),
                format!("Unknown size suffix: {suffix}"),
            ));
        }
    };

    let base: f64 = num_part.trim().parse().map_err(|_| {
        HoldError::InvalidSize(s.to_string(), "Invalid number format".to_string())
    })?;
    if base < 0.0 {
        return Err(HoldError::InvalidSize(
            s.to_string(),
            "Size cannot be negative".to_string(),
        ));
    }

    Ok((base * multiplier as f64) as u64)
}

/// Split a size string into number and suffix parts
fn split_number_suffix(s: &str) -> Result<(&str, &str)> {
    let split_pos = s
        .char_indices()
        .find(|(_, ch)| ch.is_alphabetic())
        .map_or(s.len(), |(i, _)| i);

    let (num, suffix) = s.split_at(split_pos);
    if num.trim().is_empty() {
        return Err(HoldError::InvalidSize(
            s.to_string(),
            "No number found".to_string(),
        ));
    }

    Ok((num, suffix))
}

/// Format a byte count with two decimals in base-1024 units ("1.50 KB").
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

/// Format a signed change in bytes ("+120.00 MB", "-3.00 KB", "0.00 B").
pub fn format_delta(delta: i64) -> String {
    let magnitude = format_size(delta.unsigned_abs());
    match delta.signum() {
        1 => format!("+{magnitude}"),
        -1 => format!("-{magnitude}"),
        _ => magnitude,
    }
}

/// Signed difference `after - before`, saturating at the `i64` range.
pub fn signed_delta(before: u64, after: u64) -> i64 {
    if after >= before {
        i64::try_from(after - before).unwrap_or(i64::MAX)
    } else {
        i64::try_from(before - after).map_or(i64::MIN, |d| -d)
    }
}
