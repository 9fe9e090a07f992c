//! Byte-size units
//!
//! All units are exact powers of 1024 and are derived from each other by
//! integer multiplication.

use crate::common::{Error, Result};

pub const BYTE: u64 = 1;
pub const KILOBYTE: u64 = 1024 * BYTE;
pub const MEGABYTE: u64 = 1024 * KILOBYTE;
pub const GIGABYTE: u64 = 1024 * MEGABYTE;
pub const TERABYTE: u64 = 1024 * GIGABYTE;

/// Parse a size expression such as `64M`, `1G+900M` or `4096`
///
/// Each `+`-separated term is an integer with an optional unit suffix
/// (`B`, `K`, `M`, `G`, `T`, optionally followed by `B` or `iB`).
/// Suffixes are case-insensitive. Overflow is an error.
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidSize(input.to_string()));
    }

    trimmed.split('+').try_fold(0u64, |total, term| {
        let term_bytes = parse_term(term.trim()).ok_or_else(|| Error::InvalidSize(input.to_string()))?;
        total
            .checked_add(term_bytes)
            .ok_or_else(|| Error::InvalidSize(format!("{input} (overflows u64)")))
    })
}

fn parse_term(term: &str) -> Option<u64> {
    let digits_end = term
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(term.len());
    if digits_end == 0 {
        return None;
    }

    let value: u64 = term[..digits_end].parse().ok()?;
    let suffix = term[digits_end..].trim().to_ascii_uppercase();

    let unit = match suffix.as_str() {
        "" | "B" => BYTE,
        "K" | "KB" | "KIB" => KILOBYTE,
        "M" | "MB" | "MIB" => MEGABYTE,
        "G" | "GB" | "GIB" => GIGABYTE,
        "T" | "TB" | "TIB" => TERABYTE,
        _ => return None,
    };

    value.checked_mul(unit)
}

/// Render a byte count with the largest unit that keeps one decimal place
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (TERABYTE, "TiB"),
        (GIGABYTE, "GiB"),
        (MEGABYTE, "MiB"),
        (KILOBYTE, "KiB"),
    ];

    for (unit, label) in UNITS {
        if bytes >= unit {
            return format!("{:.1} {} ({} bytes)", bytes as f64 / unit as f64, label, bytes);
        }
    }
    format!("{} bytes", bytes)
}
