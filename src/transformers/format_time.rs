//! Format-time: render a time field as strings.
//!
//! Output formats use moment-style tokens:
//!
//! | Token | Output |
//! |---|---|
//! | `YYYY` `YY` | year, 4 or 2 digits |
//! | `MMMM` `MMM` `MM` `M` | month name, short name, padded, plain |
//! | `DD` `D` | day of month |
//! | `dddd` `ddd` | weekday name, short name |
//! | `HH` `H` `hh` `h` | 24h and 12h hour |
//! | `mm` `m` `ss` `s` `SSS` | minutes, seconds, milliseconds |
//! | `A` `a` | AM/PM, am/pm |
//! | `Z` `ZZ` | offset as `+07:00` or `+0700` |
//! | `X` `x` | unix seconds, unix milliseconds |
//!
//! Text inside `[...]` is copied verbatim; any other character is copied as is.

use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{DataFrame, FieldType, Value};

pub const DEFAULT_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";
pub const INVALID_DATE: &str = "Invalid date";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatTimeOptions {
    /// Display name of the field to format.
    pub time_field: String,
    /// Empty means [`DEFAULT_FORMAT`].
    pub output_format: String,
    /// Format in `timezone` instead of UTC.
    pub use_timezone: bool,
    /// IANA zone name, e.g. `Europe/Berlin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

const TOKENS: [&str; 25] = [
    "YYYY", "MMMM", "dddd", "SSS", "MMM", "ddd", "YY", "MM", "DD", "HH", "hh", "mm", "ss", "ZZ",
    "M", "D", "H", "h", "m", "s", "A", "a", "Z", "X", "x",
];

fn resolve_zone(options: &FormatTimeOptions) -> Tz {
    if !options.use_timezone {
        return Tz::UTC;
    }
    match options.timezone.as_deref() {
        Some(name) => name.parse().unwrap_or_else(|_| {
            warn!(timezone = name, "unknown timezone, formatting in UTC");
            Tz::UTC
        }),
        None => Tz::UTC,
    }
}

fn epoch_millis(value: &Value) -> Option<f64> {
    if let Some(n) = value.as_numeric() {
        return Some(n);
    }
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64)
}

fn render_token(token: &str, dt: &DateTime<Tz>, out: &mut String) {
    let rendered = match token {
        "YYYY" => format!("{:04}", dt.year()),
        "YY" => format!("{:02}", dt.year().rem_euclid(100)),
        "MMMM" => dt.format("%B").to_string(),
        "MMM" => dt.format("%b").to_string(),
        "MM" => format!("{:02}", dt.month()),
        "M" => dt.month().to_string(),
        "DD" => format!("{:02}", dt.day()),
        "D" => dt.day().to_string(),
        "dddd" => dt.format("%A").to_string(),
        "ddd" => dt.format("%a").to_string(),
        "HH" => format!("{:02}", dt.hour()),
        "H" => dt.hour().to_string(),
        "hh" => format!("{:02}", dt.hour12().1),
        "h" => dt.hour12().1.to_string(),
        "mm" => format!("{:02}", dt.minute()),
        "m" => dt.minute().to_string(),
        "ss" => format!("{:02}", dt.second()),
        "s" => dt.second().to_string(),
        "SSS" => format!("{:03}", dt.timestamp_subsec_millis()),
        "A" => (if dt.hour12().0 { "PM" } else { "AM" }).to_string(),
        "a" => (if dt.hour12().0 { "pm" } else { "am" }).to_string(),
        "Z" => dt.format("%:z").to_string(),
        "ZZ" => dt.format("%z").to_string(),
        "X" => dt.timestamp().to_string(),
        "x" => dt.timestamp_millis().to_string(),
        other => other.to_string(),
    };
    out.push_str(&rendered);
}

/// Render `dt` with a moment-style format string.
pub fn format_datetime(dt: &DateTime<Tz>, format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;
    while let Some(c) = rest.chars().next() {
        if c == '[' {
            match rest.find(']') {
                Some(end) => {
                    out.push_str(&rest[1..end]);
                    rest = &rest[end + 1..];
                }
                None => {
                    out.push_str(&rest[1..]);
                    rest = "";
                }
            }
            continue;
        }
        match TOKENS.iter().find(|t| rest.starts_with(**t)) {
            Some(token) => {
                render_token(token, dt, &mut out);
                rest = &rest[token.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// Format one value. Values that are not a point in time render as [`INVALID_DATE`].
pub fn format_value(value: &Value, format: &str, zone: Tz) -> String {
    epoch_millis(value)
        .filter(|ms| ms.is_finite())
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
        .map(|dt| format_datetime(&dt.with_timezone(&zone), format))
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// Replace the values of the field named `timeField` with formatted strings in every frame.
///
/// The field becomes a string field. Frames without that field are unchanged.
pub fn format_time(frames: &[DataFrame], options: &FormatTimeOptions) -> Vec<DataFrame> {
    if options.time_field.is_empty() {
        return frames.to_vec();
    }
    let format = if options.output_format.is_empty() {
        DEFAULT_FORMAT
    } else {
        options.output_format.as_str()
    };
    let zone = resolve_zone(options);

    frames
        .iter()
        .map(|frame| {
            let Some(index) = frame.index_of_display_name(&options.time_field) else {
                return frame.clone();
            };
            if frame.fields[index].field_type != FieldType::Time {
                return frame.clone();
            }
            let mut fields = frame.fields.clone();
            let field = &mut fields[index];
            field.values = field
                .values
                .iter()
                .map(|v| Value::String(format_value(v, format, zone)))
                .collect();
            field.field_type = FieldType::String;
            frame.with_fields(fields, frame.length)
        })
        .collect()
}
