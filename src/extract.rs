//! Navigation and normalization helpers for raw Dodge project records.
//!
//! Raw records are heterogeneous: any field may be missing, null, or wrapped
//! in a `{ "value": ... }` envelope. Nothing in here fails; malformed input
//! degrades to an empty value.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Date patterns tried in order, each with the shape its input must have.
/// The first one that matches wins, so day-first beats month-first for
/// ambiguous inputs like `03/04/2025`. Years are always four digits.
const DATE_FORMATS: [(&str, &str); 6] = [
    ("%Y-%m-%d", r"^\d{4}-\d{1,2}-\d{1,2}$"), // 2025-10-31
    ("%d/%m/%Y", r"^\d{1,2}/\d{1,2}/\d{4}$"), // 31/10/2025
    ("%m/%d/%Y", r"^\d{1,2}/\d{1,2}/\d{4}$"), // 10/31/2025
    ("%Y/%m/%d", r"^\d{4}/\d{1,2}/\d{1,2}$"), // 2025/10/31
    ("%d-%m-%Y", r"^\d{1,2}-\d{1,2}-\d{4}$"), // 31-10-2025
    ("%m-%d-%Y", r"^\d{1,2}-\d{1,2}-\d{4}$"), // 10-31-2025
];

static DATE_SHAPES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    DATE_FORMATS
        .iter()
        .map(|(fmt, shape)| (*fmt, Regex::new(shape).expect("static regex is valid")))
        .collect()
});

static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("static regex is valid"));

/// Walks `path` through nested objects and unwraps a trailing `value` envelope.
///
/// Returns `None` when a segment is missing, when an intermediate node is not
/// an object, or when the resolved value is null.
pub fn extract_path<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = record;
    for key in path {
        match current {
            Value::Object(map) => current = map.get(*key)?,
            _ => return None,
        }
    }

    let resolved = match current {
        Value::Object(map) if map.contains_key("value") => &map["value"],
        other => other,
    };

    if resolved.is_null() {
        None
    } else {
        Some(resolved)
    }
}

/// Renders a scalar as text. Objects, arrays and null render as `""`.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => {
            tracing::debug!("Expected a scalar, found a structured value");
            String::new()
        }
    }
}

/// [`extract_path`] rendered through [`value_text`]; `""` when absent.
pub fn extract_text(record: &Value, path: &[&str]) -> String {
    extract_path(record, path)
        .map(value_text)
        .unwrap_or_default()
}

/// Returns the first contact whose role is `Owner`.
pub fn find_owner_contact(record: &Value) -> Option<&Value> {
    let contacts = record
        .get("value")
        .and_then(|v| v.get("data"))
        .and_then(|d| d.get("contacts"))
        .and_then(Value::as_array);

    let owner = contacts.and_then(|list| {
        list.iter().find(|contact| {
            contact
                .get("contactRole")
                .and_then(|role| role.get("value"))
                .and_then(Value::as_str)
                == Some("Owner")
        })
    });

    if owner.is_none() {
        tracing::warn!("No Owner contact found in project");
    }
    owner
}

/// Joins area code and number as `area-number`, or whichever part exists.
pub fn format_phone(area_code: &str, number: &str) -> String {
    match (area_code.is_empty(), number.is_empty()) {
        (false, false) => format!("{}-{}", area_code, number),
        (true, false) => number.to_string(),
        (false, true) => area_code.to_string(),
        (true, true) => String::new(),
    }
}

/// Normalizes a date (plain string or `{value}` envelope) to `YYYY-MM-DDT00:00:00`.
///
/// Timezone markers and the time-of-day are dropped before parsing. Returns
/// `""` for null, empty, or unparseable input.
pub fn format_date_to_iso(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => match map.get("value") {
            Some(Value::String(s)) => s.as_str(),
            _ => return String::new(),
        },
        _ => return String::new(),
    };

    if raw.is_empty() || raw == "null" {
        return String::new();
    }

    let without_zone = raw.replace('Z', "");
    let date_part = without_zone
        .split('+')
        .next()
        .and_then(|s| s.split('T').next())
        .map(str::trim)
        .and_then(|s| s.split_whitespace().next())
        .unwrap_or_default();

    for (fmt, shape) in DATE_SHAPES.iter() {
        if !shape.is_match(date_part) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(date_part, fmt) {
            return date.format("%Y-%m-%dT00:00:00").to_string();
        }
    }

    tracing::warn!("Could not parse date '{}' with any known format", raw);
    String::new()
}

/// Replaces line breaks with a space, collapses runs of spaces, and trims.
pub fn clean_text(text: &str) -> String {
    let single_line = text
        .replace("\r\n", " ")
        .replace('\n', " ")
        .replace('\r', " ");
    MULTI_SPACE
        .replace_all(&single_line, " ")
        .trim()
        .to_string()
}

/// Left-pads a postal code with zeros to five characters.
pub fn pad_zip(zip: &str) -> String {
    if zip.is_empty() {
        String::new()
    } else {
        format!("{:0>5}", zip)
    }
}
