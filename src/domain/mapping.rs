// Conversions between storage rows, wire values and domain models

use entities::player_progress;
use serde_json::Value;

use super::models::ProgressRecord;

pub fn map_row_to_record(row: player_progress::Model) -> ProgressRecord {
    ProgressRecord {
        id: row.id,
        uid: row.uid,
        vid: row.vid,
        percent: row.percent,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Players send the percent either as a string or as a bare number.
/// Strings are stored verbatim. Numbers are stored in plain decimal without
/// exponent, and whole-valued floats drop the fraction (`1e2` and `100.0`
/// both become "100"). Anything else is rejected.
pub fn percent_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => Some(f.to_string()),
            _ => Some(n.to_string()),
        },
        _ => None,
    }
}
