//! Pure transcoders between flat form fields and normalized values
//!
//! The form layer works with one boolean flag per weekday or ordinal and with
//! comma-separated text for lists; the stored record keeps normalized lists.
//! These functions convert in both directions and never touch any state.

use chrono::NaiveDate;
use serde_json::Value;

use crate::core::frequency::{ordinal_flag_key, Weekday, ORDINALS};
use crate::core::record::FieldMap;
use crate::schema::registry::{DisplayField, DisplaySchema, Widget};

/// Split comma-separated text into trimmed tokens.
///
/// A value that is already a list passes through unchanged, so the function
/// is idempotent. `Null` and the empty string yield an empty list.
pub fn string_to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => s
            .split(',')
            .map(|token| {
                token
                    .trim_matches(|c| c == '\'' || c == '"' || c == ' ')
                    .to_string()
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Collapse the five per-weekday flags into an ordered `collection_days`
/// list, removing the flags from the map. No-op if the list is already there.
pub fn days_to_list(fields: &mut FieldMap) {
    if fields.contains_key("collection_days") {
        return;
    }
    let mut days = Vec::new();
    for day in Weekday::all() {
        if let Some(flag) = fields.remove(&day.flag_key()) {
            if flag.as_bool().unwrap_or(false) {
                days.push(Value::String(day.token().to_string()));
            }
        }
    }
    fields.insert("collection_days".to_string(), Value::Array(days));
}

/// Collapse the five per-ordinal flags (`<prefix>_1` .. `<prefix>_5`) into an
/// ascending ordinal list under `prefix`, removing the flags. No-op if the
/// list is already there.
pub fn weekdays_to_list(fields: &mut FieldMap, prefix: &str) {
    if fields.contains_key(prefix) {
        return;
    }
    let mut ordinals = Vec::new();
    for n in ORDINALS {
        if let Some(flag) = fields.remove(&ordinal_flag_key(prefix, n)) {
            if flag.as_bool().unwrap_or(false) {
                ordinals.push(Value::Number(n.into()));
            }
        }
    }
    fields.insert(prefix.to_string(), Value::Array(ordinals));
}

/// Rebuild the five weekday checkboxes at the front of a display schema,
/// pre-checked from the stored day list, dropping the `collection_days` row.
pub fn list_to_days(schema: &mut DisplaySchema, default_days: &[String]) {
    let mut fields = Vec::with_capacity(schema.fields.len() + 4);
    for day in Weekday::all() {
        fields.push(DisplayField {
            name: day.flag_key(),
            widget: Widget::Checkbox,
            default: Value::Bool(default_days.iter().any(|d| d == day.token())),
            required: true,
        });
    }
    fields.extend(
        schema
            .fields
            .drain(..)
            .filter(|f| f.name != "collection_days"),
    );
    schema.fields = fields;
}

/// Rebuild the five ordinal checkboxes for `prefix` at the front of a display
/// schema, dropping both ordinal-list rows.
pub fn list_to_weekdays(schema: &mut DisplaySchema, prefix: &str, default_ordinals: &[u8]) {
    let mut fields = Vec::with_capacity(schema.fields.len() + 4);
    for n in ORDINALS {
        fields.push(DisplayField {
            name: ordinal_flag_key(prefix, n),
            widget: Widget::Checkbox,
            default: Value::Bool(default_ordinals.contains(&n)),
            required: true,
        });
    }
    fields.extend(schema.fields.drain(..).filter(|f| {
        f.name != "weekday_order_number" && f.name != "week_order_number"
    }));
    schema.fields = fields;
}

/// Validate "MM/DD", ignoring year. Leap-day "02/29" is accepted.
pub fn is_month_day(s: &str) -> bool {
    let Some((month, day)) = s.split_once('/') else {
        return false;
    };
    let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) else {
        return false;
    };
    // Checked against a leap year so every real month/day combination passes.
    NaiveDate::from_ymd_opt(2020, month, day).is_some()
}

/// Validate "YYYY-MM-DD". The empty string counts as valid (field cleared).
pub fn is_date(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Validate a whole list of "YYYY-MM-DD" strings.
pub fn is_dates(dates: &[String]) -> bool {
    dates.iter().all(|d| is_date(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_to_list_splits_and_trims() {
        assert_eq!(
            string_to_list(&json!("a, 'b', c")),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_string_to_list_idempotent() {
        let once = string_to_list(&json!("a, 'b', c"));
        let twice = string_to_list(&Value::Array(
            once.iter().cloned().map(Value::String).collect(),
        ));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_string_to_list_empty() {
        assert_eq!(string_to_list(&json!("")), Vec::<String>::new());
        assert_eq!(string_to_list(&Value::Null), Vec::<String>::new());
    }

    #[test]
    fn test_days_to_list_roundtrip() {
        let mut fields = FieldMap::new();
        for day in Weekday::all() {
            let checked = matches!(day, Weekday::Mon | Weekday::Wed);
            fields.insert(day.flag_key(), Value::Bool(checked));
        }
        days_to_list(&mut fields);

        assert_eq!(fields.get("collection_days"), Some(&json!(["mon", "wed"])));
        for day in Weekday::all() {
            assert!(!fields.contains_key(&day.flag_key()));
        }
    }

    #[test]
    fn test_days_to_list_noop_when_list_present() {
        let mut fields = FieldMap::new();
        fields.insert("collection_days".to_string(), json!(["fri"]));
        fields.insert("collection_days_mon".to_string(), json!(true));
        days_to_list(&mut fields);
        assert_eq!(fields.get("collection_days"), Some(&json!(["fri"])));
        // Untouched: the flags are only collapsed when no list exists yet.
        assert!(fields.contains_key("collection_days_mon"));
    }

    #[test]
    fn test_weekdays_to_list_ascending() {
        let mut fields = FieldMap::new();
        for n in ORDINALS {
            let checked = n % 2 == 1;
            fields.insert(ordinal_flag_key("week_order_number", n), json!(checked));
        }
        weekdays_to_list(&mut fields, "week_order_number");

        assert_eq!(fields.get("week_order_number"), Some(&json!([1, 3, 5])));
        for n in ORDINALS {
            assert!(!fields.contains_key(&ordinal_flag_key("week_order_number", n)));
        }
    }

    #[test]
    fn test_list_to_days_prefills_flags() {
        let mut schema = DisplaySchema::default();
        schema.fields.push(DisplayField {
            name: "collection_days".to_string(),
            widget: Widget::Text,
            default: json!([]),
            required: true,
        });
        schema.fields.push(DisplayField {
            name: "period".to_string(),
            widget: Widget::Number,
            default: json!(1),
            required: false,
        });
        list_to_days(&mut schema, &["wed".to_string()]);

        assert!(!schema.contains("collection_days"));
        assert_eq!(
            schema.get("collection_days_wed").map(|f| &f.default),
            Some(&json!(true))
        );
        assert_eq!(
            schema.get("collection_days_mon").map(|f| &f.default),
            Some(&json!(false))
        );
        // Other rows survive behind the flags.
        assert!(schema.contains("period"));
    }

    #[test]
    fn test_month_day_validation() {
        assert!(is_month_day("02/29"));
        assert!(is_month_day("12/25"));
        assert!(!is_month_day("13/01"));
        assert!(!is_month_day("04/31"));
        assert!(!is_month_day("2024-04-01"));
    }

    #[test]
    fn test_date_validation() {
        assert!(is_date(""));
        assert!(is_date("2024-02-29"));
        assert!(!is_date("2024-02-30"));
        assert!(!is_date("04/01"));
        assert!(is_dates(&["2024-01-01".to_string(), String::new()]));
        assert!(!is_dates(&["2024-01-01".to_string(), "bad".to_string()]));
    }
}
