//! Schema definition registry
//!
//! One declarative table describes every configurable field: which wizard
//! step it belongs to, how it validates and coerces, its default, and which
//! frequency categories it applies to. Two pure queries compile that table
//! into a validation ruleset or a display schema for a step. Form defaults
//! (what to pre-fill after a validation error or when editing an existing
//! entry) live on the registry instance, so sessions cannot leak into each
//! other.

use chrono::NaiveTime;
use serde_json::Value;
use std::str::FromStr;

use crate::core::frequency::{Frequency, FrequencyCategory};
use crate::core::record::FieldMap;
use crate::schema::transcode::{is_date, is_dates, is_month_day, string_to_list};

/// Month tokens for the seasonal first/last month bounds.
pub const MONTH_OPTIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Which frequency categories a field applies to.
#[derive(Debug, Clone, Copy)]
pub enum Applies {
    Always,
    Only(&'static [FrequencyCategory]),
    Except(&'static [FrequencyCategory]),
}

impl Applies {
    /// With no category filter (step 1, before a frequency exists) every
    /// field applies.
    pub fn matches(&self, category: Option<FrequencyCategory>) -> bool {
        let Some(category) = category else {
            return true;
        };
        match self {
            Applies::Always => true,
            Applies::Only(cats) => cats.contains(&category),
            Applies::Except(cats) => !cats.contains(&category),
        }
    }
}

/// Field value type: validation, coercion, and widget selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, may be empty.
    Text,
    /// Free text, must be non-empty.
    RequiredText,
    /// One of the closed frequency set.
    FrequencySelect,
    /// Icon reference in "pack:name" form.
    Icon,
    /// Time of day, "HH:MM" or "HH:MM:SS"; empty clears the field.
    Time,
    Boolean,
    /// Integer >= 1.
    PositiveInt,
    /// Week of year, 1..=52.
    WeekNumber,
    /// Month token from MONTH_OPTIONS, or empty.
    Month,
    /// Single "YYYY-MM-DD" date; empty clears the field.
    Date,
    /// Comma text or list of "YYYY-MM-DD" dates.
    DateList,
    /// "MM/DD", year ignored.
    MonthDay,
    /// Comma text or list of entity references; must be non-empty.
    EntityList,
    /// Comma text or list of free-text tokens.
    TextList,
    /// List of weekday tokens (normally produced by the flag transcoder).
    DayList,
    /// List of ordinals 1..=5 (normally produced by the flag transcoder).
    OrdinalList,
}

impl FieldKind {
    /// Validate a submitted value, returning the coerced value to store.
    pub fn validate(&self, value: &Value) -> Result<Value, String> {
        match self {
            FieldKind::Text => match value.as_str() {
                Some(s) => Ok(Value::String(s.to_string())),
                None => Err("expected a string".to_string()),
            },
            FieldKind::RequiredText => match value.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(Value::String(s.to_string())),
                _ => Err("expected a non-empty string".to_string()),
            },
            FieldKind::FrequencySelect => {
                let s = value.as_str().ok_or("expected a string")?;
                let freq = Frequency::from_str(s).map_err(|e| e.to_string())?;
                Ok(Value::String(freq.as_str().to_string()))
            }
            FieldKind::Icon => {
                let s = value.as_str().ok_or("expected a string")?;
                match s.split_once(':') {
                    Some((pack, name)) if !pack.is_empty() && !name.is_empty() => {
                        Ok(Value::String(s.to_string()))
                    }
                    _ => Err(format!("invalid icon reference: '{}'", s)),
                }
            }
            FieldKind::Time => {
                let s = value.as_str().ok_or("expected a string")?;
                if s.is_empty()
                    || NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
                    || NaiveTime::parse_from_str(s, "%H:%M").is_ok()
                {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(format!("invalid time: '{}'", s))
                }
            }
            FieldKind::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err("expected a boolean".to_string()),
            },
            FieldKind::PositiveInt => coerce_int(value, 1, i64::MAX),
            FieldKind::WeekNumber => coerce_int(value, 1, 52),
            FieldKind::Month => {
                let s = value.as_str().ok_or("expected a string")?;
                if s.is_empty() || MONTH_OPTIONS.contains(&s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(format!("invalid month: '{}'", s))
                }
            }
            FieldKind::Date => {
                let s = value.as_str().ok_or("expected a string")?;
                if is_date(s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(format!("invalid date: '{}'", s))
                }
            }
            FieldKind::DateList => {
                let list = coerce_list(value)?;
                if is_dates(&list) {
                    Ok(Value::Array(list.into_iter().map(Value::String).collect()))
                } else {
                    Err("list contains an invalid date".to_string())
                }
            }
            FieldKind::MonthDay => {
                let s = value.as_str().ok_or("expected a string")?;
                if is_month_day(s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(format!("invalid month/day: '{}'", s))
                }
            }
            FieldKind::EntityList => {
                let list = coerce_list(value)?;
                if list.is_empty() {
                    Err("expected at least one entity".to_string())
                } else {
                    Ok(Value::Array(list.into_iter().map(Value::String).collect()))
                }
            }
            FieldKind::TextList => {
                let list = coerce_list(value)?;
                Ok(Value::Array(list.into_iter().map(Value::String).collect()))
            }
            FieldKind::DayList => {
                let items = value.as_array().ok_or("expected a list")?;
                for item in items {
                    let token = item.as_str().ok_or("expected weekday tokens")?;
                    if crate::core::frequency::Weekday::from_token(token).is_none() {
                        return Err(format!("invalid weekday: '{}'", token));
                    }
                }
                Ok(value.clone())
            }
            FieldKind::OrdinalList => {
                let items = value.as_array().ok_or("expected a list")?;
                let mut ordinals = Vec::with_capacity(items.len());
                for item in items {
                    let n = match item {
                        Value::Number(n) => n.as_u64(),
                        Value::String(s) => s.parse::<u64>().ok(),
                        _ => None,
                    };
                    match n {
                        Some(n @ 1..=5) => ordinals.push(Value::Number(n.into())),
                        _ => return Err(format!("invalid ordinal: {}", item)),
                    }
                }
                Ok(Value::Array(ordinals))
            }
        }
    }

    /// Map a validation failure on this kind to the user-facing error class.
    pub fn error_class(&self) -> ErrorClass {
        match self {
            FieldKind::Date | FieldKind::DateList => ErrorClass::Date,
            FieldKind::Icon => ErrorClass::Icon,
            FieldKind::Time => ErrorClass::Time,
            _ => ErrorClass::Value,
        }
    }
}

/// Coarse failure classes used by the first step's error taxonomy.
/// When several fields fail at once the class with the lowest rank wins,
/// which keeps classification deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorClass {
    Date,
    Icon,
    Time,
    Value,
}

fn coerce_int(value: &Value, min: i64, max: i64) -> Result<Value, String> {
    let n = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n >= min && n <= max => Ok(Value::Number(n.into())),
        _ => Err(format!("expected an integer in {}..={}", min, max)),
    }
}

fn coerce_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Null | Value::String(_) | Value::Array(_) => Ok(string_to_list(value)),
        _ => Err("expected a list or comma-separated text".to_string()),
    }
}

/// Field defaults expressible in the static table.
#[derive(Debug, Clone, Copy)]
pub enum FieldDefault {
    Empty,
    Bool(bool),
    Int(i64),
    Text(&'static str),
    EmptyList,
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Empty => Value::String(String::new()),
            FieldDefault::Bool(b) => Value::Bool(b),
            FieldDefault::Int(n) => Value::Number(n.into()),
            FieldDefault::Text(s) => Value::String(s.to_string()),
            FieldDefault::EmptyList => Value::Array(Vec::new()),
        }
    }
}

/// One row of the registry: a configurable field.
#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub step: u8,
    pub kind: FieldKind,
    pub default: FieldDefault,
    pub valid_for: Applies,
}

use Applies::{Always, Except, Only};
use FrequencyCategory::{Annual, DailyBlank, Group, Monthly, Weekly};

/// The full field table. Each field belongs to exactly one step; its presence
/// in a compiled schema depends only on the session's frequency category.
pub static FIELDS: &[FieldDef] = &[
    // Step 1: general setup.
    FieldDef {
        name: "name",
        step: 1,
        kind: FieldKind::RequiredText,
        default: FieldDefault::Empty,
        valid_for: Always,
    },
    FieldDef {
        name: "frequency",
        step: 1,
        kind: FieldKind::FrequencySelect,
        default: FieldDefault::Text("weekly"),
        valid_for: Always,
    },
    FieldDef {
        name: "include_dates",
        step: 1,
        kind: FieldKind::DateList,
        default: FieldDefault::EmptyList,
        valid_for: Always,
    },
    FieldDef {
        name: "exclude_dates",
        step: 1,
        kind: FieldKind::DateList,
        default: FieldDefault::EmptyList,
        valid_for: Always,
    },
    FieldDef {
        name: "icon_normal",
        step: 1,
        kind: FieldKind::Icon,
        default: FieldDefault::Text("mdi:trash"),
        valid_for: Always,
    },
    FieldDef {
        name: "icon_today",
        step: 1,
        kind: FieldKind::Icon,
        default: FieldDefault::Text("mdi:delete-restore"),
        valid_for: Always,
    },
    FieldDef {
        name: "icon_tomorrow",
        step: 1,
        kind: FieldKind::Icon,
        default: FieldDefault::Text("mdi:delete-circle"),
        valid_for: Always,
    },
    FieldDef {
        name: "expire_after",
        step: 1,
        kind: FieldKind::Time,
        default: FieldDefault::Empty,
        valid_for: Always,
    },
    FieldDef {
        name: "verbose_state",
        step: 1,
        kind: FieldKind::Boolean,
        default: FieldDefault::Bool(false),
        valid_for: Always,
    },
    FieldDef {
        name: "hidden",
        step: 1,
        kind: FieldKind::Boolean,
        default: FieldDefault::Bool(false),
        valid_for: Always,
    },
    FieldDef {
        name: "manual_update",
        step: 1,
        kind: FieldKind::Boolean,
        default: FieldDefault::Bool(false),
        valid_for: Always,
    },
    // Step 2: annual or group detail.
    FieldDef {
        name: "date",
        step: 2,
        kind: FieldKind::MonthDay,
        default: FieldDefault::Empty,
        valid_for: Only(&[Annual]),
    },
    FieldDef {
        name: "entities",
        step: 2,
        kind: FieldKind::EntityList,
        default: FieldDefault::Empty,
        valid_for: Only(&[Group]),
    },
    // Step 3: day-of-week detail.
    FieldDef {
        name: "collection_days",
        step: 3,
        kind: FieldKind::DayList,
        default: FieldDefault::EmptyList,
        valid_for: Except(&[Annual, Group, DailyBlank]),
    },
    // Step 4: final parameters.
    FieldDef {
        name: "weekday_order_number",
        step: 4,
        kind: FieldKind::OrdinalList,
        default: FieldDefault::EmptyList,
        valid_for: Only(&[Monthly]),
    },
    FieldDef {
        name: "week_order_number",
        step: 4,
        kind: FieldKind::OrdinalList,
        default: FieldDefault::EmptyList,
        valid_for: Only(&[Monthly]),
    },
    FieldDef {
        name: "period",
        step: 4,
        kind: FieldKind::PositiveInt,
        default: FieldDefault::Int(1),
        valid_for: Only(&[Weekly, DailyBlank, Monthly]),
    },
    FieldDef {
        name: "first_week",
        step: 4,
        kind: FieldKind::WeekNumber,
        default: FieldDefault::Int(1),
        valid_for: Only(&[Weekly]),
    },
    FieldDef {
        name: "first_date",
        step: 4,
        kind: FieldKind::Date,
        default: FieldDefault::Empty,
        valid_for: Only(&[DailyBlank]),
    },
    FieldDef {
        name: "first_month",
        step: 4,
        kind: FieldKind::Month,
        default: FieldDefault::Empty,
        valid_for: Always,
    },
    FieldDef {
        name: "last_month",
        step: 4,
        kind: FieldKind::Month,
        default: FieldDefault::Empty,
        valid_for: Always,
    },
    FieldDef {
        name: "holiday_in_week_move",
        step: 4,
        kind: FieldKind::Boolean,
        default: FieldDefault::Bool(false),
        valid_for: Except(&[Annual, Group]),
    },
    FieldDef {
        name: "holiday_pop_named",
        step: 4,
        kind: FieldKind::TextList,
        default: FieldDefault::EmptyList,
        valid_for: Always,
    },
    FieldDef {
        name: "date_format",
        step: 4,
        kind: FieldKind::Text,
        default: FieldDefault::Text("%d-%b-%Y"),
        valid_for: Always,
    },
    FieldDef {
        name: "verbose_format",
        step: 4,
        kind: FieldKind::Text,
        default: FieldDefault::Text("on {date}, in {days} days"),
        valid_for: Always,
    },
];

/// Widget hint for the form renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Text,
    Checkbox,
    Number,
    Select(Vec<String>),
}

/// One row of a compiled display schema.
#[derive(Debug, Clone)]
pub struct DisplayField {
    pub name: String,
    pub widget: Widget,
    pub default: Value,
    pub required: bool,
}

/// Ordered field list handed to the form renderer.
#[derive(Debug, Clone, Default)]
pub struct DisplaySchema {
    pub fields: Vec<DisplayField>,
}

impl DisplaySchema {
    pub fn get(&self, name: &str) -> Option<&DisplayField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<DisplayField> {
        let idx = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(idx))
    }

    pub fn push(&mut self, field: DisplayField) {
        self.fields.push(field);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The registry instance: the static field table plus per-session form
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    defaults: FieldMap,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field definition by name.
    pub fn lookup(name: &str) -> Option<&'static FieldDef> {
        FIELDS.iter().find(|def| def.name == name)
    }

    /// All field names tagged to a step, regardless of category. Used for
    /// stale-field stripping when a step is merged.
    pub fn step_keys(step: u8) -> Vec<&'static str> {
        FIELDS
            .iter()
            .filter(|def| def.step == step)
            .map(|def| def.name)
            .collect()
    }

    /// Compile the validation ruleset for a step, filtered by category.
    /// An unknown step yields an empty ruleset.
    pub fn ruleset_for_step(
        &self,
        step: u8,
        category: Option<FrequencyCategory>,
    ) -> Vec<&'static FieldDef> {
        FIELDS
            .iter()
            .filter(|def| def.step == step && def.valid_for.matches(category))
            .collect()
    }

    /// Compile the ordered display schema for a step, with defaults drawn
    /// from this session's default storage.
    pub fn display_for_step(
        &self,
        step: u8,
        category: Option<FrequencyCategory>,
    ) -> DisplaySchema {
        let mut schema = DisplaySchema::default();
        for def in self.ruleset_for_step(step, category) {
            let default = self
                .defaults
                .get(def.name)
                .cloned()
                .unwrap_or_else(|| def.default.to_value());
            schema.push(DisplayField {
                name: def.name.to_string(),
                widget: widget_for(def.kind),
                default,
                required: matches!(
                    def.kind,
                    FieldKind::RequiredText
                        | FieldKind::FrequencySelect
                        | FieldKind::MonthDay
                        | FieldKind::EntityList
                ),
            });
        }
        schema
    }

    /// Copy a step's fields from `values` into default storage, so the next
    /// compiled display schema pre-fills them.
    pub fn set_defaults(&mut self, step: u8, values: &FieldMap) {
        for def in FIELDS.iter().filter(|def| def.step == step) {
            if let Some(value) = values.get(def.name) {
                self.defaults.insert(def.name.to_string(), value.clone());
            }
        }
    }

    /// Clear default storage. Called at the start of every session.
    pub fn reset_defaults(&mut self) {
        self.defaults.clear();
    }

    /// Rewrite a stored list default as comma text for re-display.
    pub fn join_list(&mut self, field: &str) {
        if let Some(value) = self.defaults.get(field) {
            let joined = string_to_list(value).join(",");
            self.defaults
                .insert(field.to_string(), Value::String(joined));
        }
    }

    /// The stored default for a list field, as plain tokens. Used to
    /// pre-check the inverse-transcoded weekday flags.
    pub fn default_tokens(&self, field: &str) -> Vec<String> {
        self.defaults
            .get(field)
            .map(string_to_list)
            .unwrap_or_default()
    }

    /// The stored default for an ordinal-list field.
    pub fn default_ordinals(&self, field: &str) -> Vec<u8> {
        match self.defaults.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_u64())
                .filter(|n| (1..=5).contains(n))
                .map(|n| n as u8)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn default_for(&self, field: &str) -> Option<&Value> {
        self.defaults.get(field)
    }
}

fn widget_for(kind: FieldKind) -> Widget {
    match kind {
        FieldKind::Boolean => Widget::Checkbox,
        FieldKind::PositiveInt | FieldKind::WeekNumber => Widget::Number,
        FieldKind::FrequencySelect => Widget::Select(
            Frequency::all()
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
        ),
        FieldKind::Month => {
            let mut options = vec![String::new()];
            options.extend(MONTH_OPTIONS.iter().map(|m| m.to_string()));
            Widget::Select(options)
        }
        _ => Widget::Text,
    }
}
