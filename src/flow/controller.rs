//! Step controller - the wizard's shared state machine
//!
//! Owns the accumulating record and the schema registry (and with it this
//! session's form defaults). One operation per step: validate the input
//! against the compiled ruleset, classify the failure if any, merge the
//! accepted fields, and report whether the flow advances or the form must be
//! shown again.

use serde_json::Value;
use std::fmt;

use crate::core::frequency::{Frequency, FrequencyCategory};
use crate::core::record::{FieldMap, ScheduleRecord};
use crate::schema::registry::{
    DisplayField, DisplaySchema, ErrorClass, FieldDef, FieldKind, SchemaRegistry, Widget,
};
use crate::schema::transcode::{days_to_list, list_to_days, list_to_weekdays, string_to_list,
    weekdays_to_list};

/// Classified validation failure, surfaced as one error per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Date,
    Icon,
    Time,
    Value,
    MonthDay,
    Entities,
    Days,
    WeekOrderNumber,
    WeekdayOrderNumber,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Date => "date",
            ErrorKind::Icon => "icon",
            ErrorKind::Time => "time",
            ErrorKind::Value => "value",
            ErrorKind::MonthDay => "month_day",
            ErrorKind::Entities => "entities",
            ErrorKind::Days => "days",
            ErrorKind::WeekOrderNumber => "week_order_number",
            ErrorKind::WeekdayOrderNumber => "weekday_order_number",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Date => ErrorKind::Date,
            ErrorClass::Icon => ErrorKind::Icon,
            ErrorClass::Time => ErrorKind::Time,
            ErrorClass::Value => ErrorKind::Value,
        }
    }
}

/// Which ordinal scheme a monthly schedule uses. Chosen in the day-of-week
/// step and held as controller state, so the final record carries exactly one
/// ordinal list and never the toggle itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyScheme {
    /// Nth weekday of the month (e.g. second Friday).
    WeekdayOrder,
    /// Nth week of the month.
    WeekOrder,
}

impl MonthlyScheme {
    pub fn field_name(&self) -> &'static str {
        match self {
            MonthlyScheme::WeekdayOrder => "weekday_order_number",
            MonthlyScheme::WeekOrder => "week_order_number",
        }
    }

    pub fn other(&self) -> MonthlyScheme {
        match self {
            MonthlyScheme::WeekdayOrder => MonthlyScheme::WeekOrder,
            MonthlyScheme::WeekOrder => MonthlyScheme::WeekdayOrder,
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        match self {
            MonthlyScheme::WeekdayOrder => ErrorKind::WeekdayOrderNumber,
            MonthlyScheme::WeekOrder => ErrorKind::WeekOrderNumber,
        }
    }
}

/// Result of applying one step.
#[derive(Debug)]
pub enum StepOutcome {
    /// All fields validated and merged; move to the next step.
    Advanced,
    /// Show (or re-show) the form: a display schema with current defaults,
    /// plus the classified error when input was rejected.
    ShowForm {
        schema: DisplaySchema,
        error: Option<ErrorKind>,
    },
}

impl StepOutcome {
    pub fn advanced(&self) -> bool {
        matches!(self, StepOutcome::Advanced)
    }
}

/// The shared wizard state for one configuration session.
pub struct StepController {
    registry: SchemaRegistry,
    record: ScheduleRecord,
    scheme: Option<MonthlyScheme>,
}

impl StepController {
    /// Start a fresh session with a new unique id.
    pub fn new() -> Self {
        Self::resume(ScheduleRecord::new())
    }

    /// Start a session over an existing record (edit flows).
    pub fn resume(record: ScheduleRecord) -> Self {
        Self {
            // A fresh registry means fresh default storage; nothing can leak
            // in from another session.
            registry: SchemaRegistry::new(),
            record,
            scheme: None,
        }
    }

    pub fn unique_id(&self) -> &str {
        self.record.unique_id()
    }

    pub fn name(&self) -> Option<&str> {
        self.record.name()
    }

    /// The frequency fixed by the general step, if it has completed.
    pub fn frequency(&self) -> Option<Frequency> {
        self.record.get("frequency")?.as_str()?.parse().ok()
    }

    pub fn category(&self) -> Option<FrequencyCategory> {
        self.frequency().map(|f| f.category())
    }

    /// Hand off the finished record's data.
    pub fn into_data(self) -> FieldMap {
        self.record.into_fields()
    }

    /// Step 1: general setup. `defaults` is given only when editing an
    /// existing entry; its name is immutable there, so the name field is
    /// dropped from both validation and display.
    pub fn step_general(
        &mut self,
        input: Option<&FieldMap>,
        defaults: Option<&FieldMap>,
    ) -> StepOutcome {
        let editing = defaults.is_some();
        let mut error = None;

        if let Some(input) = input {
            let mut input = input.clone();
            for key in ["include_dates", "exclude_dates"] {
                if let Some(value) = input.get(key) {
                    let list = string_to_list(value);
                    input.insert(
                        key.to_string(),
                        Value::Array(list.into_iter().map(Value::String).collect()),
                    );
                }
            }

            let mut ruleset = self.registry.ruleset_for_step(1, None);
            if editing {
                ruleset.retain(|def| def.name != "name");
            }

            let (updates, failures) = run_ruleset(&ruleset, &input);
            if failures.is_empty() {
                self.record.merge_step(updates, &SchemaRegistry::step_keys(1));
                return StepOutcome::Advanced;
            }
            error = Some(classify_general(&failures));
            self.registry.set_defaults(1, &input);
        } else if let Some(defaults) = defaults {
            self.registry.reset_defaults();
            self.registry.set_defaults(1, defaults);
            self.registry.join_list("include_dates");
            self.registry.join_list("exclude_dates");
        }

        let mut schema = self.registry.display_for_step(1, None);
        if editing {
            schema.remove("name");
        }
        StepOutcome::ShowForm { schema, error }
    }

    /// Step 2a: annual date or group entity references. Terminal.
    pub fn step_annual_group(
        &mut self,
        input: Option<&FieldMap>,
        defaults: Option<&FieldMap>,
    ) -> StepOutcome {
        let category = self.category().unwrap_or(FrequencyCategory::Weekly);
        let input = input.filter(|map| !map.is_empty());
        let mut error = None;

        if let Some(input) = input {
            let ruleset = self.registry.ruleset_for_step(2, Some(category));
            let (updates, failures) = run_ruleset(&ruleset, input);
            if failures.is_empty() {
                self.record.merge_step(updates, &SchemaRegistry::step_keys(2));
                return StepOutcome::Advanced;
            }
            error = Some(if category == FrequencyCategory::Annual {
                ErrorKind::MonthDay
            } else {
                ErrorKind::Entities
            });
            self.registry.set_defaults(2, input);
        } else if let Some(defaults) = defaults {
            self.registry.set_defaults(2, defaults);
        }

        StepOutcome::ShowForm {
            schema: self.registry.display_for_step(2, Some(category)),
            error,
        }
    }

    /// Step 3: day-of-week selection; monthly schedules also pick which
    /// ordinal scheme the final step will use.
    pub fn step_days(
        &mut self,
        input: Option<&FieldMap>,
        defaults: Option<&FieldMap>,
    ) -> StepOutcome {
        let category = self.category().unwrap_or(FrequencyCategory::Weekly);
        let monthly = category == FrequencyCategory::Monthly;
        let input = input.filter(|map| !map.is_empty());
        let mut error = None;

        // Default for the scheme toggle checkbox: mirror the submitted value,
        // or pre-check it when editing an entry that stored week ordinals.
        let mut force_default = defaults
            .map(|d| d.contains_key("week_order_number"))
            .unwrap_or(false);

        if let Some(input) = input {
            let mut staged = input.clone();
            days_to_list(&mut staged);
            let force = staged
                .get("force_week_numbers")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            force_default = force;

            let ruleset = self.registry.ruleset_for_step(3, Some(category));
            let (updates, failures) = run_ruleset(&ruleset, &staged);
            if !failures.is_empty() {
                error = Some(ErrorKind::Value);
            }
            let no_days = updates
                .get("collection_days")
                .and_then(Value::as_array)
                .map(Vec::is_empty)
                .unwrap_or(true);
            if no_days {
                error = Some(ErrorKind::Days);
            }

            if error.is_none() {
                if monthly {
                    self.scheme = Some(if force {
                        MonthlyScheme::WeekOrder
                    } else {
                        MonthlyScheme::WeekdayOrder
                    });
                }
                self.record.merge_step(updates, &SchemaRegistry::step_keys(3));
                return StepOutcome::Advanced;
            }
            self.registry.set_defaults(3, &staged);
        } else if let Some(defaults) = defaults {
            self.registry.set_defaults(3, defaults);
        }

        let mut schema = self.registry.display_for_step(3, Some(category));
        list_to_days(&mut schema, &self.registry.default_tokens("collection_days"));
        if monthly {
            schema.push(DisplayField {
                name: "force_week_numbers".to_string(),
                widget: Widget::Checkbox,
                default: Value::Bool(force_default),
                required: false,
            });
        }
        StepOutcome::ShowForm { schema, error }
    }

    /// Step 4: final parameters. Terminal. For monthly schedules exactly one
    /// ordinal list ends up in the record, per the scheme chosen in step 3.
    pub fn step_final(
        &mut self,
        input: Option<&FieldMap>,
        defaults: Option<&FieldMap>,
    ) -> StepOutcome {
        let category = self.category().unwrap_or(FrequencyCategory::Weekly);
        let monthly = category == FrequencyCategory::Monthly;
        let scheme = self.scheme.unwrap_or(MonthlyScheme::WeekdayOrder);
        let input = input.filter(|map| !map.is_empty());
        let mut error = None;

        if let Some(input) = input {
            let mut staged = input.clone();
            if monthly {
                weekdays_to_list(&mut staged, scheme.field_name());
            }
            if let Some(value) = staged.get("holiday_pop_named") {
                let list = string_to_list(value);
                staged.insert(
                    "holiday_pop_named".to_string(),
                    Value::Array(list.into_iter().map(Value::String).collect()),
                );
            }

            let ruleset = self.registry.ruleset_for_step(4, Some(category));
            let (mut updates, failures) = run_ruleset(&ruleset, &staged);
            if !failures.is_empty() {
                error = Some(ErrorKind::Value);
            }
            if monthly {
                let chosen_empty = updates
                    .get(scheme.field_name())
                    .and_then(Value::as_array)
                    .map(Vec::is_empty)
                    .unwrap_or(true);
                if chosen_empty {
                    error = Some(scheme.error_kind());
                }
            }

            if error.is_none() {
                if monthly {
                    // Only the chosen scheme's list may survive.
                    updates.remove(scheme.other().field_name());
                }
                self.record.merge_step(updates, &SchemaRegistry::step_keys(4));
                return StepOutcome::Advanced;
            }
            self.registry.set_defaults(4, &staged);
        } else if let Some(defaults) = defaults {
            self.registry.set_defaults(4, defaults);
            self.registry.join_list("holiday_pop_named");
        }

        let mut schema = self.registry.display_for_step(4, Some(category));
        if monthly {
            list_to_weekdays(
                &mut schema,
                scheme.field_name(),
                &self.registry.default_ordinals(scheme.field_name()),
            );
        }
        StepOutcome::ShowForm { schema, error }
    }
}

impl Default for StepController {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate every applicable field in the input, collecting coerced values
/// and the definitions that failed. Fields whose kind marks them required
/// fail when absent; everything else is skipped when missing.
fn run_ruleset(
    ruleset: &[&'static FieldDef],
    input: &FieldMap,
) -> (FieldMap, Vec<&'static FieldDef>) {
    let mut updates = FieldMap::new();
    let mut failures = Vec::new();
    for def in ruleset {
        match input.get(def.name) {
            Some(value) => match def.kind.validate(value) {
                Ok(coerced) => {
                    updates.insert(def.name.to_string(), coerced);
                }
                Err(message) => {
                    tracing::debug!(field = def.name, %message, "field validation failed");
                    failures.push(*def);
                }
            },
            None => {
                let required = matches!(
                    def.kind,
                    FieldKind::RequiredText
                        | FieldKind::FrequencySelect
                        | FieldKind::MonthDay
                        | FieldKind::EntityList
                );
                if required {
                    tracing::debug!(field = def.name, "required field missing");
                    failures.push(*def);
                }
            }
        }
    }
    (updates, failures)
}

/// Classify a general-step failure set. When several fields fail at once the
/// highest-priority class wins: date, then icon, then time, then the
/// catch-all. Catch-all failures are logged at error level since they mean a
/// field outside the known taxonomy rejected its input.
fn classify_general(failures: &[&'static FieldDef]) -> ErrorKind {
    let class = failures
        .iter()
        .map(|def| def.kind.error_class())
        .min()
        .unwrap_or(ErrorClass::Value);
    if class == ErrorClass::Value {
        let fields: Vec<_> = failures.iter().map(|def| def.name).collect();
        tracing::error!(?fields, "unclassified validation failure in general step");
    }
    ErrorKind::from(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn general(name: &str, frequency: &str) -> FieldMap {
        map(&[("name", json!(name)), ("frequency", json!(frequency))])
    }

    #[test]
    fn test_first_call_shows_schema_without_errors() {
        let mut ctl = StepController::new();
        match ctl.step_general(None, None) {
            StepOutcome::ShowForm { schema, error } => {
                assert!(error.is_none());
                assert!(schema.contains("name"));
                assert!(schema.contains("frequency"));
            }
            StepOutcome::Advanced => panic!("must not advance without input"),
        }
    }

    #[test]
    fn test_malformed_include_dates_reprompts_with_date_error() {
        let mut ctl = StepController::new();
        let mut input = general("test", "weekly");
        input.insert("include_dates".to_string(), json!("2024-13-77"));

        match ctl.step_general(Some(&input), None) {
            StepOutcome::ShowForm { schema, error } => {
                assert_eq!(error, Some(ErrorKind::Date));
                // The rejected value comes back as the new default.
                assert_eq!(
                    schema.get("include_dates").map(|f| &f.default),
                    Some(&json!(["2024-13-77"]))
                );
            }
            StepOutcome::Advanced => panic!("invalid input must not advance"),
        }
    }

    #[test]
    fn test_bad_icon_classified_as_icon() {
        let mut ctl = StepController::new();
        let mut input = general("test", "weekly");
        input.insert("icon_today".to_string(), json!("no-colon"));
        match ctl.step_general(Some(&input), None) {
            StepOutcome::ShowForm { error, .. } => assert_eq!(error, Some(ErrorKind::Icon)),
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_date_failure_outranks_icon_failure() {
        let mut ctl = StepController::new();
        let mut input = general("test", "weekly");
        input.insert("icon_today".to_string(), json!("no-colon"));
        input.insert("exclude_dates".to_string(), json!("not-a-date"));
        match ctl.step_general(Some(&input), None) {
            StepOutcome::ShowForm { error, .. } => assert_eq!(error, Some(ErrorKind::Date)),
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_bad_expire_after_classified_as_time() {
        let mut ctl = StepController::new();
        let mut input = general("test", "weekly");
        input.insert("expire_after".to_string(), json!("25:99"));
        match ctl.step_general(Some(&input), None) {
            StepOutcome::ShowForm { error, .. } => assert_eq!(error, Some(ErrorKind::Time)),
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_unknown_frequency_falls_back_to_value() {
        let mut ctl = StepController::new();
        match ctl.step_general(Some(&general("test", "fortnightly")), None) {
            StepOutcome::ShowForm { error, .. } => assert_eq!(error, Some(ErrorKind::Value)),
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_annual_session_end_to_end() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("test", "annual")), None).advanced());
        assert_eq!(ctl.category(), Some(FrequencyCategory::Annual));

        let input = map(&[("date", json!("12/25"))]);
        assert!(ctl.step_annual_group(Some(&input), None).advanced());

        assert_eq!(ctl.name(), Some("test"));
        let data = ctl.into_data();
        assert_eq!(data.get("frequency"), Some(&json!("annual")));
        assert_eq!(data.get("date"), Some(&json!("12/25")));
        assert!(!data.contains_key("collection_days"));
        assert!(!data.contains_key("name"));
    }

    #[test]
    fn test_annual_bad_month_day() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("test", "annual")), None).advanced());
        let input = map(&[("date", json!("13/01"))]);
        match ctl.step_annual_group(Some(&input), None) {
            StepOutcome::ShowForm { error, .. } => assert_eq!(error, Some(ErrorKind::MonthDay)),
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_group_entities_transcoded() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("all bins", "group")), None).advanced());

        let input = map(&[("entities", json!("paper, 'glass'"))]);
        assert!(ctl.step_annual_group(Some(&input), None).advanced());
        let data = ctl.into_data();
        assert_eq!(data.get("entities"), Some(&json!(["paper", "glass"])));
    }

    #[test]
    fn test_group_empty_entities_rejected() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("g", "group")), None).advanced());
        let input = map(&[("entities", json!(""))]);
        match ctl.step_annual_group(Some(&input), None) {
            StepOutcome::ShowForm { error, .. } => assert_eq!(error, Some(ErrorKind::Entities)),
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_no_days_selected_rejected() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("test", "weekly")), None).advanced());

        let mut input = FieldMap::new();
        for day in crate::core::frequency::Weekday::all() {
            input.insert(day.flag_key(), json!(false));
        }
        match ctl.step_days(Some(&input), None) {
            StepOutcome::ShowForm { error, .. } => assert_eq!(error, Some(ErrorKind::Days)),
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_monthly_weekday_order_session() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("test", "monthly")), None).advanced());

        let mut days = FieldMap::new();
        for day in crate::core::frequency::Weekday::all() {
            days.insert(day.flag_key(), json!(day.token() == "fri"));
        }
        days.insert("force_week_numbers".to_string(), json!(false));
        assert!(ctl.step_days(Some(&days), None).advanced());

        let mut finals = FieldMap::new();
        for n in crate::core::frequency::ORDINALS {
            finals.insert(format!("weekday_order_number_{}", n), json!(n == 1));
        }
        assert!(ctl.step_final(Some(&finals), None).advanced());

        let data = ctl.into_data();
        assert_eq!(data.get("collection_days"), Some(&json!(["fri"])));
        assert_eq!(data.get("weekday_order_number"), Some(&json!([1])));
        assert!(!data.contains_key("week_order_number"));
        assert!(!data.contains_key("force_week_numbers"));
    }

    #[test]
    fn test_monthly_week_order_session() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("test", "monthly")), None).advanced());

        let mut days = FieldMap::new();
        days.insert("collection_days_wed".to_string(), json!(true));
        days.insert("force_week_numbers".to_string(), json!(true));
        assert!(ctl.step_days(Some(&days), None).advanced());

        let mut finals = FieldMap::new();
        finals.insert("week_order_number_2".to_string(), json!(true));
        assert!(ctl.step_final(Some(&finals), None).advanced());

        let data = ctl.into_data();
        assert_eq!(data.get("week_order_number"), Some(&json!([2])));
        assert!(!data.contains_key("weekday_order_number"));
        assert!(!data.contains_key("force_week_numbers"));
    }

    #[test]
    fn test_monthly_empty_ordinals_error_names_the_field() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("test", "monthly")), None).advanced());

        let mut days = FieldMap::new();
        days.insert("collection_days_mon".to_string(), json!(true));
        days.insert("force_week_numbers".to_string(), json!(true));
        assert!(ctl.step_days(Some(&days), None).advanced());

        let mut finals = FieldMap::new();
        finals.insert("week_order_number_1".to_string(), json!(false));
        match ctl.step_final(Some(&finals), None) {
            StepOutcome::ShowForm { error, .. } => {
                assert_eq!(error, Some(ErrorKind::WeekOrderNumber))
            }
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_weekly_blank_final_step() {
        let mut ctl = StepController::new();
        assert!(ctl.step_general(Some(&general("test", "blank")), None).advanced());
        assert_eq!(ctl.category(), Some(FrequencyCategory::DailyBlank));

        let input = map(&[("date_format", json!("%d-%b-%Y"))]);
        assert!(ctl.step_final(Some(&input), None).advanced());
        let data = ctl.into_data();
        assert_eq!(data.get("date_format"), Some(&json!("%d-%b-%Y")));
    }

    #[test]
    fn test_edit_mode_hides_name() {
        let stored = map(&[
            ("unique_id", json!("01ABC")),
            ("frequency", json!("weekly")),
            ("collection_days", json!(["mon"])),
        ]);
        let mut ctl = StepController::resume(ScheduleRecord::with_id("01ABC".to_string()));
        match ctl.step_general(None, Some(&stored)) {
            StepOutcome::ShowForm { schema, error } => {
                assert!(error.is_none());
                assert!(!schema.contains("name"));
                assert_eq!(
                    schema.get("frequency").map(|f| &f.default),
                    Some(&json!("weekly"))
                );
            }
            StepOutcome::Advanced => panic!(),
        }

        // Submitting without a name advances in edit mode.
        let input = map(&[("frequency", json!("weekly"))]);
        assert!(ctl.step_general(Some(&input), Some(&stored)).advanced());
    }

    #[test]
    fn test_edit_defaults_precheck_week_order_toggle() {
        let stored = map(&[
            ("unique_id", json!("01ABC")),
            ("frequency", json!("monthly")),
            ("collection_days", json!(["wed"])),
            ("week_order_number", json!([1, 3])),
        ]);
        let mut ctl = StepController::resume(ScheduleRecord::with_id("01ABC".to_string()));
        let input = map(&[("frequency", json!("monthly"))]);
        assert!(ctl.step_general(Some(&input), Some(&stored)).advanced());

        match ctl.step_days(None, Some(&stored)) {
            StepOutcome::ShowForm { schema, .. } => {
                assert_eq!(
                    schema.get("force_week_numbers").map(|f| &f.default),
                    Some(&json!(true))
                );
                assert_eq!(
                    schema.get("collection_days_wed").map(|f| &f.default),
                    Some(&json!(true))
                );
            }
            StepOutcome::Advanced => panic!(),
        }
    }

    #[test]
    fn test_replayed_step_strips_stale_fields() {
        let mut ctl = StepController::new();
        let mut input = general("test", "weekly");
        input.insert("expire_after".to_string(), json!("10:00"));
        assert!(ctl.step_general(Some(&input), None).advanced());

        // Re-run step 1 with expire_after cleared.
        let mut input = general("test", "weekly");
        input.insert("expire_after".to_string(), json!(""));
        assert!(ctl.step_general(Some(&input), None).advanced());

        let data = ctl.into_data();
        assert!(!data.contains_key("expire_after"));
    }
}
