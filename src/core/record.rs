//! The accumulating configuration record for one wizard session

use serde_json::Value;
use ulid::Ulid;

/// Flat field map shared between form input, validation output, and the
/// stored record.
pub type FieldMap = serde_json::Map<String, Value>;

/// The partially-validated configuration built up across wizard steps.
///
/// The unique id is assigned at session start and never changes. The name is
/// pulled out of the field map and held separately; it becomes the stored
/// entry's title rather than part of its data.
#[derive(Debug, Clone)]
pub struct ScheduleRecord {
    unique_id: String,
    name: Option<String>,
    fields: FieldMap,
}

impl ScheduleRecord {
    /// Start a fresh session with a newly minted id.
    pub fn new() -> Self {
        Self::with_id(Ulid::new().to_string())
    }

    /// Resume a session for an existing stored entry.
    pub fn with_id(unique_id: String) -> Self {
        let mut fields = FieldMap::new();
        fields.insert("unique_id".to_string(), Value::String(unique_id.clone()));
        Self {
            unique_id,
            name: None,
            fields,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Consume the session, yielding the final data map.
    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    /// Merge one step's validated fields into the record.
    ///
    /// `step_keys` is the full set of field names tagged to the step. Any of
    /// them already in the record but absent from (or empty in) this
    /// submission is removed, so re-running a step never leaves stale values
    /// behind. A `name` field is moved out of the map into its own slot.
    pub fn merge_step(&mut self, updates: FieldMap, step_keys: &[&str]) {
        for (key, value) in &updates {
            self.fields.insert(key.clone(), value.clone());
        }
        for key in step_keys {
            let empty = match updates.get(*key) {
                None => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };
            if empty {
                self.fields.remove(*key);
            }
        }
        if let Some(Value::String(name)) = self.fields.remove("name") {
            self.name = Some(name);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }
}

impl Default for ScheduleRecord {
    fn default() -> Self {
        Self::new()
    }
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

    #[test]
    fn test_record_keeps_unique_id() {
        let record = ScheduleRecord::with_id("01ABC".to_string());
        assert_eq!(record.unique_id(), "01ABC");
        assert_eq!(record.get("unique_id"), Some(&json!("01ABC")));
    }

    #[test]
    fn test_merge_extracts_name() {
        let mut record = ScheduleRecord::new();
        record.merge_step(
            map(&[("name", json!("paper")), ("frequency", json!("weekly"))]),
            &["name", "frequency"],
        );
        assert_eq!(record.name(), Some("paper"));
        assert!(!record.contains("name"));
        assert_eq!(record.get("frequency"), Some(&json!("weekly")));
    }

    #[test]
    fn test_reapplied_step_strips_stale_fields() {
        let mut record = ScheduleRecord::new();
        record.merge_step(
            map(&[("expire_after", json!("10:00")), ("hidden", json!(true))]),
            &["expire_after", "hidden"],
        );
        assert!(record.contains("expire_after"));

        // Re-run the step with expire_after cleared and hidden omitted.
        record.merge_step(map(&[("expire_after", json!(""))]), &["expire_after", "hidden"]);
        assert!(!record.contains("expire_after"));
        assert!(!record.contains("hidden"));
    }

    #[test]
    fn test_merge_ignores_other_steps_fields() {
        let mut record = ScheduleRecord::new();
        record.merge_step(map(&[("date", json!("04/01"))]), &["date"]);
        record.merge_step(map(&[("period", json!(2))]), &["period", "first_week"]);
        assert_eq!(record.get("date"), Some(&json!("04/01")));
        assert_eq!(record.get("period"), Some(&json!(2)));
    }
}
