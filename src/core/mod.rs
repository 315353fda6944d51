//! Core module - fundamental types

pub mod frequency;
pub mod record;
pub mod store;

pub use frequency::{Frequency, FrequencyCategory, Weekday};
pub use record::{FieldMap, ScheduleRecord};
pub use store::{ScheduleStore, StoreError, StoredSchedule};
