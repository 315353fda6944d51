//! Collection frequency and weekday types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How often a collection recurs. Chosen in the first wizard step and fixed
/// for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Weekly,
    EvenWeeks,
    OddWeeks,
    EveryNWeeks,
    EveryNDays,
    Monthly,
    Annual,
    Group,
    Blank,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::EvenWeeks => "even-weeks",
            Frequency::OddWeeks => "odd-weeks",
            Frequency::EveryNWeeks => "every-n-weeks",
            Frequency::EveryNDays => "every-n-days",
            Frequency::Monthly => "monthly",
            Frequency::Annual => "annual",
            Frequency::Group => "group",
            Frequency::Blank => "blank",
        }
    }

    /// All selectable frequencies, in the order the first step offers them.
    pub fn all() -> &'static [Frequency] {
        &[
            Frequency::Weekly,
            Frequency::EvenWeeks,
            Frequency::OddWeeks,
            Frequency::EveryNWeeks,
            Frequency::EveryNDays,
            Frequency::Monthly,
            Frequency::Annual,
            Frequency::Group,
            Frequency::Blank,
        ]
    }

    /// The category drives which later steps apply and which fields they show.
    pub fn category(&self) -> FrequencyCategory {
        match self {
            Frequency::Annual => FrequencyCategory::Annual,
            Frequency::Group => FrequencyCategory::Group,
            Frequency::Blank | Frequency::EveryNDays => FrequencyCategory::DailyBlank,
            Frequency::Monthly => FrequencyCategory::Monthly,
            _ => FrequencyCategory::Weekly,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Frequency::Weekly),
            "even-weeks" => Ok(Frequency::EvenWeeks),
            "odd-weeks" => Ok(Frequency::OddWeeks),
            "every-n-weeks" => Ok(Frequency::EveryNWeeks),
            "every-n-days" => Ok(Frequency::EveryNDays),
            "monthly" => Ok(Frequency::Monthly),
            "annual" => Ok(Frequency::Annual),
            "group" => Ok(Frequency::Group),
            "blank" => Ok(Frequency::Blank),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown frequency: '{0}' (valid: weekly, even-weeks, odd-weeks, every-n-weeks, every-n-days, monthly, annual, group, blank)")]
pub struct UnknownFrequency(pub String);

/// Frequency groups with distinct wizard paths.
///
/// Annual and group schedules skip the day-of-week step entirely; daily/blank
/// schedules have no day concept at all and jump straight to the final step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyCategory {
    Annual,
    Group,
    DailyBlank,
    Monthly,
    Weekly,
}

/// Collection weekdays. The wizard models day selection as one boolean flag
/// per weekday, normalized to an ordered list of tokens in the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Weekday {
    /// Fixed weekday order, used both for flag layout and list normalization.
    pub fn all() -> &'static [Weekday] {
        &[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
    }

    /// The token stored in `collection_days` lists.
    pub fn token(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
        }
    }

    /// The flat form field carrying this weekday's boolean flag.
    pub fn flag_key(&self) -> String {
        format!("collection_days_{}", self.token())
    }

    pub fn from_token(s: &str) -> Option<Weekday> {
        Weekday::all().iter().copied().find(|d| d.token() == s)
    }
}

/// Week/weekday ordinals within a month (first through fifth).
pub const ORDINALS: [u8; 5] = [1, 2, 3, 4, 5];

/// The flat form field carrying one ordinal's boolean flag, e.g.
/// `weekday_order_number_3`.
pub fn ordinal_flag_key(prefix: &str, ordinal: u8) -> String {
    format!("{}_{}", prefix, ordinal)
}
