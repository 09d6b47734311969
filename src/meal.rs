use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Meal category of a transaction, decided by time of day alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Dinner,
    Lunch,
}

const BREAKFAST_START: (u32, u32) = (7, 0);
const BREAKFAST_END: (u32, u32) = (8, 30);
const LUNCH_START: (u32, u32) = (11, 30);
const LUNCH_END: (u32, u32) = (13, 30);

fn hm(bound: (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(bound.0, bound.1, 0).unwrap_or(NaiveTime::MIN)
}

impl Meal {
    /// All categories in label order.
    pub const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Dinner, Meal::Lunch];

    /// Categorizes a wall-clock time.
    ///
    /// Both windows are inclusive on both ends: `07:00:00..=08:30:00` is
    /// breakfast, `11:30:00..=13:30:00` is lunch, and everything else
    /// (including any fraction of a second past a window end) is dinner.
    pub fn from_time(time: NaiveTime) -> Self {
        if hm(BREAKFAST_START) <= time && time <= hm(BREAKFAST_END) {
            Meal::Breakfast
        } else if hm(LUNCH_START) <= time && time <= hm(LUNCH_END) {
            Meal::Lunch
        } else {
            Meal::Dinner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Meal {
    type Err = ParseMealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Meal::Breakfast),
            "lunch" => Ok(Meal::Lunch),
            "dinner" => Ok(Meal::Dinner),
            _ => Err(ParseMealError(s.to_string())),
        }
    }
}

/// Error returned when a meal name is not one of breakfast, lunch or dinner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMealError(pub String);

impl fmt::Display for ParseMealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown meal '{}' (expected breakfast, lunch or dinner)",
            self.0
        )
    }
}

impl std::error::Error for ParseMealError {}

/// Weekdays in calendar order, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Full English name of a weekday ("Monday", ...).
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses a weekday from its full or three-letter name, ignoring case.
pub fn parse_weekday(s: &str) -> Result<Weekday, chrono::ParseWeekdayError> {
    Weekday::from_str(s.trim())
}

/// Serde adapter writing an optional weekday as its full name.
pub(crate) mod weekday_full_name {
    use super::weekday_name;
    use chrono::Weekday;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(day: &Option<Weekday>, serializer: S) -> Result<S::Ok, S::Error> {
        match day {
            Some(day) => serializer.serialize_str(weekday_name(*day)),
            None => serializer.serialize_none(),
        }
    }
}
