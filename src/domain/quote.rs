use super::tier::ServiceTier;
use crate::error::CheckoutError;
use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A wall-clock time of day, `HH:MM` on a 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, CheckoutError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| CheckoutError::Validation(format!("Invalid time {hour:02}:{minute:02}")))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Signed minutes from `self` to `later`. Negative when `later` is earlier in the day.
    pub fn minutes_until(&self, later: TimeOfDay) -> i64 {
        (later.0 - self.0).num_minutes()
    }
}

impl FromStr for TimeOfDay {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| CheckoutError::Validation(format!("Invalid time '{s}', expected HH:MM")))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = CheckoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// The form contents a quote is computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub email: String,
    pub tier: ServiceTier,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    #[serde(rename = "dangerous", default, deserialize_with = "deserialize_flag")]
    pub dangerous_location: bool,
    #[serde(rename = "weather", default, deserialize_with = "deserialize_flag")]
    pub adverse_weather: bool,
    /// Ignored unless the tier is Advanced.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub emergency: bool,
    /// Ignored unless the tier is Advanced.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub special_equipment: bool,
}

/// Reads a checkbox value as posted by a form or written in a CSV cell.
///
/// Case-insensitive; a blank value is `false`. `None` for anything else.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "off" | "0" => Some(false),
        "true" | "yes" | "on" | "1" => Some(true),
        _ => None,
    }
}

/// Accepts booleans as well as the spellings [`parse_flag`] understands.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean flag")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            parse_flag(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            email: String::new(),
            tier: ServiceTier::Basic,
            start: TimeOfDay(NaiveTime::MIN + chrono::Duration::hours(6)),
            end: TimeOfDay(NaiveTime::MIN + chrono::Duration::hours(18)),
            dangerous_location: false,
            adverse_weather: false,
            emergency: false,
            special_equipment: false,
        }
    }
}

impl QuoteRequest {
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

/// An amount in the smallest currency unit (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct MinorUnits(pub u64);

impl MinorUnits {
    pub const ZERO: Self = Self(0);

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The same amount in major units, e.g. `120000` -> `1200`.
    pub fn to_major(&self) -> Decimal {
        Decimal::from(self.0)
            .checked_div(Decimal::ONE_HUNDRED)
            .unwrap_or_default()
            .normalize()
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

/// A priced request. Never updated in place; reprice the request instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub tier: ServiceTier,
    /// Billable duration after the minimum clamp, possibly fractional.
    pub billed_hours: Decimal,
    /// Whole hours charged at the day or night rate.
    pub hourly_increments: u32,
    pub total: MinorUnits,
}
