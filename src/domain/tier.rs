use crate::error::CheckoutError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Security service level. Selects the rate card used for pricing.
///
/// Names are matched case-insensitively wherever a tier is parsed, serde included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceTier {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl ServiceTier {
    pub const ALL: [ServiceTier; 3] = [Self::Basic, Self::Intermediate, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    /// Emergency response and special equipment are only offered on Advanced.
    pub fn offers_flat_fees(&self) -> bool {
        matches!(self, Self::Advanced)
    }

    pub fn rate_card(&self) -> RateCard {
        match self {
            Self::Basic => RateCard {
                daytime: dec!(100),
                nighttime: dec!(150),
                danger: dec!(50),
                weather: dec!(30),
                emergency: None,
                special_equipment: None,
            },
            Self::Intermediate => RateCard {
                daytime: dec!(150),
                nighttime: dec!(200),
                danger: dec!(75),
                weather: dec!(30),
                emergency: None,
                special_equipment: None,
            },
            Self::Advanced => RateCard {
                daytime: dec!(200),
                nighttime: dec!(250),
                danger: dec!(80),
                weather: dec!(50),
                emergency: Some(dec!(200)),
                special_equipment: Some(dec!(100)),
            },
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceTier {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CheckoutError::Validation(format!("Unknown service tier '{s}'")))
    }
}

impl TryFrom<String> for ServiceTier {
    type Error = CheckoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceTier> for String {
    fn from(tier: ServiceTier) -> Self {
        tier.as_str().to_string()
    }
}

/// Rates for one tier, in major currency units.
///
/// Hourly rates apply per billed hour; `emergency` and `special_equipment`
/// are flat one-time fees present only on tiers that offer them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RateCard {
    pub daytime: Decimal,
    pub nighttime: Decimal,
    pub danger: Decimal,
    pub weather: Decimal,
    pub emergency: Option<Decimal>,
    pub special_equipment: Option<Decimal>,
}

impl RateCard {
    /// All rates zero. What an unrecognized tier name prices at.
    pub const ZERO: Self = Self {
        daytime: Decimal::ZERO,
        nighttime: Decimal::ZERO,
        danger: Decimal::ZERO,
        weather: Decimal::ZERO,
        emergency: None,
        special_equipment: None,
    };

    /// Rates for a tier known only by name, e.g. from an untyped form post.
    ///
    /// Falls back to [`RateCard::ZERO`] instead of failing. Callers holding a
    /// [`ServiceTier`] use [`ServiceTier::rate_card`].
    pub fn lookup(name: &str) -> Self {
        name.parse::<ServiceTier>()
            .map(|tier| tier.rate_card())
            .unwrap_or(Self::ZERO)
    }

    pub fn hourly_rate(&self, hour_of_day: u32) -> Decimal {
        if is_daytime(hour_of_day) {
            self.daytime
        } else {
            self.nighttime
        }
    }

    /// Captions for the hourly surcharge checkboxes, e.g. `Dangerous Location (50 ZAR per hour)`.
    pub fn surcharge_labels(&self, currency: &str) -> Vec<String> {
        vec![
            format!("Dangerous Location ({} {currency} per hour)", self.danger),
            format!("Adverse Weather ({} {currency} per hour)", self.weather),
        ]
    }

    /// Captions for the one-time fees. Empty unless the tier offers them.
    pub fn flat_fee_labels(&self, currency: &str) -> Vec<String> {
        let mut labels = Vec::new();
        if let Some(fee) = self.emergency {
            labels.push(format!("Emergency Response ({fee} {currency})"));
        }
        if let Some(fee) = self.special_equipment {
            labels.push(format!("Special Equipment ({fee} {currency})"));
        }
        labels
    }
}

/// Daytime covers hours [6, 18).
pub fn is_daytime(hour_of_day: u32) -> bool {
    (6..18).contains(&hour_of_day)
}
