//! Quote pricing.
//!
//! Pure functions from a [`QuoteRequest`] snapshot to an amount in minor units.
//! Nothing here touches the flow state or performs I/O.

use super::quote::{MinorUnits, Quote, QuoteRequest};
use super::tier::RateCard;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Bookings shorter than this, including ones whose end precedes the start, bill this many hours.
pub const MINIMUM_BILLED_HOURS: Decimal = dec!(3);

/// Billable hours for a request: the start-to-end span, clamped to the minimum.
///
/// An end time earlier than the start time does not wrap past midnight; the
/// negative span is clamped to [`MINIMUM_BILLED_HOURS`].
pub fn billed_hours(request: &QuoteRequest) -> Decimal {
    let minutes = request.start.minutes_until(request.end);
    let hours = Decimal::from(minutes) / dec!(60);
    hours.max(MINIMUM_BILLED_HOURS)
}

/// Prices `request` against its tier's rate card.
pub fn price(request: &QuoteRequest) -> Quote {
    price_with(request, &request.tier.rate_card())
}

/// Convenience for callers that only need the amount.
pub fn compute_total(request: &QuoteRequest) -> MinorUnits {
    price(request).total
}

/// Prices `request` against an explicit rate card.
///
/// Day/night rates are charged once per whole hour, walking from the start
/// hour; a fractional remainder is not charged. Danger and weather surcharges
/// scale with the fractional billed duration. Flat fees apply once and only
/// when the request's tier offers them.
pub fn price_with(request: &QuoteRequest, card: &RateCard) -> Quote {
    let billed = billed_hours(request);
    let increments = billed.trunc().to_u32().unwrap_or_default();

    let start_hour = request.start.hour();
    let mut amount: Decimal = (0..increments)
        .map(|offset| card.hourly_rate((start_hour + offset) % 24))
        .sum();

    if request.dangerous_location {
        amount += card.danger * billed;
    }
    if request.adverse_weather {
        amount += card.weather * billed;
    }
    if request.tier.offers_flat_fees() {
        if request.emergency
            && let Some(fee) = card.emergency
        {
            amount += fee;
        }
        if request.special_equipment
            && let Some(fee) = card.special_equipment
        {
            amount += fee;
        }
    }

    Quote {
        tier: request.tier,
        billed_hours: billed,
        hourly_increments: increments,
        total: to_minor_units(amount),
    }
}

/// Major units to minor units, rounding half away from zero to a whole cent.
fn to_minor_units(major: Decimal) -> MinorUnits {
    let minor = (major * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .max(Decimal::ZERO);
    MinorUnits(minor.to_u64().unwrap_or_default())
}
