//! # Pricing Engine
//!
//! Computes the cost of a parking stay from its entry instant, the exit
//! instant, the plan type, the tariff set and the grace period.
//!
//! ## Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          quote(input, tariffs, now)                     │
//! │                                                                         │
//! │  duration = ceil(ms / 60000)                                            │
//! │       │                                                                 │
//! │       ├── plan DAY ──► ceil(duration / 1440) × day rate                 │
//! │       │                                                                 │
//! │       └── plan HOUR ──► PricingConfig::for_hour_plan(tariffs)           │
//! │                             │                                           │
//! │              ┌──────────────┼──────────────────┐                        │
//! │              ▼              ▼                  ▼                        │
//! │        Traditional       Minute             Blocks                      │
//! │        hours + grace     minutes × price    base + extra blocks         │
//! │        optional cap      optional cap                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each [`PricingConfig`] variant carries only the fields its formula reads.
//! Only the Traditional model consults the grace period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::tariff::TariffSet;
use crate::types::{PlanType, PricingModel, Tariff, TariffType};
use crate::MINUTES_PER_DAY;

// =============================================================================
// Pricing Configuration
// =============================================================================

/// Flat-rate cap: once a stay reaches `min_hours`, cost never exceeds
/// `max_price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRateCap {
    pub max_price: Money,
    pub min_hours: i64,
}

/// A tariff row interpreted by its pricing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingConfig {
    /// Whole hours, trailing partial hour forgiven within the grace period.
    Traditional {
        hour_rate: Money,
        cap: Option<FlatRateCap>,
    },
    /// Every started minute is billed.
    Minute {
        per_minute: Money,
        cap: Option<FlatRateCap>,
    },
    /// A base block, then fixed-size extra blocks.
    Blocks {
        base_price: Money,
        base_minutes: i64,
        extra_price: Money,
        extra_minutes: i64,
    },
}

impl PricingConfig {
    /// Interprets a stored tariff row.
    ///
    /// ## Errors
    /// - [`CoreError::InvalidTariff`] for negative prices or a BLOCKS tariff
    ///   without a positive extra block size
    pub fn from_tariff(tariff: &Tariff) -> CoreResult<Self> {
        if tariff.base_price < 0 || tariff.extra_frac_price < 0 {
            return Err(invalid(tariff, "prices must not be negative"));
        }

        let cap = match tariff.day_max_price {
            Some(max) if max < 0 => return Err(invalid(tariff, "day_max_price must not be negative")),
            Some(max) => Some(FlatRateCap {
                max_price: Money::from_amount(max),
                min_hours: tariff.day_min_hours.unwrap_or(0).max(0),
            }),
            None => None,
        };

        let config = match tariff.pricing_model {
            PricingModel::Traditional => PricingConfig::Traditional {
                hour_rate: tariff.base_price_money(),
                cap,
            },
            PricingModel::Minute => PricingConfig::Minute {
                per_minute: tariff.base_price_money(),
                cap,
            },
            PricingModel::Blocks => {
                if tariff.extra_frac_time_minutes <= 0 {
                    return Err(invalid(tariff, "extra_frac_time_minutes must be positive"));
                }
                PricingConfig::Blocks {
                    base_price: tariff.base_price_money(),
                    base_minutes: tariff.base_time_minutes.max(0),
                    extra_price: Money::from_amount(tariff.extra_frac_price),
                    extra_minutes: tariff.extra_frac_time_minutes,
                }
            }
        };
        Ok(config)
    }

    /// Picks the configuration an HOUR-plan stay is billed with.
    ///
    /// HOUR tariff first, then a MINUTE tariff, then a Traditional fallback
    /// at the hardcoded hour rate with no cap.
    pub fn for_hour_plan(tariffs: &TariffSet) -> CoreResult<Self> {
        match tariffs
            .get(TariffType::Hour)
            .or_else(|| tariffs.get(TariffType::Minute))
        {
            Some(tariff) => PricingConfig::from_tariff(tariff),
            None => Ok(PricingConfig::Traditional {
                hour_rate: tariffs.hour_rate(),
                cap: None,
            }),
        }
    }

    /// Cost of a stay of `duration_minutes`.
    ///
    /// ## Example
    /// ```rust
    /// use lotkeeper_core::money::Money;
    /// use lotkeeper_core::pricing::PricingConfig;
    ///
    /// let blocks = PricingConfig::Blocks {
    ///     base_price: Money::from_amount(3000),
    ///     base_minutes: 60,
    ///     extra_price: Money::from_amount(1000),
    ///     extra_minutes: 30,
    /// };
    /// assert_eq!(blocks.cost(90, 0).amount(), 4000);
    /// ```
    pub fn cost(&self, duration_minutes: i64, grace_period_minutes: i64) -> Money {
        let duration = duration_minutes.max(0);
        match *self {
            PricingConfig::Traditional { hour_rate, cap } => {
                let full_hours = duration / 60;
                let remainder = duration % 60;
                let mut chargeable = full_hours;
                if remainder > grace_period_minutes.max(0) {
                    chargeable += 1;
                }
                // The first hour is always billed.
                let chargeable = chargeable.max(1);
                let raw = hour_rate * chargeable;
                match cap {
                    Some(cap) if chargeable >= cap.min_hours => raw.min(cap.max_price),
                    _ => raw,
                }
            }
            PricingConfig::Minute { per_minute, cap } => {
                let raw = per_minute * duration;
                match cap {
                    Some(cap) if duration / 60 >= cap.min_hours => raw.min(cap.max_price),
                    _ => raw,
                }
            }
            PricingConfig::Blocks {
                base_price,
                base_minutes,
                extra_price,
                extra_minutes,
            } => {
                let overflow = (duration - base_minutes).max(0);
                let blocks = div_ceil(overflow, extra_minutes);
                base_price + extra_price * blocks
            }
        }
    }

    /// Price of one hour under this configuration, shown in previews.
    pub fn hourly_rate(&self) -> Money {
        match *self {
            PricingConfig::Traditional { hour_rate, .. } => hour_rate,
            PricingConfig::Minute { per_minute, .. } => per_minute * 60,
            PricingConfig::Blocks { .. } => self.cost(60, 0),
        }
    }
}

fn invalid(tariff: &Tariff, reason: &str) -> CoreError {
    CoreError::InvalidTariff {
        tariff_id: tariff.id.clone(),
        reason: reason.to_string(),
    }
}

fn div_ceil(numerator: i64, denominator: i64) -> i64 {
    if denominator <= 0 {
        return 0;
    }
    (numerator + denominator - 1) / denominator
}

// =============================================================================
// Duration
// =============================================================================

/// Billable minutes between two instants. Any partial minute is a full one.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use lotkeeper_core::pricing::duration_minutes;
///
/// let entry = Utc::now();
/// assert_eq!(duration_minutes(entry, entry + Duration::seconds(61)).unwrap(), 2);
/// assert_eq!(duration_minutes(entry, entry).unwrap(), 0);
/// ```
pub fn duration_minutes(entry_time: DateTime<Utc>, exit_time: DateTime<Utc>) -> CoreResult<i64> {
    let millis = (exit_time - entry_time).num_milliseconds();
    if millis < 0 {
        return Err(CoreError::ExitBeforeEntry {
            entry_time: entry_time.to_rfc3339(),
            exit_time: exit_time.to_rfc3339(),
        });
    }
    Ok(div_ceil(millis, 60_000))
}

// =============================================================================
// Quote
// =============================================================================

/// What the engine needs to know about the session being priced.
#[derive(Debug, Clone, Copy)]
pub struct PlanQuoteInput {
    pub entry_time: DateTime<Utc>,
    pub plan_type: PlanType,
    pub grace_period_minutes: i64,
}

/// Result of pricing a stay, before any discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceQuote {
    pub cost: Money,
    pub duration_minutes: i64,
    #[ts(as = "String")]
    pub exit_time: DateTime<Utc>,
    pub hourly_rate: Money,
}

/// Prices a stay ending at `exit_time`.
///
/// ## Errors
/// - [`CoreError::ExitBeforeEntry`] if the clock runs backwards
/// - [`CoreError::InvalidTariff`] if the selected tariff is malformed
pub fn quote(
    input: &PlanQuoteInput,
    tariffs: &TariffSet,
    exit_time: DateTime<Utc>,
) -> CoreResult<PriceQuote> {
    let duration = duration_minutes(input.entry_time, exit_time)?;

    let (cost, hourly_rate) = match input.plan_type {
        PlanType::Day => {
            let days = div_ceil(duration, MINUTES_PER_DAY);
            (tariffs.day_rate() * days, tariffs.hour_rate())
        }
        PlanType::Hour => {
            let config = PricingConfig::for_hour_plan(tariffs)?;
            (
                config.cost(duration, input.grace_period_minutes),
                config.hourly_rate(),
            )
        }
    };

    Ok(PriceQuote {
        cost,
        duration_minutes: duration,
        exit_time,
        hourly_rate,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleType;
    use chrono::{Duration, TimeZone};

    fn entry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn tariff(kind: TariffType, model: PricingModel) -> Tariff {
        let now = entry();
        Tariff {
            id: "tariff-1".to_string(),
            tenant_id: "t-1".to_string(),
            location_id: "loc-1".to_string(),
            vehicle_type: VehicleType::Car,
            tariff_type: kind,
            pricing_model: model,
            base_price: 0,
            base_time_minutes: 60,
            extra_frac_price: 0,
            extra_frac_time_minutes: 0,
            day_max_price: None,
            day_min_hours: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn hour_input(grace: i64) -> PlanQuoteInput {
        PlanQuoteInput {
            entry_time: entry(),
            plan_type: PlanType::Hour,
            grace_period_minutes: grace,
        }
    }

    #[test]
    fn test_duration_rounds_up() {
        let e = entry();
        assert_eq!(duration_minutes(e, e + Duration::seconds(61)).unwrap(), 2);
        assert_eq!(duration_minutes(e, e + Duration::milliseconds(1)).unwrap(), 1);
        assert_eq!(duration_minutes(e, e + Duration::minutes(60)).unwrap(), 60);
        assert!(duration_minutes(e, e - Duration::seconds(1)).is_err());
    }

    #[test]
    fn test_traditional_grace_period() {
        let tariffs = TariffSet::new(VehicleType::Car, Vec::new());
        let exit = entry() + Duration::minutes(65);

        let forgiven = quote(&hour_input(10), &tariffs, exit).unwrap();
        assert_eq!(forgiven.duration_minutes, 65);
        assert_eq!(forgiven.cost.amount(), 3000);

        let charged = quote(&hour_input(2), &tariffs, exit).unwrap();
        assert_eq!(charged.cost.amount(), 6000);
        assert_eq!(charged.hourly_rate.amount(), 3000);
    }

    #[test]
    fn test_traditional_first_hour_always_billed() {
        let config = PricingConfig::Traditional {
            hour_rate: Money::from_amount(3000),
            cap: None,
        };
        // Inside the grace period but still one full hour
        assert_eq!(config.cost(3, 10).amount(), 3000);
        assert_eq!(config.cost(0, 5).amount(), 3000);
    }

    #[test]
    fn test_traditional_flat_rate_cap() {
        let mut t = tariff(TariffType::Hour, PricingModel::Traditional);
        t.base_price = 2000;
        t.day_max_price = Some(8000);
        t.day_min_hours = Some(4);
        let tariffs = TariffSet::new(VehicleType::Car, vec![t]);

        let five_hours = quote(&hour_input(5), &tariffs, entry() + Duration::hours(5)).unwrap();
        assert_eq!(five_hours.cost.amount(), 8000);

        let three_hours = quote(&hour_input(5), &tariffs, entry() + Duration::hours(3)).unwrap();
        assert_eq!(three_hours.cost.amount(), 6000);
    }

    #[test]
    fn test_minute_model_cap_threshold() {
        let mut t = tariff(TariffType::Minute, PricingModel::Minute);
        t.base_price = 50;
        t.day_max_price = Some(12000);
        t.day_min_hours = Some(6);
        let tariffs = TariffSet::new(VehicleType::Car, vec![t]);

        let five = quote(&hour_input(5), &tariffs, entry() + Duration::hours(5)).unwrap();
        assert_eq!(five.cost.amount(), 15000);

        let seven = quote(&hour_input(5), &tariffs, entry() + Duration::hours(7)).unwrap();
        assert_eq!(seven.cost.amount(), 12000);
        assert_eq!(seven.hourly_rate.amount(), 3000);
    }

    #[test]
    fn test_minute_model_ignores_grace() {
        let config = PricingConfig::Minute {
            per_minute: Money::from_amount(50),
            cap: None,
        };
        assert_eq!(config.cost(65, 60).amount(), 3250);
    }

    #[test]
    fn test_blocks_model() {
        let mut t = tariff(TariffType::Hour, PricingModel::Blocks);
        t.base_price = 3000;
        t.base_time_minutes = 60;
        t.extra_frac_price = 1000;
        t.extra_frac_time_minutes = 30;
        let tariffs = TariffSet::new(VehicleType::Car, vec![t]);

        let q = quote(&hour_input(5), &tariffs, entry() + Duration::minutes(90)).unwrap();
        assert_eq!(q.cost.amount(), 4000);

        let q = quote(&hour_input(5), &tariffs, entry() + Duration::minutes(91)).unwrap();
        assert_eq!(q.cost.amount(), 5000);

        let q = quote(&hour_input(5), &tariffs, entry() + Duration::minutes(20)).unwrap();
        assert_eq!(q.cost.amount(), 3000);
    }

    #[test]
    fn test_blocks_requires_extra_block_size() {
        let mut t = tariff(TariffType::Hour, PricingModel::Blocks);
        t.base_price = 3000;
        t.extra_frac_price = 1000;
        t.extra_frac_time_minutes = 0;
        let err = PricingConfig::from_tariff(&t).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTariff { .. }));
    }

    #[test]
    fn test_extreme_rates_saturate() {
        let config = PricingConfig::Traditional {
            hour_rate: Money::from_amount(i64::MAX / 2),
            cap: None,
        };
        assert_eq!(config.cost(600, 0).amount(), i64::MAX);

        let config = PricingConfig::Minute {
            per_minute: Money::from_amount(i64::MAX / 100),
            cap: None,
        };
        assert_eq!(config.hourly_rate().amount(), i64::MAX);
    }

    #[test]
    fn test_day_plan() {
        let tariffs = TariffSet::new(VehicleType::Motorcycle, Vec::new());
        let input = PlanQuoteInput {
            entry_time: entry(),
            plan_type: PlanType::Day,
            grace_period_minutes: 5,
        };

        let one = quote(&input, &tariffs, entry() + Duration::hours(3)).unwrap();
        assert_eq!(one.cost.amount(), 8000);

        let two = quote(&input, &tariffs, entry() + Duration::minutes(1441)).unwrap();
        assert_eq!(two.cost.amount(), 16000);
    }

    #[test]
    fn test_hour_tariff_preferred_over_minute() {
        let mut hour = tariff(TariffType::Hour, PricingModel::Traditional);
        hour.base_price = 4000;
        let mut minute = tariff(TariffType::Minute, PricingModel::Minute);
        minute.base_price = 10;
        let tariffs = TariffSet::new(VehicleType::Car, vec![minute, hour]);

        let config = PricingConfig::for_hour_plan(&tariffs).unwrap();
        assert!(matches!(config, PricingConfig::Traditional { .. }));
        assert_eq!(config.hourly_rate().amount(), 4000);
    }
}
