//! # Tariff Resolution
//!
//! Indexes the tariffs configured for one vehicle type at one location by
//! [`TariffType`], and supplies the hardcoded fallback rates when a location
//! has not configured a tariff.
//!
//! ## Fallback Table
//! ```text
//! ┌──────────────┬────────┬────────┐
//! │ vehicle      │  HOUR  │  DAY   │
//! ├──────────────┼────────┼────────┤
//! │ CAR          │  3000  │ 15000  │
//! │ MOTORCYCLE   │  2000  │  8000  │
//! │ OTHER        │  3000  │ 15000  │  (priced as CAR)
//! └──────────────┴────────┴────────┘
//! ```
//!
//! A missing tariff is not an error: pricing degrades to these rates.

use std::collections::HashMap;

use crate::money::Money;
use crate::types::{Tariff, TariffType, VehicleType};

/// Fallback HOUR rate for a vehicle type.
pub const fn fallback_hour_rate(vehicle_type: VehicleType) -> Money {
    match vehicle_type {
        VehicleType::Motorcycle => Money::from_amount(2000),
        VehicleType::Car | VehicleType::Other => Money::from_amount(3000),
    }
}

/// Fallback DAY rate for a vehicle type.
pub const fn fallback_day_rate(vehicle_type: VehicleType) -> Money {
    match vehicle_type {
        VehicleType::Motorcycle => Money::from_amount(8000),
        VehicleType::Car | VehicleType::Other => Money::from_amount(15000),
    }
}

/// All tariffs for one vehicle type at one location, keyed by tariff type.
#[derive(Debug, Clone)]
pub struct TariffSet {
    vehicle_type: VehicleType,
    by_type: HashMap<TariffType, Tariff>,
}

impl TariffSet {
    /// Builds the set. Rows for other vehicle types are ignored.
    pub fn new(vehicle_type: VehicleType, tariffs: Vec<Tariff>) -> Self {
        let by_type = tariffs
            .into_iter()
            .filter(|t| t.vehicle_type == vehicle_type)
            .map(|t| (t.tariff_type, t))
            .collect();
        Self {
            vehicle_type,
            by_type,
        }
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    pub fn get(&self, tariff_type: TariffType) -> Option<&Tariff> {
        self.by_type.get(&tariff_type)
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// HOUR tariff base price, or the fallback.
    pub fn hour_rate(&self) -> Money {
        self.get(TariffType::Hour)
            .map(Tariff::base_price_money)
            .unwrap_or_else(|| fallback_hour_rate(self.vehicle_type))
    }

    /// DAY tariff base price, or the fallback.
    pub fn day_rate(&self) -> Money {
        self.get(TariffType::Day)
            .map(Tariff::base_price_money)
            .unwrap_or_else(|| fallback_day_rate(self.vehicle_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricingModel;
    use chrono::Utc;

    fn tariff(vehicle: VehicleType, kind: TariffType, base_price: i64) -> Tariff {
        let now = Utc::now();
        Tariff {
            id: format!("{:?}-{:?}", vehicle, kind),
            tenant_id: "t-1".to_string(),
            location_id: "loc-1".to_string(),
            vehicle_type: vehicle,
            tariff_type: kind,
            pricing_model: PricingModel::Traditional,
            base_price,
            base_time_minutes: 60,
            extra_frac_price: 0,
            extra_frac_time_minutes: 0,
            day_max_price: None,
            day_min_hours: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_fallbacks_when_empty() {
        let car = TariffSet::new(VehicleType::Car, Vec::new());
        assert!(car.is_empty());
        assert_eq!(car.hour_rate().amount(), 3000);
        assert_eq!(car.day_rate().amount(), 15000);

        let moto = TariffSet::new(VehicleType::Motorcycle, Vec::new());
        assert_eq!(moto.hour_rate().amount(), 2000);
        assert_eq!(moto.day_rate().amount(), 8000);

        let other = TariffSet::new(VehicleType::Other, Vec::new());
        assert_eq!(other.hour_rate().amount(), 3000);
    }

    #[test]
    fn test_configured_rates_override_fallback() {
        let set = TariffSet::new(
            VehicleType::Car,
            vec![
                tariff(VehicleType::Car, TariffType::Hour, 3500),
                tariff(VehicleType::Car, TariffType::Day, 20000),
                tariff(VehicleType::Motorcycle, TariffType::Hour, 1000),
            ],
        );
        assert_eq!(set.hour_rate().amount(), 3500);
        assert_eq!(set.day_rate().amount(), 20000);
        assert!(set.get(TariffType::Night).is_none());
    }

    #[test]
    fn test_other_vehicle_rows_ignored() {
        let set = TariffSet::new(
            VehicleType::Motorcycle,
            vec![tariff(VehicleType::Car, TariffType::Hour, 9999)],
        );
        assert!(set.is_empty());
        assert_eq!(set.hour_rate().amount(), 2000);
    }
}
