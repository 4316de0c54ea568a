//! Coupon Model
//!
//! Coupons are rows of the remote `offers` collection. Validity windows
//! are end-exclusive: a coupon is expired only when "now" is strictly
//! after `end_date`.

use crate::serde_util::{f64_from_decimal, opt_f64_from_decimal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discount type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Flat,
}

/// Validity of a coupon at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponValidity {
    Valid,
    NotYetActive,
    Expired,
}

/// Coupon entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub coupon_code: String,
    #[serde(default)]
    pub title: Option<String>,
    pub discount_type: DiscountType,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub discount_value: f64,
    /// Cap on the computed discount (percentage type only)
    #[serde(default, deserialize_with = "opt_f64_from_decimal")]
    pub max_discount: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_from_decimal")]
    pub min_order_value: Option<f64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
}

impl Coupon {
    /// Check the validity window against `now`.
    pub fn validity(&self, now: DateTime<Utc>) -> CouponValidity {
        if let Some(start) = self.start_date {
            if now < start {
                return CouponValidity::NotYetActive;
            }
        }
        if let Some(end) = self.end_date {
            if now > end {
                return CouponValidity::Expired;
            }
        }
        CouponValidity::Valid
    }

    /// Discount amount for a given subtotal.
    ///
    /// Percentage coupons are clamped to `max_discount` when present. Flat
    /// coupons return their face value, not clamped to the subtotal; the
    /// cart total computation floors at zero.
    pub fn discount_for(&self, subtotal: f64) -> f64 {
        match self.discount_type {
            DiscountType::Percentage => {
                let mut amount = subtotal * self.discount_value / 100.0;
                if let Some(max) = self.max_discount {
                    if amount > max {
                        amount = max;
                    }
                }
                amount
            }
            DiscountType::Flat => self.discount_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn coupon(kind: DiscountType, value: f64, max: Option<f64>) -> Coupon {
        Coupon {
            id: "c1".into(),
            coupon_code: "SAVE10".into(),
            title: None,
            discount_type: kind,
            discount_value: value,
            max_discount: max,
            min_order_value: None,
            start_date: None,
            end_date: None,
            is_active: true,
            display_order: 0,
        }
    }

    #[test]
    fn percentage_discount_clamped_to_cap() {
        let c = coupon(DiscountType::Percentage, 10.0, Some(50.0));
        assert_eq!(c.discount_for(1000.0), 50.0);
        assert_eq!(c.discount_for(300.0), 30.0);
    }

    #[test]
    fn flat_discount_is_face_value() {
        let c = coupon(DiscountType::Flat, 75.0, None);
        assert_eq!(c.discount_for(1000.0), 75.0);
        // Not clamped to subtotal; the total computation floors at zero.
        assert_eq!(c.discount_for(50.0), 75.0);
    }

    #[test]
    fn validity_window_is_end_exclusive() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let mut c = coupon(DiscountType::Flat, 10.0, None);
        c.start_date = Some(start);
        c.end_date = Some(end);

        let before = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(c.validity(before), CouponValidity::NotYetActive);
        assert_eq!(c.validity(start), CouponValidity::Valid);
        // Exactly at end_date the coupon is still usable.
        assert_eq!(c.validity(end), CouponValidity::Valid);
        let after = end + chrono::Duration::seconds(1);
        assert_eq!(c.validity(after), CouponValidity::Expired);
    }

    #[test]
    fn open_window_is_always_valid() {
        let c = coupon(DiscountType::Percentage, 5.0, None);
        assert_eq!(c.validity(Utc::now()), CouponValidity::Valid);
    }
}
