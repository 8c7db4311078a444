//! Coupon pricing
//!
//! Effective discount percentages and the formatted price strings shown to users.

use rust_decimal::Decimal;

use crate::coupons::Coupon;

/// Where an effective discount was derived from, in order of precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountSource {
    /// Loyalty points multiplier (`0.5 * m` percent)
    LoyaltyMultiplier,

    /// Ratio of price to compare price
    ComparePrice,

    /// Pre-computed percentage from the source
    Static,
}

/// An effective discount in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    /// Discount in percent (e.g. `39` for 39% off)
    pub percent: Decimal,

    /// Source of the figure
    pub source: DiscountSource,
}

impl Discount {
    /// Format as `-39%`, or with one decimal (`-2,5%`) for multiplier discounts.
    pub fn formatted(&self) -> String {
        let decimals = match self.source {
            DiscountSource::LoyaltyMultiplier => 1,
            DiscountSource::ComparePrice | DiscountSource::Static => 0,
        };

        format!("-{}%", decimal_comma(self.percent, decimals))
    }
}

impl Coupon {
    /// Effective discount with strict precedence: loyalty multiplier, compare
    /// price ratio, static percentage.
    pub fn discount(&self) -> Option<Discount> {
        if let Some(multiplicator) = self.payback_multiplicator {
            return Some(Discount {
                percent: Decimal::new(5, 1) * Decimal::from(multiplicator),
                source: DiscountSource::LoyaltyMultiplier,
            });
        }

        if let Some(percent) = self.compare_price_percent() {
            return Some(Discount {
                percent,
                source: DiscountSource::ComparePrice,
            });
        }

        self.static_reduced_percent.map(|percent| Discount {
            percent,
            source: DiscountSource::Static,
        })
    }

    /// Effective discount in percent.
    pub fn discount_percent(&self) -> Option<Decimal> {
        self.discount().map(|discount| discount.percent)
    }

    /// Formatted effective discount, e.g. `-39%`.
    pub fn discount_formatted(&self) -> Option<String> {
        self.discount().map(|discount| discount.formatted())
    }

    /// Formatted price, e.g. `2,99€`.
    pub fn price_formatted(&self) -> Option<String> {
        self.price.map(format_price)
    }

    /// Formatted compare price.
    pub fn price_compare_formatted(&self) -> Option<String> {
        self.price_compare.map(format_price)
    }

    /// Price when known, otherwise the discount.
    pub fn price_or_discount_formatted(&self) -> Option<String> {
        self.price_formatted().or_else(|| self.discount_formatted())
    }

    fn compare_price_percent(&self) -> Option<Decimal> {
        let price = Decimal::from(self.price?);
        let compare = Decimal::from(self.price_compare?);

        let ratio = price.checked_div(compare)?;

        (Decimal::ONE - ratio).checked_mul(Decimal::ONE_HUNDRED)
    }
}

/// Format minor units as `2,99€`.
pub fn format_price(minor_units: i64) -> String {
    format!("{}€", decimal_comma(Decimal::new(minor_units, 2), 2))
}

/// Sum of all known prices in minor units.
pub fn total_price<'a>(coupons: impl IntoIterator<Item = &'a Coupon>) -> i64 {
    coupons
        .into_iter()
        .filter_map(|coupon| coupon.price)
        .fold(0i64, i64::saturating_add)
}

fn decimal_comma(value: Decimal, decimals: u32) -> String {
    let mut rounded = value.round_dp(decimals);
    rounded.rescale(decimals);

    rounded.to_string().replace('.', ",")
}
