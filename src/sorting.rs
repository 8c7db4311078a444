//! Sort modes
//!
//! Sort modes are identified by their position in [`SortMode::ALL`]. Users
//! store that position as their preference, so the list only ever grows at the
//! end. Every mode is a stable sort: ties keep their input order.

use std::{borrow::Borrow, cmp::Reverse, fmt};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{coupons::Coupon, time::PointInTime};

/// Unknown sort code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown sort code {0}")]
pub struct SortModeError(pub u8);

/// Named coupon orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SortMode {
    /// Price ascending; unpriced first
    Price,

    /// Price descending; unpriced last
    PriceDescending,

    /// Discount ascending; no discount counts as zero
    Discount,

    /// Discount descending
    DiscountDescending,

    /// Non-new before new
    New,

    /// New before non-new
    NewDescending,

    /// Single products before menus, each by price
    MenuPrice,

    /// Grouped by coupon type code, then as [`SortMode::MenuPrice`]
    TypeMenuPrice,
}

impl SortMode {
    /// All sort modes in sort code order.
    pub const ALL: [SortMode; 8] = [
        SortMode::Price,
        SortMode::PriceDescending,
        SortMode::Discount,
        SortMode::DiscountDescending,
        SortMode::New,
        SortMode::NewDescending,
        SortMode::MenuPrice,
        SortMode::TypeMenuPrice,
    ];

    /// Stable sort code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a sort mode by code.
    ///
    /// # Errors
    ///
    /// Returns [`SortModeError`] for codes outside [`SortMode::ALL`].
    pub fn try_from_code(code: u8) -> Result<Self, SortModeError> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(SortModeError(code))
    }

    /// Look up a sort mode by code, falling back to the first mode.
    pub fn from_code(code: u8) -> Self {
        Self::try_from_code(code).unwrap_or_else(|err| {
            warn!(%err, fallback = %Self::Price, "falling back to default sort mode");
            Self::Price
        })
    }

    /// The following mode, wrapping around after the last one.
    pub fn next(self) -> Self {
        let next = (usize::from(self.code()) + 1) % Self::ALL.len();

        Self::ALL.get(next).copied().unwrap_or(Self::Price)
    }

    /// Upper-case identifier.
    pub fn name(self) -> &'static str {
        match self {
            SortMode::Price => "PRICE",
            SortMode::PriceDescending => "PRICE_DESCENDING",
            SortMode::Discount => "DISCOUNT",
            SortMode::DiscountDescending => "DISCOUNT_DESCENDING",
            SortMode::New => "NEW",
            SortMode::NewDescending => "NEW_DESCENDING",
            SortMode::MenuPrice => "MENU_PRICE",
            SortMode::TypeMenuPrice => "TYPE_MENU_PRICE",
        }
    }

    /// Human readable label for sort toggles.
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Price => "Price ⬆",
            SortMode::PriceDescending => "Price ⬇",
            SortMode::Discount => "Discount ⬆",
            SortMode::DiscountDescending => "Discount ⬇",
            SortMode::New => "New ⬇",
            SortMode::NewDescending => "New ⬆",
            SortMode::MenuPrice => "Menu/Price",
            SortMode::TypeMenuPrice => "Type/Menu/Price",
        }
    }

    /// Sort `coupons` in place.
    pub fn sort<C: Borrow<Coupon>>(self, coupons: &mut [C], at: &PointInTime) {
        match self {
            SortMode::Price => coupons.sort_by_key(|c| c.borrow().price),
            SortMode::PriceDescending => coupons.sort_by_key(|c| Reverse(c.borrow().price)),
            SortMode::Discount => coupons.sort_by_cached_key(|c| discount(c.borrow())),
            SortMode::DiscountDescending => {
                coupons.sort_by_cached_key(|c| Reverse(discount(c.borrow())));
            }
            SortMode::New => coupons.sort_by_cached_key(|c| c.borrow().is_new(at)),
            SortMode::NewDescending => {
                coupons.sort_by_cached_key(|c| Reverse(c.borrow().is_new(at)));
            }
            SortMode::MenuPrice => coupons.sort_by_cached_key(|c| {
                let coupon = c.borrow();
                (coupon.contains_fries_and_drink(), coupon.price)
            }),
            SortMode::TypeMenuPrice => coupons.sort_by_cached_key(|c| {
                let coupon = c.borrow();
                (
                    coupon.coupon_type.code(),
                    coupon.contains_fries_and_drink(),
                    coupon.price,
                )
            }),
        }
    }
}

impl TryFrom<u8> for SortMode {
    type Error = SortModeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::try_from_code(code)
    }
}

impl From<SortMode> for u8 {
    fn from(mode: SortMode) -> Self {
        mode.code()
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn discount(coupon: &Coupon) -> Decimal {
    coupon.discount_percent().unwrap_or(Decimal::ZERO)
}
