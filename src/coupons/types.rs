//! Coupon Types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unknown coupon type code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown coupon type code: {0}")]
pub struct CouponTypeError(pub u8);

/// Source/category of a coupon.
///
/// The numeric codes are persisted by callers and define the group order of
/// [`SortMode::TypeMenuPrice`](crate::sorting::SortMode::TypeMenuPrice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum CouponType {
    /// Coupon offered through the mobile app API
    App = 0,

    /// Printed paper coupon
    Paper = 3,

    /// Paper coupon whose validity could not be confirmed
    PaperUnsafe = 4,

    /// Only redeemable when ordering online
    OnlineOnly = 5,

    /// Special/limited campaign coupon
    Special = 7,

    /// Loyalty-card offer (points multiplier, no product)
    Payback = 8,
}

impl CouponType {
    /// All types in ascending code order.
    pub const ALL: [CouponType; 6] = [
        CouponType::App,
        CouponType::Paper,
        CouponType::PaperUnsafe,
        CouponType::OnlineOnly,
        CouponType::Special,
        CouponType::Payback,
    ];

    /// Stable numeric code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::App => "App",
            Self::Paper => "Paper",
            Self::PaperUnsafe => "Paper (unsafe)",
            Self::OnlineOnly => "Online only",
            Self::Special => "Special",
            Self::Payback => "Payback",
        }
    }

    /// Discount-only types describe a bonus rather than a product.
    pub const fn is_discount_only(self) -> bool {
        matches!(self, Self::Payback)
    }

    /// Whether coupons of this type take part in title based duplicate collapsing.
    pub const fn is_dedup_eligible(self) -> bool {
        !self.is_discount_only()
    }
}

impl TryFrom<u8> for CouponType {
    type Error = CouponTypeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|coupon_type| coupon_type.code() == code)
            .ok_or(CouponTypeError(code))
    }
}

impl From<CouponType> for u8 {
    fn from(coupon_type: CouponType) -> Self {
        coupon_type.code()
    }
}

impl fmt::Display for CouponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of coupon types, usable in `const` filter definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CouponTypeSet {
    bits: u16,
}

impl CouponTypeSet {
    /// The empty set; nothing passes a filter restricted to it.
    pub const EMPTY: Self = Self { bits: 0 };

    /// Product coupon types shown to bot users.
    pub const BOT_ALLOWED: Self = Self::of(&[
        CouponType::App,
        CouponType::Paper,
        CouponType::PaperUnsafe,
        CouponType::OnlineOnly,
        CouponType::Special,
    ]);

    /// Build a set from a slice of types.
    pub const fn of(types: &[CouponType]) -> Self {
        let mut bits = 0u16;
        let mut remaining = types;

        while let [first, rest @ ..] = remaining {
            bits |= 1 << first.code();
            remaining = rest;
        }

        Self { bits }
    }

    /// Check membership.
    pub const fn contains(self, coupon_type: CouponType) -> bool {
        self.bits & (1 << coupon_type.code()) != 0
    }

    /// Add a type.
    pub fn insert(&mut self, coupon_type: CouponType) {
        self.bits |= 1 << coupon_type.code();
    }

    /// Check whether the set is empty.
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Iterate members in ascending code order.
    pub fn iter(self) -> impl Iterator<Item = CouponType> {
        CouponType::ALL
            .into_iter()
            .filter(move |coupon_type| self.contains(*coupon_type))
    }
}

impl FromIterator<CouponType> for CouponTypeSet {
    fn from_iter<I: IntoIterator<Item = CouponType>>(iter: I) -> Self {
        let mut set = Self::EMPTY;

        for coupon_type in iter {
            set.insert(coupon_type);
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_u8() {
        for coupon_type in CouponType::ALL {
            assert_eq!(CouponType::try_from(coupon_type.code()), Ok(coupon_type));
        }

        assert_eq!(CouponType::try_from(1), Err(CouponTypeError(1)));
    }

    #[test]
    fn payback_is_not_dedup_eligible() {
        assert!(!CouponType::Payback.is_dedup_eligible());
        assert!(CouponType::App.is_dedup_eligible());
        assert!(CouponType::Paper.is_dedup_eligible());
    }

    #[test]
    fn type_set_membership() {
        let set = CouponTypeSet::of(&[CouponType::App, CouponType::Payback]);

        assert!(set.contains(CouponType::App));
        assert!(set.contains(CouponType::Payback));
        assert!(!set.contains(CouponType::Paper));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![CouponType::App, CouponType::Payback]
        );
    }

    #[test]
    fn bot_allowed_excludes_loyalty_offers() {
        assert!(CouponTypeSet::BOT_ALLOWED.contains(CouponType::Paper));
        assert!(!CouponTypeSet::BOT_ALLOWED.contains(CouponType::Payback));
    }

    #[test]
    fn empty_set_contains_nothing() {
        assert!(CouponTypeSet::EMPTY.is_empty());
        assert!(
            CouponType::ALL
                .into_iter()
                .all(|coupon_type| !CouponTypeSet::EMPTY.contains(coupon_type))
        );
    }

    #[test]
    fn serde_uses_numeric_codes() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&CouponType::Paper)?, "3");
        assert_eq!(serde_json::from_str::<CouponType>("8")?, CouponType::Payback);
        assert!(serde_json::from_str::<CouponType>("2").is_err());

        Ok(())
    }
}
