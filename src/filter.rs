//! Coupon filters
//!
//! A [`CouponFilter`] is a conjunction of optional predicates. `None` leaves a
//! property unconstrained; `Some(b)` requires the derived property to equal `b`.
//! The one exception is `active_only`, which only constrains when `Some(true)`.

use std::collections::BTreeMap;

use crate::{
    coupons::{Coupon, CouponType, CouponTypeSet},
    dedup::remove_duplicates,
    sorting::SortMode,
    time::PointInTime,
};

/// Declarative coupon filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponFilter {
    /// Only valid coupons (neither expired nor upcoming)
    pub active_only: Option<bool>,

    /// Upcoming coupons
    pub not_yet_active: Option<bool>,

    /// Menus with fries and a drink
    pub contains_fries_and_drink: Option<bool>,

    /// Collapse duplicate offers for the same product
    pub remove_duplicates: bool,

    /// Allowed types; `None` allows all, an empty set allows none
    pub allowed_types: Option<CouponTypeSet>,

    /// New coupons
    pub is_new: Option<bool>,

    /// Hidden/upsell coupons
    pub is_hidden: Option<bool>,

    /// Vegetarian coupons
    pub is_veggie: Option<bool>,

    /// Plant-based coupons
    pub is_plant_based: Option<bool>,

    /// Food coupons
    pub is_eatable: Option<bool>,

    /// Ordering applied by [`CouponFilter::apply_sorted`]
    pub sort_mode: SortMode,
}

impl CouponFilter {
    /// Active coupons of all types, sorted by price.
    pub const DEFAULT: Self = Self {
        active_only: Some(true),
        not_yet_active: None,
        contains_fries_and_drink: None,
        remove_duplicates: false,
        allowed_types: None,
        is_new: None,
        is_hidden: None,
        is_veggie: None,
        is_plant_based: None,
        is_eatable: None,
        sort_mode: SortMode::Price,
    };

    /// Whether a single coupon passes every predicate.
    pub fn matches(&self, coupon: &Coupon, at: &PointInTime) -> bool {
        if self.active_only == Some(true) && !coupon.is_valid(at) {
            return false;
        }

        if self
            .allowed_types
            .is_some_and(|types| !types.contains(coupon.coupon_type))
        {
            return false;
        }

        let checks: [(Option<bool>, &dyn Fn() -> bool); 7] = [
            (self.not_yet_active, &|| coupon.is_not_yet_active(at)),
            (self.contains_fries_and_drink, &|| coupon.contains_fries_and_drink()),
            (self.is_new, &|| coupon.is_new(at)),
            (self.is_hidden, &|| coupon.is_hidden),
            (self.is_veggie, &|| coupon.is_veggie()),
            (self.is_plant_based, &|| coupon.is_plant_based()),
            (self.is_eatable, &|| coupon.is_eatable()),
        ];

        checks
            .iter()
            .all(|(wanted, actual)| wanted.is_none_or(|wanted| wanted == actual()))
    }

    /// Apply predicates, then dedup if requested. Input order is preserved.
    pub fn apply<'a>(
        &self,
        coupons: impl IntoIterator<Item = &'a Coupon>,
        at: &PointInTime,
    ) -> Vec<&'a Coupon> {
        let mut matching: Vec<&'a Coupon> = coupons
            .into_iter()
            .filter(|coupon| self.matches(coupon, at))
            .collect();

        if self.remove_duplicates {
            let winners = remove_duplicates(matching.iter().copied());

            matching.retain(|coupon| {
                winners
                    .get(coupon.id.as_str())
                    .is_some_and(|winner| std::ptr::eq(*winner, *coupon))
            });
        }

        matching
    }

    /// [`CouponFilter::apply`] followed by this filter's sort mode.
    pub fn apply_sorted<'a>(
        &self,
        coupons: impl IntoIterator<Item = &'a Coupon>,
        at: &PointInTime,
    ) -> Vec<&'a Coupon> {
        self.apply_sorted_by(coupons, self.sort_mode, at)
    }

    /// [`CouponFilter::apply`] followed by an explicit sort mode.
    pub fn apply_sorted_by<'a>(
        &self,
        coupons: impl IntoIterator<Item = &'a Coupon>,
        sort_mode: SortMode,
        at: &PointInTime,
    ) -> Vec<&'a Coupon> {
        let mut filtered = self.apply(coupons, at);
        sort_mode.sort(&mut filtered, at);
        filtered
    }
}

impl Default for CouponFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Split coupons by type, keeping their relative order.
pub fn partition_by_type<'a>(
    coupons: impl IntoIterator<Item = &'a Coupon>,
) -> BTreeMap<CouponType, Vec<&'a Coupon>> {
    let mut partitions: BTreeMap<CouponType, Vec<&'a Coupon>> = BTreeMap::new();

    for coupon in coupons {
        partitions.entry(coupon.coupon_type).or_default().push(coupon);
    }

    partitions
}
