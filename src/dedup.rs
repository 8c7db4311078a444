//! Product deduplication
//!
//! Several sources can offer the same product at different prices. Coupons are
//! grouped by [`Coupon::normalized_title`] and each group collapses onto one
//! representative. Types excluded from dedup (loyalty bonuses) always pass.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::coupons::{Coupon, CouponType};

/// Collapse duplicate offers for the same product.
///
/// Pure and idempotent: applying it to its own output changes nothing.
pub fn remove_duplicates<'a>(
    coupons: impl IntoIterator<Item = &'a Coupon>,
) -> BTreeMap<&'a str, &'a Coupon> {
    let mut result = BTreeMap::new();
    let mut groups: FxHashMap<String, Vec<&'a Coupon>> = FxHashMap::default();
    let mut order = Vec::new();

    for coupon in coupons {
        if !coupon.coupon_type.is_dedup_eligible() {
            result.insert(coupon.id.as_str(), coupon);
            continue;
        }

        let key = coupon.normalized_title();

        groups
            .entry(key)
            .or_insert_with_key(|key| {
                order.push(key.clone());
                Vec::new()
            })
            .push(coupon);
    }

    for key in &order {
        let Some(members) = groups.get(key) else {
            continue;
        };

        if let Some(winner) = representative(members) {
            if members.len() > 1 {
                debug!(
                    title = %key,
                    kept = %winner.id,
                    dropped = members.len() - 1,
                    "collapsed duplicate coupons"
                );
            }

            result.insert(winner.id.as_str(), winner);
        }
    }

    result
}

/// Pick the representative of one title group, in encounter order.
fn representative<'a>(members: &[&'a Coupon]) -> Option<&'a Coupon> {
    if let [single] = members {
        return Some(*single);
    }

    let mut prices = members.iter().filter_map(|coupon| coupon.price);
    let first_price = prices.next();
    let prices_agree = prices.all(|price| Some(price) == first_price);

    if prices_agree {
        return members
            .iter()
            .find(|coupon| coupon.coupon_type == CouponType::App)
            .or_else(|| members.first())
            .copied();
    }

    // Unpriced members rank after every priced one.
    members
        .iter()
        .copied()
        .min_by_key(|coupon| (coupon.price.is_none(), coupon.price))
}
