//! Product classification
//!
//! Heuristics over source tags and titles. Sources are known to mis-tag
//! products, so the order of checks in [`Coupon::diet`] matters: tags are
//! consulted before the title, and at each level meat beats plant-based and
//! veggie markers.

use crate::coupons::Coupon;

/// Tag substrings marking meat or fish.
const MEAT_TAGS: &[&str] = &[
    "beef", "chicken", "pork", "bacon", "fish", "meat", "rind", "hähnchen", "schwein",
];

/// Tag substrings marking plant-based products.
const PLANT_BASED_TAGS: &[&str] = &["plant", "vegan"];

/// Tag substrings marking vegetarian products.
const VEGGIE_TAGS: &[&str] = &["veggie", "vegetar"];

/// Title keywords marking meat or fish.
const MEAT_KEYWORDS: &[&str] = &[
    "chicken",
    "beef",
    "bacon",
    "nuggets",
    "wings",
    "fish",
    "fisch",
    "rind",
    "hähnchen",
    "pulled pork",
    "steakhouse",
];

/// Title keywords marking plant-based products.
const PLANT_BASED_KEYWORDS: &[&str] = &["plant", "vegan", "rebel"];

/// Title keywords marking vegetarian products.
const VEGGIE_KEYWORDS: &[&str] = &["veggie", "vegetar", "fusion"];

/// Products without any marker that are vegetarian anyway.
const VEGGIE_TITLES: &[&str] = &[
    "sundae",
    "shake",
    "donut",
    "cookie",
    "muffin",
    "brownie",
    "onion rings",
    "mozzarella sticks",
];

const FRIES_KEYWORDS: &[&str] = &["pommes", "fries", "wedges"];

const DRINK_KEYWORDS: &[&str] = &[
    "cola",
    "coke",
    "fanta",
    "sprite",
    "mezzo mix",
    "getränk",
    "drink",
    "lipton",
];

const CHILI_CHEESE_KEYWORDS: &[&str] = &["chili cheese", "chili-cheese", "chilicheese"];

/// Diet classification of a coupon's products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diet {
    /// Contains meat or fish
    Meat,

    /// Vegetarian
    Veggie,

    /// Plant-based (implies vegetarian)
    PlantBased,
}

impl Coupon {
    /// Classify the products of this coupon, if any marker applies.
    pub fn diet(&self) -> Option<Diet> {
        if self.tags.mentions_any(MEAT_TAGS) {
            return Some(Diet::Meat);
        }

        if self.tags.mentions_any(PLANT_BASED_TAGS) {
            return Some(Diet::PlantBased);
        }

        if self.tags.mentions_any(VEGGIE_TAGS) {
            return Some(Diet::Veggie);
        }

        let title = self.title.to_lowercase();

        if contains_any(&title, MEAT_KEYWORDS) {
            Some(Diet::Meat)
        } else if contains_any(&title, PLANT_BASED_KEYWORDS) {
            Some(Diet::PlantBased)
        } else if contains_any(&title, VEGGIE_KEYWORDS) || contains_any(&title, VEGGIE_TITLES) {
            Some(Diet::Veggie)
        } else {
            None
        }
    }

    /// Contains meat or fish.
    pub fn contains_meat(&self) -> bool {
        self.diet() == Some(Diet::Meat)
    }

    /// Plant-based.
    pub fn is_plant_based(&self) -> bool {
        self.diet() == Some(Diet::PlantBased)
    }

    /// Vegetarian, including plant-based products.
    pub fn is_veggie(&self) -> bool {
        matches!(self.diet(), Some(Diet::Veggie | Diet::PlantBased))
    }

    /// Whether the coupon is for food at all (loyalty bonuses are not).
    pub fn is_eatable(&self) -> bool {
        !self.coupon_type.is_discount_only()
    }

    /// Whether the bundle contains both fries and a drink.
    pub fn contains_fries_and_drink(&self) -> bool {
        if let Some(flag) = self.contains_fries_and_drink {
            return flag;
        }

        let title = self.title.to_lowercase();

        contains_any(&title, FRIES_KEYWORDS) && contains_any(&title, DRINK_KEYWORDS)
    }

    /// Whether any product is a chili cheese variant.
    pub fn contains_chili_cheese(&self) -> bool {
        contains_any(&self.title.to_lowercase(), CHILI_CHEESE_KEYWORDS)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use crate::{coupons::CouponType, tags::CouponTags};

    use super::*;

    fn titled(title: &str) -> Coupon {
        Coupon::new("1", title, CouponType::App)
    }

    fn tagged(title: &str, tags: &[&str]) -> Coupon {
        Coupon {
            tags: CouponTags::from_strs(tags),
            ..titled(title)
        }
    }

    #[test]
    fn meat_tag_overrides_veggie_title() {
        let coupon = tagged("Veggie Burger", &["beef"]);

        assert!(!coupon.is_veggie());
        assert!(coupon.contains_meat());
    }

    #[test]
    fn plant_tag_implies_veggie() {
        let coupon = tagged("Long Chicken", &["PlantBased"]);

        assert!(coupon.is_plant_based());
        assert!(coupon.is_veggie());
        assert!(!coupon.contains_meat());
    }

    #[test]
    fn meat_keyword_beats_plant_keyword_in_title() {
        let coupon = titled("Plant-based Chicken Nuggets");

        assert!(coupon.contains_meat());
        assert!(!coupon.is_plant_based());
    }

    #[test]
    fn title_keywords_when_tags_are_silent() {
        assert!(titled("Veggie Burger").is_veggie());
        assert!(!titled("Veggie Burger").is_plant_based());
        assert!(titled("Rebel Whopper").is_plant_based());
        assert!(titled("2x Crispy Chicken").contains_meat());
    }

    #[test]
    fn allow_list_forces_veggie() {
        assert!(titled("KitKat® Sundae").is_veggie());
        assert!(titled("Oreo Shake").is_veggie());
        assert_eq!(titled("Whopper").diet(), None);
    }

    #[test]
    fn fries_and_drink_detection() {
        assert!(titled("Whopper + Pommes + 0,4L Coca-Cola").contains_fries_and_drink());
        assert!(!titled("Whopper + Pommes").contains_fries_and_drink());

        let flagged = Coupon {
            contains_fries_and_drink: Some(true),
            ..titled("Menü")
        };

        assert!(flagged.contains_fries_and_drink());
    }

    #[test]
    fn chili_cheese_detection() {
        assert!(titled("6 Chili Cheese Nuggets").contains_chili_cheese());
        assert!(!titled("Cheeseburger").contains_chili_cheese());
    }

    #[test]
    fn payback_is_not_eatable() {
        let payback = Coupon::new("p", "10fach Punkte", CouponType::Payback);

        assert!(!payback.is_eatable());
        assert!(titled("Whopper").is_eatable());
    }
}
