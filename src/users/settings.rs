//! User settings

use serde::{Deserialize, Serialize};

use crate::{
    coupons::text::Highlights,
    filter::CouponFilter,
    views::{CouponView, ViewKind},
};

/// Per-user toggles. Unknown keys in stored documents are ignored and missing
/// keys take their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent user-facing on/off settings"
)]
pub struct UserSettings {
    /// Show the hidden app coupons category
    pub display_coupon_category_app_coupons_hidden: bool,

    /// Show the veggie category
    pub display_coupon_category_veggie: bool,

    /// Show the loyalty card category
    pub display_coupon_category_payback: bool,

    /// Show the sort toggle button
    pub display_coupon_sort_button: bool,

    /// Include plant-based coupons in generic categories
    pub display_plant_based_coupons_within_generic_categories: bool,

    /// Include hidden upsell app coupons in generic categories
    pub display_hidden_upselling_app_coupons_within_generic_categories: bool,

    /// Collapse duplicate offers for the same product
    pub hide_duplicates: bool,

    /// Notify when expired favourites become available again
    pub notify_when_favorites_are_back: bool,

    /// Notify when new coupons are available
    pub notify_when_new_coupons_are_available: bool,

    /// Prefix favourites with a symbol
    pub highlight_favorite_coupons_in_button_texts: bool,

    /// Prefix new coupons with a symbol
    pub highlight_new_coupons_in_coupon_button_texts: bool,

    /// Prefix veggie coupons with a symbol
    pub highlight_veggie_coupons_in_coupon_button_texts: bool,

    /// Prefix chili cheese coupons with a symbol
    pub highlight_chili_cheese_coupons_in_coupon_button_texts: bool,

    /// Send QR codes with coupon details
    #[serde(rename = "displayQR")]
    pub display_qr: bool,

    /// Drop favourites once they are no longer available
    pub auto_delete_expired_favorites: bool,
}

impl UserSettings {
    /// Settings of a fresh user.
    pub const DEFAULT: Self = Self {
        display_coupon_category_app_coupons_hidden: true,
        display_coupon_category_veggie: true,
        display_coupon_category_payback: true,
        display_coupon_sort_button: true,
        display_plant_based_coupons_within_generic_categories: true,
        display_hidden_upselling_app_coupons_within_generic_categories: true,
        hide_duplicates: false,
        notify_when_favorites_are_back: false,
        notify_when_new_coupons_are_available: false,
        highlight_favorite_coupons_in_button_texts: true,
        highlight_new_coupons_in_coupon_button_texts: true,
        highlight_veggie_coupons_in_coupon_button_texts: true,
        highlight_chili_cheese_coupons_in_coupon_button_texts: true,
        display_qr: true,
        auto_delete_expired_favorites: false,
    };

    /// Highlight symbols to use when rendering `view`.
    pub fn highlights(&self, view: &CouponView) -> Highlights {
        Highlights {
            favorite: view.highlight_favorites && self.highlight_favorite_coupons_in_button_texts,
            new: self.highlight_new_coupons_in_coupon_button_texts,
            veggie: view.include_veggie_symbol
                && self.highlight_veggie_coupons_in_coupon_button_texts,
            chili_cheese: self.highlight_chili_cheese_coupons_in_coupon_button_texts,
        }
    }

    /// The view's filter adjusted to these settings, where the view allows it.
    pub fn filter_for(&self, view: &CouponView) -> CouponFilter {
        let mut filter = view.filter;

        if !view.allow_modify_filter {
            return filter;
        }

        if self.hide_duplicates {
            filter.remove_duplicates = true;
        }

        if is_generic(view.kind) {
            if !self.display_plant_based_coupons_within_generic_categories
                && filter.is_plant_based.is_none()
            {
                filter.is_plant_based = Some(false);
            }

            if !self.display_hidden_upselling_app_coupons_within_generic_categories
                && filter.is_hidden.is_none()
            {
                filter.is_hidden = Some(false);
            }
        }

        filter
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn is_generic(kind: ViewKind) -> bool {
    matches!(
        kind,
        ViewKind::All
            | ViewKind::AllWithoutMenu
            | ViewKind::Category
            | ViewKind::CategoryWithoutMenu
            | ViewKind::New
    )
}
