//! Users
//!
//! Per-user state: settings, favourites, per-view sort preferences, the loyalty
//! card and activity bookkeeping. Favourites are stored as full coupon
//! snapshots so they can still be shown after the coupon left the catalog.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    catalog::CouponCatalog,
    coupons::Coupon,
    sorting::SortMode,
    time::PointInTime,
    views::{CouponView, ViewKind},
};

pub mod activity;
pub mod settings;

pub use activity::ActivityPolicy;
pub use settings::UserSettings;

/// A registered loyalty card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaybackCard {
    /// Card number as printed
    #[serde(rename = "paybackCardNumber")]
    pub number: String,

    /// When the card was added
    #[serde(rename = "addedDate")]
    pub added: Timestamp,
}

/// Stored user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Chat/user id
    pub id: String,

    /// Toggles
    #[serde(default)]
    pub settings: UserSettings,

    /// Favourite coupons by id, as they looked when added
    #[serde(default)]
    pub favorite_coupons: BTreeMap<String, Coupon>,

    /// Preferred sort code per view index
    #[serde(default)]
    pub coupon_view_sort_modes: BTreeMap<usize, u8>,

    /// Registered loyalty card
    #[serde(default)]
    pub payback_card: Option<PaybackCard>,

    /// Consecutive failed deliveries because the user blocked the bot
    #[serde(default)]
    pub bot_blocked_counter: u32,

    /// Last interaction with the bot
    #[serde(default)]
    pub timestamp_last_time_bot_used: Option<Timestamp>,

    /// Last successfully delivered notification
    #[serde(default)]
    pub timestamp_last_time_notification_sent_successfully: Option<Timestamp>,

    /// Deletion warnings sent since the last activity
    #[serde(default)]
    pub times_informed_about_upcoming_auto_account_deletion: u32,

    /// Last deletion warning
    #[serde(default)]
    pub timestamp_last_time_warned_about_upcoming_auto_account_deletion: Option<Timestamp>,
}

/// Favourites split by availability in the current catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesInfo<'a> {
    /// Valid catalog entries
    pub available: Vec<&'a Coupon>,

    /// Stored snapshots of favourites that are missing or no longer valid
    pub unavailable: Vec<&'a Coupon>,
}

impl FavoritesInfo<'_> {
    /// Whether the user has no favourites at all.
    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.unavailable.is_empty()
    }
}

impl User {
    /// Create a user with default settings.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            settings: UserSettings::DEFAULT,
            favorite_coupons: BTreeMap::new(),
            coupon_view_sort_modes: BTreeMap::new(),
            payback_card: None,
            bot_blocked_counter: 0,
            timestamp_last_time_bot_used: None,
            timestamp_last_time_notification_sent_successfully: None,
            times_informed_about_upcoming_auto_account_deletion: 0,
            timestamp_last_time_warned_about_upcoming_auto_account_deletion: None,
        }
    }

    /// Check if a coupon is a favourite.
    pub fn is_favorite(&self, coupon_id: &str) -> bool {
        self.favorite_coupons.contains_key(coupon_id)
    }

    /// Store a snapshot of `coupon` as favourite, replacing an older one.
    pub fn add_favorite(&mut self, coupon: &Coupon) {
        self.favorite_coupons
            .insert(coupon.id.clone(), coupon.clone());
    }

    /// Remove a favourite. Returns whether it existed.
    pub fn remove_favorite(&mut self, coupon_id: &str) -> bool {
        self.favorite_coupons.remove(coupon_id).is_some()
    }

    /// Split favourites into available and unavailable ones, optionally sorted
    /// with the favourites view's sort mode.
    pub fn favorites_info<'a>(
        &'a self,
        catalog: &'a CouponCatalog,
        at: &PointInTime,
        sorted: bool,
    ) -> FavoritesInfo<'a> {
        let mut info = FavoritesInfo::default();

        for (id, snapshot) in &self.favorite_coupons {
            match catalog.get(id) {
                Some(current) if current.is_valid(at) => info.available.push(current),
                _ => info.unavailable.push(snapshot),
            }
        }

        if sorted {
            let sort_mode = ViewKind::Favorites.view().default_sort_mode();

            sort_mode.sort(&mut info.available, at);
            sort_mode.sort(&mut info.unavailable, at);
        }

        info
    }

    /// Remove favourites that are no longer available, if the user asked for it.
    ///
    /// Returns the removed ids.
    pub fn delete_unavailable_favorites(
        &mut self,
        catalog: &CouponCatalog,
        at: &PointInTime,
    ) -> Vec<String> {
        if !self.settings.auto_delete_expired_favorites {
            return Vec::new();
        }

        let mut removed = Vec::new();

        self.favorite_coupons.retain(|id, _| {
            let available = catalog.get(id).is_some_and(|coupon| coupon.is_valid(at));

            if !available {
                removed.push(id.clone());
            }

            available
        });

        debug!(user = %self.id, removed = removed.len(), "deleted unavailable favorites");

        removed
    }

    /// Whether the user wants to hear about favourites that are back.
    pub fn allows_favorites_back_notification(&self) -> bool {
        !self.settings.auto_delete_expired_favorites
            && self.settings.notify_when_favorites_are_back
    }

    /// The user's sort mode for `view`, falling back to the view's default.
    pub fn sort_mode_for_view(&self, view: &CouponView) -> SortMode {
        self.coupon_view_sort_modes
            .get(&view.index())
            .map_or_else(|| view.default_sort_mode(), |code| SortMode::from_code(*code))
    }

    /// The sort mode following the current one for `view`.
    pub fn next_sort_mode_for_view(&self, view: &CouponView) -> SortMode {
        self.sort_mode_for_view(view).next()
    }

    /// Store a sort preference for `view`.
    pub fn set_sort_mode_for_view(&mut self, view: &CouponView, sort_mode: SortMode) {
        self.coupon_view_sort_modes
            .insert(view.index(), sort_mode.code());
    }

    /// Whether any view has a stored sort preference.
    pub fn has_stored_sort_modes(&self) -> bool {
        !self.coupon_view_sort_modes.is_empty()
    }

    /// Default settings and no stored sort preferences.
    pub fn has_default_settings(&self) -> bool {
        self.settings == UserSettings::DEFAULT && !self.has_stored_sort_modes()
    }

    /// Restore default settings and forget sort preferences.
    pub fn reset_settings(&mut self) {
        self.settings = UserSettings::DEFAULT;
        self.coupon_view_sort_modes.clear();
    }

    /// The registered loyalty card number.
    pub fn payback_card_number(&self) -> Option<&str> {
        self.payback_card
            .as_ref()
            .map(|card| card.number.as_str())
    }

    /// Register a loyalty card, replacing an existing one.
    pub fn add_payback_card(&mut self, number: impl Into<String>, at: &PointInTime) {
        self.payback_card = Some(PaybackCard {
            number: number.into(),
            added: at.timestamp(),
        });
    }

    /// Forget the loyalty card.
    pub fn delete_payback_card(&mut self) {
        self.payback_card = None;
    }

    /// Digits encoded in the card's EAN-13 barcode.
    pub fn payback_card_barcode(&self) -> Option<String> {
        self.payback_card_number().map(|number| format!("240{number}"))
    }
}
