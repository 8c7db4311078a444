//! Coupons
//!
//! The canonical coupon entity. Everything beyond the stored fields (validity,
//! "new" status, classification, discount, display strings) is derived on demand.

use std::collections::BTreeMap;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    tags::CouponTags,
    time::{PointInTime, SECONDS_PER_DAY, end_of_day, format_date, parse_iso_date},
};

pub mod nutrition;
pub mod pricing;
pub mod text;
pub mod types;

pub use types::{CouponType, CouponTypeError, CouponTypeSet};

/// Id-keyed coupon collection.
pub type CouponMap = BTreeMap<String, Coupon>;

/// Placeholder for absent values inside comparison keys.
const UNDEFINED: &str = "undefined";

/// Canonical coupon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Globally unique id, stable across reloads
    pub id: String,

    /// Short in-store code; `None` means the coupon can only be redeemed via QR code
    pub plu: Option<String>,

    /// Source/category
    #[serde(rename = "type")]
    pub coupon_type: CouponType,

    /// Full title as delivered by the source
    pub title: String,

    /// Title after product name abbreviation
    pub title_shortened: Option<String>,

    /// Subtitle
    pub subtitle: Option<String>,

    /// Free text description (e.g. acknowledgement notes)
    pub description: Option<String>,

    /// Price in minor units
    pub price: Option<i64>,

    /// Reference price in minor units
    pub price_compare: Option<i64>,

    /// Discount given by the source when no compare price exists
    pub static_reduced_percent: Option<Decimal>,

    /// Loyalty points multiplier
    pub payback_multiplicator: Option<u32>,

    /// Start of validity; `None` means always started
    pub timestamp_start: Option<Timestamp>,

    /// End of validity
    pub timestamp_expire: Option<Timestamp>,

    /// When the coupon was first stored
    #[serde(rename = "timestampAddedToDB")]
    pub timestamp_added_to_db: Option<Timestamp>,

    /// Explicit "new" marker
    pub timestamp_is_new: Option<Timestamp>,

    /// `YYYY-MM-DD` date until which the coupon counts as new
    pub is_new_until_date: Option<String>,

    /// Free-text source tags
    #[serde(default)]
    pub tags: CouponTags,

    /// Hidden/upsell coupon
    #[serde(default)]
    pub is_hidden: bool,

    /// Explicit combo flag from the source; derived from the title when absent
    pub contains_fries_and_drink: Option<bool>,

    /// Local file reference or remote URL
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,

    /// Web view id
    #[serde(rename = "webviewID")]
    pub webview_id: Option<String>,

    /// Web view URL
    #[serde(rename = "webviewURL")]
    pub webview_url: Option<String>,
}

impl Coupon {
    /// Create a coupon with only its identity set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, coupon_type: CouponType) -> Self {
        Self {
            id: id.into(),
            plu: None,
            coupon_type,
            title: title.into(),
            title_shortened: None,
            subtitle: None,
            description: None,
            price: None,
            price_compare: None,
            static_reduced_percent: None,
            payback_multiplicator: None,
            timestamp_start: None,
            timestamp_expire: None,
            timestamp_added_to_db: None,
            timestamp_is_new: None,
            is_new_until_date: None,
            tags: CouponTags::default(),
            is_hidden: false,
            contains_fries_and_drink: None,
            image_url: None,
            webview_id: None,
            webview_url: None,
        }
    }

    /// PLU if present, id otherwise.
    pub fn plu_or_id(&self) -> &str {
        self.plu.as_deref().unwrap_or(&self.id)
    }

    /// Coupons without PLU can only be redeemed by scanning the QR code.
    pub fn is_qr_only(&self) -> bool {
        self.plu.is_none()
    }

    /// Letter prefix of PLUs shaped like `A12`.
    pub fn plu_first_letter(&self) -> Option<char> {
        let mut chars = self.plu.as_deref()?.chars();
        let first = chars.next().filter(char::is_ascii_alphabetic)?;
        let digits = chars.as_str();

        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(first.to_ascii_uppercase())
        } else {
            None
        }
    }

    /// Shortened title, falling back to the full title.
    pub fn title_or_shortened(&self) -> &str {
        self.title_shortened.as_deref().unwrap_or(&self.title)
    }

    /// Dedup key: shortened title, lowercased, with non-word characters removed.
    pub fn normalized_title(&self) -> String {
        self.title_or_shortened()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect()
    }

    /// Whether the expiry lies strictly before `at`.
    ///
    /// A coupon without expiry is a data-integrity fault and counts as expired.
    /// The fault itself is reported once, at ingestion.
    pub fn is_expired(&self, at: &PointInTime) -> bool {
        let Some(expire) = self.timestamp_expire else {
            debug!(coupon_id = %self.id, "coupon without expiry date");
            return true;
        };

        expire < at.timestamp()
    }

    /// Whether the start lies strictly after `at`.
    pub fn is_not_yet_active(&self, at: &PointInTime) -> bool {
        self.timestamp_start
            .is_some_and(|start| start > at.timestamp())
    }

    /// Neither expired nor not yet active.
    pub fn is_valid(&self, at: &PointInTime) -> bool {
        !self.is_expired(at) && !self.is_not_yet_active(at)
    }

    /// Whether the coupon counts as new at `at`.
    pub fn is_new(&self, at: &PointInTime) -> bool {
        let within_a_day = |timestamp: Option<Timestamp>| {
            timestamp.is_some_and(|timestamp| at.seconds_since(timestamp) < SECONDS_PER_DAY)
        };

        if within_a_day(self.timestamp_added_to_db) || within_a_day(self.timestamp_is_new) {
            return true;
        }

        let started = self
            .timestamp_start
            .filter(|start| start.as_second() > 0);

        if within_a_day(started) {
            return true;
        }

        self.is_new_until_date
            .as_deref()
            .is_some_and(|until| self.is_new_until(until, at))
    }

    fn is_new_until(&self, until: &str, at: &PointInTime) -> bool {
        match parse_iso_date(until).and_then(|date| end_of_day(date, at.time_zone())) {
            Ok(last_second) => last_second > at.timestamp(),
            Err(err) => {
                warn!(coupon_id = %self.id, %err, "ignoring malformed isNewUntilDate");
                false
            }
        }
    }

    /// Key used to detect material changes of a coupon between ingestion cycles.
    pub fn unique_identifier(&self) -> String {
        let expire = self
            .timestamp_expire
            .map_or_else(|| UNDEFINED.to_string(), |expire| expire.as_second().to_string());

        format!(
            "{}_{}_{}_{}",
            self.id,
            self.plu.as_deref().unwrap_or(UNDEFINED),
            expire,
            self.image_url.as_deref().unwrap_or(UNDEFINED),
        )
    }

    /// Expiry date as `DD.MM.YYYY`.
    pub fn expire_date_formatted(&self, at: &PointInTime) -> Option<String> {
        self.timestamp_expire
            .map(|expire| format_date(expire, at.time_zone()))
    }

    /// Start date as `DD.MM.YYYY`.
    pub fn start_date_formatted(&self, at: &PointInTime) -> Option<String> {
        self.timestamp_start
            .map(|start| format_date(start, at.time_zone()))
    }

    /// File name of the rendered QR code image.
    pub fn qr_image_file_name(&self) -> String {
        format!("{}_QR.png", self.id)
    }

    /// File name of the cached product image, derived from the image URL.
    pub fn image_file_name(&self) -> Option<String> {
        let url = self.image_url.as_deref()?;
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let name = path.rsplit('/').next().filter(|name| !name.is_empty())?;

        Some(format!("{}_{name}", self.id))
    }
}
