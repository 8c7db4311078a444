//! Coupon display text
//!
//! Plain values for the presentation layer: short list entries, long
//! descriptions, optional HTML markup and hyperlink wrapping.

use crate::{coupons::Coupon, time::PointInTime};

/// Marks a favourite coupon.
pub const SYMBOL_FAVORITE: &str = "⭐";

/// Marks a new coupon.
pub const SYMBOL_NEW: &str = "🆕";

/// Marks a vegetarian coupon.
pub const SYMBOL_VEGGIE: &str = "🥦";

/// Marks a plant-based coupon.
pub const SYMBOL_PLANT_BASED: &str = "🌱";

/// Marks a chili cheese coupon.
pub const SYMBOL_CHILI_CHEESE: &str = "🌶";

/// Which highlight symbols to prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent user-facing highlight toggles"
)]
pub struct Highlights {
    /// Favourites (only applied when the caller marks the coupon as favourite)
    pub favorite: bool,

    /// New coupons
    pub new: bool,

    /// Veggie and plant-based coupons
    pub veggie: bool,

    /// Chili cheese coupons
    pub chili_cheese: bool,
}

impl Highlights {
    /// Every highlight enabled.
    pub const ALL: Self = Self {
        favorite: true,
        new: true,
        veggie: true,
        chili_cheese: true,
    };
}

/// Rendering options for [`Coupon::long_text`].
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    /// Emit HTML markup (`<b>`, escaped text)
    pub markup: bool,

    /// Wrap the title in a hyperlink to this URL (requires `markup`)
    pub link: Option<String>,

    /// Highlight symbols to prefix
    pub highlights: Highlights,

    /// Whether the viewing user has this coupon as favourite
    pub is_favorite: bool,
}

impl Coupon {
    /// `"{PLU-or-ID} | {shortened title} | {price-or-discount}"`.
    ///
    /// The last segment is omitted when neither price nor discount is known.
    pub fn short_text(&self) -> String {
        let mut text = format!("{} | {}", self.plu_or_id(), self.title_or_shortened());

        if let Some(value) = self.price_or_discount_formatted() {
            text.push_str(" | ");
            text.push_str(&value);
        }

        text
    }

    /// Highlight symbols for this coupon, in display order.
    pub fn highlight_symbols(
        &self,
        at: &PointInTime,
        highlights: Highlights,
        is_favorite: bool,
    ) -> String {
        let mut symbols = String::new();

        if highlights.favorite && is_favorite {
            symbols.push_str(SYMBOL_FAVORITE);
        }

        if highlights.new && self.is_new(at) {
            symbols.push_str(SYMBOL_NEW);
        }

        if highlights.veggie {
            if self.is_plant_based() {
                symbols.push_str(SYMBOL_PLANT_BASED);
            } else if self.is_veggie() {
                symbols.push_str(SYMBOL_VEGGIE);
            }
        }

        if highlights.chili_cheese && self.contains_chili_cheese() {
            symbols.push_str(SYMBOL_CHILI_CHEESE);
        }

        symbols
    }

    /// Short text prefixed with highlight symbols, as used for list buttons.
    pub fn button_text(&self, at: &PointInTime, highlights: Highlights, is_favorite: bool) -> String {
        let symbols = self.highlight_symbols(at, highlights, is_favorite);

        if symbols.is_empty() {
            self.short_text()
        } else {
            format!("{symbols} {}", self.short_text())
        }
    }

    /// Multi-line description with title, prices and validity.
    pub fn long_text(&self, at: &PointInTime, options: &TextOptions) -> String {
        let symbols = self.highlight_symbols(at, options.highlights, options.is_favorite);
        let mut text = String::new();

        if !symbols.is_empty() {
            text.push_str(&symbols);
            text.push(' ');
        }

        let code = self.plu_or_id();
        let title = self.title.as_str();

        if options.markup {
            let title = escape_html(title);
            let title = match options.link.as_deref() {
                Some(link) => format!("<a href=\"{}\">{title}</a>", escape_html(link)),
                None => title,
            };

            text.push_str(&format!("<b>{}</b> | {title}", escape_html(code)));
        } else {
            text.push_str(&format!("{code} | {title}"));
        }

        if let Some(price) = self.price_formatted() {
            text.push('\n');
            text.push_str(&price);

            if let Some(compare) = self.price_compare_formatted() {
                text.push_str(&format!(" instead of {compare}"));
            }

            if let Some(discount) = self.discount_formatted() {
                text.push_str(&format!(" ({discount})"));
            }
        } else if let Some(discount) = self.discount_formatted() {
            text.push('\n');
            text.push_str(&discount);
        }

        if let Some(expire) = self.expire_date_formatted(at) {
            text.push('\n');

            match self.start_date_formatted(at) {
                Some(start) if self.is_not_yet_active(at) => {
                    text.push_str(&format!("Valid from {start} until {expire}"));
                }
                _ => text.push_str(&format!("Valid until {expire}")),
            }
        }

        if let Some(description) = self.description.as_deref() {
            text.push('\n');

            if options.markup {
                text.push_str(&escape_html(description));
            } else {
                text.push_str(description);
            }
        }

        text
    }
}

/// Escape text for HTML message markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
