//! Listing
//!
//! Tabular console output for a list of coupons.

use std::io;

use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    coupons::{Coupon, text::Highlights},
    time::PointInTime,
};

/// Errors that can occur when writing a listing.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Output could not be written
    #[error("failed to write listing: {0}")]
    Io(#[from] io::Error),
}

/// Write `coupons` as a table followed by a one-line summary.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_to<'a>(
    mut out: impl io::Write,
    coupons: impl IntoIterator<Item = &'a Coupon>,
    at: &PointInTime,
    highlights: Highlights,
) -> Result<(), ListingError> {
    let mut builder = Builder::default();

    builder.push_record(["", "Code", "Title", "Type", "Price", "Discount", "Valid until"]);

    let mut count = 0usize;

    for coupon in coupons {
        builder.push_record([
            coupon.highlight_symbols(at, highlights, false),
            coupon.plu_or_id().to_string(),
            coupon.title_or_shortened().to_string(),
            coupon.coupon_type.name().to_string(),
            coupon.price_formatted().unwrap_or_default(),
            coupon.discount_formatted().unwrap_or_default(),
            coupon.expire_date_formatted(at).unwrap_or_default(),
        ]);

        count += 1;
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(4..6), Alignment::right());

    writeln!(out, "\n{table}")?;
    writeln!(out, "{count} coupon(s)")?;

    Ok(())
}
