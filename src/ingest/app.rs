//! App and loyalty coupons
//!
//! App records mirror the canonical fields closely and are trusted: a record
//! that fails to convert is skipped on its own rather than failing its batch.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    coupons::{Coupon, CouponType},
    ingest::{DiagnosticKind, IngestError, IngestReport, Ingested, RawBatch, minor_units},
    tags::CouponTags,
    titles::TitleShortener,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAppCoupon {
    id: String,
    plu: Option<String>,
    #[serde(rename = "type")]
    coupon_type: Option<CouponType>,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "minor_units")]
    price: Option<i64>,
    #[serde(default, deserialize_with = "minor_units")]
    price_compare: Option<i64>,
    static_reduced_percent: Option<Decimal>,
    timestamp_start: Option<i64>,
    timestamp_expire: Option<i64>,
    is_new_until_date: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_hidden: bool,
    contains_fries_and_drink: Option<bool>,
    #[serde(rename = "imageURL")]
    image_url: Option<String>,
    #[serde(rename = "webviewID")]
    webview_id: Option<String>,
    #[serde(rename = "webviewURL")]
    webview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPaybackCoupon {
    id: String,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    #[serde(alias = "paybackMultiplicator")]
    multiplicator: Option<u32>,
    static_reduced_percent: Option<Decimal>,
    timestamp_start: Option<i64>,
    timestamp_expire: Option<i64>,
    #[serde(rename = "imageURL")]
    image_url: Option<String>,
}

/// App API coupon adapter.
#[derive(Debug, Clone, Copy)]
pub struct AppIngestor<'a, S> {
    shortener: &'a S,
}

impl<'a, S: TitleShortener> AppIngestor<'a, S> {
    /// Create a new adapter.
    pub fn new(shortener: &'a S) -> Self {
        Self { shortener }
    }

    /// Convert all records of all batches.
    pub fn ingest(&self, batches: &[RawBatch]) -> Ingested {
        ingest_each(batches, |raw: RawAppCoupon, index| {
            let title = raw.title.trim().to_string();

            Ok(Coupon {
                plu: raw.plu.filter(|plu| !plu.trim().is_empty()),
                title_shortened: Some(self.shortener.shorten(&title)),
                subtitle: raw.subtitle,
                description: raw.description,
                price: raw.price,
                price_compare: raw.price_compare,
                static_reduced_percent: raw.static_reduced_percent,
                timestamp_start: timestamp(raw.timestamp_start, index)?,
                timestamp_expire: timestamp(raw.timestamp_expire, index)?,
                is_new_until_date: raw.is_new_until_date,
                tags: CouponTags::new(raw.tags),
                is_hidden: raw.is_hidden,
                contains_fries_and_drink: raw.contains_fries_and_drink,
                image_url: raw.image_url,
                webview_id: raw.webview_id,
                webview_url: raw.webview_url,
                ..Coupon::new(raw.id, title, raw.coupon_type.unwrap_or(CouponType::App))
            })
        })
    }
}

/// Loyalty card offer adapter.
#[derive(Debug, Clone, Copy)]
pub struct PaybackIngestor<'a, S> {
    shortener: &'a S,
}

impl<'a, S: TitleShortener> PaybackIngestor<'a, S> {
    /// Create a new adapter.
    pub fn new(shortener: &'a S) -> Self {
        Self { shortener }
    }

    /// Convert all records of all batches.
    pub fn ingest(&self, batches: &[RawBatch]) -> Ingested {
        ingest_each(batches, |raw: RawPaybackCoupon, index| {
            let title = raw.title.trim().to_string();

            Ok(Coupon {
                title_shortened: Some(self.shortener.shorten(&title)),
                subtitle: raw.subtitle,
                description: raw.description,
                payback_multiplicator: raw.multiplicator,
                static_reduced_percent: raw.static_reduced_percent,
                timestamp_start: timestamp(raw.timestamp_start, index)?,
                timestamp_expire: timestamp(raw.timestamp_expire, index)?,
                image_url: raw.image_url,
                ..Coupon::new(raw.id, title, CouponType::Payback)
            })
        })
    }
}

fn ingest_each<R, F>(batches: &[RawBatch], convert: F) -> Ingested
where
    R: for<'de> Deserialize<'de>,
    F: Fn(R, usize) -> Result<Coupon, IngestError>,
{
    let mut report = IngestReport::default();
    let mut coupons = Vec::new();

    for batch in batches {
        let records = match batch.records() {
            Ok(records) => records,
            Err(err) => {
                report.record(DiagnosticKind::BatchSkipped {
                    batch: batch.source.clone(),
                    index: None,
                    reason: err.to_string(),
                });

                continue;
            }
        };

        for (index, value) in records.into_iter().enumerate() {
            let converted = serde_json::from_value(value)
                .map_err(|source| IngestError::Record { index, source })
                .and_then(|raw| convert(raw, index));

            match converted {
                Ok(coupon) => {
                    if coupon.timestamp_expire.is_none() {
                        report.record(DiagnosticKind::MissingExpireDate {
                            batch: batch.source.clone(),
                            id: coupon.id.clone(),
                        });
                    }

                    coupons.push(coupon);
                }
                Err(err) => report.record(DiagnosticKind::RecordSkipped {
                    batch: batch.source.clone(),
                    index,
                    reason: err.to_string(),
                }),
            }
        }
    }

    Ingested { coupons, report }
}

fn timestamp(seconds: Option<i64>, index: usize) -> Result<Option<Timestamp>, IngestError> {
    seconds
        .map(|seconds| {
            Timestamp::from_second(seconds)
                .map_err(|_err| IngestError::Timestamp { index, seconds })
        })
        .transpose()
}
