//! Paper coupons
//!
//! Paper coupons arrive as JSON batches transcribed from printed flyers. One
//! flyer has a fixed number of coupons sharing one expiry date; both are
//! checked and reported, never enforced.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    coupons::{Coupon, CouponType},
    ingest::{
        DiagnosticKind, DuplicateKey, IngestError, IngestReport, Ingested, RawBatch, minor_units,
    },
    tags::CouponTags,
    time::{PointInTime, end_of_day, parse_dotted_date, start_of_day},
    titles::TitleShortener,
};

/// Extra information for all paper coupons expiring on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraInfo {
    /// `D.M.YYYY` first day of validity
    pub start_date: Option<String>,

    /// Acknowledgement note shown as description
    pub thankyou_note: Option<String>,
}

/// Extra information keyed by the `D.M.YYYY` expiry date string.
pub type ExtraInfoTable = BTreeMap<String, ExtraInfo>;

/// Paper adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSettings {
    /// Number of coupons on one flyer
    pub expected_count: usize,

    /// Discount assigned to zero-priced ("free") coupons
    pub free_discount_percent: Decimal,

    /// Per expiry date extra information
    pub extra_info: ExtraInfoTable,
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            expected_count: 48,
            free_discount_percent: Decimal::from(50),
            extra_info: ExtraInfoTable::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPaperCoupon {
    #[serde(rename = "uniqueID")]
    unique_id: String,
    plu: Option<String>,
    title: String,
    subtitle: Option<String>,
    #[serde(default, deserialize_with = "minor_units")]
    price: Option<i64>,
    #[serde(default, deserialize_with = "minor_units")]
    price_compare: Option<i64>,
    expire_date: String,
    #[serde(rename = "imageURL")]
    image_url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

struct ParsedBatch {
    coupons: Vec<Coupon>,
    expire_dates: BTreeSet<String>,
    count: usize,
}

/// Paper coupon adapter.
#[derive(Debug, Clone, Copy)]
pub struct PaperIngestor<'a, S> {
    settings: &'a PaperSettings,
    shortener: &'a S,
}

impl<'a, S: TitleShortener> PaperIngestor<'a, S> {
    /// Create a new adapter.
    pub fn new(settings: &'a PaperSettings, shortener: &'a S) -> Self {
        Self {
            settings,
            shortener,
        }
    }

    /// Convert all batches. Failing batches are skipped; expired coupons are
    /// dropped; reissued ids and PLUs keep the copy expiring first.
    pub fn ingest(&self, batches: &[RawBatch], at: &PointInTime) -> Ingested {
        let mut report = IngestReport::default();
        let mut candidates = Vec::new();

        for batch in batches {
            match self.parse_batch(batch, at) {
                Ok(parsed) => {
                    self.check_consistency(&batch.source, &parsed, &mut report);
                    candidates.extend(parsed.coupons);
                }
                Err(err) => report.record(DiagnosticKind::BatchSkipped {
                    batch: batch.source.clone(),
                    index: err.index(),
                    reason: err.to_string(),
                }),
            }
        }

        let before = candidates.len();
        candidates.retain(|coupon| !coupon.is_expired(at));

        debug!(
            expired = before - candidates.len(),
            remaining = candidates.len(),
            "dropped expired paper coupons"
        );

        let coupons = keep_first_seen(candidates, &mut report);

        Ingested { coupons, report }
    }

    fn parse_batch(&self, batch: &RawBatch, at: &PointInTime) -> Result<ParsedBatch, IngestError> {
        let records = batch.records()?;
        let count = records.len();

        let mut coupons = Vec::with_capacity(count);
        let mut expire_dates = BTreeSet::new();

        for (index, value) in records.into_iter().enumerate() {
            let raw: RawPaperCoupon = serde_json::from_value(value)
                .map_err(|source| IngestError::Record { index, source })?;

            expire_dates.insert(raw.expire_date.trim().to_string());
            coupons.push(self.convert(raw, index, at)?);
        }

        Ok(ParsedBatch {
            coupons,
            expire_dates,
            count,
        })
    }

    fn convert(
        &self,
        raw: RawPaperCoupon,
        index: usize,
        at: &PointInTime,
    ) -> Result<Coupon, IngestError> {
        let date_error = |source| IngestError::Date { index, source };
        let time_zone = at.time_zone();

        let expire_key = raw.expire_date.trim();
        let expire = parse_dotted_date(expire_key)
            .and_then(|date| end_of_day(date, time_zone))
            .map_err(date_error)?;

        let extra = self.settings.extra_info.get(expire_key);

        let start = extra
            .and_then(|extra| extra.start_date.as_deref())
            .map(|start| parse_dotted_date(start).and_then(|date| start_of_day(date, time_zone)))
            .transpose()
            .map_err(date_error)?;

        let title = raw.title.replace('*', "").trim().to_string();

        let (price, static_reduced_percent) = match raw.price {
            Some(0) => (None, Some(self.settings.free_discount_percent)),
            price => (price, None),
        };

        Ok(Coupon {
            plu: raw.plu.filter(|plu| !plu.trim().is_empty()),
            title_shortened: Some(self.shortener.shorten(&title)),
            subtitle: raw.subtitle,
            description: extra.and_then(|extra| extra.thankyou_note.clone()),
            price,
            price_compare: raw.price_compare,
            static_reduced_percent,
            timestamp_start: start,
            timestamp_expire: Some(expire),
            tags: CouponTags::new(raw.tags),
            image_url: raw.image_url,
            ..Coupon::new(raw.unique_id, title, CouponType::Paper)
        })
    }

    fn check_consistency(&self, batch: &str, parsed: &ParsedBatch, report: &mut IngestReport) {
        if parsed.expire_dates.len() > 1 {
            report.record(DiagnosticKind::MismatchedExpireDates {
                batch: batch.to_string(),
                dates: parsed.expire_dates.iter().cloned().collect(),
            });
        }

        if parsed.count != self.settings.expected_count {
            report.record(DiagnosticKind::UnexpectedCount {
                batch: batch.to_string(),
                expected: self.settings.expected_count,
                found: parsed.count,
            });
        }

        for expire_date in &parsed.expire_dates {
            let expire_date = expire_date.clone();

            let Some(extra) = self.settings.extra_info.get(&expire_date) else {
                report.record(DiagnosticKind::MissingExtraInfo { expire_date });
                continue;
            };

            if extra.start_date.is_none() {
                report.record(DiagnosticKind::MissingStartDate {
                    expire_date: expire_date.clone(),
                });
            }

            if extra.thankyou_note.is_none() {
                report.record(DiagnosticKind::MissingThankYouNote { expire_date });
            }
        }
    }
}

/// Keep the first coupon per id and per PLU after ordering by expiry.
///
/// Only kept coupons claim their id and PLU; a dropped record never blocks a
/// later one.
fn keep_first_seen(mut coupons: Vec<Coupon>, report: &mut IngestReport) -> Vec<Coupon> {
    coupons.sort_by_key(|coupon| coupon.timestamp_expire);

    let mut ids: FxHashSet<String> = FxHashSet::default();
    let mut plus: FxHashMap<String, String> = FxHashMap::default();

    coupons.retain(|coupon| {
        if ids.contains(coupon.id.as_str()) {
            report.record(DiagnosticKind::DuplicateSkipped {
                id: coupon.id.clone(),
                key: DuplicateKey::Id,
                kept: coupon.id.clone(),
            });

            return false;
        }

        let plu = coupon.plu.as_deref();

        if let Some((plu, kept)) = plu.and_then(|plu| plus.get(plu).map(|kept| (plu, kept))) {
            report.record(DiagnosticKind::DuplicateSkipped {
                id: coupon.id.clone(),
                key: DuplicateKey::Plu(plu.to_string()),
                kept: kept.clone(),
            });

            return false;
        }

        ids.insert(coupon.id.clone());

        if let Some(plu) = plu {
            plus.insert(plu.to_string(), coupon.id.clone());
        }

        true
    });

    coupons
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, tz::TimeZone};
    use serde_json::json;
    use testresult::TestResult;

    use crate::titles::AbbreviationTable;

    use super::*;

    // 2024-11-01 00:00:00 UTC
    const NOW: i64 = 1_730_419_200;

    fn at() -> Result<PointInTime, jiff::Error> {
        Ok(PointInTime::new(Timestamp::from_second(NOW)?, TimeZone::UTC))
    }

    fn settings() -> PaperSettings {
        PaperSettings {
            expected_count: 2,
            extra_info: ExtraInfoTable::from([(
                "8.11.2024".to_string(),
                ExtraInfo {
                    start_date: Some("7.9.2024".to_string()),
                    thankyou_note: Some("Thanks!".to_string()),
                },
            )]),
            ..PaperSettings::default()
        }
    }

    fn record(id: &str, plu: &str, price: i64, expire: &str) -> serde_json::Value {
        json!({
            "uniqueID": id,
            "plu": plu,
            "title": format!("*Whopper {id}"),
            "price": price,
            "expireDate": expire,
        })
    }

    fn batch(source: &str, records: &[serde_json::Value]) -> RawBatch {
        RawBatch::new(source, serde_json::Value::from(records.to_vec()).to_string())
    }

    #[test]
    fn converts_records() -> TestResult {
        let settings = settings();
        let table = AbbreviationTable::new([("Whopper", "Wh")]);
        let ingestor = PaperIngestor::new(&settings, &table);

        let ingested = ingestor.ingest(
            &[batch(
                "a.json",
                &[record("1", "A1", 0, "8.11.2024"), record("2", "A2", 599, "8.11.2024")],
            )],
            &at()?,
        );

        assert!(!ingested.report.has_warnings(), "{:?}", ingested.report);

        let [free, paid] = ingested.coupons.as_slice() else {
            panic!("expected two coupons, got {:?}", ingested.coupons);
        };

        assert_eq!(free.title, "Whopper 1");
        assert_eq!(free.title_shortened.as_deref(), Some("Wh 1"));
        assert_eq!(free.price, None);
        assert_eq!(free.discount_formatted().as_deref(), Some("-50%"));
        assert_eq!(free.description.as_deref(), Some("Thanks!"));
        assert_eq!(free.coupon_type, CouponType::Paper);
        assert_eq!(
            free.timestamp_expire.map(Timestamp::as_second),
            Some(1_731_110_399)
        );
        assert_eq!(
            free.timestamp_start.map(Timestamp::as_second),
            Some(1_725_667_200)
        );
        assert_eq!(paid.price, Some(599));
        assert_eq!(paid.static_reduced_percent, None);

        Ok(())
    }

    #[test]
    fn failing_batch_is_skipped_siblings_survive() -> TestResult {
        let settings = settings();
        let ingestor = PaperIngestor::new(&settings, &crate::titles::Identity);

        let broken = RawBatch::new(
            "broken.json",
            json!([
                record("1", "A1", 100, "8.11.2024"),
                {"uniqueID": "2", "title": "x", "price": "free", "expireDate": "8.11.2024"},
            ])
            .to_string(),
        );
        let good = batch(
            "good.json",
            &[record("3", "A3", 100, "8.11.2024"), record("4", "A4", 100, "8.11.2024")],
        );

        let ingested = ingestor.ingest(&[broken, good], &at()?);

        let ids: Vec<&str> = ingested.coupons.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, vec!["3", "4"]);
        assert!(ingested.report.warnings().any(|kind| matches!(
            kind,
            DiagnosticKind::BatchSkipped { batch, index: Some(1), .. } if batch == "broken.json"
        )));

        Ok(())
    }

    #[test]
    fn malformed_json_skips_batch_without_index() -> TestResult {
        let settings = settings();
        let ingestor = PaperIngestor::new(&settings, &crate::titles::Identity);

        let ingested = ingestor.ingest(&[RawBatch::new("x.json", "{not json")], &at()?);

        assert!(ingested.coupons.is_empty());
        assert!(matches!(
            ingested.report.warnings().next(),
            Some(DiagnosticKind::BatchSkipped { index: None, .. })
        ));

        Ok(())
    }

    #[test]
    fn reissued_plu_keeps_soonest_expiry() -> TestResult {
        let mut settings = settings();
        settings.extra_info.insert(
            "6.12.2024".to_string(),
            ExtraInfo {
                start_date: Some("9.11.2024".to_string()),
                thankyou_note: Some("Thanks again!".to_string()),
            },
        );

        let ingestor = PaperIngestor::new(&settings, &crate::titles::Identity);

        let newer = batch(
            "newer.json",
            &[record("10", "A1", 100, "6.12.2024"), record("2", "A2", 100, "6.12.2024")],
        );
        let older = batch(
            "older.json",
            &[record("1", "A1", 100, "8.11.2024"), record("2", "B2", 100, "8.11.2024")],
        );

        let ingested = ingestor.ingest(&[newer, older], &at()?);

        let kept: Vec<(&str, Option<&str>)> = ingested
            .coupons
            .iter()
            .map(|c| (c.id.as_str(), c.plu.as_deref()))
            .collect();

        assert_eq!(kept, vec![("1", Some("A1")), ("2", Some("B2"))]);
        assert_eq!(ingested.report.infos().count(), 2);
        assert!(!ingested.report.has_warnings(), "{:?}", ingested.report);

        Ok(())
    }

    #[test]
    fn dropped_plu_duplicate_does_not_claim_its_id() -> TestResult {
        let settings = settings();
        let ingestor = PaperIngestor::new(&settings, &crate::titles::Identity);

        let ingested = ingestor.ingest(
            &[
                batch("first.json", &[record("1", "A1", 100, "8.11.2024")]),
                batch("reissue.json", &[record("2", "A1", 100, "6.12.2024")]),
                batch("winter.json", &[record("2", "B2", 100, "3.1.2025")]),
            ],
            &at()?,
        );

        let kept: Vec<(&str, Option<&str>)> = ingested
            .coupons
            .iter()
            .map(|c| (c.id.as_str(), c.plu.as_deref()))
            .collect();

        assert_eq!(kept, vec![("1", Some("A1")), ("2", Some("B2"))]);
        assert_eq!(
            ingested.report.infos().collect::<Vec<_>>(),
            vec![&DiagnosticKind::DuplicateSkipped {
                id: "2".to_string(),
                key: DuplicateKey::Plu("A1".to_string()),
                kept: "1".to_string(),
            }]
        );

        Ok(())
    }

    #[test]
    fn inconsistencies_are_reported_not_enforced() -> TestResult {
        let settings = PaperSettings {
            expected_count: 48,
            ..PaperSettings::default()
        };
        let ingestor = PaperIngestor::new(&settings, &crate::titles::Identity);

        let ingested = ingestor.ingest(
            &[batch(
                "mixed.json",
                &[record("1", "A1", 100, "8.11.2024"), record("2", "A2", 100, "6.12.2024")],
            )],
            &at()?,
        );

        assert_eq!(ingested.coupons.len(), 2);

        let warnings: Vec<&DiagnosticKind> = ingested.report.warnings().collect();

        assert!(warnings.iter().any(|kind| matches!(
            kind,
            DiagnosticKind::MismatchedExpireDates { dates, .. } if dates.len() == 2
        )));
        assert!(warnings.iter().any(|kind| matches!(
            kind,
            DiagnosticKind::UnexpectedCount { expected: 48, found: 2, .. }
        )));
        assert_eq!(
            warnings
                .iter()
                .filter(|kind| matches!(kind, DiagnosticKind::MissingExtraInfo { .. }))
                .count(),
            2
        );

        Ok(())
    }

    #[test]
    fn whole_float_prices_are_accepted() -> TestResult {
        let settings = settings();
        let ingestor = PaperIngestor::new(&settings, &crate::titles::Identity);

        let floats = RawBatch::new(
            "floats.json",
            json!([
                {"uniqueID": "1", "title": "x", "price": 0.0, "expireDate": "8.11.2024"},
                {"uniqueID": "2", "title": "y", "price": 299.0, "priceCompare": 499.0, "expireDate": "8.11.2024"},
            ])
            .to_string(),
        );
        let fractional = RawBatch::new(
            "fractional.json",
            json!([{"uniqueID": "3", "title": "z", "price": 2.99, "expireDate": "8.11.2024"}])
                .to_string(),
        );

        let ingested = ingestor.ingest(&[floats, fractional], &at()?);

        let prices: Vec<(&str, Option<i64>, Option<i64>)> = ingested
            .coupons
            .iter()
            .map(|c| (c.id.as_str(), c.price, c.price_compare))
            .collect();

        assert_eq!(prices, vec![("1", None, None), ("2", Some(299), Some(499))]);
        assert!(ingested.report.warnings().any(|kind| matches!(
            kind,
            DiagnosticKind::BatchSkipped { batch, index: Some(0), .. } if batch == "fractional.json"
        )));

        Ok(())
    }

    #[test]
    fn expired_coupons_are_dropped() -> TestResult {
        let settings = settings();
        let ingestor = PaperIngestor::new(&settings, &crate::titles::Identity);

        let ingested = ingestor.ingest(
            &[batch(
                "old.json",
                &[record("1", "A1", 100, "31.10.2024"), record("2", "A2", 100, "8.11.2024")],
            )],
            &at()?,
        );

        assert_eq!(ingested.coupons.len(), 1);
        assert_eq!(ingested.coupons.first().map(|c| c.id.as_str()), Some("2"));

        Ok(())
    }
}
