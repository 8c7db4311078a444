//! End-to-end ingestion of paper flyers and app coupons into a catalog.
//!
//! Flyer A: 48 records expiring 8.11.2024, the first one free (price 0).
//! Flyer B: 48 records, 47 expiring 3.1.2025 and one stray 8.11.2024 record.
//!
//! Evaluated at 2024-11-01 00:00:00 UTC, both flyers have extra info configured
//! in `fixtures/config.yml`, flyer A is active and flyer B starts on 9.11.2024.

use jiff::{Timestamp, tz::TimeZone};
use rust_decimal::Decimal;
use serde_json::json;
use testresult::TestResult;

use coupon_catalog::{
    catalog::CouponCatalog,
    config::EngineConfig,
    ingest::{AppIngestor, DiagnosticKind, PaperIngestor, RawBatch},
    time::PointInTime,
    views::ViewKind,
};

// 2024-11-01 00:00:00 UTC
const NOW: i64 = 1_730_419_200;

fn at() -> Result<PointInTime, jiff::Error> {
    Ok(PointInTime::new(Timestamp::from_second(NOW)?, TimeZone::UTC))
}

fn config() -> TestResult<EngineConfig> {
    Ok(EngineConfig::load("fixtures/config.yml".as_ref())?)
}

fn flyer(source: &str, prefix: &str, expire_date: impl Fn(usize) -> &'static str) -> RawBatch {
    let records: Vec<serde_json::Value> = (0..48)
        .map(|index| {
            json!({
                "uniqueID": format!("{prefix}{index}"),
                "plu": format!("{prefix}{index}"),
                "title": format!("*Chicken Burger Nr. {index}"),
                "price": if index == 0 { 0 } else { 199 + 10 * index },
                "priceCompare": 499 + 10 * index,
                "expireDate": expire_date(index),
            })
        })
        .collect();

    RawBatch::new(source, serde_json::Value::from(records).to_string())
}

fn flyer_a() -> RawBatch {
    flyer("a.json", "A", |_| "8.11.2024")
}

fn flyer_b() -> RawBatch {
    flyer("b.json", "B", |index| {
        if index == 47 { "8.11.2024" } else { "3.1.2025" }
    })
}

#[test]
fn consistent_flyer_ingests_without_warnings() -> TestResult {
    let config = config()?;
    let at = at()?;

    let ingested = PaperIngestor::new(&config.paper, &config.abbreviations).ingest(&[flyer_a()], &at);

    assert!(
        ingested.report.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        ingested.report.diagnostics()
    );
    assert_eq!(ingested.coupons.len(), 48);

    let free = ingested
        .coupons
        .iter()
        .find(|coupon| coupon.id == "A0")
        .ok_or("free coupon missing")?;

    assert_eq!(free.price, None);
    assert_eq!(free.discount_percent(), Some(Decimal::from(50)));
    assert_eq!(free.discount_formatted().as_deref(), Some("-50%"));
    assert_eq!(free.title, "Chicken Burger Nr. 0");
    assert_eq!(free.title_or_shortened(), "Ckn Burger Nr. 0");
    assert_eq!(
        free.description.as_deref(),
        Some("Thanks for collecting the autumn flyer!")
    );
    assert!(free.is_valid(&at));

    Ok(())
}

#[test]
fn stray_expiry_date_warns_but_keeps_the_batch() -> TestResult {
    let config = config()?;
    let at = at()?;

    let ingested = PaperIngestor::new(&config.paper, &config.abbreviations)
        .ingest(&[flyer_a(), flyer_b()], &at);

    let warnings: Vec<&DiagnosticKind> = ingested.report.warnings().collect();

    assert_eq!(
        warnings,
        vec![&DiagnosticKind::MismatchedExpireDates {
            batch: "b.json".to_string(),
            dates: vec!["3.1.2025".to_string(), "8.11.2024".to_string()],
        }]
    );
    assert_eq!(ingested.coupons.len(), 96);

    let upcoming = ingested
        .coupons
        .iter()
        .filter(|coupon| coupon.is_not_yet_active(&at))
        .count();

    assert_eq!(upcoming, 47);

    Ok(())
}

#[test]
fn catalog_views_over_merged_sources() -> TestResult {
    let config = config()?;
    let at = at()?;

    let paper = PaperIngestor::new(&config.paper, &config.abbreviations)
        .ingest(&[flyer_a(), flyer_b()], &at);

    let app = AppIngestor::new(&config.abbreviations).ingest(&[RawBatch::new(
        "app.json",
        json!([
            {
                "id": "9001",
                "title": "Veggie Burger",
                "tags": ["beef"],
                "price": 399,
                "timestampExpire": NOW + 86_400,
            },
            {
                "id": "9002",
                "title": "Chicken Burger Nr. 1",
                "price": 209,
                "timestampExpire": NOW + 86_400,
            },
            {
                "id": "9003",
                "title": "Veggie Burger",
                "price": 399,
                "timestampExpire": NOW + 86_400,
            },
        ])
        .to_string(),
    )]);

    let (catalog, report) = CouponCatalog::merge([paper, app]);

    assert_eq!(catalog.len(), 99);
    assert_eq!(report.warnings().count(), 1);

    let mislabelled = catalog.get("9001").ok_or("missing app coupon")?;

    assert!(!mislabelled.is_veggie(), "meat tag overrides the title");

    let veggie: Vec<&str> = ViewKind::Veggie
        .view()
        .filter
        .apply_sorted(&catalog, &at)
        .into_iter()
        .map(|coupon| coupon.id.as_str())
        .collect();

    assert_eq!(veggie, vec!["9003"]);

    let all = ViewKind::All.view();
    let deduped = coupon_catalog::filter::CouponFilter {
        remove_duplicates: true,
        ..all.filter
    };

    let shown = deduped.apply_sorted(&catalog, &at);

    assert!(
        shown.iter().any(|coupon| coupon.id == "9002"),
        "app coupon wins a price tie"
    );
    assert!(!shown.iter().any(|coupon| coupon.id == "A1"));

    Ok(())
}
