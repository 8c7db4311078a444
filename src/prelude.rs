//! Coupon Catalog prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{CatalogDiff, CatalogHandle, CouponCatalog},
    config::{ConfigError, EngineConfig},
    coupons::{
        Coupon, CouponMap, CouponType, CouponTypeSet,
        pricing::{Discount, DiscountSource},
        text::{Highlights, TextOptions},
    },
    dedup::remove_duplicates,
    filter::CouponFilter,
    ingest::{
        AppIngestor, Diagnostic, DiagnosticKind, IngestError, IngestReport, Ingested,
        PaperIngestor, PaperSettings, PaybackIngestor, RawBatch, Severity,
    },
    sorting::SortMode,
    tags::CouponTags,
    time::PointInTime,
    titles::{AbbreviationTable, TitleShortener},
    users::{ActivityPolicy, User, UserSettings},
    views::{CouponView, VIEWS, ViewKind},
};
