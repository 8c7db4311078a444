//! Coupon catalog
//!
//! The productive, id-keyed coupon set assembled from every source, plus the
//! handle that publishes complete snapshots to readers.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{debug, info};

use crate::{
    coupons::{Coupon, CouponMap, CouponTypeSet, pricing},
    ingest::{DiagnosticKind, IngestReport, Ingested},
    time::PointInTime,
};

/// Id-keyed coupon set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponCatalog {
    coupons: CouponMap,
}

/// Ids that differ between two catalogs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDiff {
    /// Present now, absent before
    pub added: Vec<String>,

    /// Present in both with a different comparison key
    pub changed: Vec<String>,

    /// Absent now, present before
    pub removed: Vec<String>,
}

impl CatalogDiff {
    /// Whether both catalogs hold the same coupons.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

impl CouponCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog directly; later coupons replace earlier ones with the same id.
    pub fn from_coupons(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self {
            coupons: coupons
                .into_iter()
                .map(|coupon| (coupon.id.clone(), coupon))
                .collect(),
        }
    }

    /// Merge adapter outputs in order. On id collisions the later source wins
    /// and the collision is recorded as informational.
    pub fn merge(sources: impl IntoIterator<Item = Ingested>) -> (Self, IngestReport) {
        let mut catalog = Self::new();
        let mut report = IngestReport::default();

        for source in sources {
            report.merge(source.report);

            for coupon in source.coupons {
                let id = coupon.id.clone();

                if catalog.coupons.insert(id.clone(), coupon).is_some() {
                    report.record(DiagnosticKind::IdCollision { id });
                }
            }
        }

        info!(coupons = catalog.len(), "merged catalog");

        (catalog, report)
    }

    /// Coupon by id.
    pub fn get(&self, id: &str) -> Option<&Coupon> {
        self.coupons.get(id)
    }

    /// Whether a coupon with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.coupons.contains_key(id)
    }

    /// All coupons, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Coupon> {
        self.coupons.values()
    }

    /// Underlying map.
    pub fn coupons(&self) -> &CouponMap {
        &self.coupons
    }

    /// Number of coupons.
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// Coupons the bot may show right now.
    pub fn valid_bot_coupons<'a>(
        &'a self,
        at: &'a PointInTime,
    ) -> impl Iterator<Item = &'a Coupon> + 'a {
        self.iter().filter(move |coupon| is_valid_bot_coupon(coupon, at))
    }

    /// Sum of all known prices in minor units.
    pub fn total_price(&self) -> i64 {
        pricing::total_price(self.iter())
    }

    /// Compare against the previous catalog.
    pub fn diff(&self, previous: &CouponCatalog) -> CatalogDiff {
        let mut diff = CatalogDiff::default();

        for (id, coupon) in &self.coupons {
            match previous.get(id) {
                None => diff.added.push(id.clone()),
                Some(old) if old.unique_identifier() != coupon.unique_identifier() => {
                    diff.changed.push(id.clone());
                }
                Some(_) => {}
            }
        }

        diff.removed = previous
            .coupons
            .keys()
            .filter(|id| !self.contains(id))
            .cloned()
            .collect();

        debug!(
            added = diff.added.len(),
            changed = diff.changed.len(),
            removed = diff.removed.len(),
            "catalog diff"
        );

        diff
    }

    /// Carry "added" timestamps over from `previous` and stamp coupons seen
    /// for the first time with `at`.
    pub fn stamp_added(&mut self, previous: &CouponCatalog, at: &PointInTime) {
        for (id, coupon) in &mut self.coupons {
            coupon.timestamp_added_to_db = previous
                .get(id)
                .and_then(|old| old.timestamp_added_to_db)
                .or(coupon.timestamp_added_to_db)
                .or(Some(at.timestamp()));
        }
    }
}

impl FromIterator<Coupon> for CouponCatalog {
    fn from_iter<T: IntoIterator<Item = Coupon>>(iter: T) -> Self {
        Self::from_coupons(iter)
    }
}

impl<'a> IntoIterator for &'a CouponCatalog {
    type Item = &'a Coupon;
    type IntoIter = std::collections::btree_map::Values<'a, String, Coupon>;

    fn into_iter(self) -> Self::IntoIter {
        self.coupons.values()
    }
}

/// Valid and of a type the bot displays.
pub fn is_valid_bot_coupon(coupon: &Coupon, at: &PointInTime) -> bool {
    CouponTypeSet::BOT_ALLOWED.contains(coupon.coupon_type) && coupon.is_valid(at)
}

/// Where a coupon's rendered QR code lives below `base`.
pub fn qr_image_path(base: &Path, coupon: &Coupon) -> PathBuf {
    base.join(coupon.qr_image_file_name())
}

/// Where a coupon's cached product image lives below `base`.
pub fn image_path(base: &Path, coupon: &Coupon) -> Option<PathBuf> {
    coupon.image_file_name().map(|name| base.join(name))
}

/// Shared, atomically replaceable catalog.
///
/// Readers get an `Arc` to a complete snapshot; a refresh that fails leaves
/// the current snapshot untouched.
#[derive(Debug, Default)]
pub struct CatalogHandle {
    current: RwLock<Arc<CouponCatalog>>,
}

impl CatalogHandle {
    /// Handle publishing `catalog`.
    pub fn new(catalog: CouponCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CouponCatalog> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the snapshot, returning the previous one.
    pub fn publish(&self, catalog: CouponCatalog) -> Arc<CouponCatalog> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        std::mem::replace(&mut *current, Arc::new(catalog))
    }

    /// Build a new catalog from the current one and publish it on success.
    ///
    /// # Errors
    ///
    /// Returns the builder's error; the current snapshot is kept.
    pub fn refresh<E>(
        &self,
        build: impl FnOnce(&CouponCatalog) -> Result<CouponCatalog, E>,
    ) -> Result<CatalogDiff, E> {
        let previous = self.snapshot();
        let next = build(&previous)?;
        let diff = next.diff(&previous);

        self.publish(next);

        Ok(diff)
    }
}
