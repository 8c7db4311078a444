//! Ingestion
//!
//! Adapters turning raw per-source records into canonical [`Coupon`]s. A bad
//! record or batch never aborts a run: it is skipped and reported through the
//! [`IngestReport`] returned alongside the coupons.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;
use tracing::{info, warn};

use crate::{coupons::Coupon, time::TimeError};

pub mod app;
pub mod paper;

pub use app::{AppIngestor, PaybackIngestor};
pub use paper::{ExtraInfo, ExtraInfoTable, PaperIngestor, PaperSettings};

/// Errors raised while reading or converting raw records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,

        /// Underlying IO error
        source: std::io::Error,
    },

    /// Batch contents are not a JSON array
    #[error("malformed batch: {0}")]
    Json(#[from] serde_json::Error),

    /// A record did not match the expected shape
    #[error("record {index}: {source}")]
    Record {
        /// Position of the record in its batch
        index: usize,

        /// Deserialization error
        source: serde_json::Error,
    },

    /// A date inside a record could not be parsed
    #[error("record {index}: {source}")]
    Date {
        /// Position of the record in its batch
        index: usize,

        /// Date error
        source: TimeError,
    },

    /// A unix timestamp inside a record is out of range
    #[error("record {index}: timestamp {seconds} out of range")]
    Timestamp {
        /// Position of the record in its batch
        index: usize,

        /// Offending value
        seconds: i64,
    },
}

impl IngestError {
    /// Index of the record that failed, if the error is record-level.
    pub fn index(&self) -> Option<usize> {
        match self {
            IngestError::Record { index, .. }
            | IngestError::Date { index, .. }
            | IngestError::Timestamp { index, .. } => Some(*index),
            IngestError::Io { .. } | IngestError::Json(_) => None,
        }
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Expected, deterministically resolved condition
    Info,

    /// Data-integrity fault worth an operator's attention
    Warning,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Records inside one paper batch carry different expiry dates
    MismatchedExpireDates {
        /// Batch identifier
        batch: String,

        /// Distinct expiry date strings, sorted
        dates: Vec<String>,
    },

    /// A paper batch does not hold the expected number of records
    UnexpectedCount {
        /// Batch identifier
        batch: String,

        /// Configured count
        expected: usize,

        /// Actual count
        found: usize,
    },

    /// No extra-info entry exists for an expiry date
    MissingExtraInfo {
        /// Expiry date string
        expire_date: String,
    },

    /// The extra-info entry for an expiry date has no start date
    MissingStartDate {
        /// Expiry date string
        expire_date: String,
    },

    /// The extra-info entry for an expiry date has no acknowledgement note
    MissingThankYouNote {
        /// Expiry date string
        expire_date: String,
    },

    /// A whole batch was skipped
    BatchSkipped {
        /// Batch identifier
        batch: String,

        /// Index of the failing record, if record-level
        index: Option<usize>,

        /// Error message
        reason: String,
    },

    /// A single record was skipped
    RecordSkipped {
        /// Batch identifier
        batch: String,

        /// Index of the failing record
        index: usize,

        /// Error message
        reason: String,
    },

    /// A record reusing an already seen id or PLU was dropped
    DuplicateSkipped {
        /// Id of the dropped record
        id: String,

        /// The key that collided (`id` or `plu`)
        key: DuplicateKey,

        /// Id of the record that was kept
        kept: String,
    },

    /// A record was accepted without an expiry date and will never be valid
    MissingExpireDate {
        /// Batch identifier
        batch: String,

        /// Coupon id
        id: String,
    },

    /// A later source replaced a coupon with the same id
    IdCollision {
        /// Colliding id
        id: String,
    },
}

/// Which key a duplicate was detected on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateKey {
    /// Coupon id
    Id,

    /// PLU code
    Plu(String),
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MismatchedExpireDates { batch, dates } => {
                write!(f, "{batch}: mismatched expire dates {dates:?}")
            }
            DiagnosticKind::UnexpectedCount {
                batch,
                expected,
                found,
            } => write!(f, "{batch}: expected {expected} paper coupons, found {found}"),
            DiagnosticKind::MissingExtraInfo { expire_date } => {
                write!(f, "no extra info for expire date {expire_date}")
            }
            DiagnosticKind::MissingStartDate { expire_date } => {
                write!(f, "no start date for expire date {expire_date}")
            }
            DiagnosticKind::MissingThankYouNote { expire_date } => {
                write!(f, "no thank you note for expire date {expire_date}")
            }
            DiagnosticKind::BatchSkipped {
                batch,
                index,
                reason,
            } => match index {
                Some(index) => write!(f, "{batch}: skipped at record {index}: {reason}"),
                None => write!(f, "{batch}: skipped: {reason}"),
            },
            DiagnosticKind::RecordSkipped {
                batch,
                index,
                reason,
            } => write!(f, "{batch}: skipped record {index}: {reason}"),
            DiagnosticKind::DuplicateSkipped { id, key, kept } => match key {
                DuplicateKey::Id => write!(f, "dropped duplicate id {id}"),
                DuplicateKey::Plu(plu) => {
                    write!(f, "dropped {id}: PLU {plu} already used by {kept}")
                }
            },
            DiagnosticKind::MissingExpireDate { batch, id } => {
                write!(f, "{batch}: coupon {id} has no expire date")
            }
            DiagnosticKind::IdCollision { id } => write!(f, "id {id} replaced by later source"),
        }
    }
}

impl DiagnosticKind {
    /// Severity this kind is reported at.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DuplicateSkipped { .. } | DiagnosticKind::IdCollision { .. } => {
                Severity::Info
            }
            _ => Severity::Warning,
        }
    }
}

/// A single ingestion diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,

    /// What happened
    pub kind: DiagnosticKind,
}

/// Diagnostics collected during one ingestion run.
///
/// Every diagnostic is also emitted through `tracing` when it is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    diagnostics: Vec<Diagnostic>,
}

impl IngestReport {
    /// Record a diagnostic at its kind's severity.
    pub fn record(&mut self, kind: DiagnosticKind) {
        let severity = kind.severity();

        match severity {
            Severity::Info => info!(diagnostic = %kind, "ingestion"),
            Severity::Warning => warn!(diagnostic = %kind, "ingestion"),
        }

        self.diagnostics.push(Diagnostic { severity, kind });
    }

    /// All diagnostics in recording order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticKind> {
        self.at(Severity::Warning)
    }

    /// Informational diagnostics only.
    pub fn infos(&self) -> impl Iterator<Item = &DiagnosticKind> {
        self.at(Severity::Info)
    }

    /// Whether any warning was recorded.
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Append another report.
    pub fn merge(&mut self, other: IngestReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    fn at(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticKind> {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.severity == severity)
            .map(|diagnostic| &diagnostic.kind)
    }
}

/// One raw batch of records and where it came from.
///
/// File batches are read when their records are requested, so an unreadable
/// file fails only its own batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatch {
    /// Batch identifier used in diagnostics
    pub source: String,

    input: BatchInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BatchInput {
    Inline(String),
    File(PathBuf),
}

impl RawBatch {
    /// Create a batch from in-memory contents.
    pub fn new(source: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            input: BatchInput::Inline(contents.into()),
        }
    }

    /// Create a batch backed by a file, using the file name as identifier.
    pub fn from_file(path: &Path) -> Self {
        let source = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );

        Self {
            source,
            input: BatchInput::File(path.to_path_buf()),
        }
    }

    /// Split the batch into untyped records so each can fail on its own.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if a file batch cannot be read and
    /// [`IngestError::Json`] if the contents are not a JSON array.
    pub fn records(&self) -> Result<Vec<serde_json::Value>, IngestError> {
        match &self.input {
            BatchInput::Inline(contents) => Ok(serde_json::from_str(contents)?),
            BatchInput::File(path) => {
                let contents = fs::read_to_string(path).map_err(|source| IngestError::Io {
                    path: path.clone(),
                    source,
                })?;

                Ok(serde_json::from_str(&contents)?)
            }
        }
    }
}

/// Deserialize an optional price in minor units.
///
/// Sources store prices as JSON numbers; whole-valued floats (`299.0`) are
/// accepted, fractional minor units are not.
pub(crate) fn minor_units<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Some(units) = number.as_i64() {
        return Ok(Some(units));
    }

    number
        .as_f64()
        .and_then(|value| Decimal::try_from(value).ok())
        .filter(|value| value.fract().is_zero())
        .and_then(|value| i64::try_from(value).ok())
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("price {number} is not whole minor units")))
}

/// Coupons produced by one adapter run.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Accepted coupons, in adapter order
    pub coupons: Vec<Coupon>,

    /// What went wrong along the way
    pub report: IngestReport,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn reads_batch_from_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("coupons.json");

        fs::write(&path, "[]")?;

        let batch = RawBatch::from_file(&path);

        assert_eq!(batch.source, "coupons.json");
        assert!(batch.records()?.is_empty());

        Ok(())
    }

    #[test]
    fn missing_file_fails_on_read() -> TestResult {
        let dir = tempfile::tempdir()?;
        let batch = RawBatch::from_file(&dir.path().join("missing.json"));

        assert_eq!(batch.source, "missing.json");
        assert!(matches!(batch.records(), Err(IngestError::Io { .. })));

        Ok(())
    }

    #[derive(Debug, Deserialize)]
    struct Priced {
        #[serde(default, deserialize_with = "minor_units")]
        price: Option<i64>,
    }

    #[test]
    fn minor_units_accept_whole_floats() -> Result<(), serde_json::Error> {
        let price = |json: &str| serde_json::from_str::<Priced>(json).map(|priced| priced.price);

        assert_eq!(price(r#"{"price": 299}"#)?, Some(299));
        assert_eq!(price(r#"{"price": 299.0}"#)?, Some(299));
        assert_eq!(price(r#"{"price": null}"#)?, None);
        assert_eq!(price("{}")?, None);
        assert!(price(r#"{"price": 2.5}"#).is_err());
        assert!(price(r#"{"price": "299"}"#).is_err());

        Ok(())
    }

    #[test]
    fn records_require_an_array() {
        assert!(matches!(
            RawBatch::new("x", r#"{"id": 1}"#).records(),
            Err(IngestError::Json(_))
        ));
    }

    #[test]
    fn severity_follows_kind() {
        let mut report = IngestReport::default();

        report.record(DiagnosticKind::IdCollision {
            id: "1".to_string(),
        });

        assert!(!report.has_warnings());

        report.record(DiagnosticKind::MissingExtraInfo {
            expire_date: "8.11.2024".to_string(),
        });

        assert!(report.has_warnings());
        assert_eq!(report.infos().count(), 1);
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.diagnostics().len(), 2);
    }

    #[test]
    fn batch_skipped_message_includes_index() {
        let kind = DiagnosticKind::BatchSkipped {
            batch: "coupons.json".to_string(),
            index: Some(3),
            reason: "bad price".to_string(),
        };

        assert_eq!(kind.to_string(), "coupons.json: skipped at record 3: bad price");
    }
}
