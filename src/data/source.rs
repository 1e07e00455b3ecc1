use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    data::{
        filter::DateRange,
        observation::Observation,
        table::{IngestStats, RawTable},
    },
    error::{CotResult, SourceError},
};

// ================================================================================================
// Source Formats
// ================================================================================================

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Parquet,
}

impl SourceFormat {
    /// Resolves the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> CotResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                SourceError::UnsupportedFormat(format!(
                    "missing or invalid extension in path '{}'",
                    path.display()
                ))
            })?
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            "xlsx" | "xls" => Err(SourceError::UnsupportedFormat(format!(
                "'{ext}': export the spreadsheet to CSV first"
            ))
            .into()),
            other => Err(SourceError::UnsupportedFormat(format!("'{other}'")).into()),
        }
    }
}

// ================================================================================================
// Fingerprint
// ================================================================================================

/// Identity of a loaded source: where it came from and what it contained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub content_hash: String,
}

impl SourceFingerprint {
    pub fn new(path: impl Into<PathBuf>, bytes: &[u8]) -> Self {
        Self {
            path: path.into(),
            content_hash: blake3::hash(bytes).to_hex().to_string(),
        }
    }
}

// ================================================================================================
// Dataset
// ================================================================================================

/// The immutable, normalized contents of one report file.
///
/// Built once per source and shared read-only across every filter/derive pass.
#[derive(Debug, Clone)]
pub struct Dataset {
    fingerprint: SourceFingerprint,
    observations: Arc<[Observation]>,
    stats: IngestStats,
}

impl Dataset {
    /// Reads, normalizes and coerces a report file.
    ///
    /// # Errors
    /// - [`SourceError`] if the file is missing, unreadable, or of an unknown format.
    /// - [`crate::error::SchemaError`] if required columns are absent.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> CotResult<Self> {
        let path = path.as_ref();
        let bytes = read_source(path)?;
        Self::from_bytes(path, bytes)
    }

    /// Builds a dataset from file contents that were already read.
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> CotResult<Self> {
        let format = SourceFormat::from_path(path)?;
        let fingerprint = SourceFingerprint::new(path, &bytes);
        let table = RawTable::from_bytes(bytes, format, path)?;
        Self::from_table(&table, fingerprint)
    }

    pub fn from_table(table: &RawTable, fingerprint: SourceFingerprint) -> CotResult<Self> {
        let (observations, stats) = table.to_observations()?;

        tracing::info!(
            path = %fingerprint.path.display(),
            rows = stats.kept(),
            dropped = stats.dropped(),
            "Loaded COT report"
        );

        Ok(Self {
            fingerprint,
            observations: observations.into(),
            stats,
        })
    }

    /// Wraps observations that were produced elsewhere; they are re-sorted by date.
    pub fn from_observations(
        fingerprint: SourceFingerprint,
        mut observations: Vec<Observation>,
    ) -> Self {
        crate::data::observation::sort_by_date(&mut observations);
        let stats = IngestStats {
            raw_rows: observations.len(),
            ..Default::default()
        };
        Self {
            fingerprint,
            observations: observations.into(),
            stats,
        }
    }

    pub fn fingerprint(&self) -> &SourceFingerprint {
        &self.fingerprint
    }

    /// All observations, sorted ascending by date across markets.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Raw rows removed during coercion (missing date or market).
    pub fn dropped_rows(&self) -> usize {
        self.stats.dropped()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Sorted, distinct normalized market names.
    pub fn markets(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|o| o.market.as_str())
            .sorted_unstable()
            .dedup()
            .map(str::to_string)
            .collect()
    }

    /// First and last report date across all markets.
    pub fn date_bounds(&self) -> Option<DateRange> {
        let first = self.observations.first()?.date;
        let last = self.observations.last()?.date;
        Some(DateRange::new_unchecked(first, last))
    }

    /// First and last report date of a single market.
    pub fn market_date_bounds(&self, market: &str) -> Option<DateRange> {
        let (min, max) = self
            .observations
            .iter()
            .filter(|o| o.market == market)
            .map(|o| o.date)
            .minmax()
            .into_option()?;
        Some(DateRange::new_unchecked(min, max))
    }

    /// Distinct calendar years present for a market, ascending.
    pub fn market_years(&self, market: &str) -> Vec<i32> {
        use chrono::Datelike;
        self.observations
            .iter()
            .filter(|o| o.market == market)
            .map(|o| o.date.year())
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Latest report date across all markets.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }
}

// ================================================================================================
// Cache
// ================================================================================================

/// Memoizes loaded datasets by path.
///
/// Every lookup re-hashes the file; a cached dataset is reused only if the
/// content hash still matches, otherwise the file is parsed again.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn get_or_load(&mut self, path: impl AsRef<Path>) -> CotResult<Arc<Dataset>> {
        let path = path.as_ref();
        let bytes = read_source(path)?;
        let content_hash = blake3::hash(&bytes).to_hex().to_string();

        if let Some(cached) = self
            .entries
            .get(path)
            .filter(|c| c.fingerprint().content_hash == content_hash)
        {
            tracing::info!("Cache hit: reusing normalized report");
            return Ok(Arc::clone(cached));
        }

        tracing::info!("Cache miss: normalizing report");
        let dataset = Arc::new(Dataset::from_bytes(path, bytes)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drops the cached dataset for `path`. Returns true if one was cached.
    pub fn invalidate(&mut self, path: impl AsRef<Path>) -> bool {
        self.entries.remove(path.as_ref()).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_source(path: &Path) -> CotResult<Vec<u8>> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()).into());
    }
    std::fs::read(path).map_err(|e| {
        SourceError::Unreadable {
            path: path.to_path_buf(),
            cause: e.to_string(),
        }
        .into()
    })
}
