use std::{
    collections::{BTreeSet, HashSet},
    sync::LazyLock,
};

use polars::prelude::PlSmallStr;
use regex::Regex;
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::SchemaError;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

/// The logical columns of a CFTC Commitments of Traders report, addressed by
/// their normalized header text as published on the CFTC portal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
pub enum ReportCol {
    #[strum(serialize = "Market and Exchange Names")]
    Market,
    /// Despite the header text, cells are accepted in day-first format.
    #[strum(serialize = "As of Date in Form YYYY-MM-DD")]
    Date,
    #[strum(serialize = "Open Interest (All)")]
    OpenInterest,
    #[strum(serialize = "Noncommercial Positions-Long (All)")]
    NoncommercialLong,
    #[strum(serialize = "Noncommercial Positions-Short (All)")]
    NoncommercialShort,
    #[strum(serialize = "Commercial Positions-Long (All)")]
    CommercialLong,
    #[strum(serialize = "Commercial Positions-Short (All)")]
    CommercialShort,
}

impl From<ReportCol> for PlSmallStr {
    fn from(value: ReportCol) -> Self {
        value.as_str().into()
    }
}

impl ReportCol {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Open interest is optional; every other column must be present.
    pub fn is_required(&self) -> bool {
        !matches!(self, Self::OpenInterest)
    }

    /// Header text of every required column, in declaration order.
    pub fn required() -> Vec<&'static str> {
        Self::iter()
            .filter(ReportCol::is_required)
            .map(|c| c.as_str())
            .collect()
    }
}

/// Collapses every run of whitespace (including embedded line breaks) to a
/// single space and trims both ends.
pub fn normalize_header(header: &str) -> String {
    WHITESPACE_RUN.replace_all(header, " ").trim().to_string()
}

/// Normalizes every header, preserving order.
pub fn normalize_headers<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    headers
        .into_iter()
        .map(|h| normalize_header(h.as_ref()))
        .collect()
}

/// Verifies that every `required` column is present.
///
/// # Errors
/// Returns [`SchemaError::MissingColumns`] listing **all** absent columns in
/// the order they were requested.
pub fn check_required<S: AsRef<str>>(
    columns: &HashSet<String>,
    required: &[S],
) -> Result<(), SchemaError> {
    let missing = required
        .iter()
        .map(|name| -> &str { name.as_ref() })
        .filter(|name| !columns.contains(*name))
        .map(str::to_string)
        .collect::<Vec<_>>();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns { names: missing })
    }
}

/// Returns the first normalized header that occurs more than once.
pub(crate) fn find_duplicate(headers: &[String]) -> Option<&str> {
    let mut seen = BTreeSet::new();
    headers
        .iter()
        .find(|h| !seen.insert(h.as_str()))
        .map(String::as_str)
}
