//! Per-language byte totals across a user's repositories.
//!
//! Each repository needs its own request for its language breakdown. Those
//! requests are best-effort: a repository whose breakdown is missing, refused
//! or unreadable simply contributes nothing, and the rest are still counted.
//! Aggregation therefore never fails. When nothing at all could be counted
//! the result holds a single [`FALLBACK_LABEL`] entry whose value is the number
//! of repositories examined.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::RepositorySummary;

/// Key of the synthetic entry used when no repository reported any language.
pub const FALLBACK_LABEL: &str = "Other";

/// Raw answer to one breakdown request.
#[derive(Debug, Clone)]
pub struct Breakdown {
    pub status: StatusCode,
    pub body: Value,
}

/// The breakdown request never produced a usable response (connection
/// failure, timeout, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFault(pub String);

impl fmt::Display for FetchFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<reqwest::Error> for FetchFault {
    fn from(e: reqwest::Error) -> Self {
        FetchFault(e.to_string())
    }
}

/// Anything that can resolve a breakdown locator into a response.
pub trait BreakdownSource {
    fn fetch_breakdown(
        &self,
        locator: &str,
    ) -> impl Future<Output = Result<Breakdown, FetchFault>>;
}

/// What happened to a single repository during aggregation. Only
/// `Contributed` feeds the totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    Contributed(Vec<(String, u64)>),
    NoLocator,
    Rejected(StatusCode),
    Failed(String),
}

/// Language name to cumulative byte count. Never empty once produced by
/// [`LanguageAggregator::aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageByteMap {
    totals: BTreeMap<String, u64>,
    fallback: bool,
}

impl LanguageByteMap {
    /// The synthetic result for a run where no repository reported anything.
    pub fn fallback(examined: usize) -> Self {
        let mut totals = BTreeMap::new();
        totals.insert(FALLBACK_LABEL.to_string(), examined as u64);
        LanguageByteMap {
            totals,
            fallback: true,
        }
    }

    fn finish(totals: BTreeMap<String, u64>, examined: usize) -> Self {
        if totals.is_empty() {
            return Self::fallback(examined);
        }
        LanguageByteMap {
            totals,
            fallback: false,
        }
    }

    #[cfg(test)]
    pub fn get(&self, language: &str) -> Option<u64> {
        self.totals.get(language).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Entries in the map's own (alphabetical) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.totals.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> u64 {
        self.totals.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// True when no repository reported any language data and the single
    /// entry is the synthetic repository count. A real language that happens
    /// to be called "Other" does not count.
    pub fn is_fallback_only(&self) -> bool {
        self.fallback
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for LanguageByteMap {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        LanguageByteMap {
            totals: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            fallback: false,
        }
    }
}

pub struct LanguageAggregator<'a, S> {
    source: &'a S,
    verbose: bool,
}

impl<'a, S: BreakdownSource> LanguageAggregator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            verbose: false,
        }
    }

    /// Emit diagnostic lines on the `lang_trace` target while aggregating.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sum language bytes over `repos`, one request per repository, in order.
    pub async fn aggregate(&self, repos: &[RepositorySummary]) -> LanguageByteMap {
        let mut totals: BTreeMap<String, u64> = BTreeMap::new();

        for (i, repo) in repos.iter().enumerate() {
            let index = i + 1;
            let entries = match self.examine(index, repo).await {
                RepoOutcome::Contributed(entries) => entries,
                RepoOutcome::NoLocator => continue,
                RepoOutcome::Rejected(status) => {
                    debug!(index, status = status.as_u16(), "breakdown refused, skipping");
                    continue;
                }
                RepoOutcome::Failed(reason) => {
                    debug!(index, %reason, "breakdown unavailable, skipping");
                    continue;
                }
            };

            for (language, bytes) in entries {
                let total = totals.entry(language.clone()).or_insert(0);
                *total = total.saturating_add(bytes);
                if self.verbose {
                    info!(target: "lang_trace", index, %language, bytes, total = *total, "add");
                }
            }
        }

        let map = LanguageByteMap::finish(totals, repos.len());
        if map.is_fallback_only() {
            debug!(examined = repos.len(), "no language data, using fallback entry");
        }
        map
    }

    /// Fetch and decode one repository's breakdown.
    pub async fn examine(&self, index: usize, repo: &RepositorySummary) -> RepoOutcome {
        let name = repo.display_name();

        let Some(locator) = repo.breakdown_locator() else {
            if self.verbose {
                info!(target: "lang_trace", index, repo = name, "skip: no languages_url");
            }
            return RepoOutcome::NoLocator;
        };

        if self.verbose {
            info!(target: "lang_trace", index, repo = name, url = locator, "GET");
        }

        let breakdown = match self.source.fetch_breakdown(locator).await {
            Ok(b) => b,
            Err(fault) => {
                if self.verbose {
                    info!(target: "lang_trace", index, repo = name, error = %fault, "request failed");
                }
                return RepoOutcome::Failed(fault.0);
            }
        };

        if self.verbose {
            info!(target: "lang_trace", index, status = breakdown.status.as_u16(), "response");
        }

        if !breakdown.status.is_success() {
            return RepoOutcome::Rejected(breakdown.status);
        }

        match decode_breakdown(name, &breakdown.body) {
            Some(entries) => RepoOutcome::Contributed(entries),
            None => {
                if self.verbose {
                    info!(target: "lang_trace", index, repo = name, "breakdown is not a JSON object");
                }
                RepoOutcome::Failed("breakdown is not a JSON object".to_string())
            }
        }
    }
}

/// Turn `{"Rust": 1234, ...}` into pairs, dropping counts that aren't
/// non-negative numbers. `None` if the body isn't an object at all.
fn decode_breakdown(repo: &str, body: &Value) -> Option<Vec<(String, u64)>> {
    let object = body.as_object()?;
    let mut entries = Vec::with_capacity(object.len());

    for (language, raw) in object {
        match coerce_bytes(raw) {
            Some(bytes) => entries.push((language.clone(), bytes)),
            None => warn!(repo, %language, value = %raw, "ignoring invalid byte count"),
        }
    }

    Some(entries)
}

/// Integers as-is, non-negative floats truncated, digit strings parsed.
fn coerce_bytes(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Some(v)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            }
        }
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
