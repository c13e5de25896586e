//! Collection of rendering and validation failures.
//!
//! Callers that prepare listings for display pass a [`DiagnosticsSink`]
//! explicitly. [`ErrorMonitor`] keeps failures in memory and can summarise
//! them; [`NullSink`] discards them.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Number of entries returned by [`ErrorStats::recent`]
const RECENT_LIMIT: usize = 10;
/// Number of entries returned by [`ErrorStats::top_errors`]
const TOP_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Component {
    SafeImage,
    SafeLink,
    SafeMap,
    Validation,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::SafeImage => "SafeImage",
            Component::SafeLink => "SafeLink",
            Component::SafeMap => "SafeMap",
            Component::Validation => "Validation",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ImageLoadFailed,
    InvalidLinkData,
    MapRenderingFailed,
    ValidationFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::ImageLoadFailed => "image_load_failed",
            ErrorKind::InvalidLinkData => "invalid_link_data",
            ErrorKind::MapRenderingFailed => "map_rendering_failed",
            ErrorKind::ValidationFailed => "validation_failed",
        })
    }
}

/// Receiver for failures noticed while preparing listings for display
pub trait DiagnosticsSink {
    fn record(&mut self, component: Component, kind: ErrorKind, details: Vec<String>);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&mut self, _component: Component, _kind: ErrorKind, _details: Vec<String>) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRecord {
    pub timestamp: DateTime<Utc>,
    pub component: Component,
    pub kind: ErrorKind,
    pub details: Vec<String>,
}

impl DiagnosticRecord {
    /// Grouping key, e.g. `SafeImage:validation_failed`
    pub fn key(&self) -> String {
        format!("{}:{}", self.component, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopError {
    pub error: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStats {
    pub total_errors: usize,
    pub by_component: BTreeMap<Component, usize>,
    pub by_kind: BTreeMap<ErrorKind, usize>,
    /// Latest entries, oldest first
    pub recent: Vec<DiagnosticRecord>,
    pub top_errors: Vec<TopError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Stable,
    Increasing,
    Decreasing,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Stable => "stable",
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTrend {
    pub recent_count: usize,
    pub trend: Trend,
    /// Entries per UTC hour of day
    pub hourly_breakdown: BTreeMap<u32, usize>,
}

/// In-memory failure log
#[derive(Debug, Clone)]
pub struct ErrorMonitor {
    enabled: bool,
    entries: Vec<DiagnosticRecord>,
    counts: BTreeMap<String, usize>,
}

impl Default for ErrorMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ErrorMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn entries(&self) -> &[DiagnosticRecord] {
        &self.entries
    }

    /// Record a failure with an explicit timestamp
    pub fn record_at(
        &mut self,
        timestamp: DateTime<Utc>,
        component: Component,
        kind: ErrorKind,
        details: Vec<String>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = DiagnosticRecord {
            timestamp,
            component,
            kind,
            details,
        };

        tracing::warn!(
            component = %entry.component,
            kind = %entry.kind,
            details = ?entry.details,
            "{} error",
            entry.component
        );

        *self.counts.entry(entry.key()).or_insert(0) += 1;
        self.entries.push(entry);
    }

    pub fn stats(&self) -> ErrorStats {
        let mut by_component = BTreeMap::new();
        let mut by_kind = BTreeMap::new();
        for entry in &self.entries {
            *by_component.entry(entry.component).or_insert(0) += 1;
            *by_kind.entry(entry.kind).or_insert(0) += 1;
        }

        let mut top_errors: Vec<TopError> = self
            .counts
            .iter()
            .map(|(error, count)| TopError {
                error: error.clone(),
                count: *count,
            })
            .collect();
        // counts is a BTreeMap, so equal counts stay in key order
        top_errors.sort_by(|a, b| b.count.cmp(&a.count));
        top_errors.truncate(TOP_LIMIT);

        let skip = self.entries.len().saturating_sub(RECENT_LIMIT);

        ErrorStats {
            total_errors: self.entries.len(),
            by_component,
            by_kind,
            recent: self.entries[skip..].to_vec(),
            top_errors,
        }
    }

    /// Trend over the trailing `window`, ending now
    pub fn trend(&self, window: Duration) -> ErrorTrend {
        self.trend_at(Utc::now(), window)
    }

    /// Trend over the trailing 24 hours
    pub fn daily_trend(&self) -> ErrorTrend {
        self.trend(Duration::hours(24))
    }

    /// Trend over the `window` ending at `now`. The window is split in two
    /// halves of equal length and their counts are compared.
    pub fn trend_at(&self, now: DateTime<Utc>, window: Duration) -> ErrorTrend {
        let cutoff = now - window;
        let midpoint = cutoff + window / 2;

        let recent: Vec<&DiagnosticRecord> = self
            .entries
            .iter()
            .filter(|entry| entry.timestamp > cutoff && entry.timestamp <= now)
            .collect();

        let first_half = recent.iter().filter(|e| e.timestamp <= midpoint).count();
        let second_half = recent.len() - first_half;

        let trend = if recent.len() < 2 {
            Trend::Stable
        } else if second_half as f64 > first_half as f64 * 1.2 {
            Trend::Increasing
        } else if (second_half as f64) < first_half as f64 * 0.8 {
            Trend::Decreasing
        } else {
            Trend::Stable
        };

        let mut hourly_breakdown = BTreeMap::new();
        for entry in &recent {
            *hourly_breakdown.entry(entry.timestamp.hour()).or_insert(0) += 1;
        }

        ErrorTrend {
            recent_count: recent.len(),
            trend,
            hourly_breakdown,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts.clear();
    }
}

impl DiagnosticsSink for ErrorMonitor {
    fn record(&mut self, component: Component, kind: ErrorKind, details: Vec<String>) {
        self.record_at(Utc::now(), component, kind, details);
    }
}
