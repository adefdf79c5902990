//! Data models for backlog entities.
//!
//! This module defines the core data structures:
//! - `Entry` - A single work item with a derived priority
//! - `Column` - The sortable columns of the backlog table
//! - `SortOrder` - The active (column, reverse) sort state
//! - `PrioritySettings` - The configured display range for priorities
//! - `PriorityLimits` - The observed raw priority range
//! - `Backlog` - The named collection of entries (see `backlog` submodule)

pub mod backlog;

pub use backlog::Backlog;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A sortable column of the backlog table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Title,
    Score,
    Duration,
    #[default]
    Priority,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Column::Title => "title",
            Column::Score => "score",
            Column::Duration => "duration",
            Column::Priority => "priority",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "title" => Ok(Column::Title),
            "score" => Ok(Column::Score),
            "duration" => Ok(Column::Duration),
            "priority" => Ok(Column::Priority),
            other => Err(Error::InvalidInput(format!("unknown column: {}", other))),
        }
    }
}

/// The active sort state of a backlog: which column entries are ordered by,
/// and whether that order is inverted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SortOrder {
    /// Column the entries are currently ordered by
    #[serde(default)]
    pub column: Column,

    /// Whether the column's natural order is inverted
    #[serde(default)]
    pub reverse: bool,
}

/// The output range used to rescale raw priorities for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrioritySettings {
    /// Lower bound of the display range
    pub min: f64,

    /// Upper bound of the display range
    pub max: f64,
}

impl Default for PrioritySettings {
    fn default() -> Self {
        Self { min: 0.0, max: 100.0 }
    }
}

/// The observed min/max raw priority across current entries.
///
/// For an empty collection both bounds are 0 so no unbounded sentinel ever
/// escapes into the rescale transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityLimits {
    /// Largest raw priority
    pub max: f64,

    /// Smallest raw priority
    pub min: f64,
}

/// Normalize a title to its canonical entry id: lowercase, spaces replaced
/// by underscores.
///
/// The normalization is lossy and one-way; the original-case title is kept
/// on the entry as the display value. Idempotent: `entry_id(entry_id(x)) ==
/// entry_id(x)`.
pub fn entry_id(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

/// A single work item with a derived priority.
///
/// `priority` is always `score / duration`; it is recomputed on every edit
/// and never drifts from its inputs while the entry lives in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    title: String,
    score: f64,
    duration: f64,
    priority: f64,
}

impl Entry {
    /// Create a new entry with `priority = score / duration`.
    ///
    /// Rejects an empty title and a zero duration (the divisor).
    pub fn new(title: &str, score: f64, duration: f64) -> Result<Self> {
        validate_fields(title, score, duration)?;
        Ok(Self {
            title: title.to_string(),
            score,
            duration,
            priority: score / duration,
        })
    }

    /// Reconstruct an entry from persisted fields, trusting the stored
    /// priority verbatim instead of re-deriving it.
    pub(crate) fn from_parts(
        title: &str,
        score: f64,
        duration: f64,
        priority: f64,
    ) -> Result<Self> {
        validate_fields(title, score, duration)?;
        Ok(Self {
            title: title.to_string(),
            score,
            duration,
            priority,
        })
    }

    /// Overwrite all three fields and recompute the priority.
    ///
    /// There is no partial edit; callers pass the current value for fields
    /// they don't intend to change.
    pub fn edit(&mut self, new_title: &str, new_score: f64, new_duration: f64) -> Result<()> {
        validate_fields(new_title, new_score, new_duration)?;
        self.title = new_title.to_string();
        self.score = new_score;
        self.duration = new_duration;
        self.priority = new_score / new_duration;
        Ok(())
    }

    /// The canonical id of this entry, derived from its title.
    pub fn id(&self) -> String {
        entry_id(&self.title)
    }

    /// Original-case display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Derived raw priority (`score / duration`).
    pub fn priority(&self) -> f64 {
        self.priority
    }
}

fn validate_fields(title: &str, score: f64, duration: f64) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("title must not be empty".to_string()));
    }
    if !score.is_finite() {
        return Err(Error::InvalidInput("score must be a finite number".to_string()));
    }
    if !duration.is_finite() {
        return Err(Error::InvalidInput(
            "duration must be a finite number".to_string(),
        ));
    }
    if duration == 0.0 {
        return Err(Error::InvalidInput("duration must not be zero".to_string()));
    }
    Ok(())
}

/// Linearly remap a raw priority from the observed range onto the configured
/// display range, rounded to the nearest integer.
///
/// A degenerate observed range (`max == min`, including the single-entry
/// case) substitutes `min = 0` before dividing. If the range is still zero
/// the result anchors to `settings.min`.
pub fn scaled_priority(
    priority: f64,
    limits: PriorityLimits,
    settings: PrioritySettings,
) -> i64 {
    let limit_min = if limits.max == limits.min { 0.0 } else { limits.min };
    let range = limits.max - limit_min;
    if range == 0.0 {
        return settings.min.round() as i64;
    }
    let scaled = (priority - limit_min) / range * (settings.max - settings.min) + settings.min;
    scaled.round() as i64
}
