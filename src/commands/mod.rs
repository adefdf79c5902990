//! Command implementations for the backlog CLI.
//!
//! Each command loads the workspace's backlog snapshot, applies one model
//! operation, saves the snapshot when it mutated anything, and returns a
//! result struct that can be printed as JSON or human-readable text.
//!
//! Validation failures propagate as errors before anything is saved, so a
//! failed command never changes the snapshot on disk.

use crate::csv;
use crate::models::{
    Backlog, Column, Entry, PriorityLimits, PrioritySettings, SortOrder, entry_id,
    scaled_priority,
};
use crate::storage::Storage;
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// One entry as presented to the user: raw fields plus the rescaled
/// display priority.
#[derive(Debug, Serialize)]
pub struct EntryRow {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub duration: f64,
    pub priority: f64,
    pub scaled_priority: i64,
}

impl EntryRow {
    fn new(entry: &Entry, limits: PriorityLimits, settings: PrioritySettings) -> Self {
        Self {
            id: entry.id(),
            title: entry.title().to_string(),
            score: entry.score(),
            duration: entry.duration(),
            priority: entry.priority(),
            scaled_priority: scaled_priority(entry.priority(), limits, settings),
        }
    }
}

/// Render entry rows as an aligned table.
fn render_table(entries: &[EntryRow]) -> String {
    let id_width = entries
        .iter()
        .map(|e| e.id.len())
        .chain(std::iter::once("ID".len()))
        .max()
        .unwrap_or(2);
    let title_width = entries
        .iter()
        .map(|e| e.title.len())
        .chain(std::iter::once("TITLE".len()))
        .max()
        .unwrap_or(5);

    let mut out = format!(
        "{:<id_width$}  {:<title_width$}  {:>8}  {:>8}  {:>8}\n",
        "ID", "TITLE", "SCORE", "DURATION", "PRIORITY"
    );
    for entry in entries {
        out.push_str(&format!(
            "{:<id_width$}  {:<title_width$}  {:>8}  {:>8}  {:>8}\n",
            entry.id, entry.title, entry.score, entry.duration, entry.scaled_priority
        ));
    }
    out
}

fn rows(backlog: &Backlog) -> Vec<EntryRow> {
    let limits = backlog.priority_limits();
    let settings = backlog.priority_settings();
    backlog
        .sorted_entries()
        .into_iter()
        .map(|entry| EntryRow::new(entry, limits, settings))
        .collect()
}

// === add ===

#[derive(Debug, Serialize)]
pub struct AddResult {
    pub entry: EntryRow,
}

impl Output for AddResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Added \"{}\" ({}): score {}, duration {}, priority {}",
            self.entry.title, self.entry.id, self.entry.score, self.entry.duration,
            self.entry.priority
        )
    }
}

/// Add a new entry. A duplicate normalized title is a reported failure and
/// leaves the snapshot untouched.
pub fn add(workspace: &Path, title: &str, score: f64, duration: f64) -> Result<AddResult> {
    let storage = Storage::open(workspace)?;
    let mut backlog = storage.load()?;

    let id = entry_id(title);
    if !backlog.add_entry(title, score, duration)? {
        return Err(Error::InvalidInput(format!(
            "an entry with id '{}' already exists",
            id
        )));
    }
    storage.save(&backlog)?;

    let entry = backlog
        .get_entry(&id)
        .ok_or_else(|| Error::Other(format!("entry '{}' missing after insert", id)))?;
    Ok(AddResult {
        entry: EntryRow::new(entry, backlog.priority_limits(), backlog.priority_settings()),
    })
}

// === edit ===

#[derive(Debug, Serialize)]
pub struct EditResult {
    pub old_id: String,
    pub entry: EntryRow,
}

impl Output for EditResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.old_id == self.entry.id {
            format!(
                "Updated {}: score {}, duration {}, priority {}",
                self.entry.id, self.entry.score, self.entry.duration, self.entry.priority
            )
        } else {
            format!(
                "Updated {} -> {}: score {}, duration {}, priority {}",
                self.old_id, self.entry.id, self.entry.score, self.entry.duration,
                self.entry.priority
            )
        }
    }
}

/// Edit an entry, overwriting all three fields. Renames re-key the entry
/// under its new normalized title.
pub fn edit(
    workspace: &Path,
    id: &str,
    new_title: &str,
    new_score: f64,
    new_duration: f64,
) -> Result<EditResult> {
    let storage = Storage::open(workspace)?;
    let mut backlog = storage.load()?;

    backlog.edit_entry(id, new_title, new_score, new_duration)?;
    storage.save(&backlog)?;

    let new_id = entry_id(new_title);
    let entry = backlog
        .get_entry(&new_id)
        .ok_or_else(|| Error::Other(format!("entry '{}' missing after edit", new_id)))?;
    Ok(EditResult {
        old_id: id.to_string(),
        entry: EntryRow::new(entry, backlog.priority_limits(), backlog.priority_settings()),
    })
}

// === delete ===

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub deleted: Vec<String>,
    pub skipped: Vec<String>,
}

impl Output for DeleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Deleted {} entries", self.deleted.len());
        for id in &self.deleted {
            out.push_str(&format!("\n  - {}", id));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!("\nSkipped {} unknown ids", self.skipped.len()));
            for id in &self.skipped {
                out.push_str(&format!("\n  - {}", id));
            }
        }
        out
    }
}

/// Delete entries by id. Unknown ids are skipped, not errors.
pub fn delete(workspace: &Path, ids: &[String]) -> Result<DeleteResult> {
    let storage = Storage::open(workspace)?;
    let mut backlog = storage.load()?;

    let mut deleted = Vec::new();
    let mut skipped = Vec::new();
    for id in ids {
        if backlog.delete_entry(id) {
            deleted.push(id.clone());
        } else {
            skipped.push(id.clone());
        }
    }
    if !deleted.is_empty() {
        storage.save(&backlog)?;
    }
    Ok(DeleteResult { deleted, skipped })
}

// === show ===

#[derive(Debug, Serialize)]
pub struct ShowResult {
    pub entry: EntryRow,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "{} ({})\n  score:    {}\n  duration: {}\n  priority: {} (displayed as {})",
            self.entry.title,
            self.entry.id,
            self.entry.score,
            self.entry.duration,
            self.entry.priority,
            self.entry.scaled_priority
        )
    }
}

/// Show a single entry by id.
pub fn show(workspace: &Path, id: &str) -> Result<ShowResult> {
    let storage = Storage::open(workspace)?;
    let backlog = storage.load()?;

    let entry = backlog
        .get_entry(id)
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    Ok(ShowResult {
        entry: EntryRow::new(entry, backlog.priority_limits(), backlog.priority_settings()),
    })
}

// === list ===

#[derive(Debug, Serialize)]
pub struct ListResult {
    pub name: String,
    pub sort_order: SortOrder,
    pub limits: PriorityLimits,
    pub count: usize,
    pub entries: Vec<EntryRow>,
}

impl Output for ListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let direction = if self.sort_order.reverse { " (reversed)" } else { "" };
        let mut out = format!(
            "{} - {} entries, sorted by {}{}\n",
            self.name, self.count, self.sort_order.column, direction
        );
        if self.entries.is_empty() {
            out.push_str("(empty)\n");
        } else {
            out.push_str(&render_table(&self.entries));
        }
        out
    }
}

/// List all entries in the live sort order with display priorities.
pub fn list(workspace: &Path) -> Result<ListResult> {
    let storage = Storage::open(workspace)?;
    let backlog = storage.load()?;

    Ok(ListResult {
        name: backlog.name().to_string(),
        sort_order: backlog.sort_order(),
        limits: backlog.priority_limits(),
        count: backlog.len(),
        entries: rows(&backlog),
    })
}

// === sort ===

#[derive(Debug, Serialize)]
pub struct SortResult {
    pub sort_order: SortOrder,
    pub entries: Vec<EntryRow>,
}

impl Output for SortResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let direction = if self.sort_order.reverse { " (reversed)" } else { "" };
        format!(
            "Sorted by {}{}\n{}",
            self.sort_order.column,
            direction,
            render_table(&self.entries)
        )
    }
}

/// Toggle the sort order: the current column flips direction, a new column
/// is selected in its natural direction. The state persists in the
/// snapshot.
pub fn sort(workspace: &Path, column: Column) -> Result<SortResult> {
    let storage = Storage::open(workspace)?;
    let mut backlog = storage.load()?;

    backlog.sort_by(column);
    storage.save(&backlog)?;

    Ok(SortResult {
        sort_order: backlog.sort_order(),
        entries: rows(&backlog),
    })
}

// === name ===

#[derive(Debug, Serialize)]
pub struct NameResult {
    pub name: String,
    pub changed: bool,
}

impl Output for NameResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.changed {
            format!("Renamed backlog to \"{}\"", self.name)
        } else {
            format!("Backlog name: \"{}\"", self.name)
        }
    }
}

/// Show or change the backlog name.
pub fn name(workspace: &Path, new_name: Option<&str>) -> Result<NameResult> {
    let storage = Storage::open(workspace)?;
    let mut backlog = storage.load()?;

    match new_name {
        Some(new_name) => {
            backlog.set_name(new_name)?;
            storage.save(&backlog)?;
            Ok(NameResult { name: backlog.name().to_string(), changed: true })
        }
        None => Ok(NameResult { name: backlog.name().to_string(), changed: false }),
    }
}

// === scale ===

#[derive(Debug, Serialize)]
pub struct ScaleResult {
    pub priority_settings: PrioritySettings,
}

impl Output for ScaleResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Priority display range: {} to {}",
            self.priority_settings.min, self.priority_settings.max
        )
    }
}

/// Set the display range used when rescaling priorities.
pub fn scale(workspace: &Path, min: f64, max: f64) -> Result<ScaleResult> {
    let storage = Storage::open(workspace)?;
    let mut backlog = storage.load()?;

    backlog.set_priority_settings(min, max)?;
    storage.save(&backlog)?;

    Ok(ScaleResult { priority_settings: backlog.priority_settings() })
}

// === limits ===

#[derive(Debug, Serialize)]
pub struct LimitsResult {
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

impl Output for LimitsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Raw priority limits over {} entries: min {}, max {}",
            self.count, self.min, self.max
        )
    }
}

/// Report the observed raw priority range.
pub fn limits(workspace: &Path) -> Result<LimitsResult> {
    let storage = Storage::open(workspace)?;
    let backlog = storage.load()?;

    let limits = backlog.priority_limits();
    Ok(LimitsResult { max: limits.max, min: limits.min, count: backlog.len() })
}

// === export / import ===

#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub path: String,
    pub format: String,
    pub entries: usize,
}

impl Output for ExportResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Exported {} entries to {} ({})", self.entries, self.path, self.format)
    }
}

#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub path: String,
    pub format: String,
    pub name: String,
    pub entries: usize,
}

impl Output for ImportResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Imported \"{}\" ({} entries) from {} ({})",
            self.name, self.entries, self.path, self.format
        )
    }
}

/// File formats selected by export/import path extension.
enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(FileFormat::Json),
            Some("csv") => Ok(FileFormat::Csv),
            _ => Err(Error::InvalidInput(format!(
                "unsupported file extension (expected .json or .csv): {}",
                path.display()
            ))),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Csv => "csv",
        }
    }
}

/// Export the backlog to a `.json` or `.csv` file.
pub fn export(workspace: &Path, path: &Path) -> Result<ExportResult> {
    let storage = Storage::open(workspace)?;
    let backlog = storage.load()?;

    let format = FileFormat::from_path(path)?;
    let text = match format {
        FileFormat::Json => {
            let mut json = backlog.to_json_string_pretty()?;
            json.push('\n');
            json
        }
        FileFormat::Csv => csv::export_to_csv(&backlog)?,
    };
    fs::write(path, text)?;

    Ok(ExportResult {
        path: path.display().to_string(),
        format: format.label().to_string(),
        entries: backlog.len(),
    })
}

/// Import a backlog from a `.json` or `.csv` file, replacing the snapshot.
///
/// Parse-then-swap: the file is parsed and validated into a complete new
/// backlog before the snapshot is touched, so a malformed file leaves the
/// live state unchanged.
pub fn import(workspace: &Path, path: &Path) -> Result<ImportResult> {
    let storage = Storage::open(workspace)?;

    let format = FileFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let backlog = match format {
        FileFormat::Json => Backlog::from_json_str(&text)?,
        FileFormat::Csv => csv::import_from_csv(&text)?,
    };
    storage.save(&backlog)?;

    Ok(ImportResult {
        path: path.display().to_string(),
        format: format.label().to_string(),
        name: backlog.name().to_string(),
        entries: backlog.len(),
    })
}
