//! Two-section CSV codec for the backlog document.
//!
//! Layout:
//! - Line 1: quoted settings column names (`name`, `sortOrder.column`,
//!   `sortOrder.reverse`, `prioritySettings.min`, `prioritySettings.max`)
//! - Line 2: their quoted values
//! - Line 3: quoted entry column names (`title`, `score`, `duration`,
//!   `priority`)
//! - Lines 4..N: one quoted row per entry, in line 3's column order
//!
//! Import maps columns by header name, so the column order in a file may
//! vary as long as it stays consistent between a header line and its data
//! lines. The stored `priority` is trusted verbatim on import, not
//! recomputed from `score / duration`.
//!
//! Known limitation: fields containing commas, double quotes, or line
//! breaks are not escaped. Export refuses them instead of writing a file
//! that cannot be re-imported.

use crate::models::{Backlog, Column, Entry, entry_id};
use crate::{Error, Result};
use std::collections::BTreeMap;

const SETTINGS_COLUMNS: [&str; 5] = [
    "name",
    "sortOrder.column",
    "sortOrder.reverse",
    "prioritySettings.min",
    "prioritySettings.max",
];

const ENTRY_COLUMNS: [&str; 4] = ["title", "score", "duration", "priority"];

/// Serialize the full backlog to its two-section CSV form.
pub fn export_to_csv(backlog: &Backlog) -> Result<String> {
    let mut lines = Vec::with_capacity(backlog.len() + 3);

    lines.push(write_row(&SETTINGS_COLUMNS.map(String::from))?);
    let sort_order = backlog.sort_order();
    let settings = backlog.priority_settings();
    lines.push(write_row(&[
        backlog.name().to_string(),
        sort_order.column.to_string(),
        sort_order.reverse.to_string(),
        settings.min.to_string(),
        settings.max.to_string(),
    ])?);

    lines.push(write_row(&ENTRY_COLUMNS.map(String::from))?);
    for entry in backlog.entries().values() {
        lines.push(write_row(&[
            entry.title().to_string(),
            entry.score().to_string(),
            entry.duration().to_string(),
            entry.priority().to_string(),
        ])?);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Parse a backlog from its two-section CSV form.
///
/// Constructs a complete new `Backlog` and validates it before returning;
/// malformed input never yields a partial result. Settings columns absent
/// from the file keep their defaults.
pub fn import_from_csv(text: &str) -> Result<Backlog> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
    if lines.len() < 3 {
        return Err(Error::InvalidInput(
            "CSV must have settings and entry header sections".to_string(),
        ));
    }

    let mut backlog = Backlog::default();

    // Settings section
    let headers = parse_row(lines[0])?;
    let values = parse_row(lines[1])?;
    if headers.len() != values.len() {
        return Err(Error::InvalidInput(format!(
            "settings row has {} fields but the header names {}",
            values.len(),
            headers.len()
        )));
    }
    for (header, value) in headers.iter().zip(&values) {
        match header.as_str() {
            "name" => backlog.set_name(value)?,
            "sortOrder.column" => backlog.sort_order.column = value.parse::<Column>()?,
            "sortOrder.reverse" => backlog.sort_order.reverse = parse_bool(value)?,
            "prioritySettings.min" => {
                backlog.priority_settings.min = parse_number(header, value)?
            }
            "prioritySettings.max" => {
                backlog.priority_settings.max = parse_number(header, value)?
            }
            other => {
                return Err(Error::InvalidInput(format!(
                    "unknown settings column: {}",
                    other
                )));
            }
        }
    }

    // Entries section
    let entry_headers = parse_row(lines[2])?;
    for header in &entry_headers {
        if !ENTRY_COLUMNS.contains(&header.as_str()) {
            return Err(Error::InvalidInput(format!(
                "unknown entry column: {}",
                header
            )));
        }
    }
    for column in ENTRY_COLUMNS {
        if entry_headers.iter().filter(|h| *h == column).count() != 1 {
            return Err(Error::InvalidInput(format!(
                "entry header must name '{}' exactly once",
                column
            )));
        }
    }

    for line in &lines[3..] {
        if line.is_empty() {
            continue;
        }
        let row = parse_row(line)?;
        if row.len() != entry_headers.len() {
            return Err(Error::InvalidInput(format!(
                "entry row has {} fields but the header names {}",
                row.len(),
                entry_headers.len()
            )));
        }
        let fields: BTreeMap<&str, &str> = entry_headers
            .iter()
            .map(String::as_str)
            .zip(row.iter().map(String::as_str))
            .collect();

        let title = fields["title"];
        let score = parse_number("score", fields["score"])?;
        let duration = parse_number("duration", fields["duration"])?;
        let priority = parse_number("priority", fields["priority"])?;

        let id = entry_id(title);
        if backlog.entries.contains_key(&id) {
            return Err(Error::InvalidInput(format!(
                "duplicate entry id '{}' in CSV",
                id
            )));
        }
        backlog
            .entries
            .insert(id, Entry::from_parts(title, score, duration, priority)?);
    }

    backlog.validate()?;
    Ok(backlog)
}

/// Join fields into one line, each wrapped in double quotes.
fn write_row(fields: &[String]) -> Result<String> {
    let mut quoted = Vec::with_capacity(fields.len());
    for field in fields {
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
            return Err(Error::InvalidInput(format!(
                "field cannot be written to CSV (contains ',', '\"', or a line break): {}",
                field
            )));
        }
        quoted.push(format!("\"{}\"", field));
    }
    Ok(quoted.join(","))
}

/// Split one line into its quoted fields.
fn parse_row(line: &str) -> Result<Vec<String>> {
    line.split(',')
        .map(|field| {
            let field = field.trim();
            field
                .strip_prefix('"')
                .and_then(|f| f.strip_suffix('"'))
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::InvalidInput(format!("CSV field is not quoted: {}", field))
                })
        })
        .collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::InvalidInput(format!(
            "expected \"true\" or \"false\", got: {}",
            other
        ))),
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| Error::InvalidInput(format!("{} is not a number: {}", field, value)))
}
