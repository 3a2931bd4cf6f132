//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use docvault_core::types::BulkOutcome;
use docvault_entity::document::DocumentEntity;
use docvault_entity::listing::FolderItem;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One catalog row as shown in tables.
#[derive(Debug, Serialize, Tabled)]
pub struct DocumentRow {
    /// Document ID
    id: String,
    /// Path
    path: String,
    /// File or folder
    #[tabled(rename = "type")]
    doc_type: String,
    /// Status
    status: String,
    /// Plaintext size
    size: String,
    /// Category
    category: String,
    /// Last modified
    modified: String,
}

impl From<&DocumentEntity> for DocumentRow {
    fn from(doc: &DocumentEntity) -> Self {
        Self {
            id: doc.id.to_string(),
            path: doc.path.clone(),
            doc_type: doc.doc_type.to_string(),
            status: doc.status.to_string(),
            size: doc.file_size.map(human_size).unwrap_or_default(),
            category: doc.category.clone(),
            modified: doc.last_modified.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// One entry of a folder listing.
#[derive(Debug, Serialize, Tabled)]
pub struct ItemRow {
    /// Name
    name: String,
    /// File or folder
    #[tabled(rename = "type")]
    doc_type: String,
    /// Status
    status: String,
    /// Plaintext size
    size: String,
    /// Persisted or inferred
    origin: String,
    /// Document ID
    id: String,
}

impl From<&FolderItem> for ItemRow {
    fn from(item: &FolderItem) -> Self {
        match item {
            FolderItem::Explicit(doc) => Self {
                name: doc.name.clone(),
                doc_type: doc.doc_type.to_string(),
                status: doc.status.to_string(),
                size: doc.file_size.map(human_size).unwrap_or_default(),
                origin: "explicit".into(),
                id: doc.id.to_string(),
            },
            FolderItem::Inferred(folder) => Self {
                name: folder.name.clone(),
                doc_type: "folder".into(),
                status: folder.status().to_string(),
                size: String::new(),
                origin: "inferred".into(),
                id: folder.id.to_string(),
            },
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

/// Summarize a bulk operation.
pub fn print_outcome(verb: &str, outcome: &BulkOutcome, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_item(outcome, format);
        return;
    }
    if outcome.is_noop() && outcome.failed.is_empty() && outcome.skipped.is_empty() {
        print_warning("Nothing changed");
        return;
    }
    print_success(&format!("{verb}: {} succeeded", outcome.succeeded));
    for id in &outcome.skipped {
        print_kv("skipped", id.as_str());
    }
    for failure in &outcome.failed {
        print_error(&format!("{}: {} ({})", failure.id, failure.message, failure.kind));
    }
    if outcome.is_partial() {
        print_warning("Partially applied");
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}

fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(51_200), "50.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
