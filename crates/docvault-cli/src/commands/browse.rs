//! Read-only catalog commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{self, DocumentRow, ItemRow, OutputFormat};
use docvault_core::error::AppError;
use docvault_core::types::DocumentId;

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Virtual folder to list (omit for the root)
    #[arg(default_value = "")]
    pub path: String,
    /// List the trash instead of a folder
    #[arg(long)]
    pub trash: bool,
}

/// Arguments for `history`
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Document ID
    pub id: DocumentId,
}

#[derive(Debug, Serialize, Tabled)]
struct HistoryRow {
    /// When
    timestamp: String,
    /// Action
    action: String,
    /// Details
    details: String,
}

/// Execute `ls`
pub async fn ls(args: &LsArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    if args.trash {
        let trashed = ctx.service.list_trashed().await?;
        let rows: Vec<DocumentRow> = trashed.iter().map(DocumentRow::from).collect();
        output::print_list(&rows, format);
        return Ok(());
    }

    let items = ctx.service.list_folder(&args.path).await?;
    match format {
        OutputFormat::Json => output::print_item(&items, format),
        OutputFormat::Table => {
            let rows: Vec<ItemRow> = items.iter().map(ItemRow::from).collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}

/// Execute `history`
pub async fn history(
    args: &HistoryArgs,
    ctx: &Context,
    format: OutputFormat,
) -> Result<(), AppError> {
    let entries = ctx.service.history(&args.id).await?;
    let rows: Vec<HistoryRow> = entries
        .iter()
        .map(|e| HistoryRow {
            timestamp: e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            action: e.action.to_string(),
            details: e.details.clone(),
        })
        .collect();
    output::print_list(&rows, format);
    Ok(())
}
