//! Trash commands.

use clap::Args;

use super::{Context, parse_ids};
use crate::output::{self, OutputFormat};
use docvault_core::error::AppError;
use docvault_core::types::DocumentId;

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RmArgs {
    /// Document IDs to trash
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Arguments for `restore`
#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Document ID
    pub id: DocumentId,
}

/// Arguments for `purge`
#[derive(Debug, Args)]
pub struct PurgeArgs {
    /// Document ID
    pub id: DocumentId,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `empty-trash`
#[derive(Debug, Args)]
pub struct EmptyTrashArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute `rm`
pub async fn rm(args: &RmArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let ids = parse_ids(&args.ids)?;
    if let [id] = ids.as_slice() {
        let affected = ctx.service.soft_delete(id).await?;
        output::print_success(&format!("Moved {affected} item(s) to the trash"));
        return Ok(());
    }
    let outcome = ctx.service.bulk_soft_delete(&ids).await;
    output::print_outcome("Trashed", &outcome, format);
    Ok(())
}

/// Execute `restore`
pub async fn restore(args: &RestoreArgs, ctx: &Context) -> Result<(), AppError> {
    let affected = ctx.service.restore(&args.id).await?;
    output::print_success(&format!("Restored {affected} item(s)"));
    Ok(())
}

/// Execute `purge`
pub async fn purge(args: &PurgeArgs, ctx: &Context) -> Result<(), AppError> {
    let doc = ctx.service.get(&args.id).await?;
    if !args.yes && !confirm(&format!("Permanently delete '{}'?", doc.path))? {
        println!("Cancelled.");
        return Ok(());
    }
    let removed = ctx.service.permanent_delete(&doc.id).await?;
    output::print_success(&format!("Permanently deleted {removed} item(s)"));
    Ok(())
}

/// Execute `empty-trash`
pub async fn empty(
    args: &EmptyTrashArgs,
    ctx: &Context,
    format: OutputFormat,
) -> Result<(), AppError> {
    if !args.yes && !confirm("Permanently delete everything in the trash?")? {
        println!("Cancelled.");
        return Ok(());
    }
    let outcome = ctx.service.empty_trash().await?;
    output::print_outcome("Purged", &outcome, format);
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, AppError> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
