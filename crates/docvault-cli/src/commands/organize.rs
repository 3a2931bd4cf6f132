//! Structural commands: folders, renames, moves, copies, and tags.

use clap::Args;

use super::{Context, parse_ids};
use crate::output::{self, DocumentRow, OutputFormat};
use docvault_core::error::AppError;
use docvault_core::types::DocumentId;

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name
    pub name: String,
    /// Parent folder (omit for the root)
    #[arg(short, long, default_value = "")]
    pub parent: String,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Document ID
    pub id: DocumentId,
    /// New leaf name
    pub name: String,
}

/// Arguments for `mv`
#[derive(Debug, Args)]
pub struct MvArgs {
    /// Target folder (`""` for the root)
    #[arg(short, long)]
    pub target: String,
    /// Document IDs to move
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Arguments for `cp`
#[derive(Debug, Args)]
pub struct CpArgs {
    /// Target folder (`""` for the root)
    #[arg(short, long)]
    pub target: String,
    /// Document IDs to copy
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Arguments for `tag`
#[derive(Debug, Args)]
pub struct TagArgs {
    /// Document ID
    pub id: DocumentId,
    /// New tag set (empty clears all tags)
    pub tags: Vec<String>,
}

/// Execute `mkdir`
pub async fn mkdir(args: &MkdirArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let folder = ctx.service.create_folder(&args.name, &args.parent).await?;
    match format {
        OutputFormat::Json => output::print_item(&folder, format),
        OutputFormat::Table => output::print_success(&format!(
            "Folder '{}' created (id: {})",
            folder.path, folder.id
        )),
    }
    Ok(())
}

/// Execute `rename`
pub async fn rename(args: &RenameArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let relocation = ctx.service.rename(&args.id, &args.name).await?;
    match format {
        OutputFormat::Json => output::print_item(&relocation, format),
        OutputFormat::Table if relocation.is_noop() => {
            output::print_warning("Name unchanged");
        }
        OutputFormat::Table => output::print_success(&format!(
            "Renamed '{}' -> '{}'",
            relocation.old_path, relocation.new_path
        )),
    }
    Ok(())
}

/// Execute `mv`
pub async fn mv(args: &MvArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let ids = parse_ids(&args.ids)?;
    let outcome = ctx.service.move_documents(&ids, &args.target).await;
    output::print_outcome("Moved", &outcome, format);
    Ok(())
}

/// Execute `cp`
pub async fn cp(args: &CpArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let ids = parse_ids(&args.ids)?;
    let outcome = ctx.service.copy_documents(&ids, &args.target).await?;
    output::print_outcome("Copied", &outcome, format);
    Ok(())
}

/// Execute `tag`
pub async fn tag(args: &TagArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let doc = ctx.service.update_tags(&args.id, &args.tags).await?;
    match format {
        OutputFormat::Json => output::print_item(&doc, format),
        OutputFormat::Table => {
            output::print_list(&[DocumentRow::from(&doc)], format);
            output::print_kv("tags", &doc.tags.0.join(", "));
        }
    }
    Ok(())
}
