//! Share link commands.

use clap::Args;

use super::Context;
use crate::output::{self, DocumentRow, OutputFormat};
use docvault_core::error::AppError;
use docvault_core::types::DocumentId;

/// Arguments for `share`
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Document ID
    pub id: DocumentId,
}

/// Arguments for `unshare`
#[derive(Debug, Args)]
pub struct UnshareArgs {
    /// Document ID
    pub id: DocumentId,
}

/// Arguments for `resolve`
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Share token
    pub token: String,
}

/// Execute `share`
pub async fn share(args: &ShareArgs, ctx: &Context) -> Result<(), AppError> {
    let token = ctx.service.share(&args.id).await?;
    output::print_success("Share link active");
    output::print_kv("token", &token);
    Ok(())
}

/// Execute `unshare`
pub async fn unshare(args: &UnshareArgs, ctx: &Context) -> Result<(), AppError> {
    let doc = ctx.service.unshare(&args.id).await?;
    output::print_success(&format!("Share link revoked for '{}'", doc.path));
    Ok(())
}

/// Execute `resolve`
pub async fn resolve(args: &ResolveArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let doc = ctx.service.find_by_share_token(&args.token).await?;
    match format {
        OutputFormat::Json => output::print_item(&doc, format),
        OutputFormat::Table => output::print_list(&[DocumentRow::from(&doc)], format),
    }
    Ok(())
}
