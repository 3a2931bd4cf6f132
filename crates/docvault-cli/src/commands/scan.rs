//! Reconciliation scan command.

use clap::Args;

use super::Context;
use crate::output::{self, OutputFormat};
use docvault_core::error::AppError;

/// Arguments for `scan`
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Virtual directory to scan (omit for the whole tree)
    #[arg(default_value = "")]
    pub root: String,
    /// Category for files discovered directly below the scan root
    #[arg(short, long)]
    pub category: Option<String>,
}

/// Execute `scan`
pub async fn execute(args: &ScanArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let report = ctx
        .service
        .scan(&args.root, args.category.as_deref())
        .await?;

    if format == OutputFormat::Json {
        output::print_item(&report, format);
        return Ok(());
    }

    output::print_success("Scan complete");
    output::print_kv("directories", &report.directories.to_string());
    output::print_kv("files", &report.files.to_string());
    output::print_kv("inserted", &report.inserted.to_string());
    output::print_kv("updated", &report.updated.to_string());
    output::print_kv("marked missing", &report.marked_missing.to_string());
    if report.errors > 0 {
        output::print_warning(&format!("{} entries could not be read", report.errors));
    }
    Ok(())
}
