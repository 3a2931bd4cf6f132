//! CLI command definitions and dispatch.

pub mod browse;
pub mod organize;
pub mod scan;
pub mod share;
pub mod transfer;
pub mod trash;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_core::types::DocumentId;
use docvault_database::DatabasePool;
use docvault_database::migration::run_migrations;
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_service::DocumentService;
use docvault_storage::LocalStorageProvider;

/// DocVault catalog administration
#[derive(Debug, Parser)]
#[command(name = "docvault", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (overrides the environment overlays)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Configuration environment overlay (`config/<env>.toml`)
    #[arg(short, long, default_value = "development", env = "DOCVAULT_ENV")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile the catalog with the physical tree
    Scan(scan::ScanArgs),
    /// List a folder's direct children, or the trash
    Ls(browse::LsArgs),
    /// Show the history of a document
    History(browse::HistoryArgs),
    /// Create a folder
    Mkdir(organize::MkdirArgs),
    /// Rename a document in place
    Rename(organize::RenameArgs),
    /// Move documents into a folder
    Mv(organize::MvArgs),
    /// Copy files into a folder
    Cp(organize::CpArgs),
    /// Replace a document's tags
    Tag(organize::TagArgs),
    /// Move documents to the trash
    Rm(trash::RmArgs),
    /// Restore a trashed document
    Restore(trash::RestoreArgs),
    /// Permanently delete a document
    Purge(trash::PurgeArgs),
    /// Permanently delete everything in the trash
    EmptyTrash(trash::EmptyTrashArgs),
    /// Write a file's plaintext content to stdout or a file
    Cat(transfer::CatArgs),
    /// Upload a local file into the catalog
    Upload(transfer::UploadArgs),
    /// Create a share link for a document
    Share(share::ShareArgs),
    /// Revoke a document's share link
    Unshare(share::UnshareArgs),
    /// Resolve a share token to its document
    Resolve(share::ResolveArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let ctx = self.open().await?;
        let result = match &self.command {
            Commands::Scan(args) => scan::execute(args, &ctx, self.format).await,
            Commands::Ls(args) => browse::ls(args, &ctx, self.format).await,
            Commands::History(args) => browse::history(args, &ctx, self.format).await,
            Commands::Mkdir(args) => organize::mkdir(args, &ctx, self.format).await,
            Commands::Rename(args) => organize::rename(args, &ctx, self.format).await,
            Commands::Mv(args) => organize::mv(args, &ctx, self.format).await,
            Commands::Cp(args) => organize::cp(args, &ctx, self.format).await,
            Commands::Tag(args) => organize::tag(args, &ctx, self.format).await,
            Commands::Rm(args) => trash::rm(args, &ctx, self.format).await,
            Commands::Restore(args) => trash::restore(args, &ctx).await,
            Commands::Purge(args) => trash::purge(args, &ctx).await,
            Commands::EmptyTrash(args) => trash::empty(args, &ctx, self.format).await,
            Commands::Cat(args) => transfer::cat(args, &ctx).await,
            Commands::Upload(args) => transfer::upload(args, &ctx, self.format).await,
            Commands::Share(args) => share::share(args, &ctx).await,
            Commands::Unshare(args) => share::unshare(args, &ctx).await,
            Commands::Resolve(args) => share::resolve(args, &ctx, self.format).await,
        };
        ctx.pool.close().await;
        result
    }

    async fn open(&self) -> Result<Context, AppError> {
        let config = match &self.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::load(&self.env)?,
        };
        open_context(&config).await
    }
}

/// Everything a command needs to reach the catalog.
pub struct Context {
    /// Open catalog pool.
    pub pool: DatabasePool,
    /// The operation facade.
    pub service: DocumentService,
}

/// Helper: connect, migrate, and wire the services for `config`.
pub async fn open_context(config: &AppConfig) -> Result<Context, AppError> {
    let storage = Arc::new(LocalStorageProvider::new(&config.storage.root_path).await?);
    let pool = DatabasePool::connect(&config.database).await?;
    run_migrations(pool.pool()).await?;

    let documents = Arc::new(DocumentRepository::new(pool.pool().clone()));
    let history = Arc::new(HistoryRepository::new(pool.pool().clone()));
    let service = DocumentService::new(documents, history, storage, config)?;

    Ok(Context {
        pool,
        service,
    })
}

/// Helper: parse a list of raw ids from the command line.
pub fn parse_ids(raw: &[String]) -> Result<Vec<DocumentId>, AppError> {
    raw.iter().map(|id| id.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn empty_trash_parses_with_yes_flag() {
        let cli = Cli::try_parse_from(["docvault", "empty-trash", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::EmptyTrash(ref a) if a.yes));
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(parse_ids(&["abc".into(), " ".into()]).is_err());
        assert_eq!(parse_ids(&["abc".into()]).unwrap()[0].as_str(), "abc");
    }
}
