//! Content commands: reading plaintext out and uploading files in.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::Context;
use crate::output::{self, OutputFormat};
use docvault_core::error::AppError;
use docvault_core::traits::storage::ByteStream;
use docvault_core::types::DocumentId;
use docvault_service::UploadRequest;

/// Arguments for `cat`
#[derive(Debug, Args)]
pub struct CatArgs {
    /// Document ID
    pub id: DocumentId,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `upload`
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Local file to upload
    pub file: PathBuf,
    /// Destination folder (omit for the root)
    #[arg(short, long, default_value = "")]
    pub parent: String,
    /// Name in the catalog (defaults to the local file name)
    #[arg(short, long)]
    pub name: Option<String>,
    /// Category (defaults to the destination folder's name)
    #[arg(short, long)]
    pub category: Option<String>,
}

/// Execute `cat`
pub async fn cat(args: &CatArgs, ctx: &Context) -> Result<(), AppError> {
    let content = ctx.service.read_content(&args.id).await?;

    let written = match &args.output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .map_err(|e| AppError::io(format!("Failed to create {}", path.display()), e))?;
            let written = drain(content.stream, file).await?;
            output::print_success(&format!(
                "Wrote {written} bytes ({}) to {}",
                content.mime,
                path.display()
            ));
            written
        }
        None => drain(content.stream, tokio::io::stdout()).await?,
    };
    debug!(document_id = %args.id, bytes = written, "Content written");
    Ok(())
}

async fn drain<W>(mut stream: ByteStream, mut out: W) -> Result<u64, AppError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AppError::io("Failed to read content", e))?;
        out.write_all(&chunk)
            .await
            .map_err(|e| AppError::io("Failed to write content", e))?;
        written += chunk.len() as u64;
    }
    out.flush()
        .await
        .map_err(|e| AppError::io("Failed to flush output", e))?;
    Ok(written)
}

/// Execute `upload`
pub async fn upload(args: &UploadArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("Cannot derive a name from the upload path"))?,
    };

    let data = tokio::fs::read(&args.file)
        .await
        .map_err(|e| AppError::io(format!("Failed to read {}", args.file.display()), e))?;

    let doc = ctx
        .service
        .write_upload(UploadRequest {
            parent_path: args.parent.clone(),
            name,
            category: args.category.clone(),
            data: Bytes::from(data),
        })
        .await?;

    match format {
        OutputFormat::Json => output::print_item(&doc, format),
        OutputFormat::Table => output::print_success(&format!(
            "Uploaded '{}' (id: {}, encrypted: {})",
            doc.path, doc.id, doc.encrypted
        )),
    }
    Ok(())
}
