//! The unit of work the scheduler runs.

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_service::{DocumentService, ScanReport};

/// Something that can reconcile the whole catalog against disk.
#[async_trait]
pub trait ScanJob: Send + Sync + 'static {
    /// Run one full scan.
    async fn run_scan(&self) -> AppResult<ScanReport>;
}

#[async_trait]
impl ScanJob for DocumentService {
    async fn run_scan(&self) -> AppResult<ScanReport> {
        self.scan("", None).await
    }
}
