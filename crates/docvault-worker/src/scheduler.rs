//! Owned scheduler for the periodic reconciliation scan.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info};

use docvault_core::config::ScannerConfig;
use docvault_core::error::AppError;

use crate::job::ScanJob;

/// When and whether the periodic scan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSchedulerConfig {
    /// Whether the periodic scan runs at all.
    pub enabled: bool,
    /// Time between scans.
    pub interval: Duration,
}

impl From<&ScannerConfig> for ScanSchedulerConfig {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            enabled: config.enabled,
            interval: Duration::from_secs(config.interval_seconds.max(1)),
        }
    }
}

/// Runs [`ScanJob::run_scan`] on a fixed interval.
///
/// A tick that fires while the previous scan is still running is skipped.
pub struct ScanScheduler {
    /// Timing settings.
    config: ScanSchedulerConfig,
    /// The work to run.
    job: Arc<dyn ScanJob>,
    /// The underlying scheduler, present once started.
    scheduler: Option<JobScheduler>,
    /// Set while a scan is in flight.
    running: Arc<AtomicBool>,
}

impl std::fmt::Debug for ScanScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanScheduler")
            .field("config", &self.config)
            .field("started", &self.scheduler.is_some())
            .finish()
    }
}

impl ScanScheduler {
    /// Create a scheduler. Nothing runs until [`start`](Self::start).
    pub fn new(config: ScanSchedulerConfig, job: Arc<dyn ScanJob>) -> Self {
        Self {
            config,
            job,
            scheduler: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the timer is active.
    pub fn is_started(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Register the scan job and start the timer.
    ///
    /// A disabled scheduler logs and returns without starting anything.
    pub async fn start(&mut self) -> Result<(), AppError> {
        if !self.config.enabled {
            info!("Periodic scan disabled");
            return Ok(());
        }
        if self.scheduler.is_some() {
            return Ok(());
        }

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        let job = Arc::clone(&self.job);
        let running = Arc::clone(&self.running);
        let cron_job = CronJob::new_repeated_async(self.config.interval, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            let running = Arc::clone(&running);
            Box::pin(async move { run_tick(job.as_ref(), running).await })
        })
        .map_err(|e| AppError::internal(format!("Failed to create scan schedule: {e}")))?;

        scheduler
            .add(cron_job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add scan schedule: {e}")))?;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!(
            interval_seconds = self.config.interval.as_secs(),
            "Periodic scan scheduled"
        );
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Stop the timer. A scan already in flight runs to completion.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Ok(());
        };
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;
        info!("Scan scheduler shut down");
        Ok(())
    }
}

/// Clears the in-flight flag when a tick ends, including by panic or
/// cancellation.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One timer tick: run the scan unless the previous one is still going.
async fn run_tick(job: &dyn ScanJob, running: Arc<AtomicBool>) {
    if running.swap(true, Ordering::AcqRel) {
        debug!("Previous scan still running, skipping tick");
        return;
    }
    let _guard = RunningGuard(running);
    match job.run_scan().await {
        Ok(report) => debug!(
            inserted = report.inserted,
            updated = report.updated,
            marked_missing = report.marked_missing,
            errors = report.errors,
            "Scheduled scan finished"
        ),
        Err(e) => error!(error = %e, "Scheduled scan failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docvault_core::result::AppResult;
    use docvault_service::ScanReport;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingJob {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl ScanJob for CountingJob {
        async fn run_scan(&self) -> AppResult<ScanReport> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(ScanReport::default())
        }
    }

    struct PanickingJob;

    #[async_trait]
    impl ScanJob for PanickingJob {
        async fn run_scan(&self) -> AppResult<ScanReport> {
            panic!("scan blew up");
        }
    }

    #[tokio::test]
    async fn panicking_scan_does_not_wedge_later_ticks() {
        let running = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&running);
        let handle = tokio::spawn(async move { run_tick(&PanickingJob, flag).await });
        assert!(handle.await.unwrap_err().is_panic());
        assert!(!running.load(Ordering::Acquire));

        let job = CountingJob::default();
        run_tick(&job, Arc::clone(&running)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);
        assert!(!running.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn tick_is_skipped_while_a_scan_is_in_flight() {
        let running = Arc::new(AtomicBool::new(true));
        let job = CountingJob::default();
        run_tick(&job, Arc::clone(&running)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
        assert!(running.load(Ordering::Acquire));
    }

    #[test]
    fn config_comes_from_scanner_section() {
        let scanner = ScannerConfig {
            interval_seconds: 42,
            ..ScannerConfig::default()
        };
        let config = ScanSchedulerConfig::from(&scanner);
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(42));
    }

    #[tokio::test]
    async fn disabled_scheduler_never_runs() {
        let job = Arc::new(CountingJob::default());
        let mut scheduler = ScanScheduler::new(
            ScanSchedulerConfig {
                enabled: false,
                interval: Duration::from_secs(1),
            },
            job.clone(),
        );

        scheduler.start().await.unwrap();
        assert!(!scheduler.is_started());
        scheduler.shutdown().await.unwrap();
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn enabled_scheduler_runs_on_interval_until_shutdown() {
        let job = Arc::new(CountingJob::default());
        let mut scheduler = ScanScheduler::new(
            ScanSchedulerConfig {
                enabled: true,
                interval: Duration::from_secs(1),
            },
            job.clone(),
        );

        scheduler.start().await.unwrap();
        assert!(scheduler.is_started());
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        scheduler.shutdown().await.unwrap();

        let runs = job.runs.load(Ordering::SeqCst);
        assert!(runs >= 1, "expected at least one scan, got {runs}");
        assert!(!scheduler.is_started());
    }
}
