//! Background work for DocVault.
//!
//! The only recurring task is the reconciliation scan. [`ScanScheduler`] is
//! constructed once at process start, owns its timer, and is shut down
//! explicitly.

pub mod job;
pub mod scheduler;

pub use job::ScanJob;
pub use scheduler::{ScanScheduler, ScanSchedulerConfig};
