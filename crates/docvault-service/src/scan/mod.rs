//! Reconciliation of the catalog against the physical tree.

pub mod report;
pub mod scanner;

pub use report::ScanReport;
pub use scanner::ScanService;
