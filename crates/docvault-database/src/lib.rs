//! # docvault-database
//!
//! SQLite catalog connection management and the repositories for
//! documents and their action history.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
