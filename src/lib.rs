// Library module for modsync
// Re-exports modules for use in integration tests and external crates

pub mod error;
pub mod store;
pub mod sync;

pub use error::SyncError;
