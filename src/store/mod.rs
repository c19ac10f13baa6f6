//! Remote document store collaborators.
//!
//! The sync core only needs "write document at URI with a content-type
//! hint"; everything else here exists for callers and test verification.

pub mod document;
pub mod memory;
pub mod opendal;

pub use document::{ContentType, DocumentStore};
pub use memory::MemoryStore;
pub use self::opendal::OpendalStore;
