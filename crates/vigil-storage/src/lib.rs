//! Vigil Storage Library
//!
//! This crate owns the raw bytes behind uploaded files. A [`FileSource`] is the
//! exclusive handle to an upload's payload (in memory or on the local filesystem);
//! the [`PreviewRegistry`] hands out revocable [`PreviewHandle`]s that presentation
//! layers use to render a file without touching its source.
//!
//! [`PreviewHandle`]: vigil_core::PreviewHandle

pub mod local;
pub mod memory;
pub mod preview;
pub mod traits;

// Re-export commonly used types
pub use local::LocalFileSource;
pub use memory::MemorySource;
pub use preview::PreviewRegistry;
pub use traits::{FileSource, SourceError, SourceReader, SourceResult};
