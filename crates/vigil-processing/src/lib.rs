//! Vigil Processing Library
//!
//! Upload validation, image probing, integrity digests and metadata derivation.

pub mod digest;
pub mod metadata;
pub mod probe;
pub mod validator;

pub use digest::{sha256_reader, sha256_source, DigestError};
pub use metadata::{DerivedMetadata, WEB_UPLOAD_PLATFORM};
pub use probe::ImageProcessor;
pub use validator::{file_extension, UploadValidator, ValidationError};
