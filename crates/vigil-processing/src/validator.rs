use std::path::Path;

/// Upload validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported file type: {content_type} (only image/* is accepted)")]
    UnsupportedContentType { content_type: String },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Empty file")]
    EmptyFile,

    #[error("Extension '{extension}' does not match content type {content_type} (expected one of: {expected})")]
    ExtensionMismatch {
        extension: String,
        content_type: String,
        expected: String,
    },
}

/// Upload validator for evidence images
///
/// Acceptance is decided by the declared media type; the extension cross-check
/// guards against files whose name and declared type disagree.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
    enforce_extension_match: bool,
}

/// Lowercase extension of `filename`, if it has one
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

impl UploadValidator {
    pub fn new(max_file_size: usize, enforce_extension_match: bool) -> Self {
        Self {
            max_file_size,
            enforce_extension_match,
        }
    }

    pub fn from_config(config: &vigil_core::VigilConfig) -> Self {
        Self::new(config.max_file_size_bytes, config.enforce_extension_match)
    }

    /// Validate content type: only `image/*` is accepted
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();
        match normalized.strip_prefix("image/") {
            Some(subtype) if !subtype.is_empty() => Ok(()),
            _ => Err(ValidationError::UnsupportedContentType {
                content_type: content_type.to_string(),
            }),
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate that the content type matches the file extension for known image types
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let Some(extension) = file_extension(filename) else {
            return Ok(());
        };

        let normalized_content_type = content_type.trim().to_lowercase();

        let expected_content_types: &[&str] = match extension.as_str() {
            "jpg" | "jpeg" | "jfif" => &["image/jpeg", "image/jpg", "image/pjpeg"],
            "png" => &["image/png"],
            "gif" => &["image/gif"],
            "webp" => &["image/webp"],
            "avif" => &["image/avif"],
            "svg" => &["image/svg+xml"],
            "bmp" => &["image/bmp", "image/x-ms-bmp"],
            "ico" => &["image/x-icon", "image/vnd.microsoft.icon"],
            "tif" | "tiff" => &["image/tiff"],
            "heic" => &["image/heic"],
            "heif" => &["image/heif"],
            _ => {
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping content type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if !expected_content_types
            .iter()
            .any(|ct| *ct == normalized_content_type)
        {
            return Err(ValidationError::ExtensionMismatch {
                extension,
                content_type: content_type.to_string(),
                expected: expected_content_types.join(", "),
            });
        }

        Ok(())
    }

    /// Validate all aspects of a file. The content type is checked first so that
    /// non-image files are always reported as unsupported.
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_content_type(content_type)?;
        self.validate_file_size(file_size)?;
        if self.enforce_extension_match {
            self.validate_extension_content_type_match(filename, content_type)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> UploadValidator {
        UploadValidator::new(1024 * 1024, true)
    }

    #[test]
    fn test_validate_content_type_accepts_images() {
        let validator = test_validator();
        assert!(validator.validate_content_type("image/jpeg").is_ok());
        assert!(validator.validate_content_type("IMAGE/PNG").is_ok());
        assert!(validator.validate_content_type("image/x-custom").is_ok());
    }

    #[test]
    fn test_validate_content_type_rejects_non_images() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_content_type("application/pdf"),
            Err(ValidationError::UnsupportedContentType { .. })
        ));
        assert!(validator.validate_content_type("video/mp4").is_err());
        assert!(validator.validate_content_type("image/").is_err());
        assert!(validator.validate_content_type("").is_err());
    }

    #[test]
    fn test_validate_file_size() {
        let validator = test_validator();
        assert!(validator.validate_file_size(512 * 1024).is_ok());
        assert_eq!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        );
        assert!(matches!(
            validator.validate_file_size(2 * 1024 * 1024),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_extension_match() {
        let validator = test_validator();
        assert!(validator
            .validate_extension_content_type_match("photo.jpg", "image/jpeg")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("photo.JPEG", "IMAGE/JPEG")
            .is_ok());
        assert!(matches!(
            validator.validate_extension_content_type_match("photo.jpg", "image/png"),
            Err(ValidationError::ExtensionMismatch { .. })
        ));
    }

    #[test]
    fn test_extension_match_skips_unknown_and_missing_extensions() {
        let validator = test_validator();
        assert!(validator
            .validate_extension_content_type_match("scan.xyz", "image/png")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("screenshot", "image/png")
            .is_ok());
    }

    #[test]
    fn test_validate_all_reports_type_before_size() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_all("notes.txt", "text/plain", 0),
            Err(ValidationError::UnsupportedContentType { .. })
        ));
    }

    #[test]
    fn test_validate_all_without_extension_enforcement() {
        let lenient = UploadValidator::new(1024, false);
        assert!(lenient.validate_all("photo.jpg", "image/png", 10).is_ok());
        let strict = UploadValidator::new(1024, true);
        assert!(strict.validate_all("photo.jpg", "image/png", 10).is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noextension"), None);
    }
}
