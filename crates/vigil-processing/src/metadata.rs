//! Deterministic metadata derived from an accepted upload

use crate::validator::file_extension;
use std::collections::BTreeSet;
use std::path::Path;
use vigil_core::{Dimensions, EvidenceKind, LegalStatus};

pub const WEB_UPLOAD_PLATFORM: &str = "Web Upload";

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Fields of an evidence record that follow purely from the file's name, type,
/// size and dimensions plus the legal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMetadata {
    pub title: String,
    pub kind: EvidenceKind,
    pub platform: String,
    pub extension: String,
    pub file_size_label: String,
    pub resolution_label: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

impl DerivedMetadata {
    pub fn derive(
        file_name: &str,
        mime_type: &str,
        size_bytes: u64,
        dimensions: Option<Dimensions>,
        legal_status: LegalStatus,
    ) -> Self {
        let kind = EvidenceKind::from_mime(mime_type);
        let extension = file_extension(file_name).unwrap_or_else(|| mime_subtype(mime_type));

        let kind_label = match kind {
            EvidenceKind::Image => "Image",
            EvidenceKind::Video => "Video",
            EvidenceKind::File => "File",
        };
        let description = format!(
            "{kind_label} file uploaded via Evidence Collection Interface. File type: {}. Awaiting analysis and verification.",
            extension.to_uppercase()
        );

        let mut tags: BTreeSet<String> = ["uploaded", kind.as_str(), "web-upload"]
            .into_iter()
            .map(String::from)
            .collect();
        if !extension.is_empty() {
            tags.insert(extension.clone());
        }
        tags.insert(
            match legal_status {
                LegalStatus::Admissible => "verified",
                LegalStatus::UnderReview => "pending-verification",
            }
            .to_string(),
        );

        Self {
            title: title_from_file_name(file_name),
            kind,
            platform: WEB_UPLOAD_PLATFORM.to_string(),
            extension,
            file_size_label: file_size_label(size_bytes),
            resolution_label: resolution_label(dimensions),
            description,
            tags,
        }
    }
}

/// File name without its final extension
pub fn title_from_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(file_name)
        .to_string()
}

/// Size in MiB with one decimal, e.g. `"2.0 MB"`
pub fn file_size_label(size_bytes: u64) -> String {
    format!("{:.1} MB", size_bytes as f64 / BYTES_PER_MIB)
}

pub fn resolution_label(dimensions: Option<Dimensions>) -> String {
    dimensions
        .map(|d| d.label())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn mime_subtype(mime_type: &str) -> String {
    mime_type
        .split_once('/')
        .map(|(_, sub)| sub.split(['+', ';']).next().unwrap_or(sub))
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}
