use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Reference to a renderable preview of an uploaded file.
///
/// The handle is only a key; the preview registry owns the underlying bytes and
/// decides whether the handle is still live. Moving a handle from a pending file to
/// an evidence record transfers it, the registry entry is never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewHandle {
    pub key: Uuid,
}

impl PreviewHandle {
    pub fn new() -> Self {
        Self { key: Uuid::new_v4() }
    }

    /// URL-like form used by presentation layers.
    pub fn url(&self) -> String {
        format!("preview://vigil/{}", self.key)
    }
}

impl Default for PreviewHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PreviewHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.url())
    }
}
