//! Attachment metadata for files submitted alongside an entity.
//!
//! Only metadata lives here. The bytes are held by an external file store,
//! which is why recording attachments is never part of an enrollment
//! transaction.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entity type string used for enrollment documents.
pub const ENROLLMENT_ENTITY: &str = "enrollment";

/// The `(entity_type, entity_id)` pair an attachment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentOwner {
  pub entity_type: &'static str,
  pub entity_id:   i64,
}

impl AttachmentOwner {
  pub fn enrollment(student_id: i64) -> Self {
    Self { entity_type: ENROLLMENT_ENTITY, entity_id: student_id }
  }
}

/// A document reference as it arrives in an enrollment payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
  /// What the document is, e.g. "birth certificate".
  pub kind:      String,
  pub file_name: String,
}

impl DocumentInput {
  /// Lower-cased file extension without the dot.
  pub fn extension(&self) -> Option<String> {
    Path::new(&self.file_name)
      .extension()
      .and_then(|e| e.to_str())
      .map(str::to_ascii_lowercase)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
  pub attachment_id: i64,
  pub entity_type:   String,
  pub entity_id:     i64,
  pub kind:          String,
  pub file_name:     String,
  pub extension:     Option<String>,
  pub created_at:    DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_is_lowercased() {
    let doc = DocumentInput { kind: "rg".into(), file_name: "Scan.PDF".into() };
    assert_eq!(doc.extension().as_deref(), Some("pdf"));
    let doc = DocumentInput { kind: "rg".into(), file_name: "scan".into() };
    assert_eq!(doc.extension(), None);
  }
}
