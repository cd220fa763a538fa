//! Export bundle construction.

use crate::models::{GenerationResult, Provenance, Tone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// The JSON export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub text: String,
    pub provider: Provenance,
    pub timestamp: DateTime<Utc>,
}

/// Descriptive data carried next to the encoded exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportMeta {
    pub result_id: Uuid,
    pub title: String,
    pub topic: String,
    pub tone: Tone,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub json: Vec<u8>,
    pub text: Vec<u8>,
    pub meta: ExportMeta,
}

impl ExportBundle {
    pub fn json_file_name(&self) -> String {
        format!("linkedin_post_{}.json", file_stamp(self.meta.generated_at))
    }

    pub fn text_file_name(&self) -> String {
        format!("linkedin_post_{}.txt", file_stamp(self.meta.generated_at))
    }

    /// The text export as a string; it is always valid UTF-8.
    pub fn text_str(&self) -> &str {
        std::str::from_utf8(&self.text).unwrap_or_default()
    }
}

fn file_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Encode a result into its JSON and plain-text exports.
pub fn package(result: &GenerationResult) -> Result<ExportBundle, PackagingError> {
    let record = ExportRecord {
        text: result.text().to_string(),
        provider: result.provider(),
        timestamp: result.timestamp(),
    };
    let json = serde_json::to_vec_pretty(&record)?;

    Ok(ExportBundle {
        json,
        text: result.text().as_bytes().to_vec(),
        meta: ExportMeta {
            result_id: result.id(),
            title: result.post().display_title().to_string(),
            topic: result.topic().to_string(),
            tone: result.tone(),
            generated_at: result.timestamp(),
        },
    })
}

pub fn unpack_json(bytes: &[u8]) -> Result<ExportRecord, PackagingError> {
    Ok(serde_json::from_slice(bytes)?)
}
