//! Generation result and provenance.

use super::post::BlogPost;
use super::request::{GenerationRequest, Tone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which provider or strategy produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Primary,
    Fallback,
    /// Only ever paired with a terminal error, never with text.
    None,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Primary => "primary",
            Provenance::Fallback => "fallback",
            Provenance::None => "none",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text produced for one request, tagged with exactly one provenance.
///
/// Constructors only exist for `primary` and `fallback`; deserialising a
/// result tagged `none` or carrying empty text fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GenerationResultRepr")]
pub struct GenerationResult {
    id: Uuid,
    text: String,
    provider: Provenance,
    model: String,
    topic: String,
    tone: Tone,
    timestamp: DateTime<Utc>,
}

impl GenerationResult {
    pub(crate) fn primary(request: &GenerationRequest, text: String, model: &str) -> Self {
        Self::tagged(request, text, Provenance::Primary, model)
    }

    pub(crate) fn fallback(request: &GenerationRequest, text: String, model: &str) -> Self {
        Self::tagged(request, text, Provenance::Fallback, model)
    }

    fn tagged(request: &GenerationRequest, text: String, provider: Provenance, model: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            provider,
            model: model.to_string(),
            topic: request.topic().to_string(),
            tone: request.tone(),
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn provider(&self) -> Provenance {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Structured view of the text (title, content, hashtags, call to action).
    pub fn post(&self) -> BlogPost {
        BlogPost::parse(&self.text)
    }
}

#[derive(Deserialize)]
struct GenerationResultRepr {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    text: String,
    provider: Provenance,
    #[serde(default)]
    model: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    tone: Tone,
    timestamp: DateTime<Utc>,
}

impl TryFrom<GenerationResultRepr> for GenerationResult {
    type Error = String;

    fn try_from(repr: GenerationResultRepr) -> Result<Self, Self::Error> {
        if repr.provider == Provenance::None {
            return Err("a generation result cannot carry provenance 'none'".to_string());
        }
        if repr.text.trim().is_empty() {
            return Err("a generation result must carry text".to_string());
        }
        Ok(Self {
            id: repr.id,
            text: repr.text,
            provider: repr.provider,
            model: repr.model,
            topic: repr.topic,
            tone: repr.tone,
            timestamp: repr.timestamp,
        })
    }
}
