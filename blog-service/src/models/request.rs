//! Generation request model and its builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default audience when the caller does not name one.
pub const DEFAULT_AUDIENCE: &str = "professionals";

/// Default target length in words.
pub const DEFAULT_TARGET_LENGTH: u32 = 500;

/// Writing style requested for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Inspirational,
    Educational,
    Conversational,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Inspirational => "inspirational",
            Tone::Educational => "educational",
            Tone::Conversational => "conversational",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            "inspirational" => Ok(Tone::Inspirational),
            "educational" => Ok(Tone::Educational),
            "conversational" => Ok(Tone::Conversational),
            other => Err(RequestError::UnknownTone(other.to_string())),
        }
    }
}

/// Rejections raised while assembling a request, before any provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Topic cannot be empty")]
    EmptyTopic,

    #[error("Target length {length} is outside the allowed range {min}..={max} words")]
    LengthOutOfBounds { length: u32, min: u32, max: u32 },

    #[error("Unknown tone: {0}")]
    UnknownTone(String),
}

/// Inclusive word-count bounds for `target_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self { min: 50, max: 2000 }
    }
}

impl LengthBounds {
    pub fn check(&self, length: u32) -> Result<(), RequestError> {
        if (self.min..=self.max).contains(&length) {
            Ok(())
        } else {
            Err(RequestError::LengthOutOfBounds {
                length,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// A validated request for one blog post.
///
/// Only obtainable through [`GenerationRequestBuilder::build`], so every
/// instance has a non-empty topic and an in-bounds length. Fields are
/// read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    topic: String,
    tone: Tone,
    target_length: u32,
    target_audience: String,
    include_hashtags: bool,
    include_call_to_action: bool,
}

impl GenerationRequest {
    pub fn builder(topic: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder::new(topic)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn target_length(&self) -> u32 {
        self.target_length
    }

    pub fn target_audience(&self) -> &str {
        &self.target_audience
    }

    pub fn include_hashtags(&self) -> bool {
        self.include_hashtags
    }

    pub fn include_call_to_action(&self) -> bool {
        self.include_call_to_action
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    topic: String,
    tone: Tone,
    target_length: u32,
    target_audience: Option<String>,
    include_hashtags: bool,
    include_call_to_action: bool,
    bounds: LengthBounds,
}

impl GenerationRequestBuilder {
    fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            tone: Tone::default(),
            target_length: DEFAULT_TARGET_LENGTH,
            target_audience: None,
            include_hashtags: true,
            include_call_to_action: true,
            bounds: LengthBounds::default(),
        }
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn target_length(mut self, words: u32) -> Self {
        self.target_length = words;
        self
    }

    pub fn target_audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = Some(audience.into());
        self
    }

    pub fn include_hashtags(mut self, include: bool) -> Self {
        self.include_hashtags = include;
        self
    }

    pub fn include_call_to_action(mut self, include: bool) -> Self {
        self.include_call_to_action = include;
        self
    }

    pub fn bounds(mut self, bounds: LengthBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn build(self) -> Result<GenerationRequest, RequestError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(RequestError::EmptyTopic);
        }
        self.bounds.check(self.target_length)?;

        let target_audience = self
            .target_audience
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

        Ok(GenerationRequest {
            topic: topic.to_string(),
            tone: self.tone,
            target_length: self.target_length,
            target_audience,
            include_hashtags: self.include_hashtags,
            include_call_to_action: self.include_call_to_action,
        })
    }
}
