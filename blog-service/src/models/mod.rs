//! Domain models for the blog service.

pub mod distribution;
pub mod post;
pub mod request;
pub mod result;
pub mod session;

pub use distribution::{
    DistributionError, DistributionRecord, DistributionSummary, RecipientOutcome, SendStatus,
};
pub use post::BlogPost;
pub use request::{GenerationRequest, GenerationRequestBuilder, LengthBounds, RequestError, Tone};
pub use result::{GenerationResult, Provenance};
pub use session::{Analytics, HistoryEntry, SessionState};
