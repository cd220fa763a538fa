pub mod dispatcher;
pub mod email;
pub mod fallback;
pub mod generation;
pub mod metrics;
pub mod packager;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod session_store;
pub mod template;

pub use dispatcher::{BatchMode, DistributionDispatcher};
pub use fallback::{FallbackSelector, FallbackStrategy};
pub use generation::{GenerationClient, GenerationError};
pub use packager::{package, unpack_json, ExportBundle, ExportRecord, PackagingError};
pub use pipeline::BlogPipeline;
pub use session_store::SessionStore;
