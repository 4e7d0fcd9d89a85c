//! Named resources and the fetch machinery around them.

pub mod fallback;
pub mod fetcher;
pub mod types;

pub use fallback::{Effective, FallbackOutcome, FallbackPair, FallbackResolver, Source};
pub use fetcher::{FetchOutcome, ResourceFetcher, transport_error};
pub use types::{ResourceName, ResourceState};
