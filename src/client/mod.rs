//! Caller-side wrapper over the HTTP API.

pub mod api;
pub mod normalize;

pub use api::ApiClient;
pub use normalize::{ResponseEnvelopeNormalizer, try_normalize};
