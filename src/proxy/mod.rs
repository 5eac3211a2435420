//! Proxy module
//!
//! Upstream client abstraction used by the relay to reach the LLM provider.

pub mod headers;
pub mod http;
pub mod logging;
pub mod upstream;

pub use http::HttpUpstream;
pub use logging::RequestContext;
pub use upstream::{ByteStream, ForwardRequest, UpstreamClient, UpstreamResponse};
