pub mod http_client;
pub mod in_memory;
pub mod wire;

pub use http_client::HttpPostApi;
pub use in_memory::{ApiCallCounts, FEED_LIMIT, InMemoryPostApi};
