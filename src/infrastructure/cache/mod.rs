pub mod query_cache;

pub use query_cache::{Fetcher, QueryCache, QueryHandle, QueryKey, QueryState};
