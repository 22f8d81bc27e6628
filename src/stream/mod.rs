//! Stream utilities for frame subscribers

mod rate_limit;

pub use rate_limit::{RateLimitExt, RateLimited};
