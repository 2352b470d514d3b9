pub mod codec;
pub mod cookie;
pub mod rate_limiter;
