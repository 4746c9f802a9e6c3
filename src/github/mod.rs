pub mod api;
pub mod client;
pub mod rate_limiter;

pub use api::GitHubApi;
pub use client::GitHubClient;
pub use rate_limiter::{RateLimiter, ResourceClass};
