//! Rate limiter implementations
//!
//! The node-local token bucket serves the `fast` policy variant and, in a
//! single-node deployment, stands in for the `consistent` one as well; a
//! cluster-coordinated limiter plugs in behind the same trait.

mod token_bucket;

pub use token_bucket::TokenBucketRatelimiter;
