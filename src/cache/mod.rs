//! # Query Cache Module
//!
//! Memoizes lookup results for the lifetime of one conversational session, so
//! repeating a query never calls the external provider again.
//!
//! ## Overview
//!
//! The cache is deliberately small:
//! - keys are the literal query strings, compared verbatim
//! - each key is written at most once; later writes are ignored
//! - there is no eviction, expiry, size bound or persistence
//!
//! Concurrent first-time lookups of one query share a single slot, which the
//! [`ResilientInvoker`](crate::resilience::ResilientInvoker) uses to make sure
//! only one of them reaches the provider.
//!
//! ## Example
//!
//! ```rust
//! use chat_search::cache::QueryCache;
//!
//! # tokio_test::block_on(async {
//! let cache = QueryCache::new();
//! assert!(cache.put("transformers", "Page: Transformer (deep learning)").await);
//! assert!(!cache.put("transformers", "something else").await);
//! assert_eq!(
//!     cache.get("transformers").as_deref(),
//!     Some("Page: Transformer (deep learning)")
//! );
//! # });
//! ```

mod query_cache;

pub use query_cache::QueryCache;
