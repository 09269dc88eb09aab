//! LRU cache for caption outcomes.
//!
//! This module implements a Least Recently Used (LRU) cache that memoizes
//! the outcome of captioning a URL, successful or not, so repeated requests
//! for the same image skip the fetch and the model.

mod lru;

pub use self::lru::{CacheStats, ResultCache};
