//! Image download over HTTP.

mod client;

pub use client::ImageFetcher;
