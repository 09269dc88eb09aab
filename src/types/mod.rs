//! Shared types: configuration, errors, requests and responses.

pub mod config;
pub mod errors;
pub mod requests;
pub mod responses;
