//! Process-wide resources and their lifecycle.
//!
//! - [`ResourceLifecycle`] owns the caption engine and the fetch client.
//! - [`ServiceContext`] bundles everything a request handler needs.

mod context;
mod resources;

pub use context::ServiceContext;
pub use resources::{PipelineState, ResourceLifecycle, SharedResources};
