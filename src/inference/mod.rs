//! Captioning models and the engine that runs them.
//!
//! - [`CaptionModel`] is the seam for model backends.
//! - [`RemoteCaptionModel`] talks to a hosted inference endpoint.
//! - [`CaptionEngine`] decodes images and runs the model off the async runtime.

mod base;
mod engine;
mod remote;

use std::sync::Arc;

pub use base::{normalize_output, CaptionModel};
pub use engine::{decode_rgb, CaptionEngine};
pub use remote::RemoteCaptionModel;

use crate::types::config::ModelConfig;
use crate::CaptionResult;

/// Loads the configured captioning model.
///
/// Blocking: call it from a blocking thread.
pub fn load_model(config: &ModelConfig) -> CaptionResult<Arc<dyn CaptionModel>> {
    let model = RemoteCaptionModel::load(config)?;
    Ok(Arc::new(model))
}
