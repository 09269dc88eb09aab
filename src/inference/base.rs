//! Base trait for captioning models.

use image::RgbImage;
use serde_json::Value;

use crate::{CaptionError, CaptionResult};

/// A loaded image-to-text model.
///
/// `generate` is a blocking call: the engine always runs it on the blocking
/// thread pool, one image at a time. Implementations return the model's raw
/// output; [`normalize_output`] turns it into a caption.
pub trait CaptionModel: Send + Sync {
    /// Model identifier.
    fn name(&self) -> &str;

    /// Runs the model on one RGB image.
    fn generate(&self, image: &RgbImage) -> CaptionResult<Value>;
}

/// Extracts the caption from raw model output.
///
/// Accepted shapes are `[{"generated_text": ".."}]` and the nested
/// `[[{"generated_text": ".."}]]`. Anything else, including an empty or
/// whitespace-only caption, is [`CaptionError::MalformedOutput`].
pub fn normalize_output(output: &Value) -> CaptionResult<String> {
    let first = match output.as_array().and_then(|items| items.first()) {
        Some(first) => first,
        None => {
            return Err(CaptionError::MalformedOutput(format!(
                "expected a non-empty list, got {}",
                output
            )))
        }
    };

    let item = match first {
        Value::Array(inner) => inner.first().ok_or_else(|| {
            CaptionError::MalformedOutput("empty nested result list".to_string())
        })?,
        other => other,
    };

    let text = item
        .get("generated_text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CaptionError::MalformedOutput(format!("no generated_text in result item {}", item))
        })?
        .trim();

    if text.is_empty() {
        return Err(CaptionError::MalformedOutput(
            "generated_text is empty".to_string(),
        ));
    }

    Ok(text.to_string())
}
