//! Pseudocode visualization
//!
//! Converts pseudocode into a small validated shape list via the
//! reasoning capability. Trivial input and every failure mode yield an
//! empty list.

use serde_json::Value;
use tracing::warn;

use crate::prompts;
use crate::services::Reasoner;

const MIN_PSEUDOCODE_CHARS: usize = 10;
const MAX_SHAPES: usize = 12;

/// Convert pseudocode into diagram shapes.
pub async fn pseudocode_to_shapes(
    reasoner: &dyn Reasoner,
    pseudocode: &str,
    problem_title: &str,
) -> Vec<Value> {
    if pseudocode.trim().len() < MIN_PSEUDOCODE_CHARS {
        return Vec::new();
    }

    let context = if problem_title.is_empty() {
        pseudocode.to_string()
    } else {
        format!("Problem: {}\n\n{}", problem_title, pseudocode)
    };

    let raw = match reasoner
        .reason(prompts::VISUALIZER_SYSTEM_PROMPT, &context, None)
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "visualization call failed");
            return Vec::new();
        }
    };

    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "malformed visualization reply");
            return Vec::new();
        }
    };

    // Accept {"shapes": [...]}, {"diagram": [...]}, or a bare array
    let shapes = match &parsed {
        Value::Object(obj) => obj.get("shapes").or_else(|| obj.get("diagram")),
        Value::Array(_) => Some(&parsed),
        _ => None,
    };

    let Some(Value::Array(shapes)) = shapes else {
        return Vec::new();
    };

    shapes
        .iter()
        .filter(|s| {
            matches!(
                s.get("type").and_then(Value::as_str),
                Some("box") | Some("text") | Some("arrow")
            )
        })
        .take(MAX_SHAPES)
        .cloned()
        .collect()
}
