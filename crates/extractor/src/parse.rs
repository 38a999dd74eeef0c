//! Response parsing
//!
//! The service is asked for a bare JSON array but routinely wraps it
//! in prose or formatting. Parsing takes the span from the first `[`
//! to the last `]` and reads it as a JSON array of strings.

use crate::{ExtractError, Result};

/// Locate and parse the embedded step array in a raw response body
pub fn extract_step_list(content: &str) -> Result<Vec<String>> {
    let start = content.find('[').ok_or(ExtractError::MalformedResponse)?;
    let end = content.rfind(']').ok_or(ExtractError::MalformedResponse)?;
    if end < start {
        return Err(ExtractError::MalformedResponse);
    }

    let span = &content[start..=end];
    let steps: Vec<String> =
        serde_json::from_str(span).map_err(|_| ExtractError::MalformedResponse)?;

    if steps.iter().all(|s| s.trim().is_empty()) {
        return Err(ExtractError::Empty);
    }

    Ok(steps)
}
