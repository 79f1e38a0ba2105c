//! Wire shapes for the bulk rating submit endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One normalized rating row. KAAB rows reuse the same shape; `type`
/// carries the category so the remote store routes each row to the right
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRow {
    pub skill_id: String,
    pub skill_level: u8,
    #[serde(rename = "type")]
    pub row_type: String,
    pub user_id: String,
}

/// The single batched request body: the full change set travels in one
/// call, skills and KAAB structurally distinguished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub skills: Vec<SubmitRow>,
    pub kaab: Vec<SubmitRow>,
    pub user_id: String,
    pub sub_institute_id: String,
}

/// 422-class response body: field-level messages to surface verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteFieldErrors {
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Flatten field errors into user-visible lines, field order stable.
#[must_use]
pub fn flatten_field_errors(body: &RemoteFieldErrors) -> Vec<String> {
    let mut lines = Vec::new();
    for (field, messages) in &body.errors {
        if messages.is_empty() {
            lines.push(field.clone());
        }
        for message in messages {
            lines.push(format!("{field}: {message}"));
        }
    }
    lines
}
