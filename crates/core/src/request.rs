//! Job requests: which workflow to run and the node parameters bound to it.
//!
//! A [`JobRequest`] is transient. It is built by the caller, validated,
//! sent once (or a few times on queue saturation) and dropped.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// File references
// ---------------------------------------------------------------------------

/// Opaque reference to a file previously accepted by the vendor's upload
/// endpoint.
///
/// Only the upload call (or a caller that issued the reference itself)
/// should construct one, which is why there is no `From<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    /// Wrap a reference string returned by a successful upload.
    pub fn from_upload(reference: impl Into<String>) -> Result<Self, CoreError> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(CoreError::Validation(
                "Upload returned an empty file reference".to_string(),
            ));
        }
        Ok(Self(reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Value bound to a node field. Both variants travel as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ParamValue {
    Text(String),
    File(FileRef),
}

impl ParamValue {
    /// The string sent to the vendor.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::File(file) => file.as_str(),
        }
    }
}

/// One `(slot, field, value)` binding in the vendor's workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeParameter {
    /// Input socket id in the workflow graph. Opaque, workflow-specific.
    pub slot_id: String,
    /// Parameter key within that socket.
    pub field_name: String,
    pub value: ParamValue,
    pub description: Option<String>,
}

impl NodeParameter {
    pub fn text(
        slot_id: impl Into<String>,
        field_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            slot_id: slot_id.into(),
            field_name: field_name.into(),
            value: ParamValue::Text(value.into()),
            description: None,
        }
    }

    pub fn file(slot_id: impl Into<String>, field_name: impl Into<String>, file: FileRef) -> Self {
        Self {
            slot_id: slot_id.into(),
            field_name: field_name.into(),
            value: ParamValue::File(file),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A generation request against one vendor workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Which vendor workflow/application to invoke.
    pub target_endpoint: String,
    /// Bindings in insertion order.
    pub parameters: Vec<NodeParameter>,
}

impl JobRequest {
    pub fn new(target_endpoint: impl Into<String>) -> Self {
        Self {
            target_endpoint: target_endpoint.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a binding, keeping insertion order.
    pub fn with_parameter(mut self, parameter: NodeParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// File references bound anywhere in this request.
    pub fn file_refs(&self) -> impl Iterator<Item = &FileRef> {
        self.parameters.iter().filter_map(|p| match &p.value {
            ParamValue::File(file) => Some(file),
            ParamValue::Text(_) => None,
        })
    }

    /// Check the request before it is sent.
    ///
    /// - `target_endpoint` must be non-blank.
    /// - At least one parameter is required.
    /// - `slot_id` and `field_name` must be non-blank.
    /// - A `(slot_id, field_name)` pair may appear only once.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.target_endpoint.trim().is_empty() {
            return Err(CoreError::Validation(
                "target_endpoint must not be empty".to_string(),
            ));
        }
        if self.parameters.is_empty() {
            return Err(CoreError::Validation(
                "A job request needs at least one parameter".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.parameters.len());
        for (index, param) in self.parameters.iter().enumerate() {
            if param.slot_id.trim().is_empty() || param.field_name.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Parameter {index} must have a slot_id and a field_name"
                )));
            }
            if !seen.insert((param.slot_id.as_str(), param.field_name.as_str())) {
                return Err(CoreError::Validation(format!(
                    "Duplicate binding for slot '{}' field '{}'",
                    param.slot_id, param.field_name
                )));
            }
        }
        Ok(())
    }
}
