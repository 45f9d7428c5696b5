//! Error types for the designer engine

use thiserror::Error;

/// Result type alias using DesignerError
pub type Result<T> = std::result::Result<T, DesignerError>;

/// Errors that can occur while editing or rendering a workflow
#[derive(Debug, Error)]
pub enum DesignerError {
    /// An activity referenced by an edit does not exist in the model
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    /// No descriptor is registered for an activity type
    #[error("Unknown activity type '{activity_type}' for activity '{activity_id}'")]
    UnknownActivityType {
        activity_id: String,
        activity_type: String,
    },

    /// A connection endpoint does not reference an activity in the model
    #[error("Connection {role} '{activity_id}' is not an activity in the workflow")]
    DanglingEndpoint {
        role: &'static str,
        activity_id: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Layout backend failed to lay out the diagram
    #[error("Layout error: {0}")]
    Layout(String),
}

impl DesignerError {
    /// Create an unknown activity type error
    pub fn unknown_type(activity_id: impl Into<String>, activity_type: impl Into<String>) -> Self {
        Self::UnknownActivityType {
            activity_id: activity_id.into(),
            activity_type: activity_type.into(),
        }
    }

    /// Create a dangling source endpoint error
    pub fn dangling_source(activity_id: impl Into<String>) -> Self {
        Self::DanglingEndpoint {
            role: "source",
            activity_id: activity_id.into(),
        }
    }

    /// Create a dangling target endpoint error
    pub fn dangling_target(activity_id: impl Into<String>) -> Self {
        Self::DanglingEndpoint {
            role: "target",
            activity_id: activity_id.into(),
        }
    }
}
