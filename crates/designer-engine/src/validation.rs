//! Workflow model validation
//!
//! Checks that a model honours the designer's structural rules. Models
//! built only through [`crate::mutation`] pass; models supplied by a host
//! may not, and the controller reports what it finds.

use std::collections::HashSet;

use crate::registry::ActivityRegistry;
use crate::types::WorkflowModel;

/// A structural problem found in a workflow model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two activities share an ID
    DuplicateActivityId { activity_id: String },
    /// A connection endpoint is not an activity in the model
    UnknownActivity {
        source_id: String,
        target_id: String,
        activity_id: String,
    },
    /// A connection follows an outcome its source does not declare
    UndeclaredOutcome { source_id: String, outcome: String },
    /// More than one connection leaves the same outcome of an activity
    DuplicateOutcomeConnection { source_id: String, outcome: String },
    /// An activity type has no descriptor in the catalog
    UnknownActivityType {
        activity_id: String,
        activity_type: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateActivityId { activity_id } => {
                write!(f, "Activity ID '{}' is used more than once", activity_id)
            }
            Self::UnknownActivity {
                source_id,
                target_id,
                activity_id,
            } => {
                write!(
                    f,
                    "Connection '{}' -> '{}' references unknown activity '{}'",
                    source_id, target_id, activity_id
                )
            }
            Self::UndeclaredOutcome { source_id, outcome } => {
                write!(
                    f,
                    "Activity '{}' does not declare outcome '{}'",
                    source_id, outcome
                )
            }
            Self::DuplicateOutcomeConnection { source_id, outcome } => {
                write!(
                    f,
                    "Outcome '{}' of activity '{}' has more than one connection",
                    outcome, source_id
                )
            }
            Self::UnknownActivityType {
                activity_id,
                activity_type,
            } => {
                write!(
                    f,
                    "Unknown activity type '{}' for activity '{}'",
                    activity_type, activity_id
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a workflow model
///
/// Returns all validation errors found (not just the first).
/// Pass a registry to also check activity types.
pub fn validate_workflow(
    model: &WorkflowModel,
    registry: Option<&ActivityRegistry>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_unique_ids(model, &mut errors);
    validate_connections(model, &mut errors);

    if let Some(reg) = registry {
        validate_activity_types(model, reg, &mut errors);
    }

    errors
}

fn validate_unique_ids(model: &WorkflowModel, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();

    for activity in &model.activities {
        let id = activity.activity_id.as_str();
        if !seen.insert(id) && reported.insert(id) {
            errors.push(ValidationError::DuplicateActivityId {
                activity_id: id.to_string(),
            });
        }
    }
}

/// Check endpoints, declared outcomes and `(source, outcome)` uniqueness
fn validate_connections(model: &WorkflowModel, errors: &mut Vec<ValidationError>) {
    let mut keys = HashSet::new();
    let mut reported = HashSet::new();

    for connection in &model.connections {
        for endpoint in [&connection.source_id, &connection.target_id] {
            if !model.contains_activity(endpoint) {
                errors.push(ValidationError::UnknownActivity {
                    source_id: connection.source_id.clone(),
                    target_id: connection.target_id.clone(),
                    activity_id: endpoint.clone(),
                });
            }
        }

        if let Some(source) = model.find_activity(&connection.source_id) {
            if !source.has_outcome(&connection.outcome) {
                errors.push(ValidationError::UndeclaredOutcome {
                    source_id: connection.source_id.clone(),
                    outcome: connection.outcome.clone(),
                });
            }
        }

        let key = (connection.source_id.as_str(), connection.outcome.as_str());
        if !keys.insert(key) && reported.insert(key) {
            errors.push(ValidationError::DuplicateOutcomeConnection {
                source_id: connection.source_id.clone(),
                outcome: connection.outcome.clone(),
            });
        }
    }
}

fn validate_activity_types(
    model: &WorkflowModel,
    registry: &ActivityRegistry,
    errors: &mut Vec<ValidationError>,
) {
    for activity in &model.activities {
        if !registry.has_activity_type(&activity.activity_type) {
            errors.push(ValidationError::UnknownActivityType {
                activity_id: activity.activity_id.clone(),
                activity_type: activity.activity_type.clone(),
            });
        }
    }
}
