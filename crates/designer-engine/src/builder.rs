//! Fluent builder for workflow models
//!
//! Provides a compact API for constructing models in host code and tests.

use crate::types::{Activity, Connection, PersistenceBehavior, PropertyValue, WorkflowModel};

/// Fluent builder for constructing workflow models
///
/// # Example
///
/// ```ignore
/// let model = WorkflowBuilder::new()
///     .add_activity("a", "WriteLine")
///     .with_outcomes(["Done"])
///     .add_activity("b", "WriteLine")
///     .connect("a", "b", "Done")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct WorkflowBuilder {
    activities: Vec<Activity>,
    connections: Vec<Connection>,
    persistence_behavior: PersistenceBehavior,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an activity whose display name is its ID
    pub fn add_activity(mut self, id: impl Into<String>, activity_type: impl Into<String>) -> Self {
        let id = id.into();
        self.activities
            .push(Activity::new(id.clone(), activity_type, id));
        self
    }

    /// Set the outcomes of the most recently added activity
    ///
    /// Must be called after `add_activity`.
    pub fn with_outcomes<I, S>(mut self, outcomes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(activity) = self.activities.last_mut() {
            activity.outcomes = outcomes.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Set the description of the most recently added activity
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        if let Some(activity) = self.activities.last_mut() {
            activity.description = Some(description.into());
        }
        self
    }

    /// Set a property on the most recently added activity
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        syntax: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        if let Some(activity) = self.activities.last_mut() {
            activity
                .properties
                .insert(name.into(), PropertyValue::new(syntax, expression));
        }
        self
    }

    /// Add a connection between two activities
    pub fn connect(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        self.connections
            .push(Connection::new(source, target, outcome));
        self
    }

    /// Set the persistence behavior
    pub fn persistence(mut self, behavior: PersistenceBehavior) -> Self {
        self.persistence_behavior = behavior;
        self
    }

    /// Build the model without validation
    pub fn build(self) -> WorkflowModel {
        WorkflowModel {
            activities: self.activities,
            connections: self.connections,
            persistence_behavior: self.persistence_behavior,
        }
    }
}
