//! Core types for workflow graphs
//!
//! These types define the structure of a workflow as the designer sees it:
//! activities, the outcome-addressed connections between them, and the
//! workflow model that owns both. They are plain values; every edit produces
//! a new model (see [`crate::mutation`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unique identifier for an activity
pub type ActivityId = String;

/// An expression bound to an activity property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    /// Expression syntax (e.g. "Literal", "JavaScript"); empty when unset
    pub syntax: String,
    /// Expression source; empty when unset
    pub expression: String,
}

impl PropertyValue {
    /// Create a property value
    pub fn new(syntax: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            syntax: syntax.into(),
            expression: expression.into(),
        }
    }
}

/// An activity (workflow step) placed on the design surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Unique identifier, immutable after creation
    pub activity_id: ActivityId,
    /// Activity type (references an ActivityDescriptor)
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Human-readable name shown on the node
    pub display_name: String,
    /// Optional free text shown in the node body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared outcomes, in display order
    #[serde(default)]
    pub outcomes: Vec<String>,
    /// Property expressions keyed by property name
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Activity {
    /// Create an activity with no outcomes or properties
    pub fn new(
        activity_id: impl Into<String>,
        activity_type: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            activity_type: activity_type.into(),
            display_name: display_name.into(),
            description: None,
            outcomes: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Check if this activity declares the given outcome
    pub fn has_outcome(&self, outcome: &str) -> bool {
        self.outcomes.iter().any(|o| o == outcome)
    }
}

/// A directed edge: when `source_id` yields `outcome`, continue at `target_id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source activity ID
    pub source_id: ActivityId,
    /// Target activity ID
    pub target_id: ActivityId,
    /// Outcome of the source that this connection follows
    pub outcome: String,
}

impl Connection {
    /// Create a connection
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            outcome: outcome.into(),
        }
    }

    /// Check if this connection touches the given activity at either end
    pub fn touches(&self, activity_id: &str) -> bool {
        self.source_id == activity_id || self.target_id == activity_id
    }
}

/// When the workflow runtime persists workflow instances
///
/// The designer carries this value through edits untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersistenceBehavior {
    /// Persist only when the workflow suspends
    Suspended,
    /// Persist at the end of each burst of execution
    #[default]
    WorkflowBurst,
    /// Persist when a workflow pass completes
    WorkflowPassCompleted,
    /// Persist after every executed activity
    ActivityExecuted,
}

/// A complete workflow as edited by the designer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowModel {
    /// Activities in insertion order
    pub activities: Vec<Activity>,
    /// Connections in insertion order
    pub connections: Vec<Connection>,
    /// Persistence behavior of the workflow
    #[serde(default)]
    pub persistence_behavior: PersistenceBehavior,
}

impl WorkflowModel {
    /// Create a new empty workflow
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an activity by ID
    pub fn find_activity(&self, activity_id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.activity_id == activity_id)
    }

    /// Check if an activity with the given ID exists
    pub fn contains_activity(&self, activity_id: &str) -> bool {
        self.find_activity(activity_id).is_some()
    }

    /// Get connections targeting an activity
    pub fn inbound_connections<'a>(
        &'a self,
        activity_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.target_id == activity_id)
    }

    /// Get connections leaving an activity
    pub fn outbound_connections<'a>(
        &'a self,
        activity_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.source_id == activity_id)
    }

    /// Get activities that no connection targets, in model order
    pub fn root_activities(&self) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| self.inbound_connections(&a.activity_id).next().is_none())
            .collect()
    }
}

/// Designer mode supplied by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignerMode {
    /// Full authoring: connectors, edge removal and context menus
    #[default]
    Edit,
    /// Viewing a running or finished instance; context menus only
    Instance,
    /// Any other read-only presentation
    ReadOnly,
}

impl DesignerMode {
    /// Whether connector buttons, the start button and edge gestures are live
    pub fn allows_authoring(&self) -> bool {
        matches!(self, DesignerMode::Edit)
    }

    /// Whether the per-activity context-menu button is live
    pub fn allows_context_menu(&self) -> bool {
        matches!(self, DesignerMode::Edit | DesignerMode::Instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorkflowModel {
        let mut model = WorkflowModel::new();
        model.activities.push(Activity::new("a", "WriteLine", "A"));
        model.activities.push(Activity::new("b", "WriteLine", "B"));
        model.activities.push(Activity::new("c", "WriteLine", "C"));
        model.connections.push(Connection::new("a", "b", "Done"));
        model
    }

    #[test]
    fn test_root_activities() {
        let model = sample();
        let roots: Vec<&str> = model
            .root_activities()
            .iter()
            .map(|a| a.activity_id.as_str())
            .collect();
        assert_eq!(roots, vec!["a", "c"]);
    }

    #[test]
    fn test_inbound_outbound() {
        let model = sample();
        assert_eq!(model.inbound_connections("b").count(), 1);
        assert_eq!(model.outbound_connections("a").count(), 1);
        assert_eq!(model.outbound_connections("b").count(), 0);
    }

    #[test]
    fn test_activity_serializes_type_field() {
        let activity = Activity::new("a", "WriteLine", "A");
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "WriteLine");
        assert_eq!(json["activityId"], "a");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_mode_affordances() {
        assert!(DesignerMode::Edit.allows_authoring());
        assert!(!DesignerMode::Instance.allows_authoring());
        assert!(DesignerMode::Instance.allows_context_menu());
        assert!(!DesignerMode::ReadOnly.allows_context_menu());
    }
}
