//! Layout projection
//!
//! Maps a workflow model into a plain directed graph that any layered
//! layout can draw. Besides one node per activity, the projection adds
//! synthetic nodes so editing affordances are drawable elements of their
//! own:
//!
//! - a single `start` node;
//! - a root connector `{activity}/start` in front of every root activity,
//!   wired `start -> {activity}/start -> {activity}`;
//! - an outcome connector `{activity}/{outcome}` for every effective outcome,
//!   wired `{activity} -> {activity}/{outcome}` and labelled with the outcome.
//!
//! The connector armed for the next connection is marked so a surface can
//! draw it highlighted.
//!
//! Real connections run from the outcome connector of their source to their
//! target. A connection whose connector does not exist (its outcome is not
//! among the source's effective outcomes) or whose target is not an
//! activity is left out and reported in [`ProjectedGraph::stale`].
//!
//! Nodes and edges keep first-insertion order, and setting an existing node
//! or edge (same endpoints) replaces it in place, so projecting an unchanged
//! model always yields an identical graph.

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::Serialize;

use crate::constants::nodes;
use crate::display::DisplayContexts;
use crate::types::{ActivityId, Connection, WorkflowModel};

/// What a projected node stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectedNodeKind {
    /// The synthetic start node
    Start,
    /// A real activity
    #[serde(rename_all = "camelCase")]
    Activity {
        activity_id: ActivityId,
        display_name: String,
        selected: bool,
    },
    /// An insertion affordance; `outcome` is `None` for a root connector
    #[serde(rename_all = "camelCase")]
    Connector {
        activity_id: ActivityId,
        outcome: Option<String>,
        /// Armed to receive the next connection (drawn highlighted)
        armed: bool,
    },
}

/// A node of the projected graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedNode {
    pub id: String,
    #[serde(flatten)]
    pub kind: ProjectedNodeKind,
}

/// What a projected edge stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectedEdgeKind {
    /// `start -> a/start` or `a/start -> a`
    Root,
    /// `a -> a/o`, labelled with the outcome
    #[serde(rename_all = "camelCase")]
    Outcome {
        activity_id: ActivityId,
        outcome: String,
    },
    /// `a/o -> b` for a real connection
    #[serde(rename_all = "camelCase")]
    Connection {
        source_id: ActivityId,
        outcome: String,
    },
}

/// An edge of the projected graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedEdge {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub kind: ProjectedEdgeKind,
}

impl ProjectedEdge {
    /// Label drawn on the edge, if any
    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            ProjectedEdgeKind::Outcome { outcome, .. } => Some(outcome.as_str()),
            _ => None,
        }
    }

    /// The `(source activity, outcome)` whose connections an edge gesture
    /// removes; root edges carry none
    pub fn connection_key(&self) -> Option<(&str, &str)> {
        match &self.kind {
            ProjectedEdgeKind::Root => None,
            ProjectedEdgeKind::Outcome {
                activity_id,
                outcome,
            } => Some((activity_id.as_str(), outcome.as_str())),
            ProjectedEdgeKind::Connection { source_id, outcome } => {
                Some((source_id.as_str(), outcome.as_str()))
            }
        }
    }
}

/// A connection left out of the projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleConnection {
    pub connection: Connection,
    /// The projected node that was expected but not found
    pub missing_node: String,
}

/// A renderable directed graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectedGraph {
    nodes: Vec<ProjectedNode>,
    edges: Vec<ProjectedEdge>,
    stale: Vec<StaleConnection>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    #[serde(skip)]
    edge_index: HashMap<(String, String), usize>,
}

impl ProjectedGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node
    pub fn set_node(&mut self, id: impl Into<String>, kind: ProjectedNodeKind) {
        let id = id.into();
        match self.node_index.get(&id) {
            Some(&index) => self.nodes[index].kind = kind,
            None => {
                self.node_index.insert(id.clone(), self.nodes.len());
                self.nodes.push(ProjectedNode { id, kind });
            }
        }
    }

    /// Insert or replace the edge between two nodes
    pub fn set_edge(&mut self, from: impl Into<String>, to: impl Into<String>, kind: ProjectedEdgeKind) {
        let key = (from.into(), to.into());
        match self.edge_index.get(&key) {
            Some(&index) => self.edges[index].kind = kind,
            None => {
                self.edge_index.insert(key.clone(), self.edges.len());
                self.edges.push(ProjectedEdge {
                    from: key.0,
                    to: key.1,
                    kind,
                });
            }
        }
    }

    /// Check if a node exists
    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Find a node by ID
    pub fn node(&self, id: &str) -> Option<&ProjectedNode> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    /// Find the edge between two nodes
    pub fn edge(&self, from: &str, to: &str) -> Option<&ProjectedEdge> {
        self.edge_index
            .get(&(from.to_string(), to.to_string()))
            .map(|&index| &self.edges[index])
    }

    /// Check if an edge exists
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edge(from, to).is_some()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[ProjectedNode] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[ProjectedEdge] {
        &self.edges
    }

    /// Connections that could not be drawn
    pub fn stale(&self) -> &[StaleConnection] {
        &self.stale
    }

    /// Edges leaving a node
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ProjectedEdge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }
}

/// ID of the root connector in front of an activity
pub fn root_connector_id(activity_id: &str) -> String {
    format!("{}{}{}", activity_id, nodes::SEPARATOR, nodes::ROOT_CONNECTOR)
}

/// ID of the connector for one outcome of an activity
pub fn outcome_connector_id(activity_id: &str, outcome: &str) -> String {
    format!("{}{}{}", activity_id, nodes::SEPARATOR, outcome)
}

/// Project a model into a renderable graph
///
/// `contexts` supplies each activity's effective outcomes; activities
/// without a context fall back to their declared outcomes. `selected`
/// marks activity nodes drawn as selected, and `armed` names the connector
/// node drawn highlighted.
pub fn project(
    model: &WorkflowModel,
    contexts: &DisplayContexts,
    selected: &HashSet<ActivityId>,
    armed: Option<&str>,
) -> ProjectedGraph {
    let mut graph = ProjectedGraph::new();

    graph.set_node(nodes::START, ProjectedNodeKind::Start);

    for activity in model.root_activities() {
        let connector = root_connector_id(&activity.activity_id);
        graph.set_edge(nodes::START, connector.clone(), ProjectedEdgeKind::Root);
        graph.set_node(
            connector.clone(),
            ProjectedNodeKind::Connector {
                activity_id: activity.activity_id.clone(),
                outcome: None,
                armed: armed == Some(connector.as_str()),
            },
        );
        graph.set_edge(connector, activity.activity_id.clone(), ProjectedEdgeKind::Root);
    }

    for activity in &model.activities {
        let activity_id = &activity.activity_id;
        graph.set_node(
            activity_id.clone(),
            ProjectedNodeKind::Activity {
                activity_id: activity_id.clone(),
                display_name: activity.display_name.clone(),
                selected: selected.contains(activity_id),
            },
        );

        let outcomes = contexts
            .get(activity_id)
            .map(|c| &c.outcomes)
            .unwrap_or(&activity.outcomes);

        for outcome in outcomes {
            let connector = outcome_connector_id(activity_id, outcome);
            graph.set_node(
                connector.clone(),
                ProjectedNodeKind::Connector {
                    activity_id: activity_id.clone(),
                    outcome: Some(outcome.clone()),
                    armed: armed == Some(connector.as_str()),
                },
            );
            graph.set_edge(
                activity_id.clone(),
                connector,
                ProjectedEdgeKind::Outcome {
                    activity_id: activity_id.clone(),
                    outcome: outcome.clone(),
                },
            );
        }
    }

    for connection in &model.connections {
        let source = outcome_connector_id(&connection.source_id, &connection.outcome);

        let missing = if !graph.has_node(&source) {
            Some(source.clone())
        } else if !model.contains_activity(&connection.target_id) {
            Some(connection.target_id.clone())
        } else {
            None
        };

        if let Some(missing_node) = missing {
            warn!("No node with ID '{}' exists; skipping connection", missing_node);
            graph.stale.push(StaleConnection {
                connection: connection.clone(),
                missing_node,
            });
            continue;
        }

        graph.set_edge(
            source,
            connection.target_id.clone(),
            ProjectedEdgeKind::Connection {
                source_id: connection.source_id.clone(),
                outcome: connection.outcome.clone(),
            },
        );
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;
    use crate::display::{ActivityIcon, DisplayContext};

    fn model() -> WorkflowModel {
        WorkflowBuilder::new()
            .add_activity("a", "If")
            .with_outcomes(["True", "False"])
            .add_activity("b", "WriteLine")
            .with_outcomes(["Done"])
            .connect("a", "b", "True")
            .build()
    }

    fn no_selection() -> HashSet<ActivityId> {
        HashSet::new()
    }

    #[test]
    fn test_start_and_root_connectors() {
        let graph = project(&model(), &DisplayContexts::new(), &no_selection(), None);

        assert_eq!(graph.nodes()[0].kind, ProjectedNodeKind::Start);
        assert!(graph.has_node("a/start"));
        assert!(!graph.has_node("b/start"));
        assert!(graph.has_edge("start", "a/start"));
        assert!(graph.has_edge("a/start", "a"));
        assert!(matches!(
            graph.node("a/start").unwrap().kind,
            ProjectedNodeKind::Connector { outcome: None, .. }
        ));
    }

    #[test]
    fn test_outcome_connectors() {
        let graph = project(&model(), &DisplayContexts::new(), &no_selection(), None);

        for outcome in ["True", "False"] {
            let connector = format!("a/{}", outcome);
            assert!(graph.has_node(&connector));
            let edge = graph.edge("a", &connector).unwrap();
            assert_eq!(edge.label(), Some(outcome));
        }
        assert!(graph.has_edge("b", "b/Done"));
    }

    #[test]
    fn test_connection_edges() {
        let graph = project(&model(), &DisplayContexts::new(), &no_selection(), None);

        let edge = graph.edge("a/True", "b").unwrap();
        assert_eq!(edge.connection_key(), Some(("a", "True")));
        assert!(graph.stale().is_empty());
    }

    #[test]
    fn test_stale_outcome_is_skipped() {
        let mut model = model();
        model.connections.push(Connection::new("b", "a", "Error"));

        let graph = project(&model, &DisplayContexts::new(), &no_selection(), None);
        assert!(!graph.has_edge("b/Error", "a"));
        assert_eq!(graph.stale().len(), 1);
        assert_eq!(graph.stale()[0].missing_node, "b/Error");
    }

    #[test]
    fn test_dangling_target_is_skipped() {
        let mut model = model();
        model.connections.push(Connection::new("b", "gone", "Done"));

        let graph = project(&model, &DisplayContexts::new(), &no_selection(), None);
        assert!(!graph.has_node("gone"));
        assert_eq!(graph.stale()[0].missing_node, "gone");
    }

    #[test]
    fn test_display_context_outcomes_win() {
        let model = model();
        let mut contexts = DisplayContexts::new();
        contexts.insert(
            "b".to_string(),
            DisplayContext {
                activity: model.find_activity("b").unwrap().clone(),
                icon: ActivityIcon {
                    color: "light-blue".to_string(),
                },
                body_display: None,
                outcomes: vec!["Next".to_string()],
            },
        );

        let graph = project(&model, &contexts, &no_selection(), None);
        assert!(graph.has_node("b/Next"));
        assert!(!graph.has_node("b/Done"));
    }

    #[test]
    fn test_duplicate_connections_draw_once() {
        let mut model = model();
        model.connections.push(Connection::new("a", "b", "True"));

        let graph = project(&model, &DisplayContexts::new(), &no_selection(), None);
        let count = graph.edges().iter().filter(|e| e.from == "a/True").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_selection_is_projected() {
        let selected: HashSet<ActivityId> = ["b".to_string()].into_iter().collect();
        let graph = project(&model(), &DisplayContexts::new(), &selected, None);

        assert!(matches!(
            graph.node("b").unwrap().kind,
            ProjectedNodeKind::Activity { selected: true, .. }
        ));
        assert!(matches!(
            graph.node("a").unwrap().kind,
            ProjectedNodeKind::Activity { selected: false, .. }
        ));
    }

    #[test]
    fn test_armed_connector_is_marked() {
        let graph = project(&model(), &DisplayContexts::new(), &no_selection(), Some("a/False"));

        assert!(matches!(
            graph.node("a/False").unwrap().kind,
            ProjectedNodeKind::Connector { armed: true, .. }
        ));
        assert!(matches!(
            graph.node("a/True").unwrap().kind,
            ProjectedNodeKind::Connector { armed: false, .. }
        ));
        assert!(matches!(
            graph.node("a/start").unwrap().kind,
            ProjectedNodeKind::Connector { armed: false, .. }
        ));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let model = model();
        let first = project(&model, &DisplayContexts::new(), &no_selection(), None);
        let second = project(&model, &DisplayContexts::new(), &no_selection(), None);
        assert_eq!(first, second);
    }
}
