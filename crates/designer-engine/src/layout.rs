//! Diagram adapter
//!
//! Hands a [`ProjectedGraph`] to a drawing surface and decides which drawn
//! elements react to input.
//!
//! A [`DiagramSurface`] stands for the external layout/drawing backend. The
//! [`DiagramAdapter`] wraps every draw so the user's pan/zoom survives it:
//! the current transform is captured, the zoom is forced to 1 while the
//! backend sizes the diagram, and the captured transform is put back
//! afterwards, even when the draw fails.
//!
//! [`LayeredLayout`] is the built-in backend algorithm: longest-path ranks
//! from the start node, barycenter ordering inside each rank, and fixed
//! spacing. [`HeadlessSurface`] runs it without any real canvas.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::controller::PendingSource;
use crate::error::Result;
use crate::projection::{ProjectedGraph, ProjectedNodeKind};
use crate::types::{ActivityId, DesignerMode};

/// Pan/zoom transform of the diagram viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

/// A positioned node (center coordinates)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBox {
    pub id: String,
    pub rank: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A routed edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRoute {
    pub from: String,
    pub to: String,
    pub points: Vec<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Result of laying out a projected graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagramLayout {
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<EdgeRoute>,
    pub width: f64,
    pub height: f64,
}

impl DiagramLayout {
    /// Find a positioned node by ID
    pub fn node(&self, id: &str) -> Option<&NodeBox> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// The external layout/drawing backend
pub trait DiagramSurface {
    /// Current viewport transform
    fn transform(&self) -> ViewTransform;

    /// Replace the viewport transform
    fn set_transform(&mut self, transform: ViewTransform);

    /// Zoom to `scale`, keeping the pan offset
    fn scale_to(&mut self, scale: f64);

    /// Lay out and draw the graph, replacing whatever was drawn before
    fn draw(&mut self, graph: &ProjectedGraph) -> Result<DiagramLayout>;
}

/// Drives a surface while preserving the user's pan/zoom
pub struct DiagramAdapter<S: DiagramSurface> {
    surface: S,
}

impl<S: DiagramSurface> DiagramAdapter<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    /// Re-lay out the diagram without disturbing the viewport
    pub fn render(&mut self, graph: &ProjectedGraph) -> Result<DiagramLayout> {
        let captured = self.surface.transform();
        self.surface.scale_to(1.0);
        let drawn = self.surface.draw(graph);
        self.surface.scale_to(captured.scale);
        self.surface.set_transform(captured);
        drawn
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

/// Handlers attached to the drawn elements for one render pass
///
/// Rebuilt after every re-layout, because the drawn elements are recreated
/// each time. Only elements present here react to input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionMap {
    start: bool,
    connectors: HashMap<String, PendingSource>,
    activities: HashSet<ActivityId>,
    context_menus: HashSet<ActivityId>,
    edges: HashMap<(String, String), (ActivityId, String)>,
}

impl InteractionMap {
    /// Attach handlers for `mode` to the elements of `graph`
    pub fn attach(graph: &ProjectedGraph, mode: DesignerMode) -> Self {
        let mut map = Self::default();
        let authoring = mode.allows_authoring();

        for node in graph.nodes() {
            match &node.kind {
                ProjectedNodeKind::Start => map.start = authoring,
                ProjectedNodeKind::Connector {
                    activity_id,
                    outcome,
                    ..
                } => {
                    if authoring {
                        map.connectors.insert(
                            node.id.clone(),
                            PendingSource::new(activity_id.clone(), outcome.clone()),
                        );
                    }
                }
                ProjectedNodeKind::Activity { activity_id, .. } => {
                    map.activities.insert(activity_id.clone());
                    if mode.allows_context_menu() {
                        map.context_menus.insert(activity_id.clone());
                    }
                }
            }
        }

        if authoring {
            for edge in graph.edges() {
                if let Some((source_id, outcome)) = edge.connection_key() {
                    map.edges.insert(
                        (edge.from.clone(), edge.to.clone()),
                        (source_id.to_string(), outcome.to_string()),
                    );
                }
            }
        }

        map
    }

    /// Whether the start node opens the picker
    pub fn start_enabled(&self) -> bool {
        self.start
    }

    /// The pending source a connector click arms
    pub fn connector(&self, node_id: &str) -> Option<&PendingSource> {
        self.connectors.get(node_id)
    }

    /// Whether an activity node handles clicks
    pub fn activity(&self, activity_id: &str) -> bool {
        self.activities.contains(activity_id)
    }

    /// Whether an activity's context-menu button is live
    pub fn context_menu(&self, activity_id: &str) -> bool {
        self.context_menus.contains(activity_id)
    }

    /// The connection key a context gesture on an edge removes
    pub fn edge(&self, from: &str, to: &str) -> Option<(&str, &str)> {
        self.edges
            .get(&(from.to_string(), to.to_string()))
            .map(|(source, outcome)| (source.as_str(), outcome.as_str()))
    }
}

/// Layered (Sugiyama-style) layout
#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
    config: LayoutConfig,
}

impl LayeredLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Compute node positions and edge routes
    pub fn layout(&self, graph: &ProjectedGraph) -> DiagramLayout {
        let ids: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        if ids.is_empty() {
            return DiagramLayout::default();
        }
        let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
        for edge in graph.edges() {
            if let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
                successors[from].push(to);
            }
        }

        let forward = remove_back_edges(&successors);
        let ranks = longest_path_ranks(&forward);
        let rows = order_ranks(&ranks, &forward);

        let sizes: Vec<(f64, f64)> = graph
            .nodes()
            .iter()
            .map(|n| self.node_size(&n.kind))
            .collect();

        let mut positions = vec![(0.0, 0.0); ids.len()];
        let mut width: f64 = 0.0;
        let mut y = 0.0;
        for row in &rows {
            let row_height = row.iter().map(|&n| sizes[n].1).fold(0.0, f64::max);
            let row_width = row.iter().map(|&n| sizes[n].0).sum::<f64>()
                + self.config.node_sep * row.len().saturating_sub(1) as f64;
            width = width.max(row_width);

            let mut x = -row_width / 2.0;
            for &n in row {
                positions[n] = (x + sizes[n].0 / 2.0, y + row_height / 2.0);
                x += sizes[n].0 + self.config.node_sep;
            }
            y += row_height + self.config.rank_sep;
        }
        let height = (y - self.config.rank_sep).max(0.0);

        // shift so the diagram starts at x = 0
        for position in &mut positions {
            position.0 += width / 2.0;
        }

        let nodes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| NodeBox {
                id: id.to_string(),
                rank: ranks[i],
                x: positions[i].0,
                y: positions[i].1,
                width: sizes[i].0,
                height: sizes[i].1,
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let from = *index.get(edge.from.as_str())?;
                let to = *index.get(edge.to.as_str())?;
                let start = (positions[from].0, positions[from].1 + sizes[from].1 / 2.0);
                let end = (positions[to].0, positions[to].1 - sizes[to].1 / 2.0);
                Some(EdgeRoute {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    points: vec![start, end],
                    label: edge.label().map(str::to_string),
                })
            })
            .collect();

        DiagramLayout {
            nodes,
            edges,
            width,
            height,
        }
    }

    fn node_size(&self, kind: &ProjectedNodeKind) -> (f64, f64) {
        match kind {
            ProjectedNodeKind::Start => (self.config.start_width, self.config.start_height),
            ProjectedNodeKind::Activity { .. } => {
                (self.config.activity_width, self.config.activity_height)
            }
            ProjectedNodeKind::Connector { .. } => {
                (self.config.connector_size, self.config.connector_size)
            }
        }
    }
}

/// Drop the edges that close a cycle, found by DFS in node order
fn remove_back_edges(successors: &[Vec<usize>]) -> Vec<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; successors.len()];
    let mut forward: Vec<Vec<usize>> = vec![Vec::new(); successors.len()];

    for root in 0..successors.len() {
        if marks[root] != Mark::New {
            continue;
        }
        // (node, next successor position)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Active;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&succ) = successors[node].get(top.1) {
                top.1 += 1;
                match marks[succ] {
                    Mark::Active => {}
                    Mark::Done => forward[node].push(succ),
                    Mark::New => {
                        forward[node].push(succ);
                        marks[succ] = Mark::Active;
                        stack.push((succ, 0));
                    }
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    forward
}

/// Rank every node by its longest path from a source (Kahn order)
fn longest_path_ranks(forward: &[Vec<usize>]) -> Vec<usize> {
    let mut in_degree = vec![0usize; forward.len()];
    for targets in forward {
        for &t in targets {
            in_degree[t] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..forward.len()).filter(|&n| in_degree[n] == 0).collect();
    let mut ranks = vec![0usize; forward.len()];

    while let Some(node) = queue.pop_front() {
        for &t in &forward[node] {
            ranks[t] = ranks[t].max(ranks[node] + 1);
            in_degree[t] -= 1;
            if in_degree[t] == 0 {
                queue.push_back(t);
            }
        }
    }

    ranks
}

/// Group nodes by rank and order each rank by the barycenter of its
/// predecessors in the rank above (stable, so ties keep node order)
fn order_ranks(ranks: &[usize], forward: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().map_or(0, |m| m + 1);
    let mut rows: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for (node, &rank) in ranks.iter().enumerate() {
        rows[rank].push(node);
    }

    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    for (node, targets) in forward.iter().enumerate() {
        for &t in targets {
            predecessors[t].push(node);
        }
    }

    let mut slot = vec![0usize; ranks.len()];
    for row in rows.iter_mut() {
        let keys: HashMap<usize, f64> = row
            .iter()
            .map(|&n| {
                let preds = &predecessors[n];
                let key = if preds.is_empty() {
                    f64::MAX
                } else {
                    preds.iter().map(|&p| slot[p] as f64).sum::<f64>() / preds.len() as f64
                };
                (n, key)
            })
            .collect();

        row.sort_by(|a, b| keys[a].total_cmp(&keys[b]));
        for (position, &n) in row.iter().enumerate() {
            slot[n] = position;
        }
    }

    rows
}

/// A surface with no canvas that runs [`LayeredLayout`]
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    transform: ViewTransform,
    layout: LayeredLayout,
    last: Option<DiagramLayout>,
    draws: usize,
    scale_during_draw: Vec<f64>,
}

impl HeadlessSurface {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            layout: LayeredLayout::new(config),
            ..Self::default()
        }
    }

    /// The most recent layout
    pub fn last_layout(&self) -> Option<&DiagramLayout> {
        self.last.as_ref()
    }

    /// Number of completed draws
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Zoom scale observed at the start of each draw
    pub fn scale_during_draw(&self) -> &[f64] {
        &self.scale_during_draw
    }
}

impl DiagramSurface for HeadlessSurface {
    fn transform(&self) -> ViewTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = transform;
    }

    fn scale_to(&mut self, scale: f64) {
        self.transform.scale = scale;
    }

    fn draw(&mut self, graph: &ProjectedGraph) -> Result<DiagramLayout> {
        self.scale_during_draw.push(self.transform.scale);
        let layout = self.layout.layout(graph);
        debug!(
            "Laid out {} nodes and {} edges ({:.0}x{:.0})",
            layout.nodes.len(),
            layout.edges.len(),
            layout.width,
            layout.height
        );
        self.last = Some(layout.clone());
        self.draws += 1;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::builder::WorkflowBuilder;
    use crate::display::DisplayContexts;
    use crate::error::DesignerError;
    use crate::projection::project;

    fn graph() -> ProjectedGraph {
        let model = WorkflowBuilder::new()
            .add_activity("a", "If")
            .with_outcomes(["True", "False"])
            .add_activity("b", "WriteLine")
            .with_outcomes(["Done"])
            .add_activity("c", "WriteLine")
            .with_outcomes(["Done"])
            .connect("a", "b", "True")
            .connect("b", "c", "Done")
            .connect("c", "b", "Done")
            .build();
        project(&model, &DisplayContexts::new(), &HashSet::new(), None)
    }

    #[test]
    fn test_layered_ranks() {
        let layout = LayeredLayout::default().layout(&graph());

        let rank = |id: &str| layout.node(id).unwrap().rank;
        assert_eq!(rank("start"), 0);
        assert_eq!(rank("a/start"), 1);
        assert_eq!(rank("a"), 2);
        assert_eq!(rank("a/True"), 3);
        assert_eq!(rank("b"), 4);
        assert_eq!(rank("b/Done"), 5);
        assert_eq!(rank("c"), 6);
        assert!(layout.node("b").unwrap().y > layout.node("a").unwrap().y);
    }

    #[test]
    fn test_cycle_keeps_every_edge_routed() {
        let graph = graph();
        let layout = LayeredLayout::default().layout(&graph);

        assert_eq!(layout.edges.len(), graph.edges().len());
        assert!(layout.edges.iter().any(|e| e.from == "c/Done" && e.to == "b"));
    }

    #[test]
    fn test_rank_nodes_do_not_overlap() {
        let layout = LayeredLayout::default().layout(&graph());
        let t = layout.node("a/True").unwrap();
        let f = layout.node("a/False").unwrap();

        assert_eq!(t.rank, f.rank);
        assert!((t.x - f.x).abs() >= t.width);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let graph = graph();
        let layout = LayeredLayout::default();
        assert_eq!(layout.layout(&graph), layout.layout(&graph));
    }

    #[test]
    fn test_adapter_preserves_transform() {
        let mut surface = HeadlessSurface::default();
        surface.set_transform(ViewTransform {
            x: 120.0,
            y: -40.0,
            scale: 0.5,
        });

        let mut adapter = DiagramAdapter::new(surface);
        adapter.render(&graph()).unwrap();

        assert_eq!(adapter.surface().scale_during_draw(), &[1.0]);
        assert_eq!(
            adapter.surface().transform(),
            ViewTransform {
                x: 120.0,
                y: -40.0,
                scale: 0.5
            }
        );
    }

    struct FailingSurface {
        transform: ViewTransform,
    }

    impl DiagramSurface for FailingSurface {
        fn transform(&self) -> ViewTransform {
            self.transform
        }

        fn set_transform(&mut self, transform: ViewTransform) {
            self.transform = transform;
        }

        fn scale_to(&mut self, scale: f64) {
            self.transform.scale = scale;
        }

        fn draw(&mut self, _graph: &ProjectedGraph) -> Result<DiagramLayout> {
            Err(DesignerError::Layout("backend unavailable".to_string()))
        }
    }

    #[test]
    fn test_adapter_restores_transform_on_failure() {
        let transform = ViewTransform {
            x: 5.0,
            y: 5.0,
            scale: 2.0,
        };
        let mut adapter = DiagramAdapter::new(FailingSurface { transform });

        assert!(adapter.render(&graph()).is_err());
        assert_eq!(adapter.surface().transform(), transform);
    }

    #[test]
    fn test_interaction_map_by_mode() {
        let graph = graph();

        let edit = InteractionMap::attach(&graph, DesignerMode::Edit);
        assert!(edit.start_enabled());
        assert_eq!(
            edit.connector("a/True"),
            Some(&PendingSource::new("a", Some("True".to_string())))
        );
        assert_eq!(edit.edge("a/True", "b"), Some(("a", "True")));
        assert_eq!(edit.edge("a", "a/True"), Some(("a", "True")));
        assert_eq!(edit.edge("start", "a/start"), None);
        assert!(edit.context_menu("a"));

        let instance = InteractionMap::attach(&graph, DesignerMode::Instance);
        assert!(!instance.start_enabled());
        assert!(instance.connector("a/True").is_none());
        assert!(instance.edge("a/True", "b").is_none());
        assert!(instance.activity("a"));
        assert!(instance.context_menu("a"));

        let read_only = InteractionMap::attach(&graph, DesignerMode::ReadOnly);
        assert!(read_only.activity("a"));
        assert!(!read_only.context_menu("a"));
    }
}
