//! Designer Engine - Interactive editing core for workflow graphs
//!
//! This crate holds everything a workflow designer needs between user input
//! and a drawn diagram. It supports:
//!
//! - Activities connected by named outcomes, edited as immutable snapshots
//! - Splice-on-insert and bridge-on-delete connection bookkeeping
//! - Projection into a plain directed graph with start and connector nodes
//! - Layered layout that keeps the user's pan/zoom across re-layouts
//! - Pointer, keyboard and bus-driven authoring with undo/redo
//!
//! # Architecture
//!
//! - `mutation`: Pure functions from one `WorkflowModel` to the next
//! - `projection`: `WorkflowModel` + display contexts -> `ProjectedGraph`
//! - `layout`: `DiagramSurface` backends, the pan/zoom preserving adapter
//!   and the per-render `InteractionMap`
//! - `controller`: `InteractionController`, which owns the session state
//!   and schedules re-layouts
//! - `events`: Injected `EventSink` (host) and `MessageBus` (collaborators)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use designer_engine::{
//!     ActivityRegistry, DesignerConfig, HeadlessSurface, InteractionController,
//!     NullEventSink, NullMessageBus, WorkflowBuilder,
//! };
//!
//! let mut controller = InteractionController::new(
//!     DesignerConfig::default(),
//!     Arc::new(ActivityRegistry::new()),
//!     Arc::new(NullEventSink),
//!     Arc::new(NullMessageBus),
//!     HeadlessSurface::default(),
//! );
//! controller.set_model(WorkflowBuilder::new().build());
//! controller.flush()?;
//! ```

pub mod builder;
pub mod config;
pub mod constants;
pub mod controller;
pub mod descriptor;
pub mod display;
pub mod error;
pub mod events;
pub mod history;
pub mod layout;
pub mod mutation;
pub mod projection;
pub mod registry;
pub mod scheduler;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use config::{DesignerConfig, LayoutConfig};
pub use controller::{InteractionController, Key, KeyPress, PendingSource};
pub use descriptor::{ActivityDescriptor, ActivityTraits, PropertyDescriptor};
pub use display::{build_display_contexts, DisplayContext, DisplayContexts};
pub use error::{DesignerError, Result};
pub use events::{
    BusMessage, ContextMenuState, DesignerEvent, EventError, EventSink, InboundMessage,
    MessageBus, NullEventSink, NullMessageBus, VecEventSink, VecMessageBus,
};
pub use history::EditHistory;
pub use layout::{
    DiagramAdapter, DiagramLayout, DiagramSurface, HeadlessSurface, InteractionMap, LayeredLayout,
    ViewTransform,
};
pub use projection::{project, ProjectedEdge, ProjectedEdgeKind, ProjectedGraph, ProjectedNode, ProjectedNodeKind};
pub use registry::ActivityRegistry;
pub use types::{Activity, ActivityId, Connection, DesignerMode, PersistenceBehavior, PropertyValue, WorkflowModel};
pub use validation::{validate_workflow, ValidationError};
