//! Interaction controller
//!
//! Owns the editing session: the current model snapshot, the selection,
//! the armed connector and the context-menu state. Pointer and keyboard
//! input, bus messages and host setters all funnel through here and turn
//! into calls on [`crate::mutation`]. Every change schedules a deferred
//! re-layout (see [`crate::scheduler`]); [`InteractionController::tick`]
//! performs it by rebuilding display contexts, projecting the model,
//! driving the diagram adapter and re-attaching the interaction map.
//!
//! # Connection authoring
//!
//! ```text
//! Idle --click connector--> Armed --plain click---> picker --ActivityPicked--> add_activity --> Idle
//!                             |
//!                             +--shift click--> stays Armed --click activity--> add_connection --> Idle
//! ```
//!
//! Clicking the start node opens the picker with nothing armed, which adds
//! an unconnected root activity.

use std::collections::{BTreeMap, HashSet};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::DesignerConfig;
use crate::descriptor::ActivityDescriptor;
use crate::display::build_display_contexts;
use crate::error::{DesignerError, Result};
use crate::events::{BusMessage, ContextMenuState, DesignerEvent, EventSink, InboundMessage, MessageBus};
use crate::history::EditHistory;
use crate::layout::{DiagramAdapter, DiagramLayout, DiagramSurface, InteractionMap};
use crate::mutation;
use crate::projection::{outcome_connector_id, project, root_connector_id, ProjectedGraph};
use crate::registry::ActivityRegistry;
use crate::scheduler::RelayoutScheduler;
use crate::types::{Activity, ActivityId, DesignerMode, WorkflowModel};
use crate::validation::validate_workflow;

/// The connector currently armed to receive the next connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSource {
    /// Activity the connector belongs to
    pub activity_id: ActivityId,
    /// `None` (or empty) for a root connector
    pub outcome: Option<String>,
}

impl PendingSource {
    /// Arm the connector of `activity_id` for `outcome`
    pub fn new(activity_id: impl Into<String>, outcome: Option<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            outcome,
        }
    }

    /// Whether this is a root connector, which inserts in front of its activity
    pub fn is_root(&self) -> bool {
        self.outcome.as_deref().map_or(true, str::is_empty)
    }

    /// ID of the projected connector node this source was armed from
    pub fn node_id(&self) -> String {
        match self.outcome.as_deref() {
            Some(outcome) if !outcome.is_empty() => outcome_connector_id(&self.activity_id, outcome),
            _ => root_connector_id(&self.activity_id),
        }
    }
}

/// Keys the designer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Disarms the pending source and hides the context menu
    Escape,
    /// Removes the selected activities
    Delete,
    /// Same as [`Key::Delete`]
    Backspace,
    /// Any printable key; `z` and `y` drive undo/redo with ctrl
    Char(char),
}

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key pressed
    pub key: Key,
    /// Ctrl (or Cmd) held
    pub ctrl: bool,
    /// Shift held
    pub shift: bool,
}

impl KeyPress {
    /// A press with no modifiers
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    /// With ctrl held
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// With shift held
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Drives one workflow designer
pub struct InteractionController<S: DiagramSurface> {
    config: DesignerConfig,
    registry: Arc<ActivityRegistry>,
    events: Arc<dyn EventSink>,
    bus: Arc<dyn MessageBus>,
    adapter: DiagramAdapter<S>,

    model: Arc<WorkflowModel>,
    mode: DesignerMode,
    selection: BTreeMap<ActivityId, Activity>,
    pending: Option<PendingSource>,
    context_menu: ContextMenuState,
    context_menu_button: Option<String>,

    history: EditHistory,
    scheduler: RelayoutScheduler,
    graph: ProjectedGraph,
    interactions: InteractionMap,
    layout: Option<DiagramLayout>,
}

impl<S: DiagramSurface> InteractionController<S> {
    /// Create a controller over an empty workflow
    ///
    /// The first render is scheduled right away with the initial delay.
    pub fn new(
        config: DesignerConfig,
        registry: Arc<ActivityRegistry>,
        events: Arc<dyn EventSink>,
        bus: Arc<dyn MessageBus>,
        surface: S,
    ) -> Self {
        let model = WorkflowModel::new();
        let mut history = EditHistory::new(config.history_limit);
        if let Err(e) = history.reset(&model) {
            warn!("Failed to start edit history: {}", e);
        }

        let mut scheduler = RelayoutScheduler::new(
            Duration::from_millis(config.relayout_delay_ms),
            Duration::from_millis(config.initial_render_delay_ms),
        );
        scheduler.schedule(Instant::now());

        Self {
            config,
            registry,
            events,
            bus,
            adapter: DiagramAdapter::new(surface),
            model: Arc::new(model),
            mode: DesignerMode::default(),
            selection: BTreeMap::new(),
            pending: None,
            context_menu: ContextMenuState::default(),
            context_menu_button: None,
            history,
            scheduler,
            graph: ProjectedGraph::new(),
            interactions: InteractionMap::default(),
            layout: None,
        }
    }

    // ---- host inputs ----

    /// Replace the model from outside
    ///
    /// Resets edit history and schedules a re-layout, but emits no
    /// `WorkflowChanged` event. Session state is re-synchronized: selected
    /// activities missing from `model` are dropped and the rest refreshed,
    /// a connector of a missing activity is disarmed, and a context menu
    /// shown for a missing activity is hidden.
    pub fn set_model(&mut self, model: WorkflowModel) {
        for problem in validate_workflow(&model, Some(self.registry.as_ref())) {
            warn!("Workflow model: {}", problem);
        }
        if let Err(e) = self.history.reset(&model) {
            warn!("Failed to reset edit history: {}", e);
        }
        self.resync(&model);
        self.replace_model(model, false);
    }

    /// Replace the selection from outside; unknown IDs are ignored
    pub fn set_selected_activity_ids<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let ids: HashSet<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        self.selection = self
            .model
            .activities
            .iter()
            .filter(|a| ids.contains(&a.activity_id))
            .map(|a| (a.activity_id.clone(), a.clone()))
            .collect();
        self.schedule_relayout();
    }

    pub fn set_mode(&mut self, mode: DesignerMode) {
        if mode != self.mode {
            debug!("Designer mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            if !mode.allows_authoring() {
                self.set_pending(None);
            }
            self.schedule_relayout();
        }
    }

    /// Replace the context-menu state (e.g. to hide the menu)
    pub fn set_context_menu(&mut self, state: ContextMenuState) {
        self.context_menu = state;
    }

    /// Set the markup of the per-activity context-menu button; `None` hides it
    pub fn set_context_menu_button(&mut self, markup: Option<String>) {
        self.context_menu_button = markup;
        self.schedule_relayout();
    }

    // ---- state ----

    /// The current model snapshot
    ///
    /// Each change installs a new snapshot, so `Arc::ptr_eq` on two returned
    /// values tells whether anything changed in between.
    pub fn model(&self) -> Arc<WorkflowModel> {
        Arc::clone(&self.model)
    }

    pub fn mode(&self) -> DesignerMode {
        self.mode
    }

    /// Selected activity IDs in ascending order
    pub fn selected_activity_ids(&self) -> Vec<ActivityId> {
        self.selection.keys().cloned().collect()
    }

    pub fn pending_source(&self) -> Option<&PendingSource> {
        self.pending.as_ref()
    }

    pub fn context_menu(&self) -> &ContextMenuState {
        &self.context_menu
    }

    pub fn context_menu_button(&self) -> Option<&str> {
        self.context_menu_button.as_deref()
    }

    /// Activities with no inbound connection, in model order
    pub fn root_activities(&self) -> Vec<Activity> {
        self.model.root_activities().into_iter().cloned().collect()
    }

    /// Graph drawn by the most recent render
    pub fn projected_graph(&self) -> &ProjectedGraph {
        &self.graph
    }

    /// Handlers attached by the most recent render
    pub fn interactions(&self) -> &InteractionMap {
        &self.interactions
    }

    /// Layout computed by the most recent render
    pub fn last_layout(&self) -> Option<&DiagramLayout> {
        self.layout.as_ref()
    }

    pub fn surface(&self) -> &S {
        self.adapter.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.adapter.surface_mut()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- edits ----

    /// Add an activity, splicing it in next to `source` or `target`
    ///
    /// `outcome` falls back to the configured default outcome. Disarms the
    /// pending source.
    pub fn add_activity(
        &mut self,
        descriptor: &ActivityDescriptor,
        source_activity_id: Option<&str>,
        target_activity_id: Option<&str>,
        outcome: Option<&str>,
    ) -> Result<Activity> {
        let outcome = outcome
            .filter(|o| !o.is_empty())
            .unwrap_or(self.config.default_outcome.as_str());
        let (next, activity) = mutation::add_activity(
            &self.model,
            descriptor,
            source_activity_id,
            target_activity_id,
            Some(outcome),
        )?;

        self.commit(next);
        self.set_pending(None);
        Ok(activity)
    }

    /// Append a connection and disarm the pending source
    ///
    /// The pending source is disarmed even when the connection is rejected.
    pub fn add_connection(&mut self, source_id: &str, target_id: &str, outcome: &str) -> Result<()> {
        let next = mutation::add_connection(&self.model, source_id, target_id, outcome);
        self.set_pending(None);
        self.commit(next?);
        Ok(())
    }

    /// Remove an activity, bridging its connections by outcome
    pub fn remove_activity(&mut self, activity_id: &str) -> Result<()> {
        let next = mutation::remove_activity(&self.model, activity_id)?;
        self.forget(activity_id);
        self.commit(next);
        Ok(())
    }

    /// Remove every connection leaving `source_id` on `outcome`
    pub fn remove_connection(&mut self, source_id: &str, outcome: &str) {
        let next = mutation::remove_connection(&self.model, source_id, outcome);
        self.commit(next);
    }

    /// Replace an activity by ID
    pub fn update_activity(&mut self, activity: Activity) -> Result<()> {
        let next = mutation::update_activity(&self.model, activity.clone())?;
        if let Some(selected) = self.selection.get_mut(&activity.activity_id) {
            *selected = activity;
        }
        self.commit(next);
        Ok(())
    }

    /// Step back one edit; returns whether anything changed
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo() {
            Some(model) => {
                self.restore(model?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Step forward one edit; returns whether anything changed
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo() {
            Some(model) => {
                self.restore(model?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Ask the editor collaborator to open an activity
    pub fn show_activity_editor(&self, activity: &Activity, animate: bool) {
        self.publish(BusMessage::ShowActivityEditor {
            activity: activity.clone(),
            animate,
        });
    }

    /// Ask the picker collaborator to offer activity types
    pub fn show_activity_picker(&self) {
        self.publish(BusMessage::ShowActivityPicker);
    }

    // ---- pointer input ----

    /// Click on the start node
    pub fn click_start(&mut self) {
        if self.pointer_blocked() || !self.interactions.start_enabled() {
            return;
        }
        self.set_pending(None);
        self.show_activity_picker();
    }

    /// Click on a connector node; `shift` arms it without opening the picker
    pub fn click_connector(&mut self, node_id: &str, shift: bool) {
        if self.pointer_blocked() {
            return;
        }
        let Some(source) = self.interactions.connector(node_id) else {
            debug!("Ignoring click on inactive connector '{}'", node_id);
            return;
        };

        debug!("Armed connector '{}'", node_id);
        let source = source.clone();
        self.set_pending(Some(source));
        if !shift {
            self.show_activity_picker();
        }
    }

    /// Click on an activity node
    ///
    /// Completes an armed connection in Edit mode, otherwise toggles the
    /// activity's selection.
    pub fn click_activity(&mut self, activity_id: &str) -> Result<()> {
        if self.pointer_blocked() || !self.interactions.activity(activity_id) {
            return Ok(());
        }

        if self.mode.allows_authoring() {
            if let Some(source) = self.pending.clone().filter(|p| !p.is_root()) {
                let outcome = source.outcome.unwrap_or_default();
                return self.add_connection(&source.activity_id, activity_id, &outcome);
            }
        }

        if self.selection.remove(activity_id).is_none() {
            let activity = self
                .model
                .find_activity(activity_id)
                .cloned()
                .ok_or_else(|| DesignerError::ActivityNotFound(activity_id.to_string()))?;

            for (_, deselected) in std::mem::take(&mut self.selection) {
                self.emit(DesignerEvent::ActivityDeselected {
                    activity: deselected,
                });
            }
            self.selection
                .insert(activity_id.to_string(), activity.clone());
            self.emit(DesignerEvent::ActivitySelected { activity });
        }

        self.schedule_relayout();
        Ok(())
    }

    /// Double click on an activity node opens its editor
    pub fn double_click_activity(&mut self, activity_id: &str) {
        if self.pointer_blocked() || !self.interactions.activity(activity_id) {
            return;
        }
        if let Some(activity) = self.model.find_activity(activity_id) {
            self.show_activity_editor(activity, true);
        }
    }

    /// Click on an activity's context-menu button at client coordinates
    pub fn click_context_menu_button(&mut self, activity_id: &str, x: f64, y: f64) {
        if self.pointer_blocked()
            || self.context_menu_button.is_none()
            || !self.interactions.context_menu(activity_id)
        {
            return;
        }
        let Some(activity) = self.model.find_activity(activity_id).cloned() else {
            return;
        };

        self.change_context_menu(ContextMenuState {
            shown: true,
            x,
            y,
            activity: Some(activity),
        });
    }

    /// Context gesture (right click) on the edge `from -> to`
    pub fn context_click_edge(&mut self, from: &str, to: &str) {
        if self.pointer_blocked() {
            return;
        }
        let Some((source_id, outcome)) = self.interactions.edge(from, to) else {
            return;
        };

        let (source_id, outcome) = (source_id.to_string(), outcome.to_string());
        self.remove_connection(&source_id, &outcome);
    }

    // ---- keyboard input ----

    pub fn key_down(&mut self, press: KeyPress) -> Result<()> {
        match press.key {
            Key::Escape => {
                self.set_pending(None);
                if self.context_menu.shown {
                    self.hide_context_menu();
                }
            }
            Key::Delete | Key::Backspace if self.mode.allows_authoring() => {
                self.remove_selected()?;
            }
            Key::Char(c) if press.ctrl && c.eq_ignore_ascii_case(&'z') => {
                if press.shift {
                    self.redo()?;
                } else {
                    self.undo()?;
                }
            }
            Key::Char(c) if press.ctrl && c.eq_ignore_ascii_case(&'y') => {
                self.redo()?;
            }
            _ => {}
        }
        Ok(())
    }

    // ---- bus input ----

    /// Handle one message from a collaborator
    pub fn handle_message(&mut self, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::ActivityPicked { descriptor } => self.on_activity_picked(&descriptor),
            InboundMessage::UpdateActivity { activity } => self.update_activity(activity),
        }
    }

    /// Handle every message already queued on `inbox`, in arrival order
    ///
    /// Returns the number of messages handled. Stops at the first failure.
    pub fn drain_messages(&mut self, inbox: &Receiver<InboundMessage>) -> Result<usize> {
        let mut handled = 0;
        while let Ok(message) = inbox.try_recv() {
            self.handle_message(message)?;
            handled += 1;
        }
        Ok(handled)
    }

    // ---- rendering ----

    /// Render if the scheduled re-layout is due; returns whether it rendered
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        if !self.scheduler.poll(now) {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Render now if a re-layout is pending, ignoring its deadline
    pub fn flush(&mut self) -> Result<bool> {
        if !self.scheduler.take() {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// When the pending re-layout is due
    pub fn next_render_at(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Rebuild display contexts, project, lay out and re-attach handlers
    pub fn render(&mut self) -> Result<&DiagramLayout> {
        let contexts = build_display_contexts(&self.model, &self.registry, self.bus.as_ref())?;
        let selected: HashSet<ActivityId> = self.selection.keys().cloned().collect();
        let armed = self.pending.as_ref().map(PendingSource::node_id);
        let graph = project(&self.model, &contexts, &selected, armed.as_deref());

        let layout = self.adapter.render(&graph)?;
        self.interactions = InteractionMap::attach(&graph, self.mode);
        debug!(
            "Rendered {} nodes, {} edges, {} stale connections",
            graph.nodes().len(),
            graph.edges().len(),
            graph.stale().len()
        );
        self.graph = graph;

        Ok(&*self.layout.insert(layout))
    }

    // ---- internals ----

    fn on_activity_picked(&mut self, descriptor: &ActivityDescriptor) -> Result<()> {
        let pending = self.pending.clone();
        self.set_pending(None);
        let (source, target, outcome) = match &pending {
            None => (None, None, None),
            Some(p) if p.is_root() => (None, Some(p.activity_id.as_str()), None),
            Some(p) => (Some(p.activity_id.as_str()), None, p.outcome.as_deref()),
        };

        let activity = self.add_activity(descriptor, source, target, outcome)?;
        self.show_activity_editor(&activity, false);
        Ok(())
    }

    fn remove_selected(&mut self) -> Result<()> {
        if self.selection.is_empty() {
            return Ok(());
        }

        let removed = self.selected_activity_ids();
        let mut next = (*self.model).clone();
        for activity_id in &removed {
            next = mutation::remove_activity(&next, activity_id)?;
        }
        for activity_id in &removed {
            self.forget(activity_id);
        }
        self.commit(next);
        Ok(())
    }

    /// Drop session state that refers to a removed activity
    fn forget(&mut self, activity_id: &str) {
        self.selection.remove(activity_id);
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.activity_id == activity_id)
        {
            self.set_pending(None);
        }
        if self.context_menu.shown
            && self
                .context_menu
                .activity
                .as_ref()
                .is_some_and(|a| a.activity_id == activity_id)
        {
            self.hide_context_menu();
        }
    }

    /// Bring session state in line with a model installed wholesale
    fn resync(&mut self, model: &WorkflowModel) {
        self.selection = std::mem::take(&mut self.selection)
            .into_keys()
            .filter_map(|id| model.find_activity(&id).cloned().map(|a| (id, a)))
            .collect();

        if self
            .pending
            .as_ref()
            .is_some_and(|p| !model.contains_activity(&p.activity_id))
        {
            self.set_pending(None);
        }

        let menu_target = self.context_menu.activity.as_ref().map(|a| a.activity_id.clone());
        if let Some(activity_id) = menu_target {
            match model.find_activity(&activity_id) {
                Some(activity) => self.context_menu.activity = Some(activity.clone()),
                None if self.context_menu.shown => self.hide_context_menu(),
                None => {}
            }
        }
    }

    fn restore(&mut self, model: WorkflowModel) {
        self.set_pending(None);
        self.resync(&model);
        self.replace_model(model, true);
    }

    fn set_pending(&mut self, pending: Option<PendingSource>) {
        if self.pending != pending {
            self.pending = pending;
            self.schedule_relayout();
        }
    }

    fn hide_context_menu(&mut self) {
        self.change_context_menu(ContextMenuState {
            shown: false,
            ..self.context_menu.clone()
        });
    }

    /// Install an edit made by the designer and record it for undo
    fn commit(&mut self, model: WorkflowModel) {
        if let Err(e) = self.history.record(&model) {
            warn!("Failed to record edit history: {}", e);
        }
        self.replace_model(model, true);
    }

    fn replace_model(&mut self, model: WorkflowModel, notify: bool) {
        self.model = Arc::new(model);
        if notify {
            self.emit(DesignerEvent::WorkflowChanged {
                model: (*self.model).clone(),
            });
        }
        self.schedule_relayout();
    }

    fn change_context_menu(&mut self, state: ContextMenuState) {
        self.context_menu = state.clone();
        self.emit(DesignerEvent::ContextMenuRequested { state });
    }

    fn pointer_blocked(&self) -> bool {
        self.context_menu.shown
    }

    fn schedule_relayout(&mut self) {
        self.scheduler.schedule(Instant::now());
    }

    fn emit(&self, event: DesignerEvent) {
        if let Err(e) = self.events.send(event) {
            warn!("Failed to deliver designer event: {}", e);
        }
    }

    fn publish(&self, message: BusMessage) {
        if let Err(e) = self.bus.publish(message) {
            warn!("Failed to publish bus message: {}", e);
        }
    }
}
