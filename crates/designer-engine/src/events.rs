//! Designer events and the message bus
//!
//! Two seams connect the designer to its surroundings:
//!
//! - [`EventSink`] receives [`DesignerEvent`]s meant for the host that embeds
//!   the designer (model changed, selection changed, context menu requested).
//! - [`MessageBus`] is the publish side of the pub/sub channel shared with
//!   collaborators such as the activity picker and the activity editor.
//!   Messages flowing the other way arrive as [`InboundMessage`]s through
//!   [`crate::controller::InteractionController::handle_message`].
//!
//! Both are injected at construction, so tests can observe everything the
//! designer emits through the `Vec*` implementations below.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::descriptor::ActivityDescriptor;
use crate::display::DisplayContext;
use crate::types::{Activity, WorkflowModel};

/// Trait for sending designer events to the host
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., host gone)
    fn send(&self, event: DesignerEvent) -> Result<(), EventError>;
}

/// Trait for publishing messages to designer collaborators
pub trait MessageBus: Send + Sync {
    /// Publish a message
    fn publish(&self, message: BusMessage) -> Result<(), EventError>;

    /// Let collaborators adjust a display context before it is frozen for
    /// the current render pass
    fn activity_design_displaying(&self, _context: &mut DisplayContext) {}
}

/// Error when delivering an event or message fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Visibility and placement of the per-activity context menu
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenuState {
    /// Whether the menu is shown
    pub shown: bool,
    /// Pointer X in client coordinates
    pub x: f64,
    /// Pointer Y in client coordinates
    pub y: f64,
    /// Activity the menu acts on
    pub activity: Option<Activity>,
}

/// Events emitted by the designer to its host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DesignerEvent {
    /// The designer changed the workflow (never emitted for host-supplied models)
    #[serde(rename_all = "camelCase")]
    WorkflowChanged { model: WorkflowModel },

    /// An activity was selected by the user
    #[serde(rename_all = "camelCase")]
    ActivitySelected { activity: Activity },

    /// An activity was deselected because another one was selected
    #[serde(rename_all = "camelCase")]
    ActivityDeselected { activity: Activity },

    /// The user asked for an activity's context menu
    #[serde(rename_all = "camelCase")]
    ContextMenuRequested { state: ContextMenuState },
}

/// Messages the designer publishes on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BusMessage {
    /// Open the property editor for an activity
    #[serde(rename_all = "camelCase")]
    ShowActivityEditor { activity: Activity, animate: bool },

    /// Open the activity picker; the choice comes back as `ActivityPicked`
    ShowActivityPicker,
}

/// Messages the designer consumes from the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// The picker reported the chosen activity type
    #[serde(rename_all = "camelCase")]
    ActivityPicked { descriptor: ActivityDescriptor },

    /// The editor saved changes to an activity
    #[serde(rename_all = "camelCase")]
    UpdateActivity { activity: Activity },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: DesignerEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A no-op bus that drops all messages and leaves display contexts alone
pub struct NullMessageBus;

impl MessageBus for NullMessageBus {
    fn publish(&self, _message: BusMessage) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<DesignerEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<DesignerEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: DesignerEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError::channel_closed())?
            .push(event);
        Ok(())
    }
}

type DisplayHook = Box<dyn Fn(&mut DisplayContext) + Send + Sync>;

/// A vector-based bus that collects published messages
///
/// Optional display hooks run, in registration order, for every display
/// context built while this bus is attached.
pub struct VecMessageBus {
    messages: Mutex<Vec<BusMessage>>,
    hooks: Vec<DisplayHook>,
}

impl VecMessageBus {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            hooks: Vec::new(),
        }
    }

    /// Register a display hook
    pub fn with_display_hook(
        mut self,
        hook: impl Fn(&mut DisplayContext) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Get all published messages
    pub fn messages(&self) -> Vec<BusMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Clear all published messages
    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

impl Default for VecMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for VecMessageBus {
    fn publish(&self, message: BusMessage) -> Result<(), EventError> {
        self.messages
            .lock()
            .map_err(|_| EventError::channel_closed())?
            .push(message);
        Ok(())
    }

    fn activity_design_displaying(&self, context: &mut DisplayContext) {
        for hook in &self.hooks {
            hook(context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        let activity = Activity::new("a", "WriteLine", "A");

        sink.send(DesignerEvent::ActivitySelected {
            activity: activity.clone(),
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DesignerEvent::ActivitySelected { activity: selected } => {
                assert_eq!(selected.activity_id, "a");
            }
            _ => panic!("Expected ActivitySelected event"),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_sinks() {
        NullEventSink
            .send(DesignerEvent::WorkflowChanged {
                model: WorkflowModel::new(),
            })
            .unwrap();
        NullMessageBus.publish(BusMessage::ShowActivityPicker).unwrap();
    }

    #[test]
    fn test_event_serialization() {
        let event = DesignerEvent::ContextMenuRequested {
            state: ContextMenuState {
                shown: true,
                x: 10.0,
                y: 20.0,
                activity: None,
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "contextMenuRequested");
        assert_eq!(json["state"]["shown"], true);
    }

    #[test]
    fn test_inbound_message_deserialization() {
        let json = serde_json::json!({
            "type": "activityPicked",
            "descriptor": {"type": "WriteLine", "displayName": "Write Line"}
        });

        let message: InboundMessage = serde_json::from_value(json).unwrap();
        assert!(matches!(
            message,
            InboundMessage::ActivityPicked { ref descriptor } if descriptor.activity_type == "WriteLine"
        ));
    }
}
