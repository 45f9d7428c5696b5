//! Per-render display contexts
//!
//! Before every render pass the designer derives a [`DisplayContext`] for
//! each activity from the model and the descriptor catalog, then offers it
//! to bus collaborators, which may rewrite the body or the effective outcome
//! list (for example to show dynamic switch cases). The projector uses the
//! context's outcomes, not the activity's raw ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::colors;
use crate::error::Result;
use crate::events::MessageBus;
use crate::registry::ActivityRegistry;
use crate::types::{Activity, ActivityId, WorkflowModel};

/// Icon shown on an activity node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityIcon {
    /// Accent color name
    pub color: String,
}

/// Presentation data for one activity in one render pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayContext {
    /// The activity being displayed
    pub activity: Activity,
    /// Node icon
    pub icon: ActivityIcon,
    /// Body text, if any
    pub body_display: Option<String>,
    /// Effective outcomes; one connector is drawn per entry
    pub outcomes: Vec<String>,
}

/// Display contexts keyed by activity ID
pub type DisplayContexts = HashMap<ActivityId, DisplayContext>;

/// Build the display context for every activity in the model
///
/// Fails with [`crate::DesignerError::UnknownActivityType`] if an activity's
/// type has no descriptor.
pub fn build_display_contexts(
    model: &WorkflowModel,
    registry: &ActivityRegistry,
    bus: &dyn MessageBus,
) -> Result<DisplayContexts> {
    let mut contexts = HashMap::with_capacity(model.activities.len());

    for activity in &model.activities {
        let descriptor = registry.require(&activity.activity_id, &activity.activity_type)?;
        let color = if descriptor.is_trigger() {
            colors::TRIGGER
        } else {
            colors::ACTION
        };

        let mut context = DisplayContext {
            activity: activity.clone(),
            icon: ActivityIcon {
                color: color.to_string(),
            },
            body_display: activity
                .description
                .as_ref()
                .filter(|d| !d.is_empty())
                .cloned(),
            outcomes: activity.outcomes.clone(),
        };

        bus.activity_design_displaying(&mut context);
        contexts.insert(activity.activity_id.clone(), context);
    }

    Ok(contexts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;
    use crate::descriptor::{ActivityDescriptor, ActivityTraits};
    use crate::error::DesignerError;
    use crate::events::{NullMessageBus, VecMessageBus};

    fn registry() -> ActivityRegistry {
        ActivityRegistry::from_descriptors([
            ActivityDescriptor::new("Timer", "Timer")
                .with_outcomes(["Done"])
                .with_traits(ActivityTraits::TRIGGER),
            ActivityDescriptor::new("Switch", "Switch"),
        ])
    }

    #[test]
    fn test_contexts_from_model() {
        let model = WorkflowBuilder::new()
            .add_activity("t", "Timer")
            .with_outcomes(["Done"])
            .with_description("Every minute")
            .add_activity("s", "Switch")
            .with_description("")
            .build();

        let contexts = build_display_contexts(&model, &registry(), &NullMessageBus).unwrap();

        assert_eq!(contexts["t"].icon.color, "rose");
        assert_eq!(contexts["t"].body_display.as_deref(), Some("Every minute"));
        assert_eq!(contexts["t"].outcomes, vec!["Done"]);
        assert_eq!(contexts["s"].icon.color, "light-blue");
        assert!(contexts["s"].body_display.is_none());
    }

    #[test]
    fn test_hook_overrides_outcomes() {
        let model = WorkflowBuilder::new().add_activity("s", "Switch").build();
        let bus = VecMessageBus::new().with_display_hook(|context| {
            if context.activity.activity_type == "Switch" {
                context.outcomes = vec!["Case 1".to_string(), "Default".to_string()];
            }
        });

        let contexts = build_display_contexts(&model, &registry(), &bus).unwrap();
        assert_eq!(contexts["s"].outcomes, vec!["Case 1", "Default"]);
        assert!(model.activities[0].outcomes.is_empty());
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let model = WorkflowBuilder::new().add_activity("x", "Unknown").build();
        let err = build_display_contexts(&model, &registry(), &NullMessageBus).unwrap_err();
        assert!(matches!(err, DesignerError::UnknownActivityType { .. }));
    }
}
