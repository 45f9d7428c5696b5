//! Designer configuration
//!
//! Timing, history and layout settings. Host-supplied inputs (the model,
//! the selection, the mode) are not configuration; they are pushed through
//! the controller's setters.

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, spacing};

/// Spacing and node sizes for the layered layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical gap between ranks
    pub rank_sep: f64,
    /// Horizontal gap between nodes of one rank
    pub node_sep: f64,
    /// Activity node width
    pub activity_width: f64,
    /// Activity node height
    pub activity_height: f64,
    /// Connector node diameter
    pub connector_size: f64,
    /// Start node width
    pub start_width: f64,
    /// Start node height
    pub start_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_sep: spacing::RANK_SEP,
            node_sep: spacing::NODE_SEP,
            activity_width: spacing::ACTIVITY_WIDTH,
            activity_height: spacing::ACTIVITY_HEIGHT,
            connector_size: spacing::CONNECTOR_SIZE,
            start_width: spacing::START_WIDTH,
            start_height: spacing::START_HEIGHT,
        }
    }
}

/// Designer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Deferral of the coalesced re-layout tick after an update (ms)
    pub relayout_delay_ms: u64,
    /// Deferral of the first render (ms)
    pub initial_render_delay_ms: u64,
    /// Outcome used when inserting an activity without one
    pub default_outcome: String,
    /// Maximum number of undo snapshots
    pub history_limit: usize,
    /// Layered layout settings
    pub layout: LayoutConfig,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            relayout_delay_ms: defaults::RELAYOUT_DELAY_MS,
            initial_render_delay_ms: defaults::INITIAL_RENDER_DELAY_MS,
            default_outcome: defaults::OUTCOME.to_string(),
            history_limit: defaults::HISTORY_LIMIT,
            layout: LayoutConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DesignerConfig =
            serde_json::from_value(serde_json::json!({"relayout_delay_ms": 10})).unwrap();

        assert_eq!(config.relayout_delay_ms, 10);
        assert_eq!(config.initial_render_delay_ms, 400);
        assert_eq!(config.default_outcome, "Done");
        assert_eq!(config.layout, LayoutConfig::default());
    }
}
