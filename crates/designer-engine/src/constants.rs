//! Designer-wide constants
//!
//! Single source of truth for node naming and configuration defaults.

/// Default values for designer configuration
pub mod defaults {
    /// Outcome used when inserting an activity without one
    pub const OUTCOME: &str = "Done";
    /// Deferral of the coalesced re-layout tick after an update
    pub const RELAYOUT_DELAY_MS: u64 = 50;
    /// Deferral of the first render after the surface is attached
    pub const INITIAL_RENDER_DELAY_MS: u64 = 400;
    /// Maximum number of undo snapshots
    pub const HISTORY_LIMIT: usize = 100;
}

/// Layered layout spacing (in diagram units)
pub mod spacing {
    /// Vertical gap between ranks
    pub const RANK_SEP: f64 = 50.0;
    /// Horizontal gap between nodes in a rank
    pub const NODE_SEP: f64 = 50.0;
    /// Activity node size
    pub const ACTIVITY_WIDTH: f64 = 320.0;
    pub const ACTIVITY_HEIGHT: f64 = 120.0;
    /// Connector and start node size
    pub const CONNECTOR_SIZE: f64 = 32.0;
    pub const START_WIDTH: f64 = 96.0;
    pub const START_HEIGHT: f64 = 48.0;
}

/// Projected graph node naming
pub mod nodes {
    /// ID of the synthetic start node
    pub const START: &str = "start";
    /// Outcome segment of a root connector (`{activity}/start`)
    pub const ROOT_CONNECTOR: &str = "start";
    /// Separator between activity ID and outcome in connector IDs
    pub const SEPARATOR: char = '/';
}

/// Icon accents by activity kind
pub mod colors {
    pub const TRIGGER: &str = "rose";
    pub const ACTION: &str = "light-blue";
}
