//! Activity descriptor catalog
//!
//! The catalog maps activity type strings to their descriptors. The host
//! populates it (typically from the server's descriptor listing) and hands
//! it to the controller; the designer only reads from it.
//!
//! # Usage
//!
//! ```ignore
//! use designer_engine::{ActivityDescriptor, ActivityRegistry};
//!
//! let mut registry = ActivityRegistry::new();
//! registry.register(ActivityDescriptor::new("WriteLine", "Write Line").with_outcomes(["Done"]));
//!
//! let descriptor = registry.require("a-1", "WriteLine")?;
//! ```

use std::collections::HashMap;

use crate::descriptor::ActivityDescriptor;
use crate::error::{DesignerError, Result};

/// Registry of activity types and their descriptors
#[derive(Debug, Clone, Default)]
pub struct ActivityRegistry {
    entries: HashMap<String, ActivityDescriptor>,
}

impl ActivityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create a registry from a list of descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ActivityDescriptor>) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor);
        }
        registry
    }

    /// Register a descriptor, replacing any previous entry for its type
    pub fn register(&mut self, descriptor: ActivityDescriptor) {
        self.entries
            .insert(descriptor.activity_type.clone(), descriptor);
    }

    /// Get the descriptor for an activity type
    pub fn get(&self, activity_type: &str) -> Option<&ActivityDescriptor> {
        self.entries.get(activity_type)
    }

    /// Get the descriptor for an activity, failing if the type is unknown
    pub fn require(&self, activity_id: &str, activity_type: &str) -> Result<&ActivityDescriptor> {
        self.get(activity_type)
            .ok_or_else(|| DesignerError::unknown_type(activity_id, activity_type))
    }

    /// Check if an activity type is registered
    pub fn has_activity_type(&self, activity_type: &str) -> bool {
        self.entries.contains_key(activity_type)
    }

    /// All descriptors, sorted by display name
    pub fn all(&self) -> Vec<&ActivityDescriptor> {
        let mut descriptors: Vec<&ActivityDescriptor> = self.entries.values().collect();
        descriptors.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        descriptors
    }

    /// Descriptors of trigger activities, sorted by display name
    pub fn triggers(&self) -> Vec<&ActivityDescriptor> {
        self.all().into_iter().filter(|d| d.is_trigger()).collect()
    }

    /// Descriptors grouped by category
    pub fn by_category(&self) -> HashMap<&str, Vec<&ActivityDescriptor>> {
        let mut grouped: HashMap<&str, Vec<&ActivityDescriptor>> = HashMap::new();
        for descriptor in self.all() {
            grouped
                .entry(descriptor.category.as_str())
                .or_default()
                .push(descriptor);
        }
        grouped
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` with the same type.
    pub fn merge(&mut self, other: ActivityRegistry) {
        self.entries.extend(other.entries);
    }
}
