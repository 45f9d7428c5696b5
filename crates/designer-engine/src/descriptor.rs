//! Activity descriptor types
//!
//! A descriptor is the catalog entry for an activity type: its display
//! name, declared outcomes, configurable properties and traits. The designer
//! uses descriptors to create new activities and to decorate existing ones
//! when building display contexts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::PropertyValue;

/// Bit set of traits an activity type carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityTraits(pub u8);

impl ActivityTraits {
    /// Regular step
    pub const ACTION: ActivityTraits = ActivityTraits(1);
    /// Starts or resumes a workflow
    pub const TRIGGER: ActivityTraits = ActivityTraits(2);
    /// Long-running step
    pub const JOB: ActivityTraits = ActivityTraits(4);

    /// Check if every trait in `other` is set
    pub fn contains(&self, other: ActivityTraits) -> bool {
        self.0 & other.0 == other.0
    }

    /// Combine two trait sets
    pub fn with(self, other: ActivityTraits) -> Self {
        ActivityTraits(self.0 | other.0)
    }
}

/// Metadata for a configurable property of an activity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name (key in `Activity::properties`)
    pub name: String,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Optional hint shown by property editors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl PropertyDescriptor {
    /// Create a property descriptor labelled with its own name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            hint: None,
        }
    }
}

/// Complete catalog entry for an activity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDescriptor {
    /// Unique type identifier (e.g. "WriteLine")
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Human-readable name used for new activities
    pub display_name: String,
    /// Description for pickers
    #[serde(default)]
    pub description: String,
    /// Category for grouping in pickers
    #[serde(default)]
    pub category: String,
    /// Outcomes new activities of this type declare
    #[serde(default)]
    pub outcomes: Vec<String>,
    /// Configurable properties
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    /// Trait flags
    #[serde(default)]
    pub traits: ActivityTraits,
}

impl ActivityDescriptor {
    /// Create a descriptor with no outcomes or properties
    pub fn new(activity_type: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            display_name: display_name.into(),
            description: String::new(),
            category: String::new(),
            outcomes: Vec::new(),
            properties: Vec::new(),
            traits: ActivityTraits::ACTION,
        }
    }

    /// Set the declared outcomes
    pub fn with_outcomes<I, S>(mut self, outcomes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outcomes = outcomes.into_iter().map(Into::into).collect();
        self
    }

    /// Add a property by name
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(PropertyDescriptor::new(name));
        self
    }

    /// Set the trait flags
    pub fn with_traits(mut self, traits: ActivityTraits) -> Self {
        self.traits = traits;
        self
    }

    /// Whether activities of this type start workflows
    pub fn is_trigger(&self) -> bool {
        self.traits.contains(ActivityTraits::TRIGGER)
    }

    /// Property map for a new activity: every declared property, empty
    pub fn empty_properties(&self) -> BTreeMap<String, PropertyValue> {
        self.properties
            .iter()
            .map(|p| (p.name.clone(), PropertyValue::default()))
            .collect()
    }
}
