//! Graph mutation engine
//!
//! Pure functions that take a workflow model and return a new one. The
//! input is never modified, so callers can detect changes by comparing
//! snapshots and keep old ones around for undo.
//!
//! Connection bookkeeping follows two insertion paths with deliberately
//! different rules:
//!
//! - [`add_activity`] splices the new activity into an existing
//!   `(activity, outcome)` edge when one exists, so an outcome never gains a
//!   second connection through this path.
//! - [`add_connection`] appends unconditionally. Calling it twice with the
//!   same arguments yields two identical connections.

use log::debug;

use crate::constants::defaults;
use crate::descriptor::ActivityDescriptor;
use crate::error::{DesignerError, Result};
use crate::types::{Activity, Connection, WorkflowModel};

/// Add a new activity built from `descriptor`
///
/// When `target_activity_id` is given, the activity is placed immediately
/// before the target on `outcome`: an existing connection into the target
/// on that outcome gets the new activity as its source, otherwise a new
/// connection `new --outcome--> target` is created.
///
/// When `source_activity_id` is given, the activity is placed immediately
/// after the source on `outcome`: an existing connection leaving the source
/// on that outcome is repointed to the new activity and the new activity
/// takes over the old downstream target, otherwise a new connection
/// `source --outcome--> new` is created.
///
/// `outcome` defaults to "Done" when absent or empty. Returns the new model
/// together with the created activity.
pub fn add_activity(
    model: &WorkflowModel,
    descriptor: &ActivityDescriptor,
    source_activity_id: Option<&str>,
    target_activity_id: Option<&str>,
    outcome: Option<&str>,
) -> Result<(WorkflowModel, Activity)> {
    let outcome = outcome
        .filter(|o| !o.is_empty())
        .unwrap_or(defaults::OUTCOME);

    if let Some(source_id) = source_activity_id {
        if !model.contains_activity(source_id) {
            return Err(DesignerError::dangling_source(source_id));
        }
    }
    if let Some(target_id) = target_activity_id {
        if !model.contains_activity(target_id) {
            return Err(DesignerError::dangling_target(target_id));
        }
    }

    let activity = Activity {
        activity_id: fresh_activity_id(model),
        activity_type: descriptor.activity_type.clone(),
        display_name: descriptor.display_name.clone(),
        description: None,
        outcomes: descriptor.outcomes.clone(),
        properties: descriptor.empty_properties(),
    };

    let mut next = model.clone();
    next.activities.push(activity.clone());
    let new_id = activity.activity_id.as_str();

    if let Some(target_id) = target_activity_id {
        let existing = next
            .connections
            .iter()
            .position(|c| c.target_id == target_id && c.outcome == outcome);

        match existing {
            Some(index) => {
                let mut replacement = next.connections.remove(index);
                replacement.source_id = new_id.to_string();
                next.connections.push(replacement);
            }
            None => next
                .connections
                .push(Connection::new(new_id, target_id, outcome)),
        }
    }

    if let Some(source_id) = source_activity_id {
        let existing = next
            .connections
            .iter()
            .position(|c| c.source_id == source_id && c.outcome == outcome);

        match existing {
            Some(index) => {
                let existing = next.connections.remove(index);
                let downstream = existing.target_id.clone();
                next.connections.push(Connection {
                    target_id: new_id.to_string(),
                    ..existing
                });
                next.connections
                    .push(Connection::new(new_id, downstream, outcome));
            }
            None => next
                .connections
                .push(Connection::new(source_id, new_id, outcome)),
        }
    }

    debug!(
        "Added activity '{}' ({}) source={:?} target={:?} outcome='{}'",
        activity.activity_id, activity.activity_type, source_activity_id, target_activity_id, outcome
    );

    Ok((next, activity))
}

/// Append a connection without any splicing or deduplication
pub fn add_connection(
    model: &WorkflowModel,
    source_id: &str,
    target_id: &str,
    outcome: &str,
) -> Result<WorkflowModel> {
    if !model.contains_activity(source_id) {
        return Err(DesignerError::dangling_source(source_id));
    }
    if !model.contains_activity(target_id) {
        return Err(DesignerError::dangling_target(target_id));
    }

    let mut next = model.clone();
    next.connections
        .push(Connection::new(source_id, target_id, outcome));

    debug!("Connected '{}' --{}--> '{}'", source_id, outcome, target_id);
    Ok(next)
}

/// Remove an activity and every connection touching it
///
/// Each inbound connection `X --o--> activity` is bridged to the target of
/// the first outbound connection with the same outcome `o`, producing
/// `X --o--> Y`. Inbound connections without a matching outbound outcome
/// are dropped. Self-connections are never bridged.
pub fn remove_activity(model: &WorkflowModel, activity_id: &str) -> Result<WorkflowModel> {
    if !model.contains_activity(activity_id) {
        return Err(DesignerError::ActivityNotFound(activity_id.to_string()));
    }

    let inbound: Vec<Connection> = model
        .inbound_connections(activity_id)
        .filter(|c| c.source_id != activity_id)
        .cloned()
        .collect();
    let outbound: Vec<Connection> = model
        .outbound_connections(activity_id)
        .filter(|c| c.target_id != activity_id)
        .cloned()
        .collect();

    let mut next = model.clone();
    next.activities.retain(|a| a.activity_id != activity_id);
    next.connections.retain(|c| !c.touches(activity_id));

    for incoming in &inbound {
        if let Some(outgoing) = outbound.iter().find(|c| c.outcome == incoming.outcome) {
            next.connections.push(Connection::new(
                incoming.source_id.clone(),
                outgoing.target_id.clone(),
                incoming.outcome.clone(),
            ));
        }
    }

    debug!(
        "Removed activity '{}' ({} inbound, {} outbound)",
        activity_id,
        inbound.len(),
        outbound.len()
    );

    Ok(next)
}

/// Remove every connection leaving `source_id` on `outcome`
pub fn remove_connection(model: &WorkflowModel, source_id: &str, outcome: &str) -> WorkflowModel {
    let mut next = model.clone();
    next.connections
        .retain(|c| !(c.source_id == source_id && c.outcome == outcome));

    debug!(
        "Removed {} connection(s) from '{}' on '{}'",
        model.connections.len() - next.connections.len(),
        source_id,
        outcome
    );
    next
}

/// Replace the activity with the same ID, keeping its position
///
/// Fails with [`DesignerError::ActivityNotFound`] when no activity has
/// that ID.
pub fn update_activity(model: &WorkflowModel, activity: Activity) -> Result<WorkflowModel> {
    let index = model
        .activities
        .iter()
        .position(|a| a.activity_id == activity.activity_id)
        .ok_or_else(|| DesignerError::ActivityNotFound(activity.activity_id.clone()))?;

    let mut next = model.clone();
    next.activities[index] = activity;
    Ok(next)
}

fn fresh_activity_id(model: &WorkflowModel) -> String {
    loop {
        let id = uuid::Uuid::new_v4().to_string();
        if !model.contains_activity(&id) {
            return id;
        }
    }
}
