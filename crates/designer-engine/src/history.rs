//! Edit history using compressed snapshots
//!
//! Every edit the designer makes produces a whole new [`WorkflowModel`], so
//! history is a bounded list of those models, each stored as zstd-compressed
//! JSON. Undo and redo move a cursor through the list; recording a new edit
//! after undoing discards the redo tail.

use std::collections::VecDeque;

use log::debug;

use crate::constants::defaults;
use crate::error::{DesignerError, Result};
use crate::types::WorkflowModel;

const COMPRESSION_LEVEL: i32 = 3;

/// Undo/redo history of workflow models
pub struct EditHistory {
    /// Compressed model states (zstd)
    snapshots: VecDeque<Vec<u8>>,
    /// Index of the snapshot matching the current model
    current: usize,
    /// Maximum number of snapshots to keep
    limit: usize,
}

impl EditHistory {
    /// Create an empty history keeping at most `limit` snapshots
    pub fn new(limit: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: 0,
            limit: limit.max(1),
        }
    }

    /// Drop everything and start over from `model`
    pub fn reset(&mut self, model: &WorkflowModel) -> Result<()> {
        self.snapshots.clear();
        self.current = 0;
        self.record(model)
    }

    /// Record the model produced by an edit
    pub fn record(&mut self, model: &WorkflowModel) -> Result<()> {
        let compressed = compress(model)?;

        self.snapshots.truncate(self.current + 1);
        self.snapshots.push_back(compressed);
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
            self.current = self.current.saturating_sub(1);
        }

        debug!(
            "Recorded snapshot {} of {}",
            self.current + 1,
            self.snapshots.len()
        );
        Ok(())
    }

    /// Step back one edit, or `None` at the oldest snapshot
    pub fn undo(&mut self) -> Option<Result<WorkflowModel>> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        Some(self.restore(self.current))
    }

    /// Step forward one edit, or `None` at the newest snapshot
    pub fn redo(&mut self) -> Option<Result<WorkflowModel>> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        Some(self.restore(self.current))
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Total compressed size of all snapshots in bytes
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(Vec::len).sum()
    }

    fn restore(&self, index: usize) -> Result<WorkflowModel> {
        let json = zstd::decode_all(&self.snapshots[index][..])
            .map_err(|e| DesignerError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(defaults::HISTORY_LIMIT)
    }
}

fn compress(model: &WorkflowModel) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(model)?;
    zstd::encode_all(&json[..], COMPRESSION_LEVEL)
        .map_err(|e| DesignerError::Compression(e.to_string()))
}
