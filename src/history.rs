use crate::model::Snapshot;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded undo/redo stacks of whole-graph snapshots for one document.
///
/// The owner records the state *before* every mutation. Undo and redo hand
/// back complete snapshots, so a graph is never restored piecemeal.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Push the pre-mutation state and drop any redo branch.
    pub fn record(&mut self, before: Snapshot) {
        push_bounded(&mut self.undo, before, self.limit);
        self.redo.clear();
    }

    /// Returns the state to restore, stashing `current` for redo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        push_bounded(&mut self.redo, current, self.limit);
        Some(previous)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop_back()?;
        push_bounded(&mut self.undo, current, self.limit);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Clear portal links in every stored snapshot whose target fails `live`,
    /// so stepping through history never resurrects a link to a removed
    /// document.
    pub fn drop_portal_links(&mut self, live: impl Fn(&str) -> bool) {
        for snapshot in self.undo.iter_mut().chain(self.redo.iter_mut()) {
            for node in &mut snapshot.nodes {
                if node.portal_document_id.as_deref().is_some_and(|id| !live(id)) {
                    node.is_portal = false;
                    node.portal_document_id = None;
                }
            }
        }
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, limit: usize) {
    stack.push_back(snapshot);
    while stack.len() > limit {
        stack.pop_front();
    }
}
