//! Reversible transaction log of the plan database.
//!
//! Every mutating primitive of [`PlanDataBase`] registers an undo closure
//! on the innermost open transaction. Committing a nested transaction
//! hands its closures to the parent; committing the outermost one drops
//! them. Rolling back replays the closures of the innermost transaction in
//! reverse order.

use crate::pdb::PlanDataBase;
use timeforge_core::Result;

/// Undo closure registered by a plan database primitive.
pub type Undo = Box<dyn FnOnce(&mut PlanDataBase) -> Result<()> + Send + Sync>;

#[derive(Default)]
pub(crate) struct TransactionLog {
    frames: Vec<Vec<Undo>>,
    /// Set while a rollback replays closures; primitives run by the
    /// closures must not record again.
    replaying: bool,
}

impl TransactionLog {
    pub(crate) fn begin(&mut self) {
        self.frames.push(Vec::with_capacity(8));
    }

    pub(crate) fn record(&mut self, undo: Undo) {
        if self.replaying {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.push(undo);
        }
    }

    /// Closes the innermost transaction, merging it into the parent.
    /// Returns false if no transaction was open.
    pub(crate) fn commit(&mut self) -> bool {
        match self.frames.pop() {
            Some(frame) => {
                if let Some(parent) = self.frames.last_mut() {
                    parent.extend(frame);
                }
                true
            }
            None => false,
        }
    }

    /// Takes the innermost transaction's closures, most recent first.
    pub(crate) fn take_for_rollback(&mut self) -> Option<Vec<Undo>> {
        self.frames.pop().map(|mut frame| {
            frame.reverse();
            frame
        })
    }

    pub(crate) fn set_replaying(&mut self, replaying: bool) -> bool {
        std::mem::replace(&mut self.replaying, replaying)
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn pending_undos(&self) -> usize {
        self.frames.last().map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for TransactionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionLog")
            .field("depth", &self.frames.len())
            .field("pending_undos", &self.pending_undos())
            .finish()
    }
}
