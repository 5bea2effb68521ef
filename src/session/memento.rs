use crate::session::Session;

/// An immutable deep copy of the whole session collection at one point in
/// time.
#[derive(Debug, Clone)]
pub struct SessionMemento {
    state: Vec<Session>,
}

impl SessionMemento {
    /// Snapshot the given collection.
    pub fn new(state: Vec<Session>) -> Self {
        Self { state }
    }

    /// The captured collection.
    pub fn state(&self) -> &[Session] {
        &self.state
    }

    /// The number of sessions in the snapshot.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Returns true if the snapshot holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

/// Linear undo/redo history over [`SessionMemento`]s.
///
/// The current state is always the top of the undo stack. Saving a new
/// memento clears the redo stack. Undo stops at the oldest snapshot rather
/// than emptying the stack, so once the first memento is saved the undo
/// stack never becomes empty.
#[derive(Debug, Default)]
pub struct SessionCaretaker {
    undo_mementos: Vec<SessionMemento>,
    redo_mementos: Vec<SessionMemento>,
}

impl SessionCaretaker {
    /// An empty history.
    pub fn new() -> Self {
        Default::default()
    }

    /// Push a new memento and clear the redo stack.
    pub fn save(&mut self, memento: SessionMemento) {
        self.undo_mementos.push(memento);
        self.redo_mementos.clear();
    }

    /// Step back one memento and return the new current state.
    ///
    /// At the oldest snapshot this is a no-op that keeps returning it.
    /// Returns `None` only if nothing was ever saved.
    pub fn undo(&mut self) -> Option<&SessionMemento> {
        if self.undo_mementos.len() > 1 {
            if let Some(top) = self.undo_mementos.pop() {
                self.redo_mementos.push(top);
            }
        }
        self.undo_mementos.last()
    }

    /// Step forward one memento and return the new current state.
    /// Returns `None` if there is nothing to redo.
    pub fn redo(&mut self) -> Option<&SessionMemento> {
        let memento = self.redo_mementos.pop()?;
        self.undo_mementos.push(memento);
        self.undo_mementos.last()
    }

    /// The current state, i.e. the top of the undo stack.
    pub fn current(&self) -> Option<&SessionMemento> {
        self.undo_mementos.last()
    }

    /// The number of snapshots reachable by undo, including the current one.
    pub fn history_len(&self) -> usize {
        self.undo_mementos.len()
    }
}
