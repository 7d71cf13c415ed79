//! Reversible commit commands and the linear undo/redo history.
//!
//! [`Command`] captures enough state at commit time to undo and redo the
//! mutation with pure in-memory graph operations -- nothing is re-captured
//! on redo, since the content was already persisted once. The forward step
//! of a command is the asynchronous commit protocol itself; a command is
//! recorded only after that step has fully succeeded, so undo is never
//! attempted for a failed commit.

use shapegraph_core::Vertex;

/// A reversible, already-applied graph mutation.
#[derive(Debug, Clone)]
pub enum Command {
    /// A prototype was committed. `children` holds the subtree members
    /// recorded at commit time, one entry per parent edge, so undo/redo
    /// can detach and reattach the whole creation atomically.
    CommitCreate {
        vertex: Vertex,
        children: Vec<Vertex>,
    },
    /// An editing batch was committed. `committed[i]` replaced the vertex
    /// whose pre-edit state is `originals[i]`.
    CommitEdit {
        committed: Vec<Vertex>,
        originals: Vec<Vertex>,
    },
}

/// Linear, pointer-based undo/redo history.
///
/// `push` truncates any redo-able tail beyond the cursor, then records the
/// command. `undo`/`redo` move the cursor and hand back the command to
/// (un-)apply; they never fail -- all fallibility lives in the forward
/// commit step.
#[derive(Debug, Default)]
pub struct CommandStack {
    commands: Vec<Command>,
    cursor: usize,
}

impl CommandStack {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successfully applied command, discarding the redo tail.
    pub fn push(&mut self, command: Command) {
        self.commands.truncate(self.cursor);
        self.commands.push(command);
        self.cursor = self.commands.len();
    }

    /// Steps the cursor back, returning the command to un-apply.
    pub fn undo(&mut self) -> Option<&Command> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.commands.get(self.cursor)
    }

    /// Steps the cursor forward, returning the command to re-apply.
    pub fn redo(&mut self) -> Option<&Command> {
        if self.cursor >= self.commands.len() {
            return None;
        }
        let command = self.commands.get(self.cursor);
        self.cursor += 1;
        command
    }

    /// True when a command can be undone.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// True when a command can be redone.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Number of recorded commands (including the redo tail).
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when the history is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
