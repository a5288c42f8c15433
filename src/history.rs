/// Linear undo/redo history over settled snapshots. Bounded: once the stack
/// exceeds `capacity`, the oldest entry is evicted and the cursor shifted so
/// the current position is preserved.
#[derive(Clone, Debug)]
pub struct UndoHistory<T: Clone> {
    stack: Vec<T>,
    cursor: usize,
    capacity: usize,
}

pub const DEFAULT_CAPACITY: usize = 50;

impl<T: Clone> UndoHistory<T> {
    pub fn new(initial: T) -> Self {
        Self::with_capacity(initial, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial: T, capacity: usize) -> Self {
        Self {
            stack: vec![initial],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Truncates the redo tail, appends, advances the cursor and evicts the
    /// oldest entry when over capacity.
    pub fn commit(&mut self, value: T) {
        if self.cursor + 1 < self.stack.len() {
            self.stack.truncate(self.cursor + 1);
        }
        self.stack.push(value);
        self.cursor = self.stack.len() - 1;

        if self.stack.len() > self.capacity {
            self.stack.remove(0);
            self.cursor -= 1;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.stack[self.cursor].clone())
    }

    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.stack[self.cursor].clone())
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }
}
