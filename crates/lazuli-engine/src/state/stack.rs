use super::Snapshot;

/// Bounded stack of saved snapshots plus the current (editable) snapshot.
///
/// Storage is allocated once at construction; push/pop never allocate.
///
/// # Panics
/// Pushing at capacity and popping an empty stack are programming errors and
/// panic in all builds.
#[derive(Debug, Clone)]
pub struct StateStack {
    current: Snapshot,
    saved: Vec<Snapshot>,
    capacity: usize,
}

impl StateStack {
    pub fn new(capacity: usize, current: Snapshot) -> Self {
        Self {
            current,
            saved: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Current snapshot.
    #[inline]
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut Snapshot {
        &mut self.current
    }

    /// Number of saved snapshots.
    #[inline]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Saves a copy of the current snapshot.
    pub fn push(&mut self) {
        assert!(
            self.saved.len() < self.capacity,
            "state stack overflow (capacity {})",
            self.capacity
        );
        self.saved.push(self.current);
    }

    /// Restores the most recently saved snapshot.
    pub fn pop(&mut self) {
        let Some(top) = self.saved.pop() else {
            panic!("state stack underflow: pop without matching push");
        };
        self.current = top;
    }

    /// Drops every saved snapshot. The current snapshot is left untouched.
    #[inline]
    pub fn clear(&mut self) {
        self.saved.clear();
    }

    /// Clears the stack and replaces the current snapshot.
    pub fn reset(&mut self, current: Snapshot) {
        self.saved.clear();
        self.current = current;
    }
}
