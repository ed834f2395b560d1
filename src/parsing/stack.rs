//! The object stack carrying inherited arguments into rules and synthesized
//! values out of them.

/// LIFO of owned parse values.
///
/// A caller pushes a rule's inherited arguments, the rule pops them on entry
/// and pushes its synthesized value on a successful match. A failed rule
/// leaves the stack exactly as it found it.
#[derive(Debug, Clone)]
pub struct ObjectStack<V> {
    items: Vec<V>,
}

impl<V> ObjectStack<V> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, value: V) {
        self.items.push(value);
    }

    pub fn pop(&mut self) -> Option<V> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&V> {
        self.items.last()
    }

    /// Pops the top `count` values, returned in push order.
    ///
    /// Returns `None` and leaves the stack untouched when fewer are available.
    pub fn pop_n(&mut self, count: usize) -> Option<Vec<V>> {
        let split = self.items.len().checked_sub(count)?;
        Some(self.items.split_off(split))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops everything above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.items.truncate(depth);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<V> Default for ObjectStack<V> {
    fn default() -> Self {
        Self::new()
    }
}
