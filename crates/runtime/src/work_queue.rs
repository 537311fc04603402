use std::collections::BTreeMap;

/// Bounded priority queue for best-effort background work.
///
/// Items pop in `(priority, arrival)` order: smaller priorities first, ties in
/// insertion order. Pushing beyond `max_len` is refused rather than evicting.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: BTreeMap<(i32, u64), T>,
    arrivals: u64,
    max_len: Option<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WorkQueueFull {
    pub max_len: usize,
}

impl std::fmt::Display for WorkQueueFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "queue already holds {} items", self.max_len)
    }
}

impl std::error::Error for WorkQueueFull {}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            arrivals: 0,
            max_len: None,
        }
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn try_push(&mut self, priority: i32, payload: T) -> Result<(), WorkQueueFull> {
        if let Some(max_len) = self.max_len
            && self.items.len() >= max_len
        {
            return Err(WorkQueueFull { max_len });
        }
        self.items.insert((priority, self.arrivals), payload);
        self.arrivals += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Pending payloads in pop order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn pop_next(&mut self) -> Option<(i32, T)> {
        self.items
            .pop_first()
            .map(|((priority, _), payload)| (priority, payload))
    }
}
