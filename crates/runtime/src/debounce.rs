use crate::clock::Millis;

/// Trailing-edge debouncer: collapses a burst of values into one.
///
/// Each `push` restarts the quiet window; `poll` releases the pending value
/// once the window has elapsed with no further pushes. There is no
/// cancellation: the last value pushed within a burst is the one released.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Millis,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    due: Millis,
}

impl<T> Debouncer<T> {
    pub fn new(window: Millis) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Millis {
        self.window
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time at which the pending value becomes due, if any.
    pub fn due_at(&self) -> Option<Millis> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    pub fn push(&mut self, value: T, now: Millis) {
        self.pending = Some(Pending {
            value,
            due: now.saturating_add(self.window),
        });
    }

    /// Like [`Debouncer::push`], but lets the caller fold the new value into
    /// the pending one.
    pub fn push_with(&mut self, value: T, now: Millis, merge: impl FnOnce(T, T) -> T) {
        let value = match self.pending.take() {
            Some(prev) => merge(prev.value, value),
            None => value,
        };
        self.push(value, now);
    }

    pub fn poll(&mut self, now: Millis) -> Option<T> {
        match &self.pending {
            Some(p) if now >= p.due => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Releases the pending value immediately, regardless of the window.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }
}
