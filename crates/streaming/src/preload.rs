use runtime::work_queue::{WorkQueue, WorkQueueFull};

/// Background thumbnail fetch for a neighbor of the active image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadJob {
    pub index: usize,
    pub url: String,
}

/// Neighbor indices around `center`, nearest first.
///
/// At equal distance the index ahead comes before the one behind, since
/// forward travel is the common direction.
pub fn preload_window(center: usize, image_count: usize, ahead: usize, behind: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(ahead + behind);
    for step in 1..=ahead.max(behind) {
        if step <= ahead && center + step < image_count {
            out.push(center + step);
        }
        if step <= behind && step <= center {
            out.push(center - step);
        }
    }
    out
}

/// Pending preloads for the current window.
///
/// Thin wrapper over `runtime::WorkQueue`: priority is the position in the
/// window, so the nearest neighbors go first.
#[derive(Debug)]
pub struct PreloadQueue {
    inner: WorkQueue<PreloadJob>,
}

impl PreloadQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            inner: WorkQueue::with_max_len(max_pending),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn pending_indices(&self) -> Vec<usize> {
        let mut pending: Vec<&PreloadJob> = self.inner.iter().collect();
        pending.sort_by_key(|job| job.index);
        pending.into_iter().map(|job| job.index).collect()
    }

    /// Replaces whatever is pending with `jobs`, in order.
    ///
    /// Jobs beyond the queue's capacity are dropped; the error reports the
    /// first rejection.
    pub fn reschedule(
        &mut self,
        jobs: impl IntoIterator<Item = PreloadJob>,
    ) -> Result<usize, WorkQueueFull> {
        self.inner.clear();
        let mut accepted = 0;
        for (order, job) in jobs.into_iter().enumerate() {
            let priority = i32::try_from(order).unwrap_or(i32::MAX);
            self.inner.try_push(priority, job)?;
            accepted += 1;
        }
        Ok(accepted)
    }

    pub fn pop_next(&mut self) -> Option<PreloadJob> {
        self.inner.pop_next().map(|(_, job)| job)
    }
}

#[cfg(test)]
mod tests {
    use super::{PreloadJob, PreloadQueue, preload_window};

    #[test]
    fn window_prefers_ahead_and_nearest() {
        assert_eq!(preload_window(10, 100, 3, 2), vec![11, 9, 12, 8, 13]);
    }

    #[test]
    fn window_is_clipped_at_sequence_bounds() {
        assert_eq!(preload_window(0, 100, 2, 2), vec![1, 2]);
        assert_eq!(preload_window(9, 10, 3, 1), vec![8]);
        assert!(preload_window(0, 1, 5, 5).is_empty());
    }

    fn job(index: usize) -> PreloadJob {
        PreloadJob {
            index,
            url: format!("u{index}"),
        }
    }

    #[test]
    fn reschedule_replaces_pending_window() {
        let mut q = PreloadQueue::new(8);
        q.reschedule([job(1), job(2)]).unwrap();
        q.reschedule([job(7), job(5)]).unwrap();

        assert_eq!(q.pending_indices(), vec![5, 7]);
        assert_eq!(q.pop_next(), Some(job(7)));
        assert_eq!(q.pop_next(), Some(job(5)));
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn reschedule_respects_capacity() {
        let mut q = PreloadQueue::new(2);
        let err = q.reschedule([job(1), job(2), job(3)]).unwrap_err();
        assert_eq!(err.max_len, 2);
        assert_eq!(q.len(), 2);
    }
}
