/// Index of the entry closest to `target`, ties broken toward the lower index.
///
/// Linear scan; the input only needs to be roughly ordered. Non-finite entries
/// are skipped. Returns `None` for an empty slice or a non-finite target.
pub fn nearest_index_by_value(values: &[f64], target: f64) -> Option<usize> {
    if !target.is_finite() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, v) in values.iter().copied().enumerate() {
        if !v.is_finite() {
            continue;
        }
        let diff = (v - target).abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((idx, diff)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Binary-search variant of [`nearest_index_by_value`] for non-decreasing
/// slices of finite values. Same tie rule: among equally close entries
/// (including runs of repeated values) the lowest index wins.
pub fn nearest_index_sorted(values: &[f64], target: f64) -> Option<usize> {
    if values.is_empty() || !target.is_finite() {
        return None;
    }

    // First entry >= target; it is also the first of its run.
    let upper = values.partition_point(|v| *v < target);
    if upper == 0 {
        return Some(0);
    }

    let below = values[upper - 1];
    let lower = values.partition_point(|v| *v < below);
    if upper == values.len() {
        return Some(lower);
    }

    if target - below <= values[upper] - target {
        Some(lower)
    } else {
        Some(upper)
    }
}
