//! Calibration point selection.
//!
//! Points are drawn evenly across the x-sorted dataset: `n` positions are
//! linearly spaced over `[1, len]` (both ends included), rounded to the
//! nearest integer (ties to even) and mapped back through the sort order.
//! The smallest and largest x are therefore always selected.
//!
//! Rounded positions that coincide are collapsed, so the result can hold
//! fewer than `n` points. For `n <= len` the spacing is at least 1, so this
//! only matters for floating-point edge cases.

use crate::domain::Observation;
use crate::error::CalibError;

/// Select up to `n` calibration points, returned in ascending-x order.
pub fn select_points(dataset: &[Observation], n: usize) -> Result<Vec<Observation>, CalibError> {
    let len = dataset.len();
    if n < 2 || n > len {
        return Err(CalibError::InvalidParameterCount {
            requested: n,
            available: len,
        });
    }

    // Stable: equal x keep their load order.
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| dataset[a].x.total_cmp(&dataset[b].x));

    let mut positions = spaced_positions(len, n);
    positions.dedup();

    Ok(positions
        .into_iter()
        .map(|pos| dataset[order[pos - 1]])
        .collect())
}

/// `n` one-based positions evenly spaced over `[1, len]`.
fn spaced_positions(len: usize, n: usize) -> Vec<usize> {
    let first = 1.0;
    let last = len as f64;
    let step = (last - first) / (n as f64 - 1.0);
    (0..n)
        .map(|i| {
            let v = if i + 1 == n { last } else { first + step * i as f64 };
            (v.round_ties_even() as usize).clamp(1, len)
        })
        .collect()
}
