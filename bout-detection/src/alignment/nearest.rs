use clam_common::{Real, SampleIndex};

use crate::error::{DetectionError, DetectionResult};

/// For each of `times`, the index of the closest sample in `reference`.
///
/// `reference` must be non-empty and strictly increasing, otherwise an error is
/// returned. A time exactly halfway between two reference samples maps to the
/// earlier one.
#[tracing::instrument(skip_all, fields(num_times = times.len(), num_reference = reference.len()))]
pub fn nearest_index(times: &[Real], reference: &[Real]) -> DetectionResult<Vec<SampleIndex>> {
    if reference.is_empty() {
        return Err(DetectionError::EmptyReference);
    }
    if let Some(index) = reference
        .windows(2)
        .position(|pair| !matches!(pair, [earlier, later] if earlier < later))
    {
        return Err(DetectionError::NonIncreasingReference { index: index + 1 });
    }
    Ok(times.iter().map(|&time| nearest(reference, time)).collect())
}

fn nearest(reference: &[Real], time: Real) -> SampleIndex {
    let after = reference.partition_point(|&sample| sample < time);
    let before = after.checked_sub(1);
    match (before.and_then(|i| reference.get(i)), reference.get(after)) {
        (Some(earlier), Some(later)) if time - earlier <= later - time => after - 1,
        (Some(_), None) => after - 1,
        _ => after,
    }
}
