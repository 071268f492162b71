use clam_common::{Real, SampleIndex};
use itertools::{Either, Itertools};

use crate::{
    datatype::{Bout, BoutIndex},
    detectors::{BoutDetector, BoutEdge},
    error::DetectionResult,
    events::EventFilter,
};

/// Segments `signal` into bouts.
///
/// A bout opens where the signal rises to `min_thresh` and closes once it has
/// stayed below `min_thresh` for `min_spacing` samples (see [BoutDetector]).
/// The final `min_spacing` samples are only used as look-ahead. Bouts that are
/// truncated by the start or the end of the recording are discarded, as are
/// bouts whose peak does not exceed `max_thresh`.
#[tracing::instrument(skip_all, fields(
    num_samples = signal.len(),
    min_thresh = min_thresh,
    max_thresh = max_thresh,
    min_spacing = min_spacing,
    num_onsets,
    num_offsets,
    num_bouts
))]
pub fn detect_bouts(
    signal: &[Real],
    min_thresh: Real,
    max_thresh: Real,
    min_spacing: usize,
) -> DetectionResult<BoutIndex> {
    let detector = BoutDetector::new(min_thresh, min_spacing)?;
    let last_scannable = signal.len().saturating_sub(min_spacing);

    let (starts, ends): (Vec<SampleIndex>, Vec<SampleIndex>) = signal
        .iter()
        .copied()
        .enumerate()
        .events(detector)
        .filter(|edge| !matches!(edge, BoutEdge::Onset(start) if *start >= last_scannable))
        .partition_map(|edge| match edge {
            BoutEdge::Onset(start) => Either::Left(start),
            BoutEdge::Offset(end) => Either::Right(end),
        });
    tracing::Span::current().record("num_onsets", starts.len());
    tracing::Span::current().record("num_offsets", ends.len());

    if starts.is_empty() || ends.is_empty() {
        tracing::Span::current().record("num_bouts", 0);
        return Ok(BoutIndex::default());
    }

    let bouts = reconcile_bout_edges(&starts, &ends, last_scannable).filter(|bout| {
        let above = signal
            .get(bout.range())
            .is_some_and(|window| window.iter().any(|&value| value > max_thresh));
        if !above {
            tracing::trace!(%bout, "Bout does not reach max threshold");
        }
        above
    });

    tracing::Span::current().record("num_bouts", bouts.len());
    Ok(bouts)
}

/// Pairs onsets with offsets, discarding bouts truncated by the recording.
///
/// The two count mismatches are resolved differently: surplus onsets are
/// dropped from the end (a bout still running when the scan stops), while
/// surplus offsets lose their first entry (closing a bout that began before
/// the scan). A pair starting at index 0 and a final pair ending at
/// `last_scannable` are dropped.
pub(crate) fn reconcile_bout_edges(
    starts: &[SampleIndex],
    ends: &[SampleIndex],
    last_scannable: SampleIndex,
) -> BoutIndex {
    let mut starts = starts;
    let mut ends = ends;

    if starts.len() > ends.len() {
        starts = starts.get(..ends.len()).unwrap_or(starts);
    } else if starts.len() < ends.len() {
        ends = ends.split_first().map_or(ends, |(_, rest)| rest);
    }

    if let (Some((&0, rest_starts)), Some((_, rest_ends))) =
        (starts.split_first(), ends.split_first())
    {
        tracing::trace!("Dropping bout which starts the recording");
        starts = rest_starts;
        ends = rest_ends;
    }

    if ends.iter().max() == Some(&last_scannable) {
        tracing::trace!("Dropping bout which ends the recording");
        starts = starts.split_last().map_or(starts, |(_, rest)| rest);
        ends = ends.split_last().map_or(ends, |(_, rest)| rest);
    }

    starts
        .iter()
        .zip(ends)
        .map(|(&start, &end)| Bout { start, end })
        .collect()
}
