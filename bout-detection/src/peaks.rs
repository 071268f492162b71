use clam_common::Real;
use itertools::{Either, Itertools};

use crate::{
    datatype::{Extremum, Peak, PeakSet},
    detectors::PeakDetector,
    error::{DetectionResult, InputLocation, ensure_same_length},
    events::EventFilter,
};

/// Finds the local maxima and minima of `values` using a hysteresis of `delta`.
///
/// Peak positions are sample indices unless `positions` supplies the abscissa of
/// each value. Fails if `positions` and `values` differ in length or if `delta`
/// is not strictly positive.
#[tracing::instrument(skip_all, fields(num_values = values.len(), delta = delta, num_maxima, num_minima))]
pub fn peakdet(
    values: &[Real],
    delta: Real,
    positions: Option<&[Real]>,
) -> DetectionResult<(PeakSet, PeakSet)> {
    if let Some(positions) = positions {
        ensure_same_length(InputLocation::PeakPositions, values.len(), positions.len())?;
    }
    let detector = PeakDetector::new(delta)?;

    let extrema: Vec<Extremum> = match positions {
        Some(positions) => positions
            .iter()
            .copied()
            .zip(values.iter().copied())
            .events(detector)
            .collect(),
        None => values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as Real, v))
            .events(detector)
            .collect(),
    };

    let (maxima, minima): (PeakSet, PeakSet) =
        extrema.into_iter().partition_map(|extremum| match extremum {
            Extremum::Maximum(peak) => Either::Left(peak),
            Extremum::Minimum(peak) => Either::Right(peak),
        });

    tracing::Span::current().record("num_maxima", maxima.len());
    tracing::Span::current().record("num_minima", minima.len());
    Ok((maxima, minima))
}

/// Merges clusters of peaks closer than `min_spacing`, keeping the largest of each.
///
/// Each pass walks adjacent pairs: a pair at least `min_spacing` apart keeps the
/// earlier peak, a closer pair collapses to the larger peak (the earlier on a tie)
/// and the walk resumes after the pair. Passes repeat until one collapses nothing,
/// so the result is a fixed point and re-running the filter returns it unchanged.
#[tracing::instrument(skip_all, fields(num_peaks = peaks.len(), min_spacing = min_spacing, num_passes, num_filtered))]
pub fn filter_peaks_by_spacing(peaks: &[Peak], min_spacing: Real) -> PeakSet {
    let mut current = peaks.to_vec();
    let mut passes = 0;
    // Every pass that is not final removes at least one peak.
    for _ in 0..=peaks.len() {
        let next = decluster_pass(&current, min_spacing);
        passes += 1;
        let converged = next.len() == current.len();
        current = next;
        if converged {
            break;
        }
    }

    tracing::Span::current().record("num_passes", passes);
    tracing::Span::current().record("num_filtered", current.len());
    current
}

pub(crate) fn decluster_pass(peaks: &[Peak], min_spacing: Real) -> PeakSet {
    let mut filtered = Vec::with_capacity(peaks.len());
    let mut remaining = peaks;
    while let [this, rest @ ..] = remaining {
        match rest {
            [next, tail @ ..] if !(next.position - this.position >= min_spacing) => {
                filtered.push(if next.value > this.value { *next } else { *this });
                remaining = tail;
            }
            _ => {
                filtered.push(*this);
                remaining = rest;
            }
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectionError;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn peaks(data: &[(Real, Real)]) -> PeakSet {
        data.iter().map(|&(p, v)| Peak::new(p, v)).collect()
    }

    #[test]
    fn peakdet_square_wave() {
        let (maxima, minima) = peakdet(&[0., 1., 0., 1., 0., 1., 0.], 0.5, None).unwrap();
        assert_eq!(maxima, peaks(&[(1., 1.), (3., 1.), (5., 1.)]));
        assert_eq!(minima, peaks(&[(2., 0.), (4., 0.)]));
    }

    #[test]
    fn peakdet_with_positions() {
        let positions = [0.0, 0.1, 0.2, 0.3, 0.4];
        let (maxima, minima) = peakdet(&[0., 3., 1., 4., 0.], 1.0, Some(&positions)).unwrap();
        assert_eq!(maxima, peaks(&[(0.1, 3.), (0.3, 4.)]));
        assert_eq!(minima, peaks(&[(0.2, 1.)]));
    }

    #[test]
    fn peakdet_preconditions() {
        assert_eq!(
            peakdet(&[0., 1.], 0.5, Some(&[0.])),
            Err(DetectionError::LengthMismatch {
                location: InputLocation::PeakPositions,
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            peakdet(&[0., 1.], -0.5, None),
            Err(DetectionError::NonPositiveDelta(-0.5))
        );
    }

    #[test]
    fn peakdet_no_data() {
        let (maxima, minima) = peakdet(&[], 0.5, None).unwrap();
        assert!(maxima.is_empty());
        assert!(minima.is_empty());
    }

    #[test]
    fn well_spaced_peaks_are_kept() {
        let input = peaks(&[(0., 1.), (10., 2.), (20., 0.5)]);
        assert_eq!(filter_peaks_by_spacing(&input, 5.), input);
    }

    #[test]
    fn close_pair_keeps_larger() {
        let input = peaks(&[(0., 1.), (2., 3.), (20., 0.5)]);
        assert_eq!(
            filter_peaks_by_spacing(&input, 5.),
            peaks(&[(2., 3.), (20., 0.5)])
        );
    }

    #[test]
    fn tie_keeps_earlier() {
        let input = peaks(&[(0., 1.), (2., 1.)]);
        assert_eq!(filter_peaks_by_spacing(&input, 5.), peaks(&[(0., 1.)]));
    }

    #[test]
    fn trailing_and_single_peaks_are_carried() {
        let input = peaks(&[(0., 1.), (1., 2.), (10., 0.5)]);
        assert_eq!(
            filter_peaks_by_spacing(&input, 5.),
            peaks(&[(1., 2.), (10., 0.5)])
        );
        let single = peaks(&[(3., 1.)]);
        assert_eq!(filter_peaks_by_spacing(&single, 5.), single);
        assert!(filter_peaks_by_spacing(&[], 5.).is_empty());
    }

    #[test]
    fn cascading_merges() {
        // The first pass leaves (1, 2) next to (3, 4), which only a second pass merges.
        let input = peaks(&[(0., 1.), (1., 2.), (3., 4.), (4., 0.)]);
        assert_eq!(decluster_pass(&input, 2.5), peaks(&[(1., 2.), (3., 4.)]));
        assert_eq!(filter_peaks_by_spacing(&input, 2.5), peaks(&[(3., 4.)]));
    }

    #[test]
    fn idempotent_and_within_pass_bound() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let n = rng.random_range(0..60);
            let mut positions: Vec<Real> = (0..n).map(|_| rng.random_range(0.0..100.0)).collect();
            positions.sort_by(Real::total_cmp);
            let input: PeakSet = positions
                .into_iter()
                .map(|p| Peak::new(p, rng.random::<Real>()))
                .collect();
            let spacing = rng.random_range(0.5..20.0);

            let mut current = input.clone();
            let mut collapsing_passes = 0;
            loop {
                let next = decluster_pass(&current, spacing);
                if next.len() == current.len() {
                    break;
                }
                collapsing_passes += 1;
                current = next;
            }
            assert!(collapsing_passes <= n / 2 + 1);

            let once = filter_peaks_by_spacing(&input, spacing);
            assert_eq!(once, current);
            assert_eq!(filter_peaks_by_spacing(&once, spacing), once);
            assert!(
                once.iter()
                    .tuple_windows()
                    .all(|(a, b)| b.position - a.position >= spacing)
            );
        }
    }
}
