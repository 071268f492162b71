//! Time from a stimulus onset to the first bout it evokes.

use clam_common::{Real, SampleIndex};
use serde::Serialize;

use crate::{
    datatype::StimulusWindow,
    error::{DetectionError, DetectionResult, InputLocation, ensure_positive, ensure_same_length},
};

/// Upper bound on the number of centers evaluated by [optimal_latency_window].
pub const MAX_GRID_CENTERS: usize = 1_000_000;

/// Motor activity at or below this level counts as no movement.
pub const DEFAULT_MOTOR_THRESHOLD: Real = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatencyRecord {
    pub latency: Real,
    /// `floor(bout_start / trial_duration)`.
    pub trial: i64,
    /// Start of the stimulus window the bout responded to.
    pub window_start: Real,
}

/// Admits latencies within `tolerance` of `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClampGate {
    pub target: Real,
    pub tolerance: Real,
}

impl ClampGate {
    pub fn new(target: Real, tolerance: Real) -> Self {
        Self { target, tolerance }
    }

    fn admits(&self, latency: Real) -> bool {
        (latency - self.target).abs() <= self.tolerance
    }
}

/// Latency of the first bout starting inside each stimulus window.
///
/// For each window the first of `bout_starts` at or after its start is taken; a
/// window is skipped when that bout starts after the window's end, or when there
/// is no such bout.
#[tracing::instrument(skip_all, fields(num_bouts = bout_starts.len(), num_windows = windows.len(), num_records))]
pub fn swim_latency(
    bout_starts: &[Real],
    windows: &[StimulusWindow],
    trial_duration: Real,
) -> DetectionResult<Vec<LatencyRecord>> {
    let trial_duration = ensure_positive("trial_duration", trial_duration)?;
    let records = windows
        .iter()
        .filter_map(|window| {
            let Some(bout_start) = bout_starts.iter().copied().find(|&t| t >= window.start) else {
                tracing::trace!(start = window.start, "No bout after stimulus onset");
                return None;
            };
            if !window.contains(bout_start) {
                tracing::trace!(
                    start = window.start,
                    end = window.end,
                    bout_start,
                    "No bout inside stimulus window"
                );
                return None;
            }
            Some(LatencyRecord {
                latency: bout_start - window.start,
                trial: (bout_start / trial_duration).floor() as i64,
                window_start: window.start,
            })
        })
        .collect::<Vec<_>>();

    tracing::Span::current().record("num_records", records.len());
    Ok(records)
}

/// Like [swim_latency], keeping only records whose latency passes `gate`.
pub fn latency_clamped_flow_times(
    bout_starts: &[Real],
    windows: &[StimulusWindow],
    trial_duration: Real,
    gate: ClampGate,
) -> DetectionResult<Vec<LatencyRecord>> {
    Ok(swim_latency(bout_starts, windows, trial_duration)?
        .into_iter()
        .filter(|record| gate.admits(record.latency))
        .collect())
}

/// Best candidate of [optimal_latency_window].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OptimalWindow {
    pub center: Real,
    pub count: usize,
}

/// Grid search for the latency window holding the most latencies.
///
/// Candidate centers are `lo + k * step` for every `k` keeping the center below
/// `hi`. A latency is counted when it lies within `half_width` of the center.
/// Of several centers sharing the highest count, the last is chosen.
///
/// Both ends of `search_range` must be finite and the grid may hold at most
/// [MAX_GRID_CENTERS] centers.
#[tracing::instrument(skip_all, fields(num_latencies = latencies.len(), half_width = half_width, step = step))]
pub fn optimal_latency_window(
    latencies: &[Real],
    half_width: Real,
    step: Real,
    search_range: (Real, Real),
) -> DetectionResult<OptimalWindow> {
    let half_width = ensure_positive("half_width", half_width)?;
    let step = ensure_positive("step", step)?;
    let (lo, hi) = search_range;
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(DetectionError::InvalidRange { lo, hi });
    }
    let num_centers = ((hi - lo) / step).ceil();
    if !(num_centers <= MAX_GRID_CENTERS as Real) {
        return Err(DetectionError::GridTooLarge {
            count: num_centers,
            max: MAX_GRID_CENTERS,
        });
    }

    let best = (0..=num_centers as u64)
        .map(|k| lo + k as Real * step)
        .take_while(|&center| center < hi)
        .map(|center| OptimalWindow {
            center,
            count: latencies
                .iter()
                .filter(|&&latency| (latency - center).abs() <= half_width)
                .count(),
        })
        .fold(None, |best: Option<OptimalWindow>, candidate| match best {
            Some(best) if candidate.count < best.count => Some(best),
            _ => Some(candidate),
        });

    // `lo < hi` guarantees the first center is evaluated.
    Ok(best.unwrap_or(OptimalWindow { center: lo, count: 0 }))
}

/// Starts of the stimulus windows during which the motor signal stayed at or below `motor_threshold`.
///
/// Windows are `[start, end)` sample ranges; empty or out of range windows are omitted.
#[tracing::instrument(skip_all, fields(num_windows = flow_start.len(), motor_threshold = motor_threshold))]
pub fn motor_free_flow_start_indices(
    flow_start: &[SampleIndex],
    flow_end: &[SampleIndex],
    motor_activity: &[Real],
    motor_threshold: Real,
) -> DetectionResult<Vec<SampleIndex>> {
    ensure_same_length(InputLocation::FlowEnds, flow_start.len(), flow_end.len())?;
    Ok(flow_start
        .iter()
        .zip(flow_end)
        .filter_map(|(&start, &end)| {
            let peak = motor_activity
                .get(start..end)
                .and_then(|activity| activity.iter().copied().reduce(Real::max));
            if peak.is_none() {
                tracing::debug!(start, end, "Stimulus window holds no motor samples");
            }
            (peak? <= motor_threshold).then_some(start)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn latency_to_first_bout_in_window() {
        let windows = StimulusWindow::from_bounds(&[10., 40.], &[20., 50.]).unwrap();
        let records = swim_latency(&[5., 15., 30.], &windows, 12.).unwrap();
        assert_eq!(
            records,
            vec![LatencyRecord {
                latency: 5.,
                trial: 1,
                window_start: 10.
            }]
        );
    }

    #[test]
    fn first_bout_after_onset_must_be_inside_window() {
        // The bout at 25 follows the onset but misses the window, later bouts are not considered.
        let windows = [StimulusWindow::new(10., 20.)];
        assert!(swim_latency(&[25., 15.], &windows, 10.).unwrap().is_empty());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let windows = [StimulusWindow::new(10., 20.), StimulusWindow::new(30., 35.)];
        let records = swim_latency(&[10., 35.], &windows, 100.).unwrap();
        let latencies: Vec<_> = records.iter().map(|r| r.latency).collect();
        assert_eq!(latencies, vec![0., 5.]);
        assert!(records.iter().all(|r| r.trial == 0));
    }

    #[test]
    fn trial_duration_must_be_positive() {
        assert!(swim_latency(&[1.], &[StimulusWindow::new(0., 2.)], 0.).is_err());
        assert!(StimulusWindow::from_bounds(&[1., 2.], &[3.]).is_err());
    }

    #[test]
    fn clamped_latencies() {
        let windows = StimulusWindow::from_bounds(&[0., 10., 20.], &[5., 15., 25.]).unwrap();
        let records = latency_clamped_flow_times(
            &[1., 13., 20.5],
            &windows,
            10.,
            ClampGate::new(1.0, 0.6),
        )
        .unwrap();
        let starts: Vec<_> = records.iter().map(|r| r.window_start).collect();
        assert_eq!(starts, vec![0., 20.]);
        assert_eq!(records[1].trial, 2);
    }

    #[test]
    fn optimal_window_prefers_densest_center() {
        let best = optimal_latency_window(&[0.6, 0.6, 1.2], 0.128, 0.128, (0.512, 2.0)).unwrap();
        assert_eq!(best.count, 2);
        assert_approx_eq!(best.center, 0.64);
    }

    #[test]
    fn optimal_window_ties_favour_later_center() {
        let best = optimal_latency_window(&[1.0, 3.0], 0.5, 1.0, (0.0, 5.0)).unwrap();
        assert_eq!(best.count, 1);
        assert_approx_eq!(best.center, 3.0);

        let none = optimal_latency_window(&[], 0.5, 1.0, (0.0, 2.5)).unwrap();
        assert_eq!(none.count, 0);
        assert_approx_eq!(none.center, 2.0);
    }

    #[test]
    fn optimal_window_preconditions() {
        assert!(optimal_latency_window(&[1.], 0.1, 0., (0., 1.)).is_err());
        assert!(optimal_latency_window(&[1.], 0., 0.1, (0., 1.)).is_err());
        assert_eq!(
            optimal_latency_window(&[1.], 0.1, 0.1, (1., 1.)),
            Err(DetectionError::InvalidRange { lo: 1., hi: 1. })
        );
    }

    #[test]
    fn optimal_window_rejects_unbounded_search() {
        assert_eq!(
            optimal_latency_window(&[0.6], 0.128, 0.128, (0.0, Real::INFINITY)),
            Err(DetectionError::InvalidRange {
                lo: 0.0,
                hi: Real::INFINITY
            })
        );
        assert!(optimal_latency_window(&[0.6], 0.128, 0.128, (Real::NEG_INFINITY, 1.0)).is_err());
        assert!(optimal_latency_window(&[0.6], 0.128, 0.128, (Real::NAN, 1.0)).is_err());
        assert!(matches!(
            optimal_latency_window(&[0.6], 0.128, 1e-9, (0.0, 1e9)),
            Err(DetectionError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn motor_free_windows() {
        let motor = [0., 0.1, 0.5, 0., 0., 0.2, 0., 0.];
        let starts = motor_free_flow_start_indices(
            &[0, 3, 6, 7, 6],
            &[3, 6, 6, 12, 8],
            &motor,
            DEFAULT_MOTOR_THRESHOLD,
        )
        .unwrap();
        assert_eq!(starts, vec![3, 6]);
        assert!(motor_free_flow_start_indices(&[0], &[], &motor, 0.2).is_err());
    }
}
