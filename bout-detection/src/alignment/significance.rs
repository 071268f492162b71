use std::ops::Range;

use clam_common::Real;
use serde::Serialize;

use super::TriggeredResponse;
use crate::{
    error::{DetectionError, DetectionResult},
    window::Stats,
};

/// Baseline and response statistics of one cell's average crop.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellSignificance {
    /// Index of the cell in the [TriggeredResponse].
    pub cell: usize,
    pub baseline_mean: Real,
    pub baseline_std: Real,
    pub threshold: Real,
    pub amplitude: Real,
    pub responsive: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignificanceReport {
    /// Cells with an average crop, in cell order.
    pub cells: Vec<CellSignificance>,
    /// Share of evaluated cells flagged responsive, absent if no cell was evaluated.
    pub fraction_responsive: Option<Real>,
    /// Mean response amplitude over the evaluated cells.
    pub mean_amplitude: Option<Real>,
}

impl SignificanceReport {
    pub fn responsive_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .filter(|cell| cell.responsive)
            .map(|cell| cell.cell)
    }
}

fn centred_range(center: usize, span: usize, crop_len: usize) -> DetectionResult<Range<usize>> {
    let invalid = || DetectionError::InvalidWindow {
        lo: center as isize - span as isize,
        hi: (center + span) as isize,
    };
    let start = center.checked_sub(span).ok_or_else(invalid)?;
    let end = center + span;
    if end > crop_len {
        return Err(invalid());
    }
    Ok(start..end)
}

/// Flags cells whose average crop rises above its own baseline.
///
/// Both windows cover `[center - span, center + span)` samples of the crop. A cell
/// is responsive when its response mean exceeds the baseline mean plus
/// `std_multiplier` population standard deviations. Cells without an average are
/// not evaluated.
#[tracing::instrument(skip_all, fields(
    num_cells = response.cells.len(),
    baseline_center = baseline_center,
    response_center = response_center,
    span = span,
    num_responsive
))]
pub fn detect_significant_responses(
    response: &TriggeredResponse,
    baseline_center: usize,
    response_center: usize,
    span: usize,
    std_multiplier: Real,
) -> DetectionResult<SignificanceReport> {
    if span == 0 {
        return Err(DetectionError::NonPositiveParameter {
            name: "span",
            value: 0.0,
        });
    }
    let crop_len = response.window.len();
    let baseline_range = centred_range(baseline_center, span, crop_len)?;
    let response_range = centred_range(response_center, span, crop_len)?;

    let cells: Vec<CellSignificance> = response
        .averages()
        .enumerate()
        .filter_map(|(cell, average)| {
            let baseline = Stats::from_slice(average?.get(baseline_range.clone())?)?;
            let amplitude = Stats::from_slice(average?.get(response_range.clone())?)?.mean;
            let baseline_std = baseline.std_dev();
            let threshold = baseline.mean + std_multiplier * baseline_std;
            Some(CellSignificance {
                cell,
                baseline_mean: baseline.mean,
                baseline_std,
                threshold,
                amplitude,
                responsive: amplitude > threshold,
            })
        })
        .collect();

    let num_responsive = cells.iter().filter(|cell| cell.responsive).count();
    tracing::Span::current().record("num_responsive", num_responsive);

    let evaluated = cells.len() as Real;
    let (fraction_responsive, mean_amplitude) = if cells.is_empty() {
        (None, None)
    } else {
        (
            Some(num_responsive as Real / evaluated),
            Some(cells.iter().map(|cell| cell.amplitude).sum::<Real>() / evaluated),
        )
    };
    Ok(SignificanceReport {
        cells,
        fraction_responsive,
        mean_amplitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{TriggerWindow, triggered_response};
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const TRIGGERS: [usize; 4] = [50, 150, 250, 350];

    /// Noisy trace with a step of `height` for 10 samples after each trigger.
    fn trace(rng: &mut StdRng, height: Real) -> Vec<Real> {
        let mut trace: Vec<Real> = (0..400).map(|_| rng.random_range(-0.1..0.1)).collect();
        for trigger in TRIGGERS {
            for sample in &mut trace[trigger..trigger + 10] {
                *sample += height;
            }
        }
        trace
    }

    #[test]
    fn flags_cells_with_evoked_response() {
        let mut rng = StdRng::seed_from_u64(17);
        let traces = [trace(&mut rng, 2.0), trace(&mut rng, 0.0), trace(&mut rng, 1.0)];
        let window = TriggerWindow::new(-20, 20).unwrap();
        let response = triggered_response(&traces, &TRIGGERS, window, None);

        // Baseline covers offsets [-20, -10), response [0, 10).
        let report = detect_significant_responses(&response, 5, 25, 5, 3.0).unwrap();
        assert_eq!(report.cells.len(), 3);
        assert_eq!(report.responsive_cells().collect::<Vec<_>>(), vec![0, 2]);
        assert_approx_eq!(report.fraction_responsive.unwrap(), 2.0 / 3.0);

        let amplitudes: Vec<_> = report.cells.iter().map(|cell| cell.amplitude).collect();
        assert_approx_eq!(amplitudes[0], 2.0, 0.1);
        assert_approx_eq!(amplitudes[2], 1.0, 0.1);
        assert_approx_eq!(
            report.mean_amplitude.unwrap(),
            amplitudes.iter().sum::<Real>() / 3.0
        );
    }

    #[test]
    fn threshold_uses_population_std() {
        let window = TriggerWindow::new(0, 4).unwrap();
        let response = triggered_response(&[vec![1., 3., 5., 5.]], &[0], window, None);
        let report = detect_significant_responses(&response, 1, 3, 1, 1.0).unwrap();
        let cell = &report.cells[0];
        assert_approx_eq!(cell.baseline_mean, 2.0);
        assert_approx_eq!(cell.baseline_std, 1.0);
        assert_approx_eq!(cell.threshold, 3.0);
        assert_approx_eq!(cell.amplitude, 5.0);
        assert!(cell.responsive);
    }

    #[test]
    fn large_offset_baseline_keeps_its_spread() {
        let window = TriggerWindow::new(0, 4).unwrap();
        let trace = vec![1e9, 1e9 + 1.0, 1e9 + 0.6, 1e9 + 0.6];
        let response = triggered_response(&[trace], &[0], window, None);
        let report = detect_significant_responses(&response, 1, 3, 1, 1.0).unwrap();
        let cell = &report.cells[0];
        assert_approx_eq!(cell.baseline_mean, 1e9 + 0.5);
        assert_approx_eq!(cell.baseline_std, 0.5);
        assert_approx_eq!(cell.threshold, 1e9 + 1.0);
        assert!(!cell.responsive);
    }

    #[test]
    fn cells_without_average_are_not_evaluated() {
        let window = TriggerWindow::new(0, 4).unwrap();
        let response = triggered_response(&[vec![0.0; 2], vec![0.0; 8]], &[0], window, None);
        let report = detect_significant_responses(&response, 1, 3, 1, 2.0).unwrap();
        assert_eq!(report.cells.len(), 1);
        assert_eq!(report.cells[0].cell, 1);
        assert_eq!(report.fraction_responsive, Some(0.0));

        let empty = triggered_response(&[vec![0.0; 2]], &[0], window, None);
        let report = detect_significant_responses(&empty, 1, 3, 1, 2.0).unwrap();
        assert_eq!(report.fraction_responsive, None);
        assert_eq!(report.mean_amplitude, None);
    }

    #[test]
    fn windows_must_fit_the_crop() {
        let window = TriggerWindow::new(0, 4).unwrap();
        let response = triggered_response(&[vec![0.0; 8]], &[0], window, None);
        assert_eq!(
            detect_significant_responses(&response, 0, 2, 1, 2.0),
            Err(DetectionError::InvalidWindow { lo: -1, hi: 1 })
        );
        assert_eq!(
            detect_significant_responses(&response, 2, 3, 2, 2.0),
            Err(DetectionError::InvalidWindow { lo: 1, hi: 5 })
        );
        assert!(detect_significant_responses(&response, 1, 3, 0, 2.0).is_err());
    }
}
