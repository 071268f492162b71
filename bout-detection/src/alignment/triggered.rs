use std::ops::Range;

use clam_common::{Real, SampleIndex};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{DetectionError, DetectionResult, InputLocation};

/// Offsets `[lo, hi)` of a crop relative to its trigger sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TriggerWindow {
    lo: isize,
    hi: isize,
}

impl TriggerWindow {
    pub fn new(lo: isize, hi: isize) -> DetectionResult<Self> {
        if lo >= hi {
            return Err(DetectionError::InvalidWindow { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> isize {
        self.lo
    }

    pub fn hi(&self) -> isize {
        self.hi
    }

    /// Number of samples in every crop.
    pub fn len(&self) -> usize {
        self.hi.abs_diff(self.lo)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample range of the crop around `trigger`, if it lies inside `[0, trace_length]`.
    pub(crate) fn crop_range(
        &self,
        trigger: SampleIndex,
        trace_length: usize,
    ) -> Option<Range<SampleIndex>> {
        let trigger = isize::try_from(trigger).ok()?;
        let start = usize::try_from(trigger.checked_add(self.lo)?).ok()?;
        let end = usize::try_from(trigger.checked_add(self.hi)?).ok()?;
        (end <= trace_length).then_some(start..end)
    }
}

/// One trial: the samples of a trace around a single trigger.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Crop {
    pub trigger: SampleIndex,
    pub values: Vec<Real>,
}

/// Every retained crop of one cell and their sample-wise mean.
///
/// `average` is absent when no crop was retained.
#[derive(Default, Clone, Debug, PartialEq, Serialize)]
pub struct CellResponse {
    pub crops: Vec<Crop>,
    pub average: Option<Vec<Real>>,
}

impl CellResponse {
    fn from_crops(crops: Vec<Crop>) -> Self {
        let average = average_crops(&crops);
        Self { crops, average }
    }

    fn from_trace(
        trace: &[Real],
        trigger_indices: &[SampleIndex],
        window: TriggerWindow,
        trace_length: usize,
    ) -> Self {
        let crops = trigger_indices
            .iter()
            .filter_map(|&trigger| {
                let values = trace.get(window.crop_range(trigger, trace_length)?)?;
                Some(Crop {
                    trigger,
                    values: values.to_vec(),
                })
            })
            .collect::<Vec<_>>();
        if crops.is_empty() {
            tracing::debug!(num_triggers = trigger_indices.len(), "No crop retained");
        }
        Self::from_crops(crops)
    }

    pub fn num_trials(&self) -> usize {
        self.crops.len()
    }
}

fn average_crops(crops: &[Crop]) -> Option<Vec<Real>> {
    let (first, rest) = crops.split_first()?;
    let mut sum = first.values.clone();
    for crop in rest {
        for (total, value) in sum.iter_mut().zip(&crop.values) {
            *total += value;
        }
    }
    let count = crops.len() as Real;
    Some(sum.into_iter().map(|total| total / count).collect())
}

/// Crops of every cell around a common set of triggers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TriggeredResponse {
    pub window: TriggerWindow,
    pub cells: Vec<CellResponse>,
}

impl TriggeredResponse {
    pub fn averages(&self) -> impl Iterator<Item = Option<&[Real]>> {
        self.cells.iter().map(|cell| cell.average.as_deref())
    }

    /// The cells at `indices`, in the order given.
    pub fn select_cells(&self, indices: &[usize]) -> DetectionResult<Self> {
        let cells = indices
            .iter()
            .map(|&index| {
                self.cells
                    .get(index)
                    .cloned()
                    .ok_or(DetectionError::IndexOutOfRange {
                        location: InputLocation::CellSelection,
                        index,
                        len: self.cells.len(),
                    })
            })
            .collect::<DetectionResult<_>>()?;
        Ok(Self {
            window: self.window,
            cells,
        })
    }

    /// The trials at `indices` within each cell, with averages recomputed.
    ///
    /// A trial index past the crops a cell retained is skipped for that cell only.
    #[tracing::instrument(skip_all, fields(num_cells = self.cells.len(), num_trials = indices.len()))]
    pub fn select_trials(&self, indices: &[usize]) -> Self {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(cell, response)| {
                let crops = indices
                    .iter()
                    .filter_map(|&trial| {
                        let crop = response.crops.get(trial);
                        if crop.is_none() {
                            tracing::debug!(cell, trial, "Trial not retained for cell");
                        }
                        crop.cloned()
                    })
                    .collect();
                CellResponse::from_crops(crops)
            })
            .collect();
        Self {
            window: self.window,
            cells,
        }
    }
}

/// Crops every trace around each trigger and averages the crops per trace.
///
/// A crop is retained only when `[trigger + lo, trigger + hi)` lies within
/// `[0, trace_length]`, where `trace_length` defaults to the trace's own length.
/// A single trace is passed as a one-element slice.
#[tracing::instrument(skip_all, fields(
    num_traces = traces.len(),
    num_triggers = trigger_indices.len(),
    lo = window.lo(),
    hi = window.hi(),
    num_averaged
))]
pub fn triggered_response<T>(
    traces: &[T],
    trigger_indices: &[SampleIndex],
    window: TriggerWindow,
    trace_length: Option<usize>,
) -> TriggeredResponse
where
    T: AsRef<[Real]> + Sync,
{
    let cells = traces
        .par_iter()
        .map(|trace| {
            let trace = trace.as_ref();
            let length = trace_length.unwrap_or(trace.len());
            CellResponse::from_trace(trace, trigger_indices, window, length)
        })
        .collect::<Vec<_>>();

    tracing::Span::current().record(
        "num_averaged",
        cells.iter().filter(|cell| cell.average.is_some()).count(),
    );
    TriggeredResponse { window, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn ramp(len: usize) -> Vec<Real> {
        (0..len).map(|i| i as Real).collect()
    }

    #[test]
    fn window_must_be_ordered() {
        assert_eq!(
            TriggerWindow::new(5, 5),
            Err(DetectionError::InvalidWindow { lo: 5, hi: 5 })
        );
        assert_eq!(TriggerWindow::new(-5, 5).unwrap().len(), 10);
    }

    #[test]
    fn crop_range_bounds() {
        let window = TriggerWindow::new(-5, 5).unwrap();
        assert_eq!(window.crop_range(5, 100), Some(0..10));
        assert_eq!(window.crop_range(4, 100), None);
        assert_eq!(window.crop_range(95, 100), Some(90..100));
        assert_eq!(window.crop_range(96, 100), None);
    }

    #[test]
    fn trigger_at_trace_end_is_kept() {
        let window = TriggerWindow::new(-5, 5).unwrap();
        let response = triggered_response(&[ramp(100)], &[10, 50, 95], window, Some(100));
        let cell = &response.cells[0];
        assert_eq!(cell.num_trials(), 3);
        assert_eq!(cell.crops[2].values, ramp(100)[90..100].to_vec());

        let average = cell.average.as_ref().unwrap();
        assert_eq!(average.len(), 10);
        assert_approx_eq!(average[0], (5. + 45. + 90.) / 3.);
    }

    #[test]
    fn trigger_past_frame_count_is_dropped() {
        let window = TriggerWindow::new(-5, 5).unwrap();
        let response = triggered_response(&[ramp(100)], &[10, 50, 95], window, Some(99));
        let cell = &response.cells[0];
        assert_eq!(cell.num_trials(), 2);
        assert_approx_eq!(cell.average.as_ref().unwrap()[0], (5. + 45.) / 2.);
    }

    #[test]
    fn validity_is_per_trace() {
        let window = TriggerWindow::new(0, 4).unwrap();
        let traces = [ramp(20), ramp(8), ramp(2)];
        let response = triggered_response(&traces, &[2, 10], window, None);
        let trials: Vec<_> = response.cells.iter().map(CellResponse::num_trials).collect();
        assert_eq!(trials, vec![2, 1, 0]);

        let averages: Vec<_> = response.averages().collect();
        assert_eq!(averages[1], Some([2., 3., 4., 5.].as_slice()));
        assert_eq!(averages[2], None);
    }

    #[test]
    fn select_cells_by_index() {
        let window = TriggerWindow::new(0, 2).unwrap();
        let response = triggered_response(&[ramp(10), vec![1.0; 10]], &[3], window, None);
        let selected = response.select_cells(&[1, 0]).unwrap();
        assert_eq!(selected.cells[0].crops[0].values, vec![1.0, 1.0]);
        assert_eq!(selected.cells[1].crops[0].values, vec![3.0, 4.0]);

        assert_eq!(
            response.select_cells(&[2]),
            Err(DetectionError::IndexOutOfRange {
                location: InputLocation::CellSelection,
                index: 2,
                len: 2
            })
        );
    }

    #[test]
    fn select_trials_recomputes_averages() {
        let window = TriggerWindow::new(0, 2).unwrap();
        let response = triggered_response(&[ramp(30), ramp(12)], &[0, 10, 20], window, None);
        let selected = response.select_trials(&[0, 2]);

        assert_eq!(selected.cells[0].num_trials(), 2);
        assert_eq!(selected.cells[0].average, Some(vec![10., 11.]));
        // The second cell never retained trial 2.
        assert_eq!(selected.cells[1].num_trials(), 1);
        assert_eq!(selected.cells[1].average, Some(vec![0., 1.]));
    }
}
