use clam_common::Real;

/// Mean and population variance of a fixed set of samples.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Stats {
    pub mean: Real,
    /// Divides by the number of samples.
    pub variance: Real,
}

impl Stats {
    /// Two passes over `values`: the mean, then the squared deviations from it.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_slice(values: &[Real]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len() as Real;
        let mean = values.iter().sum::<Real>() / count;
        let variance = values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<Real>()
            / count;
        Some(Self { mean, variance })
    }

    pub fn std_dev(&self) -> Real {
        self.variance.sqrt()
    }
}
