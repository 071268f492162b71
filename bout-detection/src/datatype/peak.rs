use std::fmt::Display;

use clam_common::Real;
use serde::Serialize;

/// A local extremum: where it was found and its value.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Peak {
    pub position: Real,
    pub value: Real,
}

impl Peak {
    pub fn new(position: Real, value: Real) -> Self {
        Self { position, value }
    }
}

impl Display for Peak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0},{1}", self.position, self.value)
    }
}

pub type PeakSet = Vec<Peak>;

/// Emitted by the peak detector each time it commits an extremum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Extremum {
    Maximum(Peak),
    Minimum(Peak),
}
