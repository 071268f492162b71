use std::{fmt::Display, ops::Range};

use clam_common::SampleIndex;
use serde::Serialize;

use crate::error::{DetectionError, DetectionResult, InputLocation, ensure_same_length};

/// A detected event window, half-open: `[start, end)`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Bout {
    pub start: SampleIndex,
    pub end: SampleIndex,
}

impl Bout {
    pub fn new(start: SampleIndex, end: SampleIndex) -> Self {
        Self { start, end }
    }

    /// Number of samples in the bout, zero if the bout is empty or reversed.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<SampleIndex> {
        self.start..self.end
    }
}

impl Display for Bout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0},{1}", self.start, self.end)
    }
}

/// Ordered, non-overlapping bouts detected in one signal.
///
/// A `BoutIndex` is never mutated once built, downstream stages only
/// take filtered copies of it.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BoutIndex {
    bouts: Vec<Bout>,
}

impl BoutIndex {
    /// Pairs up externally supplied start and end indices.
    pub fn new(starts: &[SampleIndex], ends: &[SampleIndex]) -> DetectionResult<Self> {
        ensure_same_length(InputLocation::BoutEnds, starts.len(), ends.len())?;
        Ok(starts
            .iter()
            .zip(ends)
            .map(|(&start, &end)| Bout { start, end })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.bouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bouts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bout> {
        self.bouts.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Bout> {
        self.bouts.get(index)
    }

    pub fn starts(&self) -> Vec<SampleIndex> {
        self.bouts.iter().map(|bout| bout.start).collect()
    }

    pub fn ends(&self) -> Vec<SampleIndex> {
        self.bouts.iter().map(|bout| bout.end).collect()
    }

    /// Returns the sub-selection of bouts satisfying `predicate`.
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&Bout) -> bool,
    {
        self.bouts.iter().copied().filter(|bout| predicate(bout)).collect()
    }

    /// Bouts whose window holds at least one sample.
    pub(crate) fn non_empty(&self) -> impl Iterator<Item = &Bout> {
        self.bouts.iter().filter(|bout| !bout.is_empty())
    }

    /// Every bout must be a valid slice `[start, end)` of a sequence of length `len`.
    pub(crate) fn ensure_sliceable(
        &self,
        len: usize,
        location: InputLocation,
    ) -> DetectionResult<()> {
        self.ensure_within(len, location, |bout| bout.end <= len)
    }

    /// Every bout end must itself index into a sequence of length `len`.
    pub(crate) fn ensure_indexable(
        &self,
        len: usize,
        location: InputLocation,
    ) -> DetectionResult<()> {
        self.ensure_within(len, location, |bout| bout.end < len)
    }

    fn ensure_within<F>(&self, len: usize, location: InputLocation, fits: F) -> DetectionResult<()>
    where
        F: Fn(&Bout) -> bool,
    {
        match self
            .bouts
            .iter()
            .find(|bout| bout.start > bout.end || !fits(bout))
        {
            Some(bout) => Err(DetectionError::BoutOutOfRange {
                location,
                start: bout.start,
                end: bout.end,
                len,
            }),
            None => Ok(()),
        }
    }
}

impl FromIterator<Bout> for BoutIndex {
    fn from_iter<T: IntoIterator<Item = Bout>>(iter: T) -> Self {
        Self {
            bouts: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BoutIndex {
    type Item = &'a Bout;
    type IntoIter = std::slice::Iter<'a, Bout>;

    fn into_iter(self) -> Self::IntoIter {
        self.bouts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_starts_and_ends() {
        let bouts = BoutIndex::new(&[2, 10], &[5, 14]).unwrap();
        assert_eq!(bouts.len(), 2);
        assert_eq!(bouts.starts(), vec![2, 10]);
        assert_eq!(bouts.ends(), vec![5, 14]);
        assert_eq!(bouts.get(1), Some(&Bout::new(10, 14)));
    }

    #[test]
    fn mismatched_lengths() {
        assert_eq!(
            BoutIndex::new(&[2, 10], &[5]),
            Err(DetectionError::LengthMismatch {
                location: InputLocation::BoutEnds,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn filter_keeps_order() {
        let bouts = BoutIndex::new(&[1, 5, 9], &[3, 8, 12]).unwrap();
        let long = bouts.filter(|bout| bout.len() >= 3);
        assert_eq!(long.starts(), vec![5, 9]);
        assert_eq!(bouts.len(), 3);
    }

    #[test]
    fn bounds() {
        let bouts = BoutIndex::new(&[1, 5], &[3, 8]).unwrap();
        assert!(bouts.ensure_sliceable(8, InputLocation::BoutSignal).is_ok());
        assert!(bouts.ensure_indexable(8, InputLocation::BoutTimestamps).is_err());
        assert!(bouts.ensure_indexable(9, InputLocation::BoutTimestamps).is_ok());
    }

    #[test]
    fn empty_and_reversed_bouts_have_no_length() {
        assert!(Bout::new(4, 4).is_empty());
        assert!(Bout::new(6, 4).is_empty());
        assert_eq!(Bout::new(2, 7).len(), 5);
        assert_eq!(Bout::new(2, 7).to_string(), "2,7");
    }
}
