//! Masked views over a data set: the training sampler and the testing
//! filter.

use crate::prng::Prng;

use super::data_set::{DataPoint, DataSet};
use super::error::DataSetError;
use super::mask::Mask;

/// The portion of a data set used for training.
///
/// Emits a configured number of data points drawn uniformly at random (with
/// repetition) from the training side of the mask. Each emitted output may be
/// flipped with `noise_probability`, simulating label noise; the testing side
/// never sees noise.
pub struct TrainingSet<'a> {
    base: &'a dyn DataSet,
    mask: &'a dyn Mask,
    remaining: usize,
    noise_probability: f32,
    rng: Prng,
}

impl<'a> std::fmt::Debug for TrainingSet<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingSet")
            .field("remaining", &self.remaining)
            .field("noise_probability", &self.noise_probability)
            .field("rng", &self.rng)
            .finish()
    }
}

impl<'a> TrainingSet<'a> {
    /// Build a training sampler of `length` points. Fails if the mask puts
    /// nothing on the training side, which would make sampling loop forever.
    pub fn new(
        base: &'a dyn DataSet,
        mask: &'a dyn Mask,
        length: usize,
        noise_probability: f32,
        seed: u64,
    ) -> Result<Self, DataSetError> {
        let domain_points = 1u64 << base.domain_size();
        if !(0..domain_points).any(|i| mask.in_training_set(i)) {
            return Err(DataSetError::EmptyTrainingSet { domain_points });
        }
        Ok(Self {
            base,
            mask,
            remaining: length,
            noise_probability,
            rng: Prng::new(seed),
        })
    }

    pub fn domain_size(&self) -> usize {
        self.base.domain_size()
    }
}

impl Iterator for TrainingSet<'_> {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let domain_points = 1u64 << self.base.domain_size();
        let input = loop {
            let candidate = self.rng.gen_range_u64(0, domain_points);
            if self.mask.in_training_set(candidate) {
                break candidate;
            }
        };

        let mut output = self.base.value_at(input);
        if self.noise_probability > 0.0 && self.rng.bernoulli(self.noise_probability) {
            output = !output;
        }
        Some(DataPoint { input, output })
    }
}

/// The portion of a data set used for accuracy measurement.
///
/// Iterates the base set in input order, yielding exactly the points on the
/// testing side of the mask, without noise.
pub struct TestingSet<'a> {
    base: &'a dyn DataSet,
    mask: &'a dyn Mask,
    next: u64,
}

impl<'a> TestingSet<'a> {
    pub fn new(base: &'a dyn DataSet, mask: &'a dyn Mask) -> Self {
        Self {
            base,
            mask,
            next: 0,
        }
    }

    pub fn domain_size(&self) -> usize {
        self.base.domain_size()
    }
}

impl Iterator for TestingSet<'_> {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        let domain_points = 1u64 << self.base.domain_size();
        while self.next < domain_points {
            let input = self.next;
            self.next += 1;
            if self.mask.in_testing_set(input) {
                return Some(DataPoint {
                    input,
                    output: self.base.value_at(input),
                });
            }
        }
        None
    }
}
