//! The learning model: training a brain to compute a boolean function.
//!
//! Inputs are integers of `domain_size` bits. Every bit owns a pair of
//! stimuli, one firing when the bit is 0 and one when it is 1, so each input
//! activates exactly `domain_size` stimuli. An unsupervised pass drives the
//! architecture's schedule with the active stimuli, building a
//! representation of the input in the intermediate area; a supervised pass
//! then projects the intermediate area into the output area while the
//! desired output bit clamps the winner.

use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::brain::{Brain, BrainMode, ProjectionMap};

use super::architecture::{LearningArchitecture, ProjectionSource};
use super::error::LearningError;
use super::sets::{TestingSet, TrainingSet};

/// Name of the output area owned by a learning model.
pub const OUTPUT_AREA_NAME: &str = "output";

/// Cycle counts of a learning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LearningConfig {
    /// Full architecture cycles per unsupervised pass.
    pub unsupervised_cycles: usize,
    /// Intermediate-to-output rounds per supervised pass.
    pub supervised_cycles: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            unsupervised_cycles: 10,
            supervised_cycles: 10,
        }
    }
}

/// Outcome of testing a model against a testing set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TestResults {
    /// Fraction of matching predictions, rounded to two decimals.
    pub accuracy: f64,
    /// Inputs the model predicted correctly.
    pub true_positive: Vec<u64>,
    /// Inputs the model got wrong.
    pub false_negative: Vec<u64>,
}

/// Binds a brain, a domain size and an architecture into a trainable model.
///
/// The stimulus order is fixed at construction (sorted by name) so the
/// input-to-stimulus conversion stays deterministic for the model's
/// lifetime. The model owns the `"output"` output area, recreating it if an
/// output area of that name already exists.
pub struct LearningModel<'a> {
    brain: &'a mut Brain,
    domain_size: usize,
    architecture: LearningArchitecture,
    stimuli: Vec<String>,
    config: LearningConfig,
}

impl<'a> std::fmt::Debug for LearningModel<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningModel")
            .field("domain_size", &self.domain_size)
            .field("architecture", &self.architecture)
            .field("stimuli", &self.stimuli)
            .field("config", &self.config)
            .finish()
    }
}

impl<'a> LearningModel<'a> {
    /// Build a model over `domain_size` input bits.
    ///
    /// The brain must carry exactly `2 * domain_size` stimuli (one pair per
    /// bit) and every name the architecture references. Panics if
    /// `domain_size` is zero; that is a configuration error, not runtime
    /// input.
    pub fn new(
        brain: &'a mut Brain,
        domain_size: usize,
        architecture: LearningArchitecture,
    ) -> Result<Self, LearningError> {
        assert!(domain_size > 0, "domain size must be at least one bit");
        architecture.validate(brain)?;

        let stimuli = brain.stimulus_names();
        if stimuli.len() != 2 * domain_size {
            return Err(LearningError::StimuliMismatch {
                expected: 2 * domain_size,
                actual: stimuli.len(),
            });
        }

        if brain.output_area(OUTPUT_AREA_NAME).is_some() {
            brain.remove_output_area(OUTPUT_AREA_NAME)?;
        }
        brain.add_output_area(OUTPUT_AREA_NAME)?;

        Ok(Self {
            brain,
            domain_size,
            architecture,
            stimuli,
            config: LearningConfig::default(),
        })
    }

    pub fn with_config(mut self, config: LearningConfig) -> Self {
        self.config = config;
        self
    }

    pub fn domain_size(&self) -> usize {
        self.domain_size
    }

    pub fn brain(&self) -> &Brain {
        &*self.brain
    }

    /// Train the model on every point the training set emits.
    pub fn train(&mut self, training_set: &mut TrainingSet<'_>) -> Result<(), LearningError> {
        self.check_domain("training set", training_set.domain_size())?;

        let mut trained = 0usize;
        while let Some(point) = training_set.next() {
            self.unsupervised_pass(point.input)?;
            self.supervised_pass(point.output)?;
            trained += 1;
        }
        info!(points = trained, "model trained");
        Ok(())
    }

    /// Run the model over the testing side of the domain and measure how
    /// often it reproduces the expected outputs.
    pub fn test(&mut self, testing_set: &mut TestingSet<'_>) -> Result<TestResults, LearningError> {
        self.check_domain("test set", testing_set.domain_size())?;

        let points: Vec<_> = testing_set.collect();
        if points.is_empty() {
            return Err(LearningError::EmptyTestSet);
        }

        let mut true_positive = Vec::new();
        let mut false_negative = Vec::new();
        for point in points {
            if self.run(point.input)? == point.output {
                true_positive.push(point.input);
            } else {
                false_negative.push(point.input);
            }
        }

        let total = (true_positive.len() + false_negative.len()) as f64;
        let accuracy = ((true_positive.len() as f64 / total) * 100.0).round() / 100.0;
        info!(accuracy, "model tested");
        Ok(TestResults {
            accuracy,
            true_positive,
            false_negative,
        })
    }

    /// Compute the model's prediction for one input. Only meaningful after
    /// training; runs in testing mode so no clamping occurs.
    pub fn run(&mut self, input: u64) -> Result<bool, LearningError> {
        self.validate_input(input)?;

        let previous = self.brain.mode();
        self.brain.set_mode(BrainMode::Testing);
        let result = self.readout(input);
        self.brain.set_mode(previous);
        result
    }

    /// The stimuli a given input activates, in the model's fixed stimulus
    /// order. Each input bit (most significant first) picks one stimulus of
    /// its pair: the even one when the bit is 0, the odd one when it is 1.
    pub fn active_stimuli(&self, input: u64) -> Result<Vec<String>, LearningError> {
        if self.stimuli.len() != 2 * self.domain_size {
            return Err(LearningError::StimuliMismatch {
                expected: 2 * self.domain_size,
                actual: self.stimuli.len(),
            });
        }
        self.validate_input(input)?;

        let mut active = Vec::with_capacity(self.domain_size);
        for (index, name) in self.stimuli.iter().enumerate() {
            let bit_position = index / 2;
            let bit = ((input >> (self.domain_size - 1 - bit_position)) & 1) as usize;
            if index % 2 == bit {
                active.push(name.clone());
            }
        }
        Ok(active)
    }

    /// Drive the architecture's schedule with the stimuli `input` activates.
    fn unsupervised_pass(&mut self, input: u64) -> Result<(), LearningError> {
        let active = self.active_stimuli(input)?;
        let empty = ProjectionMap::new();

        for (source, target) in self.architecture.schedule(self.config.unsupervised_cycles) {
            match source {
                ProjectionSource::Stimulus(name) => {
                    // Only active stimuli are allowed to project.
                    if !active.iter().any(|s| s == name) {
                        continue;
                    }
                    let map = pair_map(name, target);
                    self.brain.project(&map, &empty)?;
                }
                ProjectionSource::Area(name) => {
                    let map = pair_map(name, target);
                    self.brain.project(&empty, &map)?;
                }
            }
        }
        Ok(())
    }

    /// Wire the intermediate area to the output area with the desired output
    /// clamping the winner.
    fn supervised_pass(&mut self, output: bool) -> Result<(), LearningError> {
        let previous = self.brain.mode();
        self.brain.set_mode(BrainMode::Training);
        let result = self.supervised_rounds(output);
        self.brain.set_mode(previous);
        result
    }

    fn supervised_rounds(&mut self, output: bool) -> Result<(), LearningError> {
        let out = self
            .brain
            .output_area_mut(OUTPUT_AREA_NAME)
            .ok_or_else(|| LearningError::MissingArea(OUTPUT_AREA_NAME.to_string()))?;
        out.set_desired_output(output);

        let map = pair_map(self.architecture.intermediate_area(), OUTPUT_AREA_NAME);
        let empty = ProjectionMap::new();
        for _ in 0..self.config.supervised_cycles {
            self.brain.project(&empty, &map)?;
        }
        Ok(())
    }

    fn readout(&mut self, input: u64) -> Result<bool, LearningError> {
        self.unsupervised_pass(input)?;

        let map = pair_map(self.architecture.intermediate_area(), OUTPUT_AREA_NAME);
        let empty = ProjectionMap::new();
        self.brain.project(&empty, &map)?;

        let out = self
            .brain
            .output_area(OUTPUT_AREA_NAME)
            .ok_or_else(|| LearningError::MissingArea(OUTPUT_AREA_NAME.to_string()))?;
        Ok(out.winners().first().copied() == Some(1))
    }

    fn check_domain(&self, what: &str, actual: usize) -> Result<(), LearningError> {
        if actual != self.domain_size {
            return Err(LearningError::DomainSizeMismatch {
                expected_object: "learning model".to_string(),
                actual_object: what.to_string(),
                expected: self.domain_size,
                actual,
            });
        }
        Ok(())
    }

    fn validate_input(&self, input: u64) -> Result<(), LearningError> {
        let bits = (u64::BITS - input.leading_zeros()) as usize;
        if bits > self.domain_size {
            return Err(LearningError::DomainSizeMismatch {
                expected_object: "learning model".to_string(),
                actual_object: format!("input {input}"),
                expected: self.domain_size,
                actual: bits,
            });
        }
        Ok(())
    }
}

fn pair_map(source: &str, target: &str) -> ProjectionMap {
    ProjectionMap::from([(source.to_string(), vec![target.to_string()])])
}
