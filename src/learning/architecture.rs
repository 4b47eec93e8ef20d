//! Projection schedules for learning runs.
//!
//! An architecture is an ordered list of projection steps, each repeated a
//! configured number of consecutive times, and the whole list repeated for a
//! number of cycles. One area is designated the intermediate area: it holds
//! the representation of the activated stimuli and is the area wired to the
//! output readout during supervised training.

use crate::brain::Brain;

use super::error::LearningError;

/// The firing side of one projection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionSource {
    Stimulus(String),
    Area(String),
}

/// One projection step, run `consecutive_runs` times before moving on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub source: ProjectionSource,
    pub target: String,
    pub consecutive_runs: usize,
}

/// An ordered projection schedule around one intermediate area.
#[derive(Debug, Clone)]
pub struct LearningArchitecture {
    intermediate_area: String,
    steps: Vec<Step>,
}

impl LearningArchitecture {
    pub fn new(intermediate_area: &str) -> Self {
        Self {
            intermediate_area: intermediate_area.to_string(),
            steps: Vec::new(),
        }
    }

    /// Area holding the stimulus representation; wired to the output area
    /// during supervised training.
    pub fn intermediate_area(&self) -> &str {
        &self.intermediate_area
    }

    /// Append a stimulus-to-area step.
    pub fn add_stimulus_step(&mut self, stimulus: &str, target_area: &str, consecutive_runs: usize) {
        self.steps.push(Step {
            source: ProjectionSource::Stimulus(stimulus.to_string()),
            target: target_area.to_string(),
            consecutive_runs,
        });
    }

    /// Append an area-to-area step.
    pub fn add_area_step(&mut self, source_area: &str, target_area: &str, consecutive_runs: usize) {
        self.steps.push(Step {
            source: ProjectionSource::Area(source_area.to_string()),
            target: target_area.to_string(),
            consecutive_runs,
        });
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Iterate the schedule: every step `consecutive_runs` times in order,
    /// the whole list `cycles` times.
    pub fn schedule(&self, cycles: usize) -> impl Iterator<Item = (&ProjectionSource, &str)> + '_ {
        (0..cycles).flat_map(move |_| {
            self.steps.iter().flat_map(|step| {
                core::iter::repeat((&step.source, step.target.as_str()))
                    .take(step.consecutive_runs)
            })
        })
    }

    /// Check every referenced name against the brain. The intermediate area
    /// and every step endpoint must exist; stimuli may only be sources.
    pub fn validate(&self, brain: &Brain) -> Result<(), LearningError> {
        if brain.area(&self.intermediate_area).is_none() {
            return Err(LearningError::MissingArea(self.intermediate_area.clone()));
        }
        for step in &self.steps {
            match &step.source {
                ProjectionSource::Stimulus(name) => {
                    if brain.stimulus(name).is_none() {
                        return Err(LearningError::MissingStimulus(name.clone()));
                    }
                }
                ProjectionSource::Area(name) => {
                    if brain.area(name).is_none() {
                        return Err(LearningError::MissingArea(name.clone()));
                    }
                }
            }
            if brain.area(&step.target).is_none() {
                return Err(LearningError::MissingArea(step.target.clone()));
            }
        }
        Ok(())
    }
}
