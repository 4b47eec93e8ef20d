//! # cerebro
//!
//! A sparse assembly-calculus brain simulator: named areas of
//! binary-threshold neurons wired by a random graph, evolving through
//! winner-take-all projection rounds with Hebbian plasticity.
//!
//! Memory stays proportional to the neurons that have *ever fired*. The
//! projection engine keeps an explicit, growing connectome for materialized
//! neurons and models the rest of each area statistically, sampling only the
//! top order statistics of their binomial input distribution.
//!
//! ## Quick Start
//!
//! ```
//! use cerebro::prelude::*;
//!
//! let mut brain = Brain::with_seed(0.05, 42);
//! brain.add_stimulus("stim", 100).unwrap();
//! brain.add_area("a", 10_000, 100, 0.05).unwrap();
//!
//! // One round: the stimulus fires into the area.
//! let stim_map = ProjectionMap::from([("stim".to_string(), vec!["a".to_string()])]);
//! brain.project(&stim_map, &ProjectionMap::new()).unwrap();
//!
//! // The area materialized exactly its firing quota.
//! let area = brain.area("a").unwrap();
//! assert_eq!(area.winners().len(), 100);
//! assert_eq!(area.support_size(), 100);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization for config/result types
//! - `parallel`: parallel input accumulation via rayon
//!
//! ## Modules
//!
//! - [`brain`]: areas, stimuli and the `project` entry point
//! - [`connectome`]: growable synaptic weight matrices
//! - [`stats`]: the order-statistic approximation for unmaterialized neurons
//! - [`learning`]: boolean-function training on top of the engine

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/stats.rs"]
pub mod stats;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/area.rs"]
pub mod area;

#[path = "core/connectome.rs"]
pub mod connectome;

#[path = "core/projection.rs"]
mod projection;

#[path = "core/brain.rs"]
pub mod brain;

pub mod learning;

/// Prelude module for convenient imports.
///
/// ```
/// use cerebro::prelude::*;
/// ```
pub mod prelude {
    pub use crate::area::{Area, NeuronId, OutputArea, Stimulus};
    pub use crate::brain::{Brain, BrainMode, Diagnostics, ProjectionMap};
    pub use crate::connectome::{Connectome, Weight};
    pub use crate::error::BrainError;
    pub use crate::learning::architecture::{LearningArchitecture, ProjectionSource};
    pub use crate::learning::data_set::{
        CallableDataSet, DataPoint, DataSet, ValuesListDataSet,
    };
    pub use crate::learning::error::{DataSetError, LearningError};
    pub use crate::learning::mask::{ExplicitMask, Mask};
    pub use crate::learning::model::{LearningConfig, LearningModel, TestResults};
    pub use crate::learning::sets::{TestingSet, TrainingSet};
}
