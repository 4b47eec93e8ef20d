//! Learning boolean functions on top of the projection engine.
//!
//! The framework mirrors a supervised-learning experiment: a [`data_set`]
//! describes the target function, a [`mask`] splits its domain into train
//! and test sides, [`sets`] sample from those sides, an
//! [`architecture`](crate::learning::architecture) schedules which
//! projections run, and the [`model`] drives the brain through unsupervised
//! and supervised passes and measures accuracy.
//!
//! Everything here talks to the core exclusively through the public brain
//! contract: `project`, winner/support accessors, `desired_output` and the
//! brain mode.

pub mod architecture;
pub mod data_set;
pub mod error;
pub mod mask;
pub mod model;
pub mod sets;
