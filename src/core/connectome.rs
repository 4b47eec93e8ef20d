//! Growable synaptic weight matrices.
//!
//! A connectome exists for each ordered (source, target) pair that has ever
//! taken part in a projection. It covers exactly the materialized neurons of
//! both endpoints and only ever grows: a column per neuron the target
//! materializes, a row per neuron the source materializes (stimulus rows are
//! fixed at the stimulus size). Cells that were never stored are implicit
//! synapses existing with the brain-wide probability `p`; a cell's first
//! stored value is its `Bernoulli(p)` draw.

use hashbrown::HashMap;

use crate::area::NeuronId;
use crate::prng::Prng;

/// Type alias for synaptic weights (non-negative, `1.0` for a fresh synapse).
pub type Weight = f32;

/// Initial value of a cell the moment it becomes explicit.
#[inline]
pub(crate) fn synapse_draw(rng: &mut Prng, p: f32) -> Weight {
    if rng.bernoulli(p) {
        1.0
    } else {
        0.0
    }
}

/// Dense row-major weight matrix between one source and one target.
///
/// Flat storage keeps the per-column accumulation of the projection engine
/// cache-friendly; rows are source neurons, columns are target neurons.
#[derive(Debug, Clone, PartialEq)]
pub struct Connectome {
    rows: usize,
    cols: usize,
    weights: Vec<Weight>,
}

impl Connectome {
    pub(crate) fn new(rows: usize, cols: usize, fill: &mut impl FnMut() -> Weight) -> Self {
        let weights = (0..rows * cols).map(|_| fill()).collect();
        Self {
            rows,
            cols,
            weights,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn weight(&self, row: NeuronId, col: NeuronId) -> Weight {
        self.weights[row * self.cols + col]
    }

    #[inline]
    pub(crate) fn weight_mut(&mut self, row: NeuronId, col: NeuronId) -> &mut Weight {
        &mut self.weights[row * self.cols + col]
    }

    /// Largest stored weight, `0.0` for an empty matrix.
    pub fn max_weight(&self) -> Weight {
        self.weights.iter().copied().fold(0.0, f32::max)
    }

    /// Smallest stored weight, `0.0` for an empty matrix.
    pub fn min_weight(&self) -> Weight {
        if self.weights.is_empty() {
            return 0.0;
        }
        self.weights.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Grow the matrix, preserving existing cells and drawing fresh ones from
    /// `fill`. Fresh cells are visited in a fixed order (new columns of
    /// existing rows first, row-major, then whole new rows) so a seeded run
    /// is reproducible.
    pub(crate) fn grow(
        &mut self,
        added_rows: usize,
        added_cols: usize,
        fill: &mut impl FnMut() -> Weight,
    ) {
        if added_cols > 0 {
            let new_cols = self.cols + added_cols;
            let mut next = Vec::with_capacity((self.rows + added_rows) * new_cols);
            for row in 0..self.rows {
                let start = row * self.cols;
                next.extend_from_slice(&self.weights[start..start + self.cols]);
                for _ in 0..added_cols {
                    next.push(fill());
                }
            }
            self.weights = next;
            self.cols = new_cols;
        }
        if added_rows > 0 {
            self.weights.reserve(added_rows * self.cols);
            for _ in 0..added_rows * self.cols {
                self.weights.push(fill());
            }
            self.rows += added_rows;
        }
    }
}

/// All weight matrices of a brain, keyed by the (source, target) pair.
///
/// Stimulus sources and area sources live in separate maps because the same
/// name may legally denote both a stimulus and an area.
#[derive(Debug, Clone, Default)]
pub struct ConnectomeStore {
    by_stimulus: HashMap<String, HashMap<String, Connectome>>,
    by_area: HashMap<String, HashMap<String, Connectome>>,
}

impl ConnectomeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Weight matrix from a stimulus into an area, if that pair has ever
    /// been projected.
    pub fn stimulus_connectome(&self, stimulus: &str, target: &str) -> Option<&Connectome> {
        self.by_stimulus.get(stimulus).and_then(|m| m.get(target))
    }

    /// Weight matrix from one area into another, if that pair has ever been
    /// projected.
    pub fn area_connectome(&self, source: &str, target: &str) -> Option<&Connectome> {
        self.by_area.get(source).and_then(|m| m.get(target))
    }

    pub(crate) fn stimulus_connectome_mut(
        &mut self,
        stimulus: &str,
        target: &str,
    ) -> Option<&mut Connectome> {
        self.by_stimulus
            .get_mut(stimulus)
            .and_then(|m| m.get_mut(target))
    }

    pub(crate) fn area_connectome_mut(
        &mut self,
        source: &str,
        target: &str,
    ) -> Option<&mut Connectome> {
        self.by_area.get_mut(source).and_then(|m| m.get_mut(target))
    }

    /// Materialize the (stimulus, target) matrix if this is the first
    /// projection along that pair, and return it.
    pub(crate) fn ensure_stimulus_pair(
        &mut self,
        stimulus: &str,
        stimulus_k: usize,
        target: &str,
        target_support: usize,
        p: f32,
        rng: &mut Prng,
    ) -> &mut Connectome {
        self.by_stimulus
            .entry(stimulus.to_string())
            .or_default()
            .entry(target.to_string())
            .or_insert_with(|| {
                Connectome::new(stimulus_k, target_support, &mut || synapse_draw(rng, p))
            })
    }

    /// Materialize the (source area, target) matrix if this is the first
    /// projection along that pair, and return it.
    pub(crate) fn ensure_area_pair(
        &mut self,
        source: &str,
        source_support: usize,
        target: &str,
        target_support: usize,
        p: f32,
        rng: &mut Prng,
    ) -> &mut Connectome {
        self.by_area
            .entry(source.to_string())
            .or_default()
            .entry(target.to_string())
            .or_insert_with(|| {
                Connectome::new(source_support, target_support, &mut || synapse_draw(rng, p))
            })
    }

    /// Add `added` columns to every matrix targeting `target`, stimulus
    /// matrices first. Matrices are visited in name order so the draw
    /// sequence is reproducible.
    pub(crate) fn grow_target_columns(
        &mut self,
        target: &str,
        added: usize,
        p: f32,
        rng: &mut Prng,
    ) {
        let mut stimuli: Vec<String> = self
            .by_stimulus
            .iter()
            .filter(|(_, targets)| targets.contains_key(target))
            .map(|(name, _)| name.clone())
            .collect();
        stimuli.sort_unstable();
        for name in stimuli {
            if let Some(conn) = self.stimulus_connectome_mut(&name, target) {
                conn.grow(0, added, &mut || synapse_draw(rng, p));
            }
        }

        let mut sources: Vec<String> = self
            .by_area
            .iter()
            .filter(|(_, targets)| targets.contains_key(target))
            .map(|(name, _)| name.clone())
            .collect();
        sources.sort_unstable();
        for name in sources {
            if let Some(conn) = self.area_connectome_mut(&name, target) {
                conn.grow(0, added, &mut || synapse_draw(rng, p));
            }
        }
    }

    /// Add `added` rows to every matrix where `source` is the source area,
    /// in target-name order.
    pub(crate) fn grow_source_rows(&mut self, source: &str, added: usize, p: f32, rng: &mut Prng) {
        let Some(targets) = self.by_area.get_mut(source) else {
            return;
        };
        let mut names: Vec<String> = targets.keys().cloned().collect();
        names.sort_unstable();
        for name in names {
            if let Some(conn) = targets.get_mut(&name) {
                conn.grow(added, 0, &mut || synapse_draw(rng, p));
            }
        }
    }

    /// Discard every matrix targeting `target`. Used when an output area is
    /// removed.
    pub(crate) fn remove_target(&mut self, target: &str) {
        for targets in self.by_stimulus.values_mut() {
            targets.remove(target);
        }
        for targets in self.by_area.values_mut() {
            targets.remove(target);
        }
    }

    /// Number of materialized pair matrices.
    pub fn pair_count(&self) -> usize {
        self.by_stimulus.values().map(|m| m.len()).sum::<usize>()
            + self.by_area.values().map(|m| m.len()).sum::<usize>()
    }

    /// Total number of explicitly stored weights.
    pub fn stored_weight_count(&self) -> usize {
        let stim: usize = self
            .by_stimulus
            .values()
            .flat_map(|m| m.values())
            .map(|c| c.rows * c.cols)
            .sum();
        let area: usize = self
            .by_area
            .values()
            .flat_map(|m| m.values())
            .map(|c| c.rows * c.cols)
            .sum();
        stim + area
    }
}
