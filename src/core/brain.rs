//! The brain aggregate: areas, stimuli, connectomes, and the `project`
//! entry point.
//!
//! `project` is the only mutating operation. One call is one round: every
//! targeted area computes its new firing set against the committed state of
//! the previous round, and all the new sets are committed together at the
//! end. An area projecting into itself therefore reads its own pre-round
//! winners, never the set being built.

use hashbrown::HashMap;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::area::{Area, NeuronId, OutputArea, Stimulus, OUTPUT_AREA_BETA};
use crate::connectome::{Connectome, ConnectomeStore};
use crate::error::{BrainError, Result};
use crate::prng::Prng;
use crate::projection::{self, ActiveSources, AreaSource};

/// Maps a source name to the list of area names it projects into.
pub type ProjectionMap = HashMap<String, Vec<String>>;

const DEFAULT_SEED: u64 = 1;

/// Governs supervised clamping of output areas.
///
/// In `Training` mode the winner of an output area is forced to its
/// `desired_output`; in `Testing` and `Default` modes the computed winner
/// stands. Held on the owned brain, not as ambient global state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BrainMode {
    #[default]
    Default,
    Training,
    Testing,
}

/// Cheap counters describing the current brain, for logging and assertions.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    pub area_count: usize,
    pub output_area_count: usize,
    pub stimulus_count: usize,
    pub connectome_pairs: usize,
    pub stored_weights: usize,
    pub total_support: usize,
    pub rounds: u64,
}

/// A simulated brain: named areas and stimuli wired by a sparse random graph
/// of density `p`, maintained lazily as the materialized connectomes grow.
pub struct Brain {
    areas: HashMap<String, Area>,
    output_areas: HashMap<String, OutputArea>,
    stimuli: HashMap<String, Stimulus>,
    connectomes: ConnectomeStore,
    p: f32,
    mode: BrainMode,
    rng: Prng,
    rounds: u64,
}

impl Brain {
    /// Create a brain with synapse probability `p` and the default seed.
    ///
    /// Panics if `p` is outside `(0, 1]`; the graph density is a programmer
    /// configuration, not runtime input.
    pub fn new(p: f32) -> Self {
        Self::with_seed(p, DEFAULT_SEED)
    }

    /// Create a brain with an explicit seed. Two brains with the same seed
    /// and the same call sequence evolve identically.
    pub fn with_seed(p: f32, seed: u64) -> Self {
        assert!(
            p > 0.0 && p <= 1.0,
            "synapse probability must be in (0, 1]"
        );
        Self {
            areas: HashMap::new(),
            output_areas: HashMap::new(),
            stimuli: HashMap::new(),
            connectomes: ConnectomeStore::new(),
            p,
            mode: BrainMode::Default,
            rng: Prng::new(seed),
            rounds: 0,
        }
    }

    /// Register a stimulus of `k` neurons firing together.
    pub fn add_stimulus(&mut self, name: &str, k: usize) -> Result<()> {
        if self.stimuli.contains_key(name) {
            return Err(BrainError::DuplicateStimulus(name.to_string()));
        }
        if k == 0 {
            return Err(BrainError::InvalidParameter(format!(
                "stimulus `{name}` must fire at least one neuron"
            )));
        }
        self.stimuli.insert(name.to_string(), Stimulus::new(k));
        Ok(())
    }

    /// Register an area of `n` neurons firing `k` winners per round with
    /// default plasticity `beta`.
    pub fn add_area(&mut self, name: &str, n: usize, k: usize, beta: f32) -> Result<()> {
        if self.has_area(name) {
            return Err(BrainError::DuplicateArea(name.to_string()));
        }
        if n == 0 || k == 0 || k > n {
            return Err(BrainError::InvalidParameter(format!(
                "area `{name}` requires 1 <= k <= n, got n={n}, k={k}"
            )));
        }
        if beta < 0.0 {
            return Err(BrainError::InvalidParameter(format!(
                "area `{name}` requires beta >= 0, got {beta}"
            )));
        }
        self.areas.insert(name.to_string(), Area::new(name, n, k, beta));
        Ok(())
    }

    /// Register a two-neuron output area. Fails if any area of this name
    /// already exists.
    pub fn add_output_area(&mut self, name: &str) -> Result<()> {
        if self.has_area(name) {
            return Err(BrainError::DuplicateArea(name.to_string()));
        }
        let mut out = OutputArea::new(name);
        // Known sources start at the output default rate rather than lazily
        // inheriting whatever `beta` a later projection would pick.
        for stimulus in self.stimuli.keys() {
            out.area
                .stimulus_beta
                .insert(stimulus.clone(), OUTPUT_AREA_BETA);
        }
        for area in self.areas.keys() {
            out.area.area_beta.insert(area.clone(), OUTPUT_AREA_BETA);
        }
        self.output_areas.insert(name.to_string(), out);
        Ok(())
    }

    /// Remove an output area and every connectome targeting it.
    pub fn remove_output_area(&mut self, name: &str) -> Result<()> {
        if self.output_areas.remove(name).is_none() {
            return Err(BrainError::MissingOutputArea(name.to_string()));
        }
        self.connectomes.remove_target(name);
        Ok(())
    }

    pub fn area(&self, name: &str) -> Option<&Area> {
        self.areas.get(name)
    }

    pub fn output_area(&self, name: &str) -> Option<&OutputArea> {
        self.output_areas.get(name)
    }

    /// Mutable handle, used by training drivers to set `desired_output`.
    pub fn output_area_mut(&mut self, name: &str) -> Option<&mut OutputArea> {
        self.output_areas.get_mut(name)
    }

    pub fn stimulus(&self, name: &str) -> Option<&Stimulus> {
        self.stimuli.get(name)
    }

    /// Registered stimulus names in sorted order.
    pub fn stimulus_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stimuli.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Registered area names (regular areas only) in sorted order.
    pub fn area_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.areas.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn stimulus_connectome(&self, stimulus: &str, target: &str) -> Option<&Connectome> {
        self.connectomes.stimulus_connectome(stimulus, target)
    }

    pub fn area_connectome(&self, source: &str, target: &str) -> Option<&Connectome> {
        self.connectomes.area_connectome(source, target)
    }

    pub fn mode(&self) -> BrainMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BrainMode) {
        self.mode = mode;
    }

    /// Sparse-graph synapse probability.
    pub fn p(&self) -> f32 {
        self.p
    }

    /// Number of completed projection rounds.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            area_count: self.areas.len(),
            output_area_count: self.output_areas.len(),
            stimulus_count: self.stimuli.len(),
            connectome_pairs: self.connectomes.pair_count(),
            stored_weights: self.connectomes.stored_weight_count(),
            total_support: self
                .areas
                .values()
                .map(|a| a.support_size())
                .chain(self.output_areas.values().map(|o| o.area().support_size()))
                .sum(),
            rounds: self.rounds,
        }
    }

    /// Run one projection round.
    ///
    /// `stim_to_area` and `area_to_area` map each firing source to the areas
    /// it projects into. Every referenced name is validated before any state
    /// changes; a single unresolved name fails the whole call with no
    /// partial application. Targets are processed in sorted name order and
    /// committed together once all of them have computed.
    pub fn project(
        &mut self,
        stim_to_area: &ProjectionMap,
        area_to_area: &ProjectionMap,
    ) -> Result<()> {
        // Fail-fast validation, building the inverse (per-target) maps.
        let mut stim_in: HashMap<String, Vec<String>> = HashMap::new();
        let mut area_in: HashMap<String, Vec<String>> = HashMap::new();

        for (stimulus, targets) in stim_to_area {
            if !self.stimuli.contains_key(stimulus) {
                return Err(BrainError::UnknownStimulus(stimulus.clone()));
            }
            for target in targets {
                if !self.has_area(target) {
                    return Err(BrainError::UnknownArea(target.clone()));
                }
                stim_in.entry(target.clone()).or_default().push(stimulus.clone());
            }
        }
        // Output areas are readouts: they may be targets but never sources.
        for (source, targets) in area_to_area {
            if !self.areas.contains_key(source) {
                return Err(BrainError::UnknownArea(source.clone()));
            }
            for target in targets {
                if !self.has_area(target) {
                    return Err(BrainError::UnknownArea(target.clone()));
                }
                area_in.entry(target.clone()).or_default().push(source.clone());
            }
        }

        let mut targets: Vec<String> = stim_in.keys().chain(area_in.keys()).cloned().collect();
        targets.sort_unstable();
        targets.dedup();

        self.rounds += 1;
        debug!(round = self.rounds, targets = targets.len(), "projection round");

        // Compute phase: every target reads only pre-round committed state
        // and parks its result in its pending fields.
        for name in &targets {
            let mut stim_names = stim_in.get(name).cloned().unwrap_or_default();
            stim_names.sort_unstable();
            let stimuli: Vec<(String, usize)> = stim_names
                .iter()
                .map(|s| (s.clone(), self.stimuli[s.as_str()].k()))
                .collect();

            let mut source_names = area_in.get(name).cloned().unwrap_or_default();
            source_names.sort_unstable();
            let areas: Vec<AreaSource> = source_names
                .iter()
                .map(|s| {
                    let source = &self.areas[s.as_str()];
                    AreaSource {
                        name: s.clone(),
                        support: source.support_size(),
                        winners: source.winners().to_vec(),
                    }
                })
                .collect();

            let sources = ActiveSources { stimuli, areas };

            let forced: Option<NeuronId> = if self.mode == BrainMode::Training {
                self.output_areas
                    .get(name.as_str())
                    .map(|o| o.desired_output() as NeuronId)
            } else {
                None
            };

            let is_regular = self.areas.contains_key(name.as_str());
            let area_slot = if is_regular {
                self.areas.get_mut(name.as_str())
            } else {
                self.output_areas.get_mut(name.as_str()).map(|o| &mut o.area)
            };
            let Some(area) = area_slot else { continue };

            // First contact with a source fixes its plasticity rate to the
            // target's default until overridden.
            let beta = area.beta();
            for (stimulus, _) in &sources.stimuli {
                area.stimulus_beta.entry(stimulus.clone()).or_insert(beta);
            }
            for source in &sources.areas {
                area.area_beta.entry(source.name.clone()).or_insert(beta);
            }

            let first = projection::project_into(
                area,
                &sources,
                &mut self.connectomes,
                &mut self.rng,
                self.p,
                forced,
            );
            trace!(area = %name, first_winners = first, "target computed");
        }

        // Commit phase: publish every pending winner set together.
        for name in &targets {
            if let Some(area) = self.areas.get_mut(name.as_str()) {
                area.commit_winners();
            } else if let Some(out) = self.output_areas.get_mut(name.as_str()) {
                out.area.commit_winners();
            }
        }
        Ok(())
    }

    fn has_area(&self, name: &str) -> bool {
        self.areas.contains_key(name) || self.output_areas.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(source: &str, target: &str) -> ProjectionMap {
        ProjectionMap::from([(source.to_string(), vec![target.to_string()])])
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let mut brain = Brain::new(0.1);
        brain.add_area("a", 100, 10, 0.05).unwrap();
        brain.add_stimulus("s", 10).unwrap();

        assert_eq!(
            brain.add_area("a", 50, 5, 0.05),
            Err(BrainError::DuplicateArea("a".to_string()))
        );
        assert_eq!(
            brain.add_output_area("a"),
            Err(BrainError::DuplicateArea("a".to_string()))
        );
        assert_eq!(
            brain.add_stimulus("s", 3),
            Err(BrainError::DuplicateStimulus("s".to_string()))
        );

        brain.add_output_area("out").unwrap();
        assert_eq!(
            brain.add_area("out", 100, 10, 0.05),
            Err(BrainError::DuplicateArea("out".to_string()))
        );
    }

    #[test]
    fn area_parameters_are_validated() {
        let mut brain = Brain::new(0.1);
        assert!(matches!(
            brain.add_area("a", 10, 11, 0.05),
            Err(BrainError::InvalidParameter(_))
        ));
        assert!(matches!(
            brain.add_area("a", 0, 0, 0.05),
            Err(BrainError::InvalidParameter(_))
        ));
        assert!(matches!(
            brain.add_area("a", 10, 5, -0.5),
            Err(BrainError::InvalidParameter(_))
        ));
        assert!(matches!(
            brain.add_stimulus("s", 0),
            Err(BrainError::InvalidParameter(_))
        ));
    }

    #[test]
    fn removing_a_missing_output_area_fails() {
        let mut brain = Brain::new(0.1);
        assert_eq!(
            brain.remove_output_area("out"),
            Err(BrainError::MissingOutputArea("out".to_string()))
        );
    }

    #[test]
    fn removing_an_output_area_purges_its_connectomes() {
        let mut brain = Brain::with_seed(0.1, 9);
        brain.add_stimulus("s", 50).unwrap();
        brain.add_area("a", 200, 20, 0.05).unwrap();
        brain.add_output_area("out").unwrap();

        brain.project(&pair("s", "a"), &ProjectionMap::new()).unwrap();
        brain.project(&ProjectionMap::new(), &pair("a", "out")).unwrap();
        assert!(brain.area_connectome("a", "out").is_some());

        brain.remove_output_area("out").unwrap();
        assert!(brain.output_area("out").is_none());
        assert!(brain.area_connectome("a", "out").is_none());
        // The surviving stimulus connectome is untouched.
        assert!(brain.stimulus_connectome("s", "a").is_some());

        // The name is free again.
        brain.add_output_area("out").unwrap();
    }

    #[test]
    fn project_with_unknown_stimulus_leaves_state_unchanged() {
        let mut brain = Brain::with_seed(0.1, 9);
        brain.add_area("a", 100, 10, 0.05).unwrap();

        let err = brain
            .project(&pair("ghost", "a"), &ProjectionMap::new())
            .unwrap_err();
        assert_eq!(err, BrainError::UnknownStimulus("ghost".to_string()));
        assert!(brain.area("a").unwrap().winners().is_empty());
        assert_eq!(brain.area("a").unwrap().support_size(), 0);
        assert_eq!(brain.diagnostics().connectome_pairs, 0);
        assert_eq!(brain.rounds(), 0);
    }

    #[test]
    fn project_with_unknown_target_fails_before_any_mutation() {
        let mut brain = Brain::with_seed(0.1, 9);
        brain.add_stimulus("s", 20).unwrap();
        brain.add_area("a", 100, 10, 0.05).unwrap();

        // One valid entry plus one invalid entry: nothing may be applied.
        let stim_map = ProjectionMap::from([(
            "s".to_string(),
            vec!["a".to_string(), "ghost".to_string()],
        )]);
        let err = brain.project(&stim_map, &ProjectionMap::new()).unwrap_err();
        assert_eq!(err, BrainError::UnknownArea("ghost".to_string()));
        assert!(brain.area("a").unwrap().winners().is_empty());
        assert_eq!(brain.diagnostics().connectome_pairs, 0);
    }

    #[test]
    fn output_areas_cannot_be_projection_sources() {
        let mut brain = Brain::with_seed(0.1, 9);
        brain.add_area("a", 100, 10, 0.05).unwrap();
        brain.add_output_area("out").unwrap();

        let err = brain
            .project(&ProjectionMap::new(), &pair("out", "a"))
            .unwrap_err();
        assert_eq!(err, BrainError::UnknownArea("out".to_string()));
    }

    #[test]
    fn empty_projection_is_a_no_op() {
        let mut brain = Brain::with_seed(0.1, 9);
        brain.add_area("a", 100, 10, 0.05).unwrap();
        brain.project(&ProjectionMap::new(), &ProjectionMap::new()).unwrap();
        assert!(brain.area("a").unwrap().winners().is_empty());
        assert_eq!(brain.rounds(), 1);
    }

    #[test]
    fn diagnostics_count_the_brain() {
        let mut brain = Brain::with_seed(0.1, 9);
        brain.add_stimulus("s", 30).unwrap();
        brain.add_area("a", 100, 10, 0.05).unwrap();
        brain.add_output_area("out").unwrap();

        brain.project(&pair("s", "a"), &ProjectionMap::new()).unwrap();

        let diag = brain.diagnostics();
        assert_eq!(diag.area_count, 1);
        assert_eq!(diag.output_area_count, 1);
        assert_eq!(diag.stimulus_count, 1);
        assert_eq!(diag.connectome_pairs, 1);
        // Output support (2) plus the winners the projection materialized.
        assert_eq!(diag.total_support, 2 + 10);
        assert_eq!(diag.rounds, 1);
    }

    #[test]
    fn winner_accessors_are_idempotent() {
        let mut brain = Brain::with_seed(0.1, 9);
        brain.add_stimulus("s", 30).unwrap();
        brain.add_area("a", 100, 10, 0.05).unwrap();
        brain.project(&pair("s", "a"), &ProjectionMap::new()).unwrap();

        let first = brain.area("a").unwrap().winners().to_vec();
        let second = brain.area("a").unwrap().winners().to_vec();
        assert_eq!(first, second);
        assert_eq!(brain.area("a").unwrap().support_size(), 10);
    }
}
