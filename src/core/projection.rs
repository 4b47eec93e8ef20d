//! The projection engine: one round of firing into a single target area.
//!
//! The engine mixes two input populations. Materialized neurons get an exact
//! sum over stored weights from every firing source neuron. The
//! never-materialized remainder of the area is represented only by the top-k
//! order statistics of its binomial input distribution; a synthetic candidate
//! that makes it into the winner set becomes a first winner and is
//! materialized on the spot, growing every connectome touching the area.
//! Plasticity then rewards exactly the synapses from firing neurons into the
//! new winner set.

use crate::area::{Area, NeuronId};
use crate::connectome::{Connectome, ConnectomeStore};
use crate::prng::Prng;
use crate::stats;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Snapshot of one source area's committed firing state, taken before any
/// target in the round starts computing.
#[derive(Debug, Clone)]
pub(crate) struct AreaSource {
    pub name: String,
    pub support: usize,
    pub winners: Vec<NeuronId>,
}

/// Active inputs of one target area, sorted by name so the synapse draw
/// order of a seeded brain is reproducible.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSources {
    pub stimuli: Vec<(String, usize)>,
    pub areas: Vec<AreaSource>,
}

impl ActiveSources {
    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty() && self.areas.is_empty()
    }

    /// Total number of source neurons firing this round.
    pub fn firing_total(&self) -> usize {
        let stim: usize = self.stimuli.iter().map(|(_, k)| k).sum();
        let area: usize = self.areas.iter().map(|s| s.winners.len()).sum();
        stim + area
    }
}

/// One ranked entry of the merged winner selection: either a materialized
/// neuron or a synthetic candidate from the order-statistic model.
struct Pick {
    value: f32,
    explicit: bool,
    index: usize,
}

/// Compute the new firing set of `area` and update the connectomes feeding
/// it. The pending winner state is parked on the area; the caller commits it
/// once every target of the round has been computed. Returns the number of
/// first winners.
pub(crate) fn project_into(
    area: &mut Area,
    sources: &ActiveSources,
    store: &mut ConnectomeStore,
    rng: &mut Prng,
    p: f32,
    forced_winner: Option<NeuronId>,
) -> usize {
    let target = area.name().to_string();
    let support = area.support_size();

    if sources.is_empty() {
        // No input at all: republish the previous round verbatim.
        let winners = area.winners().to_vec();
        area.set_pending(winners, support, 0);
        return 0;
    }

    let m = sources.firing_total();

    // Step 1: exact input to every materialized neuron, while making sure
    // each active pair has an explicit matrix.
    let mut inputs = vec![0.0f32; support];
    for (stimulus, k) in &sources.stimuli {
        let conn = store.ensure_stimulus_pair(stimulus, *k, &target, support, p, rng);
        let rows: Vec<NeuronId> = (0..*k).collect();
        accumulate(conn, &rows, &mut inputs);
    }
    for source in &sources.areas {
        let conn = store.ensure_area_pair(&source.name, source.support, &target, support, p, rng);
        accumulate(conn, &source.winners, &mut inputs);
    }

    // Step 2: synthetic inputs for the best of the unmaterialized neurons.
    let unmaterialized = area.n() - support;
    let candidates = stats::binomial_order_statistics(m, p as f64, unmaterialized, area.k());

    // Step 3: merged top-k selection. Ties prefer materialized neurons, then
    // lower indices, so a fixed input yields a fixed winner set.
    let picks: Vec<Pick> = match forced_winner {
        Some(w) => vec![Pick {
            value: inputs.get(w).copied().unwrap_or(0.0),
            explicit: true,
            index: w,
        }],
        None => {
            let mut all: Vec<Pick> = Vec::with_capacity(support + candidates.len());
            all.extend(inputs.iter().enumerate().map(|(index, &value)| Pick {
                value,
                explicit: true,
                index,
            }));
            all.extend(candidates.iter().enumerate().map(|(rank, &value)| Pick {
                value,
                explicit: false,
                index: rank,
            }));
            all.sort_unstable_by(|a, b| {
                b.value
                    .total_cmp(&a.value)
                    .then_with(|| b.explicit.cmp(&a.explicit))
                    .then_with(|| a.index.cmp(&b.index))
            });
            all.truncate(area.k().min(support + candidates.len()));
            all
        }
    };

    // Candidates that won become first winners, numbered from the end of the
    // current support in selection order.
    let mut new_winners: Vec<NeuronId> = Vec::with_capacity(picks.len());
    let mut first_values: Vec<f32> = Vec::new();
    for pick in &picks {
        if pick.explicit {
            new_winners.push(pick.index);
        } else {
            new_winners.push(support + first_values.len());
            first_values.push(pick.value);
        }
    }
    let num_first = first_values.len();

    // Step 4: materialize the first winners. Every matrix targeting this
    // area gains their columns; the firing rows of each new column are drawn
    // conditioned on the sampled input that made the neuron win, everything
    // else is an independent Bernoulli(p) draw. Outgoing matrices where this
    // area is a source gain matching rows.
    if num_first > 0 {
        store.grow_target_columns(&target, num_first, p, rng);
        for (rank, value) in first_values.iter().enumerate() {
            let col = support + rank;
            let count = (value.round() as usize).min(m);
            let mut fired = vec![false; m];
            for idx in rng.sample_without_replacement(count, m) {
                fired[idx] = true;
            }

            let mut cursor = 0;
            for (stimulus, k) in &sources.stimuli {
                if let Some(conn) = store.stimulus_connectome_mut(stimulus, &target) {
                    for row in 0..*k {
                        *conn.weight_mut(row, col) = if fired[cursor + row] { 1.0 } else { 0.0 };
                    }
                }
                cursor += *k;
            }
            for source in &sources.areas {
                if let Some(conn) = store.area_connectome_mut(&source.name, &target) {
                    for (i, &row) in source.winners.iter().enumerate() {
                        *conn.weight_mut(row, col) = if fired[cursor + i] { 1.0 } else { 0.0 };
                    }
                }
                cursor += source.winners.len();
            }
        }
        store.grow_source_rows(&target, num_first, p, rng);
    }

    // Step 5: plasticity. Only synapses from firing source neurons into the
    // new winner set are touched, each scaled by the per-source rate.
    for (stimulus, k) in &sources.stimuli {
        let rate = area.stimulus_plasticity(stimulus);
        if let Some(conn) = store.stimulus_connectome_mut(stimulus, &target) {
            for &winner in &new_winners {
                for row in 0..*k {
                    *conn.weight_mut(row, winner) *= 1.0 + rate;
                }
            }
        }
    }
    for source in &sources.areas {
        let rate = area.area_plasticity(&source.name);
        if let Some(conn) = store.area_connectome_mut(&source.name, &target) {
            for &winner in &new_winners {
                for &row in &source.winners {
                    *conn.weight_mut(row, winner) *= 1.0 + rate;
                }
            }
        }
    }

    // Step 6: park the pending state for the round commit. Winners stay in
    // descending input order.
    area.set_pending(new_winners, support + num_first, num_first);
    num_first
}

/// Add the weights from the given source rows into the per-column totals.
fn accumulate(conn: &Connectome, rows: &[NeuronId], inputs: &mut [f32]) {
    #[cfg(feature = "parallel")]
    {
        inputs.par_iter_mut().enumerate().for_each(|(col, total)| {
            let mut acc = 0.0f32;
            for &row in rows {
                acc += conn.weight(row, col);
            }
            *total += acc;
        });
    }
    #[cfg(not(feature = "parallel"))]
    {
        // Row-outer iteration keeps the flat storage sequential.
        for &row in rows {
            for (col, total) in inputs.iter_mut().enumerate() {
                *total += conn.weight(row, col);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::OUTPUT_AREA_BETA;
    use crate::brain::{Brain, BrainMode, ProjectionMap};

    fn pair(source: &str, target: &str) -> ProjectionMap {
        ProjectionMap::from([(source.to_string(), vec![target.to_string()])])
    }

    fn none() -> ProjectionMap {
        ProjectionMap::new()
    }

    #[test]
    fn stimulating_a_fresh_area_materializes_exactly_k_winners() {
        let beta = 0.1;
        let mut brain = Brain::with_seed(0.1, 42);
        brain.add_stimulus("s", 300).unwrap();
        brain.add_area("a", 1000, 100, beta).unwrap();

        brain.project(&pair("s", "a"), &none()).unwrap();

        let area = brain.area("a").unwrap();
        assert_eq!(area.support_size(), 100);
        assert_eq!(area.num_first_winners(), 100);
        // Every winner was a first winner, numbered in selection order.
        assert_eq!(area.winners(), (0..100).collect::<Vec<_>>());

        let conn = brain.stimulus_connectome("s", "a").unwrap();
        assert_eq!((conn.rows(), conn.cols()), (300, 100));
        // Each winner's synapses from the firing stimulus were scaled once.
        assert_eq!(conn.max_weight(), (1.0 + beta) * 1.0);
        assert_eq!(conn.min_weight(), 0.0);
    }

    #[test]
    fn self_projection_scales_the_strongest_synapse_by_beta() {
        // Mirrors the reference scenario: stimulate an area, then project it
        // into itself, and watch the self-connectome max go from 1 to 1+beta.
        let beta = 0.01;
        let mut brain = Brain::with_seed(0.01, 7);
        brain.add_stimulus("s", 300).unwrap();
        brain.add_area("a", 1000, 300, beta).unwrap();

        brain.project(&pair("s", "a"), &none()).unwrap();
        assert_eq!(brain.area("a").unwrap().support_size(), 300);
        // The self pair has never been projected, so it is still implicit.
        assert!(brain.area_connectome("a", "a").is_none());

        brain.project(&none(), &pair("a", "a")).unwrap();

        let area = brain.area("a").unwrap();
        assert_eq!(area.winners().len(), 300);
        let support = area.support_size();
        assert!(support >= 300);
        assert!(area.winners().iter().all(|&w| w < support));

        let conn = brain.area_connectome("a", "a").unwrap();
        assert_eq!((conn.rows(), conn.cols()), (support, support));
        assert_eq!(conn.max_weight(), (1.0 + beta) * 1.0);
        assert_eq!(conn.min_weight(), 0.0);

        // The stimulus matrix grew columns for the new winners; those cells
        // are untouched Bernoulli draws because the stimulus was silent.
        let stim = brain.stimulus_connectome("s", "a").unwrap();
        assert_eq!(stim.cols(), support);
        for row in 0..stim.rows() {
            for col in 300..support {
                let w = stim.weight(row, col);
                assert!(w == 0.0 || w == 1.0);
            }
        }
    }

    #[test]
    fn support_is_monotone_and_winners_stay_in_range() {
        let mut brain = Brain::with_seed(0.05, 11);
        brain.add_stimulus("s", 100).unwrap();
        brain.add_area("a", 500, 50, 0.05).unwrap();

        let mut last_support = 0;
        for _ in 0..5 {
            let stim_map = pair("s", "a");
            let area_map = pair("a", "a");
            brain.project(&stim_map, &area_map).unwrap();

            let area = brain.area("a").unwrap();
            let support = area.support_size();
            assert!(support >= last_support);
            assert!(support <= area.n());
            assert_eq!(area.winners().len(), area.k().min(support));
            assert!(area.winners().iter().all(|&w| w < support));

            let mut sorted = area.winners().to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), area.winners().len());

            last_support = support;
        }
    }

    #[test]
    fn fully_materialized_area_stops_growing() {
        let mut brain = Brain::with_seed(0.2, 5);
        brain.add_stimulus("s", 40).unwrap();
        brain.add_area("a", 30, 30, 0.05).unwrap();

        brain.project(&pair("s", "a"), &none()).unwrap();
        assert_eq!(brain.area("a").unwrap().support_size(), 30);

        brain.project(&pair("s", "a"), &none()).unwrap();
        let area = brain.area("a").unwrap();
        assert_eq!(area.support_size(), 30);
        assert_eq!(area.winners().len(), 30);
        assert_eq!(area.num_first_winners(), 0);
    }

    #[test]
    fn projecting_into_an_output_area_picks_one_of_its_two_neurons() {
        let mut brain = Brain::with_seed(0.2, 13);
        brain.add_stimulus("s", 50).unwrap();
        brain.add_area("a", 200, 50, 0.1).unwrap();
        brain.add_output_area("out").unwrap();

        brain.project(&pair("s", "a"), &none()).unwrap();
        brain.project(&none(), &pair("a", "out")).unwrap();

        let out = brain.output_area("out").unwrap();
        assert_eq!(out.winners().len(), 1);
        assert!(out.winners()[0] < 2);
        assert_eq!(out.area().support_size(), 2);
        assert_eq!(out.area().num_first_winners(), 0);

        let conn = brain.area_connectome("a", "out").unwrap();
        assert_eq!((conn.rows(), conn.cols()), (50, 2));
        assert_eq!(conn.max_weight(), 1.0 + OUTPUT_AREA_BETA);
        assert_eq!(conn.min_weight(), 0.0);
    }

    #[test]
    fn training_mode_clamps_the_output_winner() {
        let mut brain = Brain::with_seed(0.5, 17);
        brain.add_stimulus("s", 50).unwrap();
        brain.add_area("a", 200, 50, 0.1).unwrap();
        brain.add_output_area("out").unwrap();

        brain.project(&pair("s", "a"), &none()).unwrap();

        brain.set_mode(BrainMode::Training);
        brain.output_area_mut("out").unwrap().set_desired_output(true);
        for _ in 0..20 {
            brain.project(&none(), &pair("a", "out")).unwrap();
            assert_eq!(brain.output_area("out").unwrap().winners(), &[1]);
        }

        brain.output_area_mut("out").unwrap().set_desired_output(false);
        brain.project(&none(), &pair("a", "out")).unwrap();
        assert_eq!(brain.output_area("out").unwrap().winners(), &[0]);

        // Plasticity kept rewarding neuron 1 while it was clamped, so the
        // unclamped readout now prefers it.
        brain.set_mode(BrainMode::Testing);
        brain.project(&none(), &pair("a", "out")).unwrap();
        assert_eq!(brain.output_area("out").unwrap().winners(), &[1]);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut brain = Brain::with_seed(0.05, 99);
            brain.add_stimulus("s", 100).unwrap();
            brain.add_area("a", 800, 40, 0.05).unwrap();
            brain.add_area("b", 600, 30, 0.05).unwrap();

            brain.project(&pair("s", "a"), &none()).unwrap();
            let both = ProjectionMap::from([(
                "a".to_string(),
                vec!["a".to_string(), "b".to_string()],
            )]);
            brain.project(&pair("s", "a"), &both).unwrap();
            brain.project(&none(), &pair("b", "a")).unwrap();
            brain
        };

        let one = run();
        let two = run();
        for name in ["a", "b"] {
            assert_eq!(
                one.area(name).unwrap().winners(),
                two.area(name).unwrap().winners()
            );
            assert_eq!(
                one.area(name).unwrap().support_size(),
                two.area(name).unwrap().support_size()
            );
        }
        assert_eq!(
            one.area_connectome("a", "b"),
            two.area_connectome("a", "b")
        );
        assert_eq!(
            one.area_connectome("a", "a"),
            two.area_connectome("a", "a")
        );
        assert_eq!(
            one.stimulus_connectome("s", "a"),
            two.stimulus_connectome("s", "a")
        );
    }

    #[test]
    fn self_projection_reads_the_pre_round_winner_set() {
        // With a self-projection in the same round as a stimulus, the area's
        // input must come from the committed (previous) winners only. On the
        // very first round the area has no committed winners, so the self
        // edge contributes nothing and the result equals a stimulus-only
        // round of the same brain.
        let build = || {
            let mut brain = Brain::with_seed(0.05, 21);
            brain.add_stimulus("s", 100).unwrap();
            brain.add_area("a", 500, 40, 0.05).unwrap();
            brain
        };

        let mut with_self = build();
        with_self.project(&pair("s", "a"), &pair("a", "a")).unwrap();

        let mut without_self = build();
        without_self.project(&pair("s", "a"), &none()).unwrap();

        assert_eq!(
            with_self.area("a").unwrap().winners(),
            without_self.area("a").unwrap().winners()
        );
    }

    #[test]
    fn engine_republishes_previous_winners_without_input() {
        let mut area = Area::new("a", 100, 10, 0.05);
        area.set_pending(vec![4, 2, 9], 10, 3);
        area.commit_winners();

        let mut store = ConnectomeStore::new();
        let mut rng = Prng::new(1);
        let sources = ActiveSources {
            stimuli: Vec::new(),
            areas: Vec::new(),
        };
        let first = project_into(&mut area, &sources, &mut store, &mut rng, 0.1, None);
        area.commit_winners();

        assert_eq!(first, 0);
        assert_eq!(area.winners(), &[4, 2, 9]);
        assert_eq!(area.support_size(), 10);
    }
}
