//! Demo runner: train the assembly engine on small boolean functions.
//!
//! The default demo learns two-bit parity; `identity-demo` learns the
//! one-bit identity function. Both print a JSON summary of the run.

use cerebro::prelude::*;
use tracing::info;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return;
    }
    if args.len() >= 2 && args[1] == "identity-demo" {
        run(Demo::identity());
        return;
    }
    if args.len() >= 2 && args[1] == "parity-demo" {
        run(Demo::parity());
        return;
    }
    if args.len() >= 2 {
        eprintln!("Unknown command: {}", args[1]);
        print_help();
        std::process::exit(2);
    }

    run(Demo::parity());
}

struct Demo {
    name: &'static str,
    domain_size: usize,
    function: fn(u64) -> bool,
    // Which inputs the model trains on; the rest measure generalization.
    train_mask: Vec<bool>,
    training_points: usize,
}

impl Demo {
    fn parity() -> Self {
        Self {
            name: "parity",
            domain_size: 2,
            function: |x| x.count_ones() % 2 == 1,
            train_mask: vec![true, true, true, false],
            training_points: 30,
        }
    }

    fn identity() -> Self {
        Self {
            name: "identity",
            domain_size: 1,
            function: |x| x == 1,
            train_mask: vec![true, false],
            training_points: 12,
        }
    }
}

fn run(demo: Demo) {
    if let Err(err) = try_run(demo) {
        eprintln!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn try_run(demo: Demo) -> Result<(), LearningError> {
    let mut brain = Brain::with_seed(0.05, 42);
    for bit in 0..demo.domain_size {
        brain.add_stimulus(&format!("s{}", 2 * bit), 50)?;
        brain.add_stimulus(&format!("s{}", 2 * bit + 1), 50)?;
    }
    brain.add_area("a", 5_000, 50, 0.1)?;

    let mut architecture = LearningArchitecture::new("a");
    for index in 0..2 * demo.domain_size {
        architecture.add_stimulus_step(&format!("s{index}"), "a", 1);
    }
    architecture.add_area_step("a", "a", 2);

    let mut model = LearningModel::new(&mut brain, demo.domain_size, architecture)?;

    let set = CallableDataSet::new(demo.function, demo.domain_size);
    let mask = ExplicitMask::new(demo.train_mask.clone());
    let mut training = TrainingSet::new(&set, &mask, demo.training_points, 0.0, 7)?;

    info!(task = demo.name, points = demo.training_points, "training");
    model.train(&mut training)?;

    // Accuracy over the held-out (testing-side) inputs.
    let mut testing = TestingSet::new(&set, &mask);
    let results = model.test(&mut testing)?;

    // Predictions over the full domain, for the summary.
    let mut predictions = Vec::new();
    for input in 0..(1u64 << demo.domain_size) {
        predictions.push(serde_json::json!({
            "input": input,
            "expected": (demo.function)(input),
            "predicted": model.run(input)?,
        }));
    }

    let diag = model.brain().diagnostics();
    let summary = serde_json::json!({
        "task": demo.name,
        "domain_size": demo.domain_size,
        "held_out_accuracy": results.accuracy,
        "true_positive": results.true_positive,
        "false_negative": results.false_negative,
        "predictions": predictions,
        "brain": {
            "rounds": diag.rounds,
            "total_support": diag.total_support,
            "connectome_pairs": diag.connectome_pairs,
            "stored_weights": diag.stored_weights,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    Ok(())
}

fn print_help() {
    println!("cerebro demo runner");
    println!();
    println!("USAGE:");
    println!("  cerebro               run the two-bit parity demo");
    println!("  cerebro parity-demo   same as the default");
    println!("  cerebro identity-demo run the one-bit identity demo");
    println!();
    println!("Set RUST_LOG=debug to watch projection rounds.");
}
