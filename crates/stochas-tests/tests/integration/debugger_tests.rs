//! Sample-size search over seeded Monte Carlo models.

use stochas_core::{
    traverse, ConvergenceTarget, DebuggerConfig, HyperparameterModel, SampleSizeDebugger,
    SampleStats, SearchOutcome, TraversalContext,
};
use stochas_ir::{mark_for_inference, Node};
use stochas_tests::{normal, standard_normal, uniform};

fn debugger(p: f64, max_count: usize) -> SampleSizeDebugger {
    SampleSizeDebugger::new(HyperparameterModel::new(p, max_count).expect("model"))
}

/// Mean of `n` fresh draws taken far away from the search's streams.
fn fresh_mean(model: &Node, n: usize, first_stream: u64) -> f64 {
    let values: Vec<f64> = (0..n as u64)
        .map(|i| {
            let mut ctx = TraversalContext::for_stream(first_stream + i).expect("stream");
            traverse(model, &mut ctx).expect("traverse")
        })
        .collect();
    SampleStats::from_values(&values).mean
}

#[test]
fn zero_mean_symmetric_model_converges() {
    for seed in 0..5 {
        let model = mark_for_inference(standard_normal("z", seed).into());
        let outcome = debugger(0.01, 1000)
            .converge_mean(&model, 0.0, 0.01)
            .expect("search");
        assert!(outcome.is_converged(), "seed {} exhausted: {:?}", seed, outcome);
        assert!(outcome.count() <= 1000);
        assert!(outcome.achieved_mean().abs() <= 0.01);
    }
}

#[test]
fn uniform_model_converges_with_estimate() {
    let model = mark_for_inference(uniform("u", -1.0, 1.0, 17).into());
    let (count, mean) = debugger(0.01, 1000)
        .converge_mean_with_estimate(&model, 0.0, 0.01)
        .expect("search");
    assert!((1..=1000).contains(&count));
    assert!(mean.abs() <= 0.01);
}

#[test]
fn two_moment_search_matches_mean_and_std() {
    let model = mark_for_inference(normal("n", 1.0, 2.0, 3).into());
    let outcome = debugger(0.005, 2000)
        .converge_mean_and_std(&model, 1.0, 2.0, 0.25)
        .expect("search");
    assert!(outcome.is_converged());
    let stats = outcome.stats().expect("stats");
    assert!((stats.mean - 1.0).abs() <= 0.25);
    assert!((stats.std_dev.expect("std") - 2.0).abs() <= 0.25);
}

#[test]
fn unreachable_target_exhausts_within_max_count_proposals() {
    let model = mark_for_inference(uniform("u", 0.0, 1.0, 5).into());
    let (outcome, diagnostics) = debugger(0.2, 30)
        .search_with_diagnostics(&model, ConvergenceTarget::mean_only(10.0, 0.1))
        .expect("search");

    assert!(matches!(outcome, SearchOutcome::Exhausted { count: 30, .. }));
    assert_eq!(diagnostics.trials.len(), 30);
    let mut counts: Vec<usize> = diagnostics.trials.iter().map(|t| t.count).collect();
    counts.sort_unstable();
    counts.dedup();
    assert_eq!(counts.len(), 30);
    assert!(outcome.achieved_mean() < 1.0);
}

#[test]
fn accepted_counts_generalize_to_fresh_draws() {
    // sigma equals the tolerance, so a single draw lands within it about 68%
    // of the time and many searches need several trials. Stopping at the
    // first passing trial puts the fresh hit rate near 74%.
    let runs = 100;
    let tolerance = 0.01;
    let mut hits = 0;
    let mut multi_draw = 0;
    for seed in 0..runs {
        let model = mark_for_inference(normal("spread", 3.0, tolerance, seed).into());
        let outcome = debugger(0.05, 200)
            .converge_mean(&model, 3.0, tolerance)
            .expect("search");
        assert!(outcome.is_converged(), "seed {} exhausted: {:?}", seed, outcome);
        if outcome.count() > 1 {
            multi_draw += 1;
        }

        let mean = fresh_mean(&model, outcome.count(), 1 << 20);
        if (mean - 3.0).abs() <= tolerance {
            hits += 1;
        }
    }
    assert!(multi_draw >= 10, "only {} of {} searches went past n = 1", multi_draw, runs);
    assert!(hits * 10 >= runs * 6, "only {} of {} runs generalized", hits, runs);
}

#[test]
fn search_is_reproducible() {
    let model = mark_for_inference(standard_normal("z", 44).into());
    let search = SampleSizeDebugger::with_config(
        HyperparameterModel::new(0.02, 300).expect("model"),
        DebuggerConfig {
            first_stream: 7,
            ..DebuggerConfig::default()
        },
    );
    let target = ConvergenceTarget::mean_only(0.0, 0.05);
    let first = search.search_with_diagnostics(&model, target).expect("first");
    let second = search.search_with_diagnostics(&model, target).expect("second");
    assert_eq!(first, second);
}
