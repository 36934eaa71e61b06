//! Dependence analysis scenarios.

use stochas_core::{
    analyze, correlated, AnalyzerConfig, DependenceAnalyzer, SourceSet,
};
use stochas_ir::{bind, constant, filter, Node};
use stochas_tests::{standard_normal, sum_chain, uniform};

#[test]
fn reused_source_through_filter_is_visited_twice() {
    // source(A) >>= filter(x > 0) >>= source(A)
    let a = standard_normal("A", 1);
    let again = a.clone();
    let graph = bind(filter(|x| x > 0.0, a.clone().into()), move |_| {
        again.clone().into()
    });

    let trace = DependenceAnalyzer::new().trace(&graph).expect("trace");
    assert_eq!(trace.visits, vec![a.id(), a.id()]);
    assert_eq!(trace.sources(), SourceSet::from([a.id()]));
    assert_eq!(trace.reused_sources(), SourceSet::from([a.id()]));
}

#[test]
fn disjoint_binds_are_independent() {
    let a = standard_normal("A", 1);
    let b = standard_normal("B", 2);
    let left = bind(a.into(), |x| constant(x * x));
    let right = bind(b.into(), |y| constant(y + 1.0));

    let report = correlated(&left, &right).expect("correlated");
    assert!(report.shared.is_empty());
    assert_eq!(report.correlation_strength, 0.0);
}

#[test]
fn self_correlation_is_one() {
    let sources: Vec<_> = (0..4).map(|i| uniform(&format!("s{}", i), -1.0, 1.0, 8)).collect();
    let graph = sum_chain(&sources);
    let report = correlated(&graph, &graph).expect("correlated");
    assert_eq!(report.correlation_strength, 1.0);
    assert_eq!(report.shared.len(), 4);
}

#[test]
fn partial_overlap_reports_shared_sources() {
    let pool: Vec<_> = (0..5).map(|i| uniform(&format!("p{}", i), 0.0, 1.0, 4)).collect();
    let left = sum_chain(&pool[..3]);
    let right = sum_chain(&pool[1..]);

    let report = correlated(&left, &right).expect("correlated");
    let expected: SourceSet = pool[1..3].iter().map(|s| s.id()).collect();
    assert_eq!(report.shared, expected);
    assert!((report.correlation_strength - 2.0 / 5.0).abs() < 1e-12);
}

#[test]
fn source_accounting_is_stable_across_streams() {
    let sources: Vec<_> = (0..3).map(|i| standard_normal(&format!("n{}", i), 21)).collect();
    let graph = sum_chain(&sources);

    let first = analyze(&graph).expect("first");
    let second = DependenceAnalyzer::with_config(AnalyzerConfig {
        stream: 99,
        ..AnalyzerConfig::default()
    })
    .analyze(&graph)
    .expect("second");
    assert_eq!(first, second);
}

#[test]
fn value_dependent_shape_is_reproducible_on_one_stream() {
    let gate = standard_normal("gate", 7);
    let (high, low) = (standard_normal("high", 7), standard_normal("low", 7));
    let (h, l) = (high.clone(), low.clone());
    let graph: Node = bind(gate.clone().into(), move |x| {
        if x > 0.0 {
            h.clone().into()
        } else {
            l.clone().into()
        }
    });

    let analyzer = DependenceAnalyzer::new();
    let first = analyzer.analyze(&graph).expect("first");
    let second = analyzer.analyze(&graph).expect("second");
    assert_eq!(first, second);
    assert!(first.contains(&gate.id()));
    assert_eq!(first.len(), 2);
    assert!(first.contains(&high.id()) ^ first.contains(&low.id()));
}
