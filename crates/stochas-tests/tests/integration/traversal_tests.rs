//! Traversal tests over seeded random sources.

use stochas_core::{traverse, ExecError, TraversalContext, MAX_STREAM};
use stochas_ir::{bind, filter, map, mark_for_inference, Node};
use stochas_tests::{standard_normal, sum_chain, uniform};

#[test]
fn traversal_draws_at_most_one_value_per_leaf() {
    let sources: Vec<_> = (0..6)
        .map(|i| uniform(&format!("u{}", i), 0.0, 1.0, 11))
        .collect();
    let graph = sum_chain(&sources);

    let mut ctx = TraversalContext::new();
    let value = traverse(&graph, &mut ctx).expect("traverse");
    assert_eq!(ctx.draws(), 6);
    assert_eq!(ctx.generation(), 6);
    assert!((0.0..6.0).contains(&value));
}

#[test]
fn rejection_stops_the_walk_early() {
    let first = uniform("first", 0.0, 1.0, 3);
    let second = uniform("second", 0.0, 1.0, 3);
    let tail = second.clone();
    let graph = bind(filter(|x| x > 2.0, first.into()), move |_| tail.clone().into());

    let mut ctx = TraversalContext::new();
    let err = traverse(&graph, &mut ctx).expect_err("must reject");
    assert!(err.is_rejection());
    assert_eq!(ctx.draws(), 1);
    assert!(!ctx.visited_ids().contains(&second.id()));
}

#[test]
fn repeated_traversals_keep_identities_and_vary_values() {
    let a = standard_normal("a", 5);
    let graph = mark_for_inference(map(a.clone().into(), |x| x * 2.0));

    let mut values = Vec::new();
    for stream in 0..8 {
        let mut ctx = TraversalContext::for_stream(stream).expect("stream");
        values.push(traverse(&graph, &mut ctx).expect("traverse"));
        assert_eq!(ctx.visited_ids(), vec![a.id()]);
    }
    values.sort_by(f64::total_cmp);
    values.dedup();
    assert_eq!(values.len(), 8);
}

#[test]
fn same_generation_reproduces_value() {
    let graph: Node = standard_normal("a", 9).into();
    let mut first = TraversalContext::starting_at(123);
    let mut second = TraversalContext::starting_at(123);
    assert_eq!(
        traverse(&graph, &mut first).expect("first"),
        traverse(&graph, &mut second).expect("second")
    );
}

#[test]
fn rejection_reports_value_and_generation() {
    let graph = filter(|x| x < 0.0, uniform("pos", 1.0, 2.0, 1).into());
    let mut ctx = TraversalContext::starting_at(10);
    match traverse(&graph, &mut ctx) {
        Err(ExecError::RejectedSample { value, generation }) => {
            assert!((1.0..2.0).contains(&value));
            assert_eq!(generation, 11);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn exhausted_draw_indices_surface_as_errors() {
    let graph: Node = standard_normal("edge", 2).into();
    let mut ctx = TraversalContext::starting_at(u64::MAX);
    let err = traverse(&graph, &mut ctx).expect_err("must fail");
    assert!(matches!(err, ExecError::PreconditionViolation(_)));
    assert_eq!(ctx.draws(), 0);

    assert!(TraversalContext::for_stream(MAX_STREAM).is_ok());
    assert!(TraversalContext::for_stream(MAX_STREAM + 1).is_err());
}
