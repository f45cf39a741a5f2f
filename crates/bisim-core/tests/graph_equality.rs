//! End-to-end comparisons of cyclic and shared-structure value graphs.

#![allow(clippy::expect_used)]

use bisim_core::{MismatchKind, ValueArena, ValueId, deeply_equal};

/// Builds a singly linked ring of `len` nodes carrying `values[i]` and
/// returns the head.
fn ring(arena: &mut ValueArena, values: &[i64]) -> ValueId {
    let nodes: Vec<ValueId> = values
        .iter()
        .map(|&v| {
            let value = arena.int(v);
            arena.record("Node", vec![("value".to_owned(), value)])
        })
        .collect();
    for (i, &node) in nodes.iter().enumerate() {
        let next = nodes[(i + 1) % nodes.len()];
        arena.set_field(node, "next", next).expect("record");
    }
    nodes[0]
}

#[test]
fn self_loop_equals_self_loop() {
    let mut arena = ValueArena::new();
    let e = ring(&mut arena, &[1]);
    let a = ring(&mut arena, &[1]);
    let result = deeply_equal(&arena, e, a).expect("covered");
    assert!(result.matched);
}

#[test]
fn self_loop_differs_from_self_loop_with_other_payload() {
    let mut arena = ValueArena::new();
    let e = ring(&mut arena, &[1]);
    let a = ring(&mut arena, &[2]);
    let result = deeply_equal(&arena, e, a).expect("covered");
    assert!(!result.matched);
    assert_eq!(result.mismatches.len(), 1);
    assert_eq!(result.mismatches[0].kind, MismatchKind::ValueMismatch);
    assert_eq!(result.mismatches[0].path.to_string(), "$.value");
}

#[test]
fn rings_of_equal_length_and_payload_match() {
    let mut arena = ValueArena::new();
    let e = ring(&mut arena, &[1, 2, 3]);
    let a = ring(&mut arena, &[1, 2, 3]);
    assert!(deeply_equal(&arena, e, a).expect("covered").matched);
}

#[test]
fn a_ring_bisimulates_a_shorter_ring_with_the_same_payload_trace() {
    // Bisimulation equality is about observable behavior: a 1-ring of 7s
    // unfolds to the same infinite trace as a 2-ring of 7s.
    let mut arena = ValueArena::new();
    let e = ring(&mut arena, &[7]);
    let a = ring(&mut arena, &[7, 7]);
    assert!(deeply_equal(&arena, e, a).expect("covered").matched);
}

#[test]
fn rings_with_different_payload_traces_do_not_match() {
    let mut arena = ValueArena::new();
    let e = ring(&mut arena, &[1, 2]);
    let a = ring(&mut arena, &[1, 3]);
    let result = deeply_equal(&arena, e, a).expect("covered");
    assert!(!result.matched);
    assert_eq!(result.mismatches[0].path.to_string(), "$.next.value");
}

#[test]
fn mutual_cycle_matches_isomorphic_mutual_cycle() {
    let mut arena = ValueArena::new();

    let build = |arena: &mut ValueArena| {
        let an = arena.str("a");
        let a = arena.record("Node", vec![("name".to_owned(), an)]);
        let bn = arena.str("b");
        let b = arena.record("Node", vec![("name".to_owned(), bn)]);
        arena.set_field(a, "peer", b).expect("record");
        arena.set_field(b, "peer", a).expect("record");
        a
    };

    let e = build(&mut arena);
    let a = build(&mut arena);
    assert!(deeply_equal(&arena, e, a).expect("covered").matched);
}

#[test]
fn cyclic_graph_differs_from_its_acyclic_unfolding_at_the_break_point() {
    // An acyclic two-level chain ends in null where the cycle loops back.
    let mut arena = ValueArena::new();
    let ev = arena.int(1);
    let e = arena.record("Node", vec![("value".to_owned(), ev)]);
    arena.set_field(e, "next", e).expect("record");

    let tail_v = arena.int(1);
    let tail_next = arena.null();
    let tail = arena.record(
        "Node",
        vec![("value".to_owned(), tail_v), ("next".to_owned(), tail_next)],
    );
    let av = arena.int(1);
    let a = arena.record("Node", vec![("value".to_owned(), av), ("next".to_owned(), tail)]);

    let result = deeply_equal(&arena, e, a).expect("covered");
    assert!(!result.matched);
    assert!(
        result
            .mismatches
            .iter()
            .any(|m| m.kind == MismatchKind::Absence),
        "the chain's null terminator must surface as an absence mismatch"
    );
}

#[test]
fn shared_subtree_on_one_side_matches_duplicated_subtree_on_the_other() {
    let mut arena = ValueArena::new();

    // Expected: both fields point at the same leaf.
    let leaf_x = arena.int(5);
    let leaf = arena.record("Leaf", vec![("x".to_owned(), leaf_x)]);
    let e = arena.record(
        "Pair",
        vec![("left".to_owned(), leaf), ("right".to_owned(), leaf)],
    );

    // Actual: two structurally equal but distinct leaves.
    let lx = arena.int(5);
    let l = arena.record("Leaf", vec![("x".to_owned(), lx)]);
    let rx = arena.int(5);
    let r = arena.record("Leaf", vec![("x".to_owned(), rx)]);
    let a = arena.record(
        "Pair",
        vec![("left".to_owned(), l), ("right".to_owned(), r)],
    );

    assert!(deeply_equal(&arena, e, a).expect("covered").matched);
}

#[test]
fn every_leaf_perturbation_in_a_cyclic_graph_is_reported() {
    let mut arena = ValueArena::new();
    let e = ring(&mut arena, &[1, 2, 3]);
    let a = ring(&mut arena, &[9, 2, 8]);
    let result = deeply_equal(&arena, e, a).expect("covered");
    assert!(!result.matched);
    let paths: Vec<String> = result
        .mismatches
        .iter()
        .map(|m| m.path.to_string())
        .collect();
    assert_eq!(paths, vec!["$.value", "$.next.next.value"]);
}

#[test]
fn cyclic_graphs_inside_collections_terminate_and_compare() {
    let mut arena = ValueArena::new();
    let e_ring = ring(&mut arena, &[4]);
    let a_ring = ring(&mut arena, &[4]);
    let e_tag = arena.str("rings");
    let a_tag = arena.str("rings");
    let e = arena.seq(vec![e_tag, e_ring]);
    let a = arena.seq(vec![a_tag, a_ring]);
    assert!(deeply_equal(&arena, e, a).expect("covered").matched);
}

#[test]
fn cyclic_map_values_match_under_unordered_entry_probing() {
    let mut arena = ValueArena::new();
    let e_k1 = arena.str("loop");
    let e_v1 = ring(&mut arena, &[1]);
    let e_k2 = arena.str("flat");
    let e_v2 = arena.int(0);
    let e = arena.map(vec![(e_k1, e_v1), (e_k2, e_v2)]);

    let a_k2 = arena.str("flat");
    let a_v2 = arena.int(0);
    let a_k1 = arena.str("loop");
    let a_v1 = ring(&mut arena, &[1]);
    let a = arena.map(vec![(a_k2, a_v2), (a_k1, a_v1)]);

    assert!(deeply_equal(&arena, e, a).expect("covered").matched);
}

/// Builds a pseudo-random graph of `n` record nodes whose `next` edges are
/// chosen by a fixed linear congruential generator, so the same seed always
/// produces the same shape (cycles included).
fn random_graph(arena: &mut ValueArena, seed: u64, n: usize) -> ValueId {
    let mut state = seed;
    let mut next_u64 = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        state
    };
    let nodes: Vec<ValueId> = (0..n)
        .map(|_| {
            let payload = arena.int((next_u64() % 5) as i64);
            arena.record("Node", vec![("value".to_owned(), payload)])
        })
        .collect();
    for &node in &nodes {
        let target = nodes[(next_u64() as usize) % n];
        arena.set_field(node, "next", target).expect("record");
    }
    nodes[0]
}

#[test]
fn identically_seeded_random_graphs_compare_equal() {
    let mut arena = ValueArena::new();
    for seed in [3u64, 17, 4242] {
        let e = random_graph(&mut arena, seed, 12);
        let a = random_graph(&mut arena, seed, 12);
        let result = deeply_equal(&arena, e, a).expect("covered");
        assert!(result.matched, "seed {seed} built two distinct but equal graphs");
    }
}

#[test]
fn perturbing_one_payload_in_a_random_graph_breaks_equality() {
    let mut arena = ValueArena::new();
    let e = random_graph(&mut arena, 99, 10);
    let a = random_graph(&mut arena, 99, 10);
    let changed = arena.int(777);
    arena.set_field(a, "value", changed).expect("record");

    let result = deeply_equal(&arena, e, a).expect("covered");
    assert!(!result.matched);
    assert!(
        result
            .mismatches
            .iter()
            .any(|m| m.path.to_string().ends_with(".value")),
        "some mismatch must point at a payload leaf"
    );
}

#[test]
fn json_loaded_documents_compare_structurally() {
    let mut arena = ValueArena::new();
    let expected_doc: serde_json::Value = serde_json::from_str(
        r#"{"name": "widget", "tags": ["a", "b"], "weight": 1.5}"#,
    )
    .expect("literal parses");
    let actual_doc: serde_json::Value = serde_json::from_str(
        r#"{"weight": 1.5, "name": "widget", "tags": ["a", "b"]}"#,
    )
    .expect("literal parses");

    let e = arena.from_json(&expected_doc);
    let a = arena.from_json(&actual_doc);
    assert!(
        deeply_equal(&arena, e, a).expect("covered").matched,
        "object key order must not matter"
    );
}

#[test]
fn json_loaded_documents_report_nested_differences() {
    let mut arena = ValueArena::new();
    let expected_doc: serde_json::Value =
        serde_json::from_str(r#"{"items": [1, 2, 3]}"#).expect("literal parses");
    let actual_doc: serde_json::Value =
        serde_json::from_str(r#"{"items": [1, 5, 3]}"#).expect("literal parses");

    let e = arena.from_json(&expected_doc);
    let a = arena.from_json(&actual_doc);
    let result = deeply_equal(&arena, e, a).expect("covered");
    assert!(!result.matched);
    let m = &result.mismatches[0];
    assert_eq!(m.kind, MismatchKind::UnmatchedExpected);
    assert_eq!(
        m.children[0].kind,
        MismatchKind::ValueMismatch,
        "the sole key match must explain the value difference"
    );
}
