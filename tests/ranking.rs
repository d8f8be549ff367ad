//! Ordering properties of the ranker.

use hybrid_rag::retrieval::{rank, GraphHit, Source, VectorHit};

fn vector_hits(scores: &[f32]) -> Vec<VectorHit> {
    scores
        .iter()
        .enumerate()
        .map(|(index, &score)| VectorHit {
            content: format!("chunk {}", index),
            score,
            index,
        })
        .collect()
}

fn graph_hits(n: usize) -> Vec<GraphHit> {
    (0..n)
        .map(|i| GraphHit::new("Finance Team", &format!("Entity {}", i), "Team"))
        .collect()
}

/// Deterministic pseudo-random scores in [-1, 1].
fn scores(seed: u64, n: usize) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
        })
        .collect()
}

#[test]
fn test_rank_preserves_every_input() {
    for seed in 0..20 {
        for (nv, ng) in [(0, 0), (1, 0), (0, 3), (7, 4), (12, 12)] {
            let ranked = rank(&vector_hits(&scores(seed, nv)), &graph_hits(ng), 0.7, 0.3);
            assert_eq!(ranked.len(), nv + ng);
        }
    }
}

#[test]
fn test_higher_weight_source_comes_first() {
    for seed in 0..20 {
        let ranked = rank(&vector_hits(&scores(seed, 6)), &graph_hits(4), 0.8, 0.2);
        let first_graph = ranked.iter().position(|i| i.source == Source::Graph).unwrap();
        assert!(ranked[first_graph..].iter().all(|i| i.source == Source::Graph));

        let ranked = rank(&vector_hits(&scores(seed, 6)), &graph_hits(4), 0.1, 0.9);
        assert!(ranked[..4].iter().all(|i| i.source == Source::Graph));
    }
}

#[test]
fn test_vector_items_sorted_by_score() {
    for seed in 0..20 {
        let ranked = rank(&vector_hits(&scores(seed, 10)), &graph_hits(3), 0.7, 0.3);
        let vector_scores: Vec<f32> = ranked
            .iter()
            .filter(|i| i.source == Source::Vector)
            .map(|i| i.score.unwrap())
            .collect();
        assert!(vector_scores.windows(2).all(|w| w[0] >= w[1]));
    }
}

#[test]
fn test_graph_items_keep_input_order() {
    let ranked = rank(&[], &graph_hits(5), 0.7, 0.3);
    let related: Vec<&str> = ranked.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(
        related,
        (0..5)
            .map(|i| format!("Finance Team is related to Entity {} (Team)", i))
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_invalid_weights_fall_back_to_defaults() {
    for (vw, gw) in [(1.5, 0.3), (0.2, -0.1), (f32::NAN, 0.9)] {
        let ranked = rank(&vector_hits(&[0.1]), &graph_hits(1), vw, gw);
        assert_eq!(ranked[0].source, Source::Vector);
        assert_eq!(ranked[0].weight, 0.7);
        assert_eq!(ranked[1].weight, 0.3);
    }
}

#[test]
fn test_reference_scenario() {
    let vector = vec![
        VectorHit { content: "A".into(), score: 0.9, index: 0 },
        VectorHit { content: "B".into(), score: 0.5, index: 1 },
    ];
    let graph = vec![GraphHit::new("X", "Y", "T")];

    let ranked = rank(&vector, &graph, 0.7, 0.3);

    let contents: Vec<&str> = ranked.iter().map(|i| i.content.as_str()).collect();
    let weights: Vec<f32> = ranked.iter().map(|i| i.weight).collect();
    assert_eq!(contents, vec!["A", "B", "X is related to Y (T)"]);
    assert_eq!(weights, vec![0.7, 0.7, 0.3]);
}

#[test]
fn test_graph_description_wins_over_synthesized_text() {
    let mut hit = GraphHit::new("X", "Y", "T");
    hit.description = "Y governs X".to_string();

    let ranked = rank(&[], &[hit], 0.7, 0.3);

    assert_eq!(ranked[0].content, "Y governs X");
    assert_eq!(ranked[0].metadata["source"], "graph");
}
