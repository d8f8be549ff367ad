//! Merges vector and graph results into one ordered list.
//!
//! Items are ordered by `(weight, score)` descending, lexicographically. The
//! weight is a source-level priority, not a multiplier: with the default
//! 0.7/0.3 every vector item precedes every graph item, vector items are
//! ordered by similarity and graph items keep their input order.

use tracing::{debug, warn};

use super::types::{ContextItem, GraphHit, VectorHit};
use crate::config::{DEFAULT_GRAPH_WEIGHT, DEFAULT_VECTOR_WEIGHT};

fn valid_weight(weight: f32) -> bool {
    (0.0..=1.0).contains(&weight)
}

/// Both weights, or the defaults when either lies outside `[0, 1]`.
pub fn normalize_weights(vector_weight: f32, graph_weight: f32) -> (f32, f32) {
    if valid_weight(vector_weight) && valid_weight(graph_weight) {
        (vector_weight, graph_weight)
    } else {
        warn!(
            vector_weight,
            graph_weight, "Weights should be between 0 and 1, using defaults"
        );
        (DEFAULT_VECTOR_WEIGHT, DEFAULT_GRAPH_WEIGHT)
    }
}

/// Every input becomes exactly one item; nothing is truncated.
pub fn rank(
    vector_results: &[VectorHit],
    graph_results: &[GraphHit],
    vector_weight: f32,
    graph_weight: f32,
) -> Vec<ContextItem> {
    let (vector_weight, graph_weight) = normalize_weights(vector_weight, graph_weight);

    let mut ranked: Vec<ContextItem> = vector_results
        .iter()
        .map(|hit| ContextItem::from_vector(hit, vector_weight))
        .chain(
            graph_results
                .iter()
                .map(|hit| ContextItem::from_graph(hit, graph_weight)),
        )
        .collect();

    // Stable, so equal keys keep input order. `total_cmp` keeps the order
    // total when a backend reports a NaN score.
    ranked.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| b.score_or_zero().total_cmp(&a.score_or_zero()))
    });

    debug!("Ranked {} contexts", ranked.len());
    ranked
}
