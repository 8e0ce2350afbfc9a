// src/clustering/subject_clustering.rs - Similarity graph and connected-component grouping

use indicatif::{MultiProgress, ProgressBar};
use log::{debug, info};

use petgraph::graph::{NodeIndex, UnGraph};

use crate::matching::name::{similar_names, MatchStrictness};
use crate::models::core::{SubjectComponent, SubjectNode, SubjectRecord};
use crate::models::stats_models::ClusteringStats;
use crate::utils::progress_config::add_bar;

/// Undirected graph of subjects; an edge means "similar enough to be the same person".
pub type SubjectGraph = UnGraph<SubjectNode, ()>;

/// Final components, largest first, and the counters gathered on the way.
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    pub components: Vec<SubjectComponent>,
    pub stats: ClusteringStats,
}

/// Main clustering function: permissive graph, connected components, then a
/// single strict pass over components larger than `large_component_threshold`.
pub fn run_subject_clustering(
    records: &[SubjectRecord],
    large_component_threshold: usize,
    multi_progress: Option<MultiProgress>,
) -> ClusteringOutcome {
    let nodes: Vec<SubjectNode> = records.iter().map(SubjectRecord::to_node).collect();
    cluster_subject_nodes(&nodes, large_component_threshold, multi_progress)
}

pub fn cluster_subject_nodes(
    nodes: &[SubjectNode],
    large_component_threshold: usize,
    multi_progress: Option<MultiProgress>,
) -> ClusteringOutcome {
    let mut stats = ClusteringStats {
        total_records: nodes.len(),
        ..Default::default()
    };

    info!("Building subject graph over {} records...", nodes.len());
    let mut graph = build_subject_graph(nodes);

    let edge_pb = add_bar(multi_progress.as_ref(), nodes.len() as u64, "  ");
    if let Some(pb) = &edge_pb {
        pb.set_message("Comparing names (permissive)...");
    }
    stats.total_edges = add_similarity_edges(&mut graph, MatchStrictness::Permissive, edge_pb.as_ref());
    if let Some(pb) = &edge_pb {
        pb.finish_with_message(format!("{} similarity edges", stats.total_edges));
    }
    info!(
        "Subject graph built with {} nodes and {} edges.",
        graph.node_count(),
        graph.edge_count()
    );

    let initial_components = find_components(&graph);
    stats.initial_components = initial_components.len();
    info!("Found {} initial connected components.", stats.initial_components);

    let (mut components, components_split) = break_up_large_components(
        initial_components,
        large_component_threshold,
        multi_progress.as_ref(),
    );
    stats.components_split = components_split;

    // Stable: equal-sized components keep their discovery order.
    components.sort_by(|a, b| b.len().cmp(&a.len()));

    stats.final_components = components.len();
    stats.largest_component = components.first().map_or(0, SubjectComponent::len);
    stats.singleton_components = components.iter().filter(|c| c.len() == 1).count();
    stats.duplicate_records = components
        .iter()
        .filter(|c| c.len() > 1)
        .map(SubjectComponent::len)
        .sum();

    ClusteringOutcome { components, stats }
}

/// One node per subject, no edges yet.
pub fn build_subject_graph(nodes: &[SubjectNode]) -> SubjectGraph {
    let mut graph = UnGraph::with_capacity(nodes.len(), 0);
    for node in nodes {
        graph.add_node(node.clone());
    }
    graph
}

/// Compares every ordered pair of nodes, self-pairs included, and links the
/// similar ones. Returns the resulting edge count.
pub fn add_similarity_edges(
    graph: &mut SubjectGraph,
    strictness: MatchStrictness,
    progress: Option<&ProgressBar>,
) -> usize {
    let indices: Vec<NodeIndex> = graph.node_indices().collect();

    for &i in &indices {
        for &j in &indices {
            let similar = similar_names(&graph[i].subject_name, &graph[j].subject_name, strictness);
            if similar {
                // update_edge keeps a single edge per unordered pair
                graph.update_edge(i, j, ());
            }
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    debug!(
        "Added {} edges with the {} matcher over {} nodes",
        graph.edge_count(),
        strictness,
        indices.len()
    );
    graph.edge_count()
}

/// Connected components in node-index discovery order. Members are listed in
/// node-index order.
pub fn find_components(graph: &SubjectGraph) -> Vec<SubjectComponent> {
    let mut visited = vec![false; graph.node_count()];
    let mut components = Vec::new();

    for node_idx in graph.node_indices() {
        if visited[node_idx.index()] {
            continue;
        }

        let mut component = Vec::new();
        let mut stack = vec![node_idx];

        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            component.push(current);

            for neighbor in graph.neighbors(current) {
                if !visited[neighbor.index()] {
                    stack.push(neighbor);
                }
            }
        }

        component.sort_unstable();
        components.push(SubjectComponent::new(
            component.into_iter().map(|idx| graph[idx].clone()).collect(),
        ));
    }

    components
}

/// Replaces each component larger than `threshold` with the components of a
/// fresh subgraph linked by the strict matcher. Sub-components are not
/// re-checked, so one may still exceed the threshold.
///
/// Returns the new component list and the number of components that were split.
pub fn break_up_large_components(
    components: Vec<SubjectComponent>,
    threshold: usize,
    multi_progress: Option<&MultiProgress>,
) -> (Vec<SubjectComponent>, usize) {
    let mut result = Vec::with_capacity(components.len());
    let mut split_count = 0;

    for component in components {
        if component.len() <= threshold {
            result.push(component);
            continue;
        }

        info!(
            "Breaking up component of {} elements: {}",
            component.len(),
            component
        );
        split_count += 1;

        let mut sub_graph = build_subject_graph(&component.members);
        let pb = add_bar(multi_progress, component.len() as u64, "    ");
        if let Some(pb) = &pb {
            pb.set_message(format!("Re-comparing {} names (strict)...", component.len()));
        }
        add_similarity_edges(&mut sub_graph, MatchStrictness::Strict, pb.as_ref());

        let sub_components = find_components(&sub_graph);
        if let Some(pb) = &pb {
            pb.finish_with_message(format!("Split into {} components", sub_components.len()));
        }
        info!(
            "Component of {} elements split into {} components (sizes {:?})",
            component.len(),
            sub_components.len(),
            sub_components.iter().map(SubjectComponent::len).collect::<Vec<_>>()
        );

        result.extend(sub_components);
    }

    (result, split_count)
}

/// Logs the final component list, one line per component.
pub fn log_components(components: &[SubjectComponent]) {
    info!("Here are the sorted components:");
    for (rank, component) in components.iter().enumerate() {
        info!("  #{} ({} members): {}", rank + 1, component.len(), component);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::SubjectId;
    use std::collections::BTreeSet;

    fn nodes(entries: &[(i64, &str)]) -> Vec<SubjectNode> {
        entries
            .iter()
            .map(|&(id, name)| SubjectNode::new(id, name))
            .collect()
    }

    fn id_sets(components: &[SubjectComponent]) -> Vec<BTreeSet<SubjectId>> {
        components
            .iter()
            .map(|c| c.subject_ids().cloned().collect())
            .collect()
    }

    fn ids(values: &[i64]) -> BTreeSet<SubjectId> {
        values.iter().map(|&v| SubjectId::from(v)).collect()
    }

    /// Nine single-word names: every cross pair is two edits apart (permissive
    /// only), every pair within a group is one edit apart (strict as well).
    fn bridged_groups() -> Vec<SubjectNode> {
        nodes(&[
            (1, "kkaa"),
            (2, "kkab"),
            (3, "kkac"),
            (4, "kkad"),
            (5, "kkzz"),
            (6, "kkzy"),
            (7, "kkzx"),
            (8, "kkzw"),
            (9, "kkzv"),
        ])
    }

    #[test]
    fn test_empty_input() {
        let outcome = cluster_subject_nodes(&[], 7, None);
        assert!(outcome.components.is_empty());
        assert_eq!(outcome.stats, ClusteringStats::default());
    }

    #[test]
    fn test_pairs_and_singletons() {
        let input = nodes(&[(1, "foo bar"), (2, "foo baz bar"), (3, "qwe qwe")]);
        let outcome = cluster_subject_nodes(&input, 7, None);

        assert_eq!(id_sets(&outcome.components), vec![ids(&[1, 2]), ids(&[3])]);
        assert_eq!(outcome.stats.final_components, 2);
        assert_eq!(outcome.stats.singleton_components, 1);
        assert_eq!(outcome.stats.duplicate_records, 2);
        assert_eq!(outcome.stats.components_split, 0);
    }

    #[test]
    fn test_every_node_in_exactly_one_component() {
        let input = bridged_groups();
        let outcome = cluster_subject_nodes(&input, 7, None);
        let mut seen: Vec<SubjectId> = outcome
            .components
            .iter()
            .flat_map(|c| c.subject_ids().cloned())
            .collect();
        seen.sort();
        let expected: Vec<SubjectId> = (1..=9).map(SubjectId::from).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_self_pairs_do_not_merge_components() {
        let mut graph = build_subject_graph(&nodes(&[(1, "ada"), (2, "zzzzzz")]));
        add_similarity_edges(&mut graph, MatchStrictness::Permissive, None);
        // One self-loop per node, nothing between them
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(find_components(&graph).len(), 2);
    }

    #[test]
    fn test_oversized_component_is_split_strictly() {
        let input = bridged_groups();

        let mut graph = build_subject_graph(&input);
        add_similarity_edges(&mut graph, MatchStrictness::Permissive, None);
        assert_eq!(find_components(&graph).len(), 1);

        let outcome = cluster_subject_nodes(&input, 7, None);
        assert_eq!(outcome.stats.initial_components, 1);
        assert_eq!(outcome.stats.components_split, 1);
        assert_eq!(
            id_sets(&outcome.components),
            vec![ids(&[5, 6, 7, 8, 9]), ids(&[1, 2, 3, 4])]
        );
        assert_eq!(outcome.stats.largest_component, 5);
    }

    #[test]
    fn test_component_at_threshold_is_kept() {
        // Seven members: not above the threshold, so strict rules never apply.
        let input = nodes(&[
            (1, "kkaa"),
            (2, "kkab"),
            (3, "kkac"),
            (4, "kkzz"),
            (5, "kkzy"),
            (6, "kkzx"),
            (7, "kkzw"),
        ]);
        let outcome = cluster_subject_nodes(&input, 7, None);
        assert_eq!(outcome.stats.components_split, 0);
        assert_eq!(outcome.components.len(), 1);
        assert_eq!(outcome.components[0].len(), 7);
    }

    #[test]
    fn test_refinement_is_single_pass() {
        // Eight names one edit apart stay together under strict rules too.
        let input = nodes(&[
            (1, "kkaa"),
            (2, "kkab"),
            (3, "kkac"),
            (4, "kkad"),
            (5, "kkae"),
            (6, "kkaf"),
            (7, "kkag"),
            (8, "kkah"),
        ]);
        let outcome = cluster_subject_nodes(&input, 7, None);
        assert_eq!(outcome.stats.components_split, 1);
        assert_eq!(outcome.components.len(), 1);
        assert_eq!(outcome.components[0].len(), 8);
    }

    #[test]
    fn test_reclustering_split_components_is_stable() {
        let outcome = cluster_subject_nodes(&bridged_groups(), 7, None);
        for component in &outcome.components {
            let again = cluster_subject_nodes(&component.members, 7, None);
            assert_eq!(again.components.len(), 1);
            assert_eq!(id_sets(&again.components), id_sets(std::slice::from_ref(component)));
        }
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let input = nodes(&[
            (1, "ada"),
            (2, "xyzxyz"),
            (3, "xyzxyz pqr"),
            (4, "mno mno mno"),
        ]);
        let outcome = cluster_subject_nodes(&input, 7, None);
        assert_eq!(
            id_sets(&outcome.components),
            vec![ids(&[2, 3]), ids(&[1]), ids(&[4])]
        );
    }

    #[test]
    fn test_members_listed_in_input_order() {
        let input = nodes(&[(30, "foo bar"), (10, "qwe"), (20, "bar foo")]);
        let outcome = cluster_subject_nodes(&input, 7, None);
        let first: Vec<&SubjectId> = outcome.components[0].subject_ids().collect();
        assert_eq!(first, vec![&SubjectId::from(30), &SubjectId::from(20)]);
    }
}
