use std::cmp::Reverse;

use itertools::Itertools;

use crate::flow::matrix::ResidualGraph;

struct Frame {
    node: usize,
    candidates: Vec<usize>,
    next: usize,
}

impl Frame {
    /// Neighbors with residual capacity left, widest first. Equal capacities keep node order.
    fn new(residual: &ResidualGraph, node: usize) -> Self {
        let candidates = residual
            .neighbors(node)
            .filter(|(_, cell)| cell.residual > 0)
            .sorted_by_key(|(_, cell)| Reverse(cell.residual))
            .map(|(to, _)| to)
            .collect();
        Self {
            node,
            candidates,
            next: 0,
        }
    }
}

/// Finds a path from `source` to `sink` over pairs with positive residual capacity.
///
/// Depth-first, always descending into the neighbor with the largest residual
/// first. No node appears twice on the returned path. When `source == sink`
/// the path is just `[source]`.
pub fn find_path(residual: &ResidualGraph, source: usize, sink: usize) -> Option<Vec<usize>> {
    if source == sink {
        return Some(vec![source]);
    }

    let mut visited = vec![false; residual.node_count()];
    visited[source] = true;
    let mut stack = vec![Frame::new(residual, source)];

    while let Some(frame) = stack.last_mut() {
        let Some(&next) = frame.candidates.get(frame.next) else {
            // dead end, backtrack
            stack.pop();
            continue;
        };
        frame.next += 1;
        if visited[next] {
            continue;
        }
        if next == sink {
            let mut path: Vec<usize> = stack.iter().map(|frame| frame.node).collect();
            path.push(sink);
            return Some(path);
        }
        visited[next] = true;
        stack.push(Frame::new(residual, next));
    }

    None
}

#[cfg(test)]
mod tests {
    use crate::flow::matrix::ResidualGraph;
    use crate::flow::network::FlowNetwork;
    use crate::flow::path::find_path;

    fn residual_of(network: &FlowNetwork) -> ResidualGraph {
        ResidualGraph::from_snapshot(&network.snapshot()).unwrap()
    }

    fn ids(residual: &ResidualGraph, path: Option<Vec<usize>>) -> Option<Vec<String>> {
        path.map(|path| residual.ids(&path))
    }

    #[test]
    fn prefers_widest_neighbor() {
        let residual = residual_of(&FlowNetwork::sample());
        let source = residual.index_of("1").unwrap();
        let sink = residual.index_of("5").unwrap();

        // 1->4 (30) is the widest edge out of the source
        assert_eq!(
            Some(vec!["1".to_owned(), "4".to_owned(), "5".to_owned()]),
            ids(&residual, find_path(&residual, source, sink))
        );
    }

    #[test]
    fn ties_follow_node_order() {
        let mut network = FlowNetwork::new();
        for id in ["s", "a", "b", "t"] {
            network.add_node(id);
        }
        network.add_edge("s", "b", 5).unwrap();
        network.add_edge("s", "a", 5).unwrap();
        network.add_edge("a", "t", 5).unwrap();
        network.add_edge("b", "t", 5).unwrap();
        let residual = residual_of(&network);

        let path = find_path(&residual, 0, 3);
        assert_eq!(
            Some(vec!["s".to_owned(), "a".to_owned(), "t".to_owned()]),
            ids(&residual, path)
        );
    }

    #[test]
    fn backtracks_out_of_dead_ends() {
        let mut network = FlowNetwork::new();
        for id in ["s", "wide", "narrow", "t"] {
            network.add_node(id);
        }
        network.add_edge("s", "wide", 100).unwrap();
        network.add_edge("s", "narrow", 1).unwrap();
        network.add_edge("wide", "s", 100).unwrap();
        network.add_edge("narrow", "t", 1).unwrap();
        let residual = residual_of(&network);

        assert_eq!(
            Some(vec!["s".to_owned(), "narrow".to_owned(), "t".to_owned()]),
            ids(&residual, find_path(&residual, 0, 3))
        );
    }

    #[test]
    fn saturated_edges_block_the_search() {
        let mut network = FlowNetwork::new();
        for id in ["s", "m", "t"] {
            network.add_node(id);
        }
        network.add_edge("s", "m", 3).unwrap();
        network.add_edge("m", "t", 3).unwrap();
        let mut residual = residual_of(&network);
        residual.set_residual(1, 2, 0);

        assert_eq!(None, find_path(&residual, 0, 2));
    }

    #[test]
    fn direction_matters() {
        let mut network = FlowNetwork::new();
        network.add_node("s");
        network.add_node("t");
        network.add_edge("t", "s", 3).unwrap();
        let residual = residual_of(&network);

        assert_eq!(None, find_path(&residual, 0, 1));
        assert_eq!(Some(vec![1, 0]), find_path(&residual, 1, 0));
    }

    #[test]
    fn source_equal_to_sink_is_a_single_node_path() {
        let residual = residual_of(&FlowNetwork::sample());
        assert_eq!(Some(vec![2]), find_path(&residual, 2, 2));
    }
}
