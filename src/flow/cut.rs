use std::collections::VecDeque;

use crate::flow::error::FlowError;
use crate::flow::matrix::ResidualGraph;

/// Minimum cut read off an exhausted residual graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MinCut {
    /// Nodes reachable from the source, in visiting order.
    pub reachable: Vec<String>,
    /// Edges of the network leading from a reachable node to an unreachable one.
    pub edges: Vec<(String, String)>,
    pub capacity: u64,
}

impl MinCut {
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.edges.iter().any(|(u, v)| u == from && v == to)
    }
}

/// Nodes reachable from `source` over positive residual capacity, breadth-first in node order.
pub fn reachable_from(residual: &ResidualGraph, source: usize) -> Vec<usize> {
    let mut visited = vec![false; residual.node_count()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut order = vec![];
    visited[source] = true;
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for (next, cell) in residual.neighbors(node) {
            if !visited[next] && cell.residual > 0 {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }

    order
}

/// Splits the nodes by reachability from `source` and collects the crossing edges.
///
/// Only cells the network defined count as cut edges. Reverse cells opened by
/// augmentation never do, even when they cross the partition. The capacity of
/// the cut adds up the capacities the run started from.
pub fn extract(residual: &ResidualGraph, source: usize) -> Result<MinCut, FlowError> {
    let order = reachable_from(residual, source);
    let mut reachable = vec![false; residual.node_count()];
    for &node in &order {
        reachable[node] = true;
    }

    let mut edges = vec![];
    let mut capacity = 0;
    for &from in &order {
        for (to, cell) in residual.neighbors(from) {
            if reachable[to] {
                continue;
            }
            if cell.is_original() {
                edges.push((residual.id(from).to_owned(), residual.id(to).to_owned()));
                capacity = cell
                    .capacity
                    .checked_add(capacity)
                    .ok_or(FlowError::CapacityOverflow)?;
            }
        }
    }

    Ok(MinCut {
        reachable: residual.ids(&order),
        edges,
        capacity,
    })
}
