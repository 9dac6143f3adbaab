use std::collections::HashMap;
use std::fmt;

use crate::flow::error::{FlowError, InvalidEdgeReason};
use crate::flow::network::GraphSnapshot;

/// Entry of the residual matrix for an ordered node pair.
///
/// `max_capacity` is only set when the network itself defines the pair; reverse
/// entries created during augmentation leave it empty and start from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub residual: u64,
    /// Residual the run started from.
    pub capacity: u64,
    pub max_capacity: Option<u64>,
}

impl Cell {
    pub fn is_original(&self) -> bool {
        self.max_capacity.is_some()
    }
}

/// Flow carried by an edge of the network at some point of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeFlow {
    pub from: String,
    pub to: String,
    pub remaining: u64,
    pub max_capacity: u64,
}

impl EdgeFlow {
    pub fn flow(&self) -> u64 {
        self.max_capacity.saturating_sub(self.remaining)
    }
}

impl fmt::Display for EdgeFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {}/{}",
            self.from,
            self.to,
            self.flow(),
            self.max_capacity
        )
    }
}

/// Dense residual capacities keyed by node pair.
///
/// Nodes are numbered in snapshot order and that numbering is the visiting
/// order of every search over the matrix. A missing cell means the pair has
/// never carried capacity, a cell with zero residual is saturated.
#[derive(Clone, Debug)]
pub struct ResidualGraph {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    cells: Vec<Vec<Option<Cell>>>,
}

impl ResidualGraph {
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self, FlowError> {
        let mut ids = Vec::with_capacity(snapshot.nodes.len());
        let mut index = HashMap::with_capacity(snapshot.nodes.len());
        for node in &snapshot.nodes {
            if !index.contains_key(&node.id) {
                index.insert(node.id.clone(), ids.len());
                ids.push(node.id.clone());
            }
        }

        let node_count = ids.len();
        let mut cells = vec![vec![None; node_count]; node_count];
        for edge in &snapshot.edges {
            let endpoint = |id: &String| {
                index
                    .get(id)
                    .copied()
                    .ok_or_else(|| FlowError::UnknownEndpoint {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                        node: id.clone(),
                    })
            };
            let from = endpoint(&edge.source)?;
            let to = endpoint(&edge.target)?;
            let cell: &mut Option<Cell> = &mut cells[from][to];
            if cell.is_some() {
                return Err(FlowError::InvalidEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    reason: InvalidEdgeReason::Duplicate,
                });
            }
            let max_capacity = if edge.max_capacity == 0 {
                edge.capacity
            } else {
                edge.max_capacity
            };
            *cell = Some(Cell {
                residual: edge.capacity,
                capacity: edge.capacity,
                max_capacity: Some(max_capacity),
            });
        }

        Ok(Self { ids, index, cells })
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn id(&self, node: usize) -> &str {
        &self.ids[node]
    }

    pub fn ids(&self, nodes: &[usize]) -> Vec<String> {
        nodes.iter().map(|&node| self.ids[node].clone()).collect()
    }

    pub fn cell(&self, from: usize, to: usize) -> Option<Cell> {
        self.cells[from][to]
    }

    pub fn residual(&self, from: usize, to: usize) -> Option<u64> {
        self.cell(from, to).map(|cell| cell.residual)
    }

    /// Cells present in row `from`, in node order.
    pub fn neighbors(&self, from: usize) -> impl Iterator<Item = (usize, Cell)> + '_ {
        self.cells[from]
            .iter()
            .enumerate()
            .filter_map(|(to, cell)| cell.map(|cell| (to, cell)))
    }

    /// Overwrites the residual of a pair, creating a reverse cell if it does not exist yet.
    pub(crate) fn set_residual(&mut self, from: usize, to: usize, residual: u64) {
        match &mut self.cells[from][to] {
            Some(cell) => cell.residual = residual,
            empty => {
                *empty = Some(Cell {
                    residual,
                    capacity: 0,
                    max_capacity: None,
                })
            }
        }
    }

    /// Current state of every edge the network defines.
    pub fn edge_flows(&self) -> Vec<EdgeFlow> {
        let mut flows = vec![];
        for (from, row) in self.cells.iter().enumerate() {
            for (to, cell) in row.iter().enumerate() {
                let Some(cell) = cell.filter(Cell::is_original) else {
                    continue;
                };
                flows.push(EdgeFlow {
                    from: self.ids[from].clone(),
                    to: self.ids[to].clone(),
                    remaining: cell.residual,
                    max_capacity: cell.max_capacity.unwrap_or(cell.capacity),
                });
            }
        }
        flows
    }
}

#[cfg(test)]
mod tests {
    use crate::flow::error::FlowError;
    use crate::flow::matrix::{Cell, ResidualGraph};
    use crate::flow::network::{EdgeRecord, FlowNetwork, GraphSnapshot, NodeRecord};

    #[test]
    fn every_node_gets_a_row() {
        let mut network = FlowNetwork::sample();
        network.add_node("lonely");
        let residual = ResidualGraph::from_snapshot(&network.snapshot()).unwrap();

        assert_eq!(6, residual.node_count());
        let lonely = residual.index_of("lonely").unwrap();
        assert_eq!(0, residual.neighbors(lonely).count());
    }

    #[test]
    fn edges_seed_forward_cells_only() {
        let residual = ResidualGraph::from_snapshot(&FlowNetwork::sample().snapshot()).unwrap();
        let one = residual.index_of("1").unwrap();
        let two = residual.index_of("2").unwrap();

        assert_eq!(
            Some(Cell {
                residual: 20,
                capacity: 20,
                max_capacity: Some(20)
            }),
            residual.cell(one, two)
        );
        assert_eq!(None, residual.cell(two, one));
        let row: Vec<_> = residual.neighbors(one).map(|(to, _)| residual.id(to)).collect();
        assert_eq!(vec!["2", "3", "4"], row);
    }

    #[test]
    fn reverse_cells_are_created_lazily() {
        let mut residual =
            ResidualGraph::from_snapshot(&FlowNetwork::sample().snapshot()).unwrap();
        let one = residual.index_of("1").unwrap();
        let two = residual.index_of("2").unwrap();
        residual.set_residual(two, one, 0);

        let reverse = residual.cell(two, one).unwrap();
        assert_eq!(0, reverse.residual);
        assert_eq!(0, reverse.capacity);
        assert!(!reverse.is_original());
        assert_eq!(8, residual.edge_flows().len());
    }

    #[test]
    fn unknown_endpoint_is_reported() {
        let snapshot = GraphSnapshot {
            nodes: vec![NodeRecord { id: "a".to_owned() }],
            edges: vec![EdgeRecord {
                source: "a".to_owned(),
                target: "ghost".to_owned(),
                capacity: 1,
                max_capacity: 1,
            }],
        };
        assert_eq!(
            Err(FlowError::UnknownEndpoint {
                from: "a".to_owned(),
                to: "ghost".to_owned(),
                node: "ghost".to_owned(),
            }),
            ResidualGraph::from_snapshot(&snapshot).map(|_| ())
        );
    }
}
