use std::collections::HashMap;

use log::{debug, warn};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::flow::error::{FlowError, InvalidEdgeReason};

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
}

#[derive(Clone, Debug)]
pub struct Edge {
    /// Capacity a run starts from.
    pub capacity: u64,
    pub max_capacity: u64,
}

/// Change applied to a [`FlowNetwork`], recorded for whoever displays it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEdit {
    NodeAdded(String),
    NodeRemoved { id: String, edges_removed: usize },
    EdgeAdded { from: String, to: String, capacity: u64 },
    EdgeRemoved { from: String, to: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub capacity: u64,
    #[serde(default)]
    pub max_capacity: u64,
}

/// Plain copy of a network, the shape the engine and the JSON files work with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeRecord>,
    #[serde(rename = "links", alias = "edges")]
    pub edges: Vec<EdgeRecord>,
}

/// Directed capacitated network edited between max-flow runs.
///
/// Node ids are unique, and at most one edge exists per ordered pair of nodes.
/// Removing a node removes every edge touching it.
#[derive(Clone, Debug, Default)]
pub struct FlowNetwork {
    graph: StableDiGraph<Node, Edge>,
    index: HashMap<String, NodeIndex>,
    edits: Vec<GraphEdit>,
}

impl FlowNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Five node network used when nothing else is loaded.
    pub fn sample() -> Self {
        let mut network = Self::new();
        for id in ["1", "2", "3", "4", "5"] {
            network.add_node(id);
        }
        let edges = [
            ("1", "2", 20),
            ("1", "3", 15),
            ("1", "4", 30),
            ("2", "3", 40),
            ("3", "4", 20),
            ("2", "5", 50),
            ("3", "5", 30),
            ("4", "5", 10),
        ];
        for (from, to, capacity) in edges {
            network
                .add_edge(from, to, capacity)
                .expect("sample edges join distinct pairs of added nodes");
        }
        network.edits.clear();
        network
    }

    /// Builds a network from a snapshot, rejecting edges the network would reject.
    ///
    /// Repeated node ids collapse into one node. The `capacity` of each record is
    /// taken as the capacity of the new edge.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self, FlowError> {
        let mut network = Self::new();
        for node in &snapshot.nodes {
            network.add_node(&node.id);
        }
        for edge in &snapshot.edges {
            network.add_edge(&edge.source, &edge.target, edge.capacity)?;
        }
        network.edits.clear();
        Ok(network)
    }

    /// Adds a node, returns `false` if the id was already taken.
    pub fn add_node(&mut self, id: &str) -> bool {
        if self.index.contains_key(id) {
            return false;
        }
        let node = self.graph.add_node(Node { id: id.to_owned() });
        self.index.insert(id.to_owned(), node);
        self.edits.push(GraphEdit::NodeAdded(id.to_owned()));
        debug!("added node {}", id);
        true
    }

    pub fn add_edge(&mut self, from: &str, to: &str, capacity: u64) -> Result<(), FlowError> {
        let invalid = |reason: InvalidEdgeReason| {
            warn!("rejected edge {} -> {}: {}", from, to, reason);
            FlowError::InvalidEdge {
                from: from.to_owned(),
                to: to.to_owned(),
                reason,
            }
        };
        let source = *self
            .index
            .get(from)
            .ok_or_else(|| invalid(InvalidEdgeReason::MissingSource))?;
        let target = *self
            .index
            .get(to)
            .ok_or_else(|| invalid(InvalidEdgeReason::MissingTarget))?;
        if capacity == 0 {
            return Err(invalid(InvalidEdgeReason::NonPositiveCapacity));
        }
        if self.graph.find_edge(source, target).is_some() {
            return Err(invalid(InvalidEdgeReason::Duplicate));
        }

        self.graph.add_edge(
            source,
            target,
            Edge {
                capacity,
                max_capacity: capacity,
            },
        );
        self.edits.push(GraphEdit::EdgeAdded {
            from: from.to_owned(),
            to: to.to_owned(),
            capacity,
        });
        debug!("added edge {} -> {} ({})", from, to, capacity);
        Ok(())
    }

    /// Adds `new_id` hanging off `from_id`, creating `from_id` first if needed.
    pub fn add_linked_node(
        &mut self,
        new_id: &str,
        from_id: &str,
        capacity: u64,
    ) -> Result<(), FlowError> {
        if capacity == 0 {
            return Err(FlowError::InvalidEdge {
                from: from_id.to_owned(),
                to: new_id.to_owned(),
                reason: InvalidEdgeReason::NonPositiveCapacity,
            });
        }
        self.add_node(from_id);
        self.add_node(new_id);
        self.add_edge(from_id, new_id, capacity)
    }

    /// Removes a node and all of its edges, returns `false` if there was no such node.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(node) = self.index.remove(id) else {
            return false;
        };
        let edges_removed = self.graph.edges_directed(node, Direction::Outgoing).count()
            + self
                .graph
                .edges_directed(node, Direction::Incoming)
                .filter(|edge| edge.source() != node)
                .count();
        self.graph.remove_node(node);
        self.edits.push(GraphEdit::NodeRemoved {
            id: id.to_owned(),
            edges_removed,
        });
        debug!("removed node {} with {} edges", id, edges_removed);
        true
    }

    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let edge = match (self.index.get(from), self.index.get(to)) {
            (Some(&source), Some(&target)) => self.graph.find_edge(source, target),
            _ => None,
        };
        match edge {
            Some(edge) => {
                self.graph.remove_edge(edge);
                self.edits.push(GraphEdit::EdgeRemoved {
                    from: from.to_owned(),
                    to: to.to_owned(),
                });
                true
            }
            None => false,
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        let source = *self.index.get(from)?;
        let target = *self.index.get(to)?;
        let edge = self.graph.find_edge(source, target)?;
        self.graph.edge_weight(edge)
    }

    pub fn graph(&self) -> &StableDiGraph<Node, Edge> {
        &self.graph
    }

    /// Edits made since the last call.
    pub fn take_edits(&mut self) -> Vec<GraphEdit> {
        std::mem::take(&mut self.edits)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .graph
            .node_indices()
            .map(|node| NodeRecord {
                id: self.graph[node].id.clone(),
            })
            .collect();
        let edges = self
            .graph
            .edge_references()
            .map(|edge| EdgeRecord {
                source: self.graph[edge.source()].id.clone(),
                target: self.graph[edge.target()].id.clone(),
                capacity: edge.weight().capacity,
                max_capacity: edge.weight().max_capacity,
            })
            .collect();
        GraphSnapshot { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::flow::error::{FlowError, InvalidEdgeReason};
    use crate::flow::network::{FlowNetwork, GraphEdit, GraphSnapshot};

    fn two_nodes() -> FlowNetwork {
        let mut network = FlowNetwork::new();
        network.add_node("a");
        network.add_node("b");
        network
    }

    #[test]
    fn add_node_is_a_no_op_for_known_ids() {
        let mut network = two_nodes();
        assert!(!network.add_node("a"));
        assert_eq!(2, network.node_count());
    }

    #[test_case("x", "b", 3, InvalidEdgeReason::MissingSource ; "missing source")]
    #[test_case("a", "x", 3, InvalidEdgeReason::MissingTarget ; "missing target")]
    #[test_case("a", "b", 0, InvalidEdgeReason::NonPositiveCapacity ; "zero capacity")]
    fn rejects_invalid_edges(from: &str, to: &str, capacity: u64, reason: InvalidEdgeReason) {
        let mut network = two_nodes();
        let result = network.add_edge(from, to, capacity);
        assert_eq!(
            Err(FlowError::InvalidEdge {
                from: from.to_owned(),
                to: to.to_owned(),
                reason,
            }),
            result
        );
        assert_eq!(0, network.edge_count());
    }

    #[test]
    fn rejects_duplicate_but_allows_opposite_direction() {
        let mut network = two_nodes();
        network.add_edge("a", "b", 4).unwrap();
        assert!(matches!(
            network.add_edge("a", "b", 7),
            Err(FlowError::InvalidEdge {
                reason: InvalidEdgeReason::Duplicate,
                ..
            })
        ));
        network.add_edge("b", "a", 7).unwrap();
        assert_eq!(2, network.edge_count());
        assert_eq!(4, network.edge("a", "b").unwrap().max_capacity);
    }

    #[test]
    fn removing_a_node_cascades_to_its_edges() {
        let mut network = FlowNetwork::sample();
        assert!(network.remove_node("3"));
        assert_eq!(4, network.node_count());
        // 1->3, 2->3, 3->4, 3->5 are gone
        assert_eq!(4, network.edge_count());
        assert!(network.edge("1", "2").is_some());
        assert!(!network.remove_node("3"));
    }

    #[test]
    fn re_added_node_has_no_edges() {
        let mut network = FlowNetwork::sample();
        network.remove_node("1");
        network.add_node("1");
        assert!(network.contains_node("1"));
        assert!(network.edge("1", "2").is_none());
        let snapshot = network.snapshot();
        assert!(snapshot
            .edges
            .iter()
            .all(|edge| edge.source != "1" && edge.target != "1"));
    }

    #[test]
    fn linked_node_creates_missing_source() {
        let mut network = FlowNetwork::new();
        network.add_linked_node("b", "a", 5).unwrap();
        assert_eq!(2, network.node_count());
        assert_eq!(5, network.edge("a", "b").unwrap().capacity);
    }

    #[test]
    fn edits_are_recorded_in_order() {
        let mut network = two_nodes();
        network.add_edge("a", "b", 2).unwrap();
        network.remove_node("b");
        assert_eq!(
            vec![
                GraphEdit::NodeAdded("a".to_owned()),
                GraphEdit::NodeAdded("b".to_owned()),
                GraphEdit::EdgeAdded {
                    from: "a".to_owned(),
                    to: "b".to_owned(),
                    capacity: 2
                },
                GraphEdit::NodeRemoved {
                    id: "b".to_owned(),
                    edges_removed: 1
                },
            ],
            network.take_edits()
        );
        assert!(network.take_edits().is_empty());
    }

    #[test]
    fn snapshot_reads_the_json_layout() {
        let json = r#"{
            "nodes": [{"id": "1", "distance": 9}, {"id": "2"}, {"id": "1"}],
            "links": [{"source": "1", "target": "2", "capacity": 20, "maxCapacity": 20, "label": "x"}]
        }"#;
        let snapshot: GraphSnapshot = serde_json::from_str(json).unwrap();
        let network = FlowNetwork::from_snapshot(&snapshot).unwrap();
        assert_eq!(2, network.node_count());
        assert_eq!(20, network.edge("1", "2").unwrap().max_capacity);
        assert_eq!(network.snapshot().edges, snapshot.edges);
    }

    #[test]
    fn snapshot_with_dangling_edge_is_rejected() {
        let json = r#"{"nodes": [{"id": "1"}], "links": [{"source": "1", "target": "2", "capacity": 1}]}"#;
        let snapshot: GraphSnapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(
            FlowNetwork::from_snapshot(&snapshot),
            Err(FlowError::InvalidEdge {
                reason: InvalidEdgeReason::MissingTarget,
                ..
            })
        ));
    }

    #[test]
    fn sample_holds_every_edge() {
        let mut network = FlowNetwork::sample();
        assert_eq!(5, network.node_count());
        assert_eq!(8, network.edge_count());
        assert_eq!(10, network.edge("4", "5").unwrap().max_capacity);
        assert!(network.take_edits().is_empty());
    }
}
