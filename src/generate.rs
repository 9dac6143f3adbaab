use itertools::Itertools;
use log::info;
use petgraph::unionfind::UnionFind;
use rand::Rng;

use crate::flow::FlowNetwork;

const EDGE_PROBABILITY: f64 = 0.7;
const BRIDGE_MAX_CAPACITY: u64 = 10;

/// Random network with nodes `"1"..="node_count"`.
///
/// Each pair of nodes is joined with probability 0.7 in a random direction.
/// Nodes left disconnected from `"1"` (ignoring direction) are then bridged
/// with an edge leaving `"1"`.
pub fn generate_network<R>(node_count: usize, max_capacity: u64, rng: &mut R) -> FlowNetwork
where
    R: Rng + ?Sized,
{
    let ids: Vec<String> = (1..=node_count).map(|i| i.to_string()).collect();
    let max_capacity = max_capacity.max(1);
    let mut network = FlowNetwork::new();
    for id in &ids {
        network.add_node(id);
    }

    let mut components = UnionFind::<usize>::new(node_count);
    for (i, j) in (0..node_count).tuple_combinations() {
        if !rng.gen_bool(EDGE_PROBABILITY) {
            continue;
        }
        let capacity = rng.gen_range(1..=max_capacity);
        let (from, to) = if rng.gen_bool(0.5) { (i, j) } else { (j, i) };
        network
            .add_edge(&ids[from], &ids[to], capacity)
            .expect("each unordered pair is visited once");
        components.union(i, j);
    }

    for i in 1..node_count {
        if !components.equiv(0, i) {
            let capacity = rng.gen_range(1..=BRIDGE_MAX_CAPACITY);
            network
                .add_edge(&ids[0], &ids[i], capacity)
                .expect("nodes in different components share no edge");
            components.union(0, i);
        }
    }

    info!(
        "generated network with {} nodes and {} edges",
        network.node_count(),
        network.edge_count()
    );
    network
}

#[cfg(test)]
mod tests {
    use petgraph::unionfind::UnionFind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    use crate::generate::generate_network;

    #[test_case(0 ; "empty")]
    #[test_case(1 ; "single node")]
    #[test_case(2 ; "pair")]
    #[test_case(10 ; "default size")]
    #[test_case(25 ; "larger")]
    fn generated_network_is_connected(node_count: usize) {
        let mut rng = StdRng::seed_from_u64(node_count as u64);
        let network = generate_network(node_count, 10, &mut rng);
        let snapshot = network.snapshot();

        assert_eq!(node_count, network.node_count());
        let mut components = UnionFind::<usize>::new(node_count);
        for edge in &snapshot.edges {
            let from: usize = edge.source.parse().unwrap();
            let to: usize = edge.target.parse().unwrap();
            components.union(from - 1, to - 1);
        }
        assert!((1..node_count).all(|i| components.equiv(0, i)));
    }

    #[test]
    fn capacities_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let network = generate_network(12, 4, &mut rng);
        for edge in network.snapshot().edges {
            assert!((1..=10).contains(&edge.capacity));
            assert_eq!(edge.capacity, edge.max_capacity);
            assert_ne!(edge.source, edge.target);
        }
    }

    #[test]
    fn same_seed_same_network() {
        let first = generate_network(8, 20, &mut StdRng::seed_from_u64(3)).snapshot();
        let second = generate_network(8, 20, &mut StdRng::seed_from_u64(3)).snapshot();
        assert_eq!(first, second);
    }
}
