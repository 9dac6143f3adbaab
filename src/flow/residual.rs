use itertools::Itertools;

use crate::flow::error::FlowError;
use crate::flow::matrix::ResidualGraph;

/// Pushes the bottleneck flow of `path` through the residual graph and returns it.
///
/// Every pair on the path loses the bottleneck in forward direction and gains it
/// in reverse direction. Nothing is written unless every pair can carry a
/// positive bottleneck and take it in reverse, so a failed call leaves
/// `residual` untouched.
pub fn augment(residual: &mut ResidualGraph, path: &[usize]) -> Result<u64, FlowError> {
    if path.len() < 2 {
        return Err(FlowError::EmptyPath {
            path: residual.ids(path),
        });
    }

    let pairs: Vec<(usize, usize)> = path.iter().copied().tuple_windows().collect();
    let forward = |from: usize, to: usize| residual.residual(from, to).unwrap_or(0);
    let flow = pairs
        .iter()
        .map(|&(from, to)| forward(from, to))
        .min()
        .unwrap_or(0);

    let mut updates = Vec::with_capacity(pairs.len());
    for &(from, to) in &pairs {
        let remaining = forward(from, to);
        match remaining.checked_sub(flow) {
            Some(left) if remaining > 0 => {
                let reverse = residual
                    .residual(to, from)
                    .unwrap_or(0)
                    .checked_add(flow)
                    .ok_or(FlowError::CapacityOverflow)?;
                updates.push((from, to, left, reverse));
            }
            _ => {
                return Err(FlowError::NegativeResidual {
                    path: residual.ids(path),
                    from: residual.id(from).to_owned(),
                    to: residual.id(to).to_owned(),
                    residual: remaining,
                    flow,
                });
            }
        }
    }

    for (from, to, left, reverse) in updates {
        residual.set_residual(from, to, left);
        residual.set_residual(to, from, reverse);
    }
    Ok(flow)
}

#[cfg(test)]
mod tests {
    use crate::flow::error::FlowError;
    use crate::flow::matrix::ResidualGraph;
    use crate::flow::network::FlowNetwork;
    use crate::flow::residual::augment;

    fn sample_residual() -> ResidualGraph {
        ResidualGraph::from_snapshot(&FlowNetwork::sample().snapshot()).unwrap()
    }

    fn path(residual: &ResidualGraph, ids: &[&str]) -> Vec<usize> {
        ids.iter()
            .map(|id| residual.index_of(id).unwrap())
            .collect()
    }

    #[test]
    fn pushes_bottleneck_and_opens_reverse_edges() {
        let mut residual = sample_residual();
        let path = path(&residual, &["1", "2", "3", "5"]);

        assert_eq!(Ok(20), augment(&mut residual, &path));
        assert_eq!(Some(0), residual.residual(path[0], path[1]));
        assert_eq!(Some(20), residual.residual(path[1], path[0]));
        assert_eq!(Some(20), residual.residual(path[1], path[2]));
        assert_eq!(Some(10), residual.residual(path[2], path[3]));
        assert_eq!(Some(20), residual.residual(path[3], path[2]));
        // the reverse cell is not mistaken for an edge of the network
        assert!(!residual.cell(path[1], path[0]).unwrap().is_original());
    }

    #[test]
    fn short_paths_are_rejected() {
        let mut residual = sample_residual();
        assert_eq!(
            Err(FlowError::EmptyPath {
                path: vec!["1".to_owned()]
            }),
            augment(&mut residual, &[0])
        );
        assert!(matches!(
            augment(&mut residual, &[]),
            Err(FlowError::EmptyPath { .. })
        ));
    }

    #[test]
    fn saturated_pair_aborts_without_writing() {
        let mut residual = sample_residual();
        let first = path(&residual, &["1", "4", "5"]);
        assert_eq!(Ok(10), augment(&mut residual, &first));

        let second = path(&residual, &["1", "4", "5"]);
        let result = augment(&mut residual, &second);
        assert_eq!(
            Err(FlowError::NegativeResidual {
                path: vec!["1".to_owned(), "4".to_owned(), "5".to_owned()],
                from: "4".to_owned(),
                to: "5".to_owned(),
                residual: 0,
                flow: 0,
            }),
            result
        );
        assert_eq!(Some(20), residual.residual(first[0], first[1]));
    }

    #[test]
    fn missing_pair_aborts() {
        let mut residual = sample_residual();
        let path = path(&residual, &["5", "1"]);
        assert!(matches!(
            augment(&mut residual, &path),
            Err(FlowError::NegativeResidual { residual: 0, .. })
        ));
        assert_eq!(None, residual.residual(path[0], path[1]));
    }

    #[test]
    fn overflowing_reverse_residual_aborts_without_writing() {
        let mut network = FlowNetwork::new();
        network.add_node("a");
        network.add_node("b");
        network.add_edge("a", "b", 5).unwrap();
        network.add_edge("b", "a", u64::MAX).unwrap();
        let mut residual = ResidualGraph::from_snapshot(&network.snapshot()).unwrap();
        let path = path(&residual, &["a", "b"]);

        assert_eq!(Err(FlowError::CapacityOverflow), augment(&mut residual, &path));
        assert_eq!(Some(5), residual.residual(path[0], path[1]));
        assert_eq!(Some(u64::MAX), residual.residual(path[1], path[0]));
    }
}
