mod app;
mod edge;
mod node;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use eframe::run_native;
use egui::{Style, Visuals};
use itertools::Itertools;

use crate::flow::{Driver, EdgeFlow, FlowNetwork, MinCut, Step};
use crate::visualization::app::GraphApp;
use crate::visualization::edge::EdgeHighlight;
use crate::visualization::node::NodeRole;

/// What the last published steps of a run paint over the network.
#[derive(Debug, Default)]
pub(crate) struct Overlay {
    source: String,
    sink: String,
    path_nodes: HashSet<String>,
    path_edges: HashSet<(String, String)>,
    cut: MinCut,
    /// Flow and capacity per edge.
    flows: HashMap<(String, String), (u64, u64)>,
}

impl Overlay {
    pub(crate) fn new(source: &str, sink: &str) -> Self {
        Self {
            source: source.to_owned(),
            sink: sink.to_owned(),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&mut self, step: &Step) {
        match step {
            Step::PathHighlighted { path, .. } => {
                self.cut = MinCut::default();
                self.path_nodes = path.iter().cloned().collect();
                self.path_edges = path
                    .iter()
                    .cloned()
                    .tuple_windows()
                    .collect();
            }
            Step::ResidualUpdated { edges, .. } => {
                self.flows = edges
                    .iter()
                    .map(|edge: &EdgeFlow| {
                        (
                            (edge.from.clone(), edge.to.clone()),
                            (edge.flow(), edge.max_capacity),
                        )
                    })
                    .collect();
            }
            Step::CutHighlighted { cut } => {
                self.path_nodes.clear();
                self.path_edges.clear();
                self.cut = cut.clone();
            }
        }
    }

    pub(crate) fn node_role(&self, id: &str) -> NodeRole {
        if id == self.source {
            NodeRole::Source
        } else if id == self.sink {
            NodeRole::Sink
        } else if self.path_nodes.contains(id) {
            NodeRole::OnPath
        } else {
            NodeRole::Other
        }
    }

    pub(crate) fn edge_highlight(&self, from: &str, to: &str) -> EdgeHighlight {
        if self.cut.contains(from, to) {
            EdgeHighlight::Cut
        } else if self.path_edges.contains(&(from.to_owned(), to.to_owned())) {
            EdgeHighlight::Path
        } else {
            EdgeHighlight::None
        }
    }

    /// `flow/capacity` once a run reported flows, the plain capacity before.
    pub(crate) fn edge_label(&self, from: &str, to: &str, capacity: u64) -> String {
        match self.flows.get(&(from.to_owned(), to.to_owned())) {
            Some((flow, max_capacity)) => format!("{}/{}", flow, max_capacity),
            None => capacity.to_string(),
        }
    }
}

pub fn draw_network(network: FlowNetwork, driver: Arc<Driver>) -> Result<(), eframe::Error> {
    let native_options = eframe::NativeOptions::default();
    run_native(
        "Max Flow Visualizer",
        native_options,
        Box::new(|cc| {
            // Set to dark mode always
            let style = Style {
                visuals: Visuals::dark(),
                ..Style::default()
            };
            cc.egui_ctx.set_style(style);
            Box::new(GraphApp::new(network, driver, cc))
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::flow::{EdgeFlow, MinCut, Step};
    use crate::visualization::edge::EdgeHighlight;
    use crate::visualization::node::NodeRole;
    use crate::visualization::Overlay;

    fn path_step(path: &[&str]) -> Step {
        Step::PathHighlighted {
            path: path.iter().map(|id| id.to_string()).collect(),
            flow: 1,
        }
    }

    #[test]
    fn path_highlights_consecutive_pairs_only() {
        let mut overlay = Overlay::new("1", "5");
        overlay.apply(&path_step(&["1", "2", "3", "5"]));

        assert_eq!(EdgeHighlight::Path, overlay.edge_highlight("2", "3"));
        assert_eq!(EdgeHighlight::None, overlay.edge_highlight("3", "2"));
        assert_eq!(EdgeHighlight::None, overlay.edge_highlight("1", "3"));
        assert_eq!(NodeRole::Source, overlay.node_role("1"));
        assert_eq!(NodeRole::OnPath, overlay.node_role("3"));
        assert_eq!(NodeRole::Other, overlay.node_role("4"));
    }

    #[test]
    fn cut_replaces_path() {
        let mut overlay = Overlay::new("1", "5");
        overlay.apply(&path_step(&["1", "4", "5"]));
        overlay.apply(&Step::CutHighlighted {
            cut: MinCut {
                reachable: vec!["1".to_owned()],
                edges: vec![("1".to_owned(), "4".to_owned())],
                capacity: 3,
            },
        });

        assert_eq!(EdgeHighlight::Cut, overlay.edge_highlight("1", "4"));
        assert_eq!(EdgeHighlight::None, overlay.edge_highlight("4", "5"));
        assert_eq!(NodeRole::Other, overlay.node_role("4"));
    }

    #[test]
    fn labels_switch_to_flow_after_update() {
        let mut overlay = Overlay::default();
        assert_eq!("20", overlay.edge_label("1", "2", 20));

        overlay.apply(&Step::ResidualUpdated {
            total_flow: 5,
            edges: vec![EdgeFlow {
                from: "1".to_owned(),
                to: "2".to_owned(),
                remaining: 15,
                max_capacity: 20,
            }],
        });
        assert_eq!("5/20", overlay.edge_label("1", "2", 20));
    }
}
