use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use eframe::emath::Pos2;
use eframe::{App, CreationContext};
use egui::{Context, DragValue, Ui};
use egui_graphs::{GraphView, SettingsInteraction, SettingsStyle};
use log::{info, warn};
use petgraph::prelude::{NodeIndex, StableDiGraph};
use petgraph::stable_graph::DefaultIx;
use petgraph::Directed;

use crate::flow::{
    CancelToken, Driver, DriverState, FlowError, FlowNetwork, FlowResult, GraphEdit, RunOutcome,
    SleepPacer, Step,
};
use crate::generate::generate_network;
use crate::visualization::edge::{CustomEdgeShape, EdgeData};
use crate::visualization::node::{CustomNodeShape, NodeData};
use crate::visualization::Overlay;

type ViewGraph =
    egui_graphs::Graph<NodeData, EdgeData, Directed, DefaultIx, CustomNodeShape, CustomEdgeShape>;

enum RunMessage {
    Step(Step),
    Done(Result<RunOutcome, FlowError>),
}

/// Run handed to the worker thread.
struct ActiveRun {
    receiver: Receiver<RunMessage>,
    cancel: CancelToken,
}

struct Forms {
    new_node: String,
    link_from: String,
    link_capacity: u64,
    edge_from: String,
    edge_to: String,
    edge_capacity: u64,
    remove_node: String,
    source: String,
    sink: String,
    node_count: usize,
    max_capacity: u64,
}

impl Default for Forms {
    fn default() -> Self {
        Self {
            new_node: String::new(),
            link_from: String::new(),
            link_capacity: 5,
            edge_from: String::new(),
            edge_to: String::new(),
            edge_capacity: 5,
            remove_node: String::new(),
            source: String::new(),
            sink: String::new(),
            node_count: 10,
            max_capacity: 10,
        }
    }
}

pub(crate) struct GraphApp {
    network: FlowNetwork,
    driver: Arc<Driver>,
    graph: ViewGraph,
    graph_ids: HashMap<NodeIndex, String>,
    overlay: Overlay,
    forms: Forms,
    run: Option<ActiveRun>,
    results: Option<FlowResult>,
    status: Option<String>,
}

impl GraphApp {
    pub(crate) fn new(network: FlowNetwork, driver: Arc<Driver>, _: &CreationContext<'_>) -> Self {
        let overlay = Overlay::default();
        let (graph, graph_ids) = generate_graph(&network, &overlay, &HashMap::new());
        Self {
            network,
            driver,
            graph,
            graph_ids,
            overlay,
            forms: Forms::default(),
            run: None,
            results: None,
            status: None,
        }
    }

    fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Rebuilds the drawn graph, keeping nodes where the user left them.
    fn refresh_graph(&mut self) {
        let locations: HashMap<String, Pos2> = self
            .graph
            .nodes_iter()
            .filter_map(|(index, node)| {
                self.graph_ids
                    .get(&index)
                    .map(|id| (id.clone(), node.location()))
            })
            .collect();
        let (graph, graph_ids) = generate_graph(&self.network, &self.overlay, &locations);
        self.graph = graph;
        self.graph_ids = graph_ids;
    }

    fn after_edit(&mut self, result: Result<(), FlowError>) {
        for edit in self.network.take_edits() {
            match edit {
                GraphEdit::NodeAdded(id) => info!("node {} added", id),
                GraphEdit::NodeRemoved { id, edges_removed } => {
                    info!("node {} removed with {} edges", id, edges_removed)
                }
                GraphEdit::EdgeAdded { from, to, capacity } => {
                    info!("edge {} -> {} added with capacity {}", from, to, capacity)
                }
                GraphEdit::EdgeRemoved { from, to } => info!("edge {} -> {} removed", from, to),
            }
        }
        self.status = result.err().map(|error| error.to_string());
        self.overlay = Overlay::default();
        self.results = None;
        self.refresh_graph();
    }

    fn start_run(&mut self, ctx: &Context) {
        if self.is_running() || self.driver.state() == DriverState::Running {
            self.status = Some(FlowError::RunInProgress.to_string());
            return;
        }

        let source = self.forms.source.trim().to_owned();
        let sink = self.forms.sink.trim().to_owned();
        if let Some(unknown) = [&source, &sink]
            .into_iter()
            .find(|id| !self.network.contains_node(id))
        {
            self.status = Some(FlowError::UnknownNode(unknown.clone()).to_string());
            return;
        }

        let cancel = CancelToken::new();
        let run_cancel = cancel.clone();
        let snapshot = self.network.snapshot();
        let driver = Arc::clone(&self.driver);
        let (sender, receiver) = mpsc::channel();
        let ctx = ctx.clone();
        let (run_source, run_sink) = (source.clone(), sink.clone());
        thread::spawn(move || {
            let step_sender = sender.clone();
            let step_ctx = ctx.clone();
            let outcome = driver.run_max_flow(
                &snapshot,
                &run_source,
                &run_sink,
                &run_cancel,
                &mut SleepPacer,
                |step: &Step| {
                    let _ = step_sender.send(RunMessage::Step(step.clone()));
                    step_ctx.request_repaint();
                },
            );
            let _ = sender.send(RunMessage::Done(outcome));
            ctx.request_repaint();
        });

        self.overlay = Overlay::new(&source, &sink);
        self.results = None;
        self.status = Some(format!("running {} -> {}", source, sink));
        self.run = Some(ActiveRun { receiver, cancel });
        self.refresh_graph();
    }

    fn poll_run(&mut self) {
        let Some(ActiveRun { receiver, .. }) = &self.run else {
            return;
        };

        let mut changed = false;
        let mut finished = None;
        loop {
            match receiver.try_recv() {
                Ok(RunMessage::Step(step)) => {
                    self.overlay.apply(&step);
                    changed = true;
                }
                Ok(RunMessage::Done(outcome)) => {
                    finished = Some(outcome);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("max-flow worker stopped without a result");
                    finished = Some(Ok(RunOutcome::Cancelled));
                    break;
                }
            }
        }

        if let Some(outcome) = finished {
            self.run = None;
            match outcome {
                Ok(RunOutcome::Finished(result)) => {
                    self.status = Some(format!("maximum flow {}", result.max_flow));
                    self.results = Some(result);
                }
                Ok(RunOutcome::Cancelled) => {
                    self.status = Some("run cancelled".to_owned());
                }
                Err(error) => {
                    // partial highlights are not a result
                    self.overlay = Overlay::default();
                    self.status = Some(error.to_string());
                    changed = true;
                }
            }
        }

        if changed {
            self.refresh_graph();
        }
    }

    fn edit_panel(&mut self, ui: &mut Ui) {
        ui.heading("Network");

        ui.label("Add node");
        ui.horizontal(|ui| {
            ui.label("id");
            ui.text_edit_singleline(&mut self.forms.new_node);
        });
        ui.horizontal(|ui| {
            ui.label("from");
            ui.text_edit_singleline(&mut self.forms.link_from);
        });
        ui.add(
            DragValue::new(&mut self.forms.link_capacity)
                .clamp_range(1..=1000)
                .prefix("capacity "),
        );
        if ui.button("Add node").clicked() {
            let new_node = self.forms.new_node.trim().to_owned();
            let link_from = self.forms.link_from.trim().to_owned();
            if !new_node.is_empty() && !link_from.is_empty() {
                let result =
                    self.network
                        .add_linked_node(&new_node, &link_from, self.forms.link_capacity);
                self.forms.new_node.clear();
                self.forms.link_from.clear();
                self.after_edit(result);
            }
        }
        ui.separator();

        ui.label("Add edge");
        ui.horizontal(|ui| {
            ui.label("from");
            ui.text_edit_singleline(&mut self.forms.edge_from);
        });
        ui.horizontal(|ui| {
            ui.label("to");
            ui.text_edit_singleline(&mut self.forms.edge_to);
        });
        ui.add(
            DragValue::new(&mut self.forms.edge_capacity)
                .clamp_range(1..=1000)
                .prefix("capacity "),
        );
        if let Some(edge) = self
            .network
            .edge(self.forms.edge_from.trim(), self.forms.edge_to.trim())
        {
            ui.label(format!("existing capacity {}", edge.max_capacity));
        }
        ui.horizontal(|ui| {
            if ui.button("Add edge").clicked() {
                let result = self.network.add_edge(
                    self.forms.edge_from.trim(),
                    self.forms.edge_to.trim(),
                    self.forms.edge_capacity,
                );
                self.after_edit(result);
            }
            if ui.button("Remove edge").clicked() {
                let (from, to) = (self.forms.edge_from.trim(), self.forms.edge_to.trim());
                if self.network.remove_edge(from, to) {
                    self.after_edit(Ok(()));
                } else {
                    self.status = Some(format!("no edge {} -> {}", from, to));
                }
            }
        });
        ui.separator();

        ui.label("Remove node");
        ui.text_edit_singleline(&mut self.forms.remove_node);
        if ui.button("Remove").clicked() {
            let id = self.forms.remove_node.trim().to_owned();
            if self.network.remove_node(&id) {
                self.forms.remove_node.clear();
                self.after_edit(Ok(()));
            } else {
                self.status = Some(FlowError::UnknownNode(id).to_string());
            }
        }
        ui.separator();

        ui.label("Random network");
        ui.add(
            DragValue::new(&mut self.forms.node_count)
                .clamp_range(2..=50)
                .prefix("nodes "),
        );
        ui.add(
            DragValue::new(&mut self.forms.max_capacity)
                .clamp_range(1..=1000)
                .prefix("max capacity "),
        );
        if ui.button("Generate").clicked() {
            self.network = generate_network(
                self.forms.node_count,
                self.forms.max_capacity,
                &mut rand::thread_rng(),
            );
            self.after_edit(Ok(()));
        }
    }

    fn run_panel(&mut self, ui: &mut Ui) {
        ui.heading("Maximum flow");
        ui.horizontal(|ui| {
            ui.label("source");
            ui.text_edit_singleline(&mut self.forms.source);
        });
        ui.horizontal(|ui| {
            ui.label("sink");
            ui.text_edit_singleline(&mut self.forms.sink);
        });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.is_running(), egui::Button::new("Run"))
                .clicked()
            {
                self.start_run(ui.ctx());
            }
            if ui
                .add_enabled(self.is_running(), egui::Button::new("Cancel"))
                .clicked()
            {
                if let Some(run) = &self.run {
                    run.cancel.cancel();
                }
            }
        });

        if let Some(status) = &self.status {
            ui.label(status.as_str());
        }

        if let Some(results) = &self.results {
            ui.separator();
            ui.label(format!("Maximum flow: {}", results.max_flow));
            ui.label("Paths:");
            for augmentation in &results.paths {
                ui.label(format!(
                    "{} ({})",
                    augmentation.path.join(" -> "),
                    augmentation.flow
                ));
            }
            ui.label("Minimum cut:");
            for (from, to) in &results.cut.edges {
                ui.label(format!("{} -> {}", from, to));
            }
        }
    }
}

impl Drop for GraphApp {
    fn drop(&mut self) {
        // the worker must not keep animating a closed window
        self.driver.cancel_run();
    }
}

impl App for GraphApp {
    fn update(&mut self, ctx: &Context, _: &mut eframe::Frame) {
        self.poll_run();

        egui::SidePanel::left("controls").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let running = self.is_running();
                ui.add_enabled_ui(!running, |ui| self.edit_panel(ui));
                ui.separator();
                self.run_panel(ui);
            });
        });

        let settings_style = &SettingsStyle::new().with_labels_always(true);
        let interaction_settings = &SettingsInteraction::new()
            .with_dragging_enabled(true)
            .with_node_clicking_enabled(true)
            .with_node_selection_enabled(true);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add(
                &mut GraphView::<_, _, _, _, CustomNodeShape, CustomEdgeShape>::new(
                    &mut self.graph,
                )
                .with_styles(settings_style)
                .with_interactions(interaction_settings),
            );
        });
    }
}

fn generate_graph(
    network: &FlowNetwork,
    overlay: &Overlay,
    locations: &HashMap<String, Pos2>,
) -> (ViewGraph, HashMap<NodeIndex, String>) {
    let source = network.graph();
    let g: StableDiGraph<NodeData, EdgeData> = source.map(
        |_, node| NodeData::new(&node.id, overlay.node_role(&node.id)),
        |edge_index, edge| {
            let (from, to) = source
                .edge_endpoints(edge_index)
                .map(|(from, to)| (source[from].id.as_str(), source[to].id.as_str()))
                .unwrap_or_default();
            EdgeData::new(
                overlay.edge_label(from, to, edge.max_capacity),
                overlay.edge_highlight(from, to),
            )
        },
    );

    let ids: HashMap<NodeIndex, String> = g
        .node_indices()
        .map(|index| (index, source[index].id.clone()))
        .collect();

    let mut graph: ViewGraph = egui_graphs::Graph::from(&g);
    for (index, id) in &ids {
        if let (Some(location), Some(node)) = (locations.get(id), graph.node_mut(*index)) {
            node.set_location(*location);
        }
    }

    (graph, ids)
}
