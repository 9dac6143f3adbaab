use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::flow::cut::{extract, MinCut};
use crate::flow::error::FlowError;
use crate::flow::matrix::{EdgeFlow, ResidualGraph};
use crate::flow::network::GraphSnapshot;
use crate::flow::path::find_path;
use crate::flow::residual::augment;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    PathHighlighted,
    ResidualUpdated,
    CutHighlighted,
}

/// State published to the display while a run advances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The augmenting path just found, and the flow it carries.
    PathHighlighted { path: Vec<String>, flow: u64 },
    /// Flow on every edge after the last augmentation.
    ResidualUpdated {
        total_flow: u64,
        edges: Vec<EdgeFlow>,
    },
    CutHighlighted { cut: MinCut },
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::PathHighlighted { .. } => StepKind::PathHighlighted,
            Step::ResidualUpdated { .. } => StepKind::ResidualUpdated,
            Step::CutHighlighted { .. } => StepKind::CutHighlighted,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Augmentation {
    pub path: Vec<String>,
    pub flow: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowResult {
    pub max_flow: u64,
    /// Augmenting paths in the order they were found.
    pub paths: Vec<Augmentation>,
    pub cut: MinCut,
    /// Final flow on every edge of the network.
    pub edges: Vec<EdgeFlow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Finished(FlowResult),
    /// Stopped at a pause. Steps published before stay valid, no result exists.
    Cancelled,
}

/// Waits between two published steps.
pub trait Pacer {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the calling thread for the whole pause.
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    /// Pause after a path is highlighted.
    pub path_pause: Duration,
    /// Pause after edge flows are updated.
    pub residual_pause: Duration,
    /// Pause after the cut is highlighted.
    pub cut_pause: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            path_pause: Duration::from_millis(500),
            residual_pause: Duration::from_millis(1000),
            cut_pause: Duration::from_millis(1000),
        }
    }
}

/// Cancels the one run it was handed to.
///
/// A token cancelled before its run starts makes that run stop before
/// publishing anything.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Whether a run is in progress.
///
/// A run leaves `Running` for `Idle` whether it succeeded, was cancelled or
/// failed. How it ended is told by the return value of
/// [`Driver::run_max_flow`], not by the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

struct RunningGuard<'a>(&'a Driver);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.0.active() = None;
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// Runs max-flow computations one at a time, publishing every step.
///
/// A run publishes a highlighted path and the updated edge flows for every
/// augmentation, then the minimum cut, pausing after each publication.
/// Cancellation is only looked at after a pause, so a path search that has
/// started always completes.
#[derive(Debug, Default)]
pub struct Driver {
    config: DriverConfig,
    running: AtomicBool,
    /// Token of the run in progress.
    active: Mutex<Option<CancelToken>>,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
            active: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn state(&self) -> DriverState {
        match self.running.load(Ordering::SeqCst) {
            true => DriverState::Running,
            false => DriverState::Idle,
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<CancelToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels the run in progress, if any.
    pub fn cancel_run(&self) {
        if let Some(cancel) = self.active().as_ref() {
            info!("cancelling max-flow run");
            cancel.cancel();
        }
    }

    /// Computes maximum flow and minimum cut from `source` to `sink` on `graph`.
    ///
    /// The run stops at the first pause after `cancel` fires, or right away when
    /// it fired already. Fails with [`FlowError::RunInProgress`] while another
    /// run is active. Any other error aborts the run; the steps already
    /// published must not be taken as a final state.
    pub fn run_max_flow<P, O>(
        &self,
        graph: &GraphSnapshot,
        source: &str,
        sink: &str,
        cancel: &CancelToken,
        pacer: &mut P,
        mut on_step: O,
    ) -> Result<RunOutcome, FlowError>
    where
        P: Pacer + ?Sized,
        O: FnMut(&Step),
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("rejected max-flow run {} -> {}: already running", source, sink);
            return Err(FlowError::RunInProgress);
        }
        *self.active() = Some(cancel.clone());
        let _running = RunningGuard(self);

        let result = match cancel.is_cancelled() {
            true => Ok(RunOutcome::Cancelled),
            false => self.run(graph, source, sink, cancel, pacer, &mut on_step),
        };
        match &result {
            Ok(RunOutcome::Finished(result)) => info!(
                "max-flow run {} -> {} finished: flow {} over {} paths",
                source,
                sink,
                result.max_flow,
                result.paths.len()
            ),
            Ok(RunOutcome::Cancelled) => info!("max-flow run {} -> {} cancelled", source, sink),
            Err(error) => warn!("max-flow run {} -> {} aborted: {}", source, sink, error),
        }
        result
    }

    fn run<P, O>(
        &self,
        graph: &GraphSnapshot,
        source: &str,
        sink: &str,
        cancel: &CancelToken,
        pacer: &mut P,
        on_step: &mut O,
    ) -> Result<RunOutcome, FlowError>
    where
        P: Pacer + ?Sized,
        O: FnMut(&Step),
    {
        let mut residual = ResidualGraph::from_snapshot(graph)?;
        let source_index = residual
            .index_of(source)
            .ok_or_else(|| FlowError::UnknownNode(source.to_owned()))?;
        let sink_index = residual
            .index_of(sink)
            .ok_or_else(|| FlowError::UnknownNode(sink.to_owned()))?;
        info!(
            "max-flow run {} -> {} on {} nodes and {} edges",
            source,
            sink,
            residual.node_count(),
            graph.edges.len()
        );

        if source_index == sink_index {
            return Ok(RunOutcome::Finished(FlowResult {
                max_flow: 0,
                paths: vec![],
                cut: MinCut::default(),
                edges: residual.edge_flows(),
            }));
        }

        let mut max_flow: u64 = 0;
        let mut paths = vec![];
        while let Some(path) = find_path(&residual, source_index, sink_index) {
            let flow = augment(&mut residual, &path)?;
            max_flow = max_flow
                .checked_add(flow)
                .ok_or(FlowError::CapacityOverflow)?;
            let path = residual.ids(&path);
            debug!("augmenting path {:?} carries {}", path, flow);
            paths.push(Augmentation {
                path: path.clone(),
                flow,
            });

            publish(on_step, Step::PathHighlighted { path, flow });
            if suspend(pacer, cancel, self.config.path_pause) {
                return Ok(RunOutcome::Cancelled);
            }
            publish(
                on_step,
                Step::ResidualUpdated {
                    total_flow: max_flow,
                    edges: residual.edge_flows(),
                },
            );
            if suspend(pacer, cancel, self.config.residual_pause) {
                return Ok(RunOutcome::Cancelled);
            }
        }

        let cut = extract(&residual, source_index)?;
        debug!("minimum cut {:?}", cut.edges);
        publish(on_step, Step::CutHighlighted { cut: cut.clone() });
        if suspend(pacer, cancel, self.config.cut_pause) {
            return Ok(RunOutcome::Cancelled);
        }

        Ok(RunOutcome::Finished(FlowResult {
            max_flow,
            paths,
            cut,
            edges: residual.edge_flows(),
        }))
    }
}

fn publish<O: FnMut(&Step)>(on_step: &mut O, step: Step) {
    debug!("publishing {:?}", step.kind());
    on_step(&step);
}

/// Pauses and reports whether the run was cancelled meanwhile.
fn suspend<P: Pacer + ?Sized>(pacer: &mut P, cancel: &CancelToken, duration: Duration) -> bool {
    pacer.pause(duration);
    cancel.is_cancelled()
}
