mod cut;
mod driver;
mod error;
mod matrix;
mod network;
mod path;
mod residual;

pub use cut::MinCut;
pub use driver::{
    CancelToken, Driver, DriverConfig, DriverState, FlowResult, RunOutcome, SleepPacer, Step,
};
pub use error::FlowError;
pub use matrix::EdgeFlow;
pub use network::{FlowNetwork, GraphEdit};
