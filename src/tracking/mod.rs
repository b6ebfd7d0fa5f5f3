pub mod record;
pub mod sink;

pub use record::{Artifact, ParamValue, RunRecord};
pub use sink::{ExperimentSink, FileExperimentSink, InMemoryExperimentSink};
