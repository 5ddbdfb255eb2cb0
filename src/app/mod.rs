mod report;
mod run;
mod sequencer;

pub use report::report;
pub use run::{run_bootstrap, Invocation};
pub use sequencer::{ProvisioningSequencer, SequenceOutcome, Step};
