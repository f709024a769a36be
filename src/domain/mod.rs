pub mod outcome;
pub mod reference;

pub use outcome::{FetchOutcome, OutcomeStatus, RunSummary, Strategy};
pub use reference::Reference;
