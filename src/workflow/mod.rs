//! Workflow layer
//!
//! Decides the order in which services run for one query. Owns no resources.

pub mod case_lookup_flow;
pub mod cause_list_flow;
pub mod submission_loop;

pub use case_lookup_flow::CaseLookupFlow;
pub use cause_list_flow::{CauseListFlow, QueryOutcome};
pub use submission_loop::{
    decide, LoopState, SubmissionRetryLoop, SubmissionSuccess, SubmitOutcome, Transition,
};
