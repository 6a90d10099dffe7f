//! Boundary to the native solver library.
//!
//! This crate provides:
//! - the [`NativeSolver`] trait over the prepare, solve and post-process
//!   routines, and a closure-backed [`RoutineTable`]
//! - console capture that forwards routine output to `tracing`
//! - validation of the solve and post-process keyword options
//! - [`SolverSession`], which runs a job and keeps its `.ofem` archive current

mod bridge;
mod capture;
pub mod options;
mod session;

pub use bridge::{
    NativeRoutine, NativeSolver, PostprocessRoutine, PrepareRoutine, RoutineTable, SolveRoutine,
    Status,
};
pub use capture::{CHANNEL_CAPACITY, OutputSink, capture_output};
pub use options::{
    LoadSelection, NodalStress, OptionWarning, PostprocessRequest, RawPostprocess, ResultCode,
    SolveAlgorithm, SolveOptions, Validated, log_warnings,
};
pub use session::{RunReport, SessionError, SolverSession, job_base};
