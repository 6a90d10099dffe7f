use std::fmt::{Display, Formatter};
use std::path::Path;

use tracing::error;

use crate::capture::OutputSink;
use crate::options::{PostprocessRequest, SolveAlgorithm};

/// Return code of a native routine. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    pub const OK: Status = Status(0);
    /// Returned when no routine is bound for a call.
    pub const UNAVAILABLE: Status = Status(-1);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}", self.0)
    }
}

/// The three entry points of the native solver library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NativeRoutine {
    Prepare,
    Solve,
    Postprocess,
}

impl NativeRoutine {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Prepare => "prefemixlib",
            Self::Solve => "femixlib",
            Self::Postprocess => "posfemixlib",
        }
    }
}

impl Display for NativeRoutine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The native solver as seen from Rust. Each call receives the job base path
/// (without extension) and a sink for the routine's console output.
pub trait NativeSolver {
    fn prepare(&mut self, job: &Path, output: &OutputSink) -> Status;

    fn solve(
        &mut self,
        job: &Path,
        algorithm: SolveAlgorithm,
        convergence: f64,
        output: &OutputSink,
    ) -> Status;

    fn postprocess(&mut self, job: &Path, request: &PostprocessRequest, output: &OutputSink)
    -> Status;
}

pub type PrepareRoutine = Box<dyn FnMut(&Path, &OutputSink) -> Status>;
pub type SolveRoutine = Box<dyn FnMut(&Path, SolveAlgorithm, f64, &OutputSink) -> Status>;
pub type PostprocessRoutine = Box<dyn FnMut(&Path, &PostprocessRequest, &OutputSink) -> Status>;

/// A [`NativeSolver`] made of closures, one per routine. Calls to a routine
/// that was never bound return [`Status::UNAVAILABLE`].
#[derive(Default)]
pub struct RoutineTable {
    prepare: Option<PrepareRoutine>,
    solve: Option<SolveRoutine>,
    postprocess: Option<PostprocessRoutine>,
}

impl RoutineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_prepare(mut self, routine: impl FnMut(&Path, &OutputSink) -> Status + 'static) -> Self {
        self.prepare = Some(Box::new(routine));
        self
    }

    pub fn on_solve(
        mut self,
        routine: impl FnMut(&Path, SolveAlgorithm, f64, &OutputSink) -> Status + 'static,
    ) -> Self {
        self.solve = Some(Box::new(routine));
        self
    }

    pub fn on_postprocess(
        mut self,
        routine: impl FnMut(&Path, &PostprocessRequest, &OutputSink) -> Status + 'static,
    ) -> Self {
        self.postprocess = Some(Box::new(routine));
        self
    }

    pub fn is_bound(&self, routine: NativeRoutine) -> bool {
        match routine {
            NativeRoutine::Prepare => self.prepare.is_some(),
            NativeRoutine::Solve => self.solve.is_some(),
            NativeRoutine::Postprocess => self.postprocess.is_some(),
        }
    }
}

fn unavailable(routine: NativeRoutine) -> Status {
    error!(routine = routine.symbol(), "native routine is not bound");
    Status::UNAVAILABLE
}

impl NativeSolver for RoutineTable {
    fn prepare(&mut self, job: &Path, output: &OutputSink) -> Status {
        match self.prepare.as_mut() {
            Some(routine) => routine(job, output),
            None => unavailable(NativeRoutine::Prepare),
        }
    }

    fn solve(
        &mut self,
        job: &Path,
        algorithm: SolveAlgorithm,
        convergence: f64,
        output: &OutputSink,
    ) -> Status {
        match self.solve.as_mut() {
            Some(routine) => routine(job, algorithm, convergence, output),
            None => unavailable(NativeRoutine::Solve),
        }
    }

    fn postprocess(
        &mut self,
        job: &Path,
        request: &PostprocessRequest,
        output: &OutputSink,
    ) -> Status {
        match self.postprocess.as_mut() {
            Some(routine) => routine(job, request, output),
            None => unavailable(NativeRoutine::Postprocess),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture_output;

    #[test]
    fn bound_routines_are_called() {
        let mut table = RoutineTable::new().on_solve(|job, algorithm, convergence, out| {
            out.write_line(format!("{} {} {convergence}", job.display(), algorithm.flag()));
            Status(if algorithm == SolveAlgorithm::Direct { 0 } else { 3 })
        });
        assert!(table.is_bound(NativeRoutine::Solve));
        assert!(!table.is_bound(NativeRoutine::Prepare));

        let (status, lines) = capture_output(NativeRoutine::Solve, |out| {
            table.solve(Path::new("jobs/slab"), SolveAlgorithm::Direct, 1e-6, out)
        });
        assert!(status.is_success());
        assert_eq!(lines, vec!["jobs/slab d 0.000001".to_string()]);

        let (status, _) = capture_output(NativeRoutine::Solve, |out| {
            table.solve(Path::new("jobs/slab"), SolveAlgorithm::Iterative, 1e-6, out)
        });
        assert_eq!(status, Status(3));
        assert_eq!(status.to_string(), "status 3");
    }

    #[test]
    fn unbound_routines_are_unavailable() {
        let mut table = RoutineTable::new().on_prepare(|_, _| Status::OK);
        assert!(table.is_bound(NativeRoutine::Prepare));
        assert!(!table.is_bound(NativeRoutine::Postprocess));

        let request = PostprocessRequest::default();
        let (status, lines) = capture_output(NativeRoutine::Postprocess, |out| {
            table.postprocess(Path::new("job"), &request, out)
        });
        assert_eq!(status, Status::UNAVAILABLE);
        assert!(lines.is_empty());
        assert_eq!(NativeRoutine::Postprocess.to_string(), "posfemixlib");
    }
}
