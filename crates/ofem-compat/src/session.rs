use std::path::{Path, PathBuf};

use ofem_io::{ArchiveError, compress_job, extract_job};
use thiserror::Error;
use tracing::{info, warn};

use crate::bridge::{NativeRoutine, NativeSolver, Status};
use crate::capture::capture_output;
use crate::options::{PostprocessRequest, SolveOptions};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The solver finished but its files could not be archived. They are
    /// left on disk.
    #[error("{status} but archiving failed: {source}")]
    Archive {
        status: Status,
        #[source]
        source: ArchiveError,
    },

    #[error("cannot restore job files: {0}")]
    Extract(#[source] ArchiveError),
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Status of the last routine called.
    pub status: Status,
    /// The routine that returned `status`.
    pub routine: NativeRoutine,
    pub output: Vec<String>,
    pub archive: Option<PathBuf>,
}

/// Strip a `.gldat` extension, giving the job base path the solver expects.
pub fn job_base(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("gldat") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

/// Drives one job through the native solver. Calls are made once, with no
/// retry.
pub struct SolverSession<S> {
    solver: S,
    job: PathBuf,
}

impl<S: NativeSolver> SolverSession<S> {
    /// `job` may be the base path or the `.gldat` deck path.
    pub fn new(solver: S, job: impl AsRef<Path>) -> Self {
        Self {
            solver,
            job: job_base(job),
        }
    }

    pub fn job(&self) -> &Path {
        &self.job
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn into_solver(self) -> S {
        self.solver
    }

    /// Prepare and solve, then archive the job. A failed prepare returns its
    /// status without solving. When a failed solve cannot be archived, its
    /// files stay on disk and the report carries no archive.
    pub fn run(&mut self, options: &SolveOptions) -> Result<RunReport, SessionError> {
        let Self { solver, job } = self;
        let job = job.as_path();
        info!(job = %job.display(), algorithm = ?options.algorithm, "solving");

        let (status, mut output) = capture_output(NativeRoutine::Prepare, |out| solver.prepare(job, out));
        if !status.is_success() {
            warn!(%status, "prepare failed, not solving");
            return Ok(RunReport {
                status,
                routine: NativeRoutine::Prepare,
                output,
                archive: None,
            });
        }

        let (status, solve_output) = capture_output(NativeRoutine::Solve, |out| {
            solver.solve(job, options.algorithm, options.convergence, out)
        });
        output.extend(solve_output);

        let archive = match compress_job(job) {
            Ok(path) => Some(path),
            Err(source) if status.is_success() => {
                return Err(SessionError::Archive { status, source });
            }
            Err(source) => {
                warn!(%status, error = %source, "solve failed, job files left unarchived");
                None
            }
        };
        Ok(RunReport {
            status,
            routine: NativeRoutine::Solve,
            output,
            archive,
        })
    }

    /// Restore the archived job, post-process it and archive it again,
    /// together with the files the post-processor produced.
    pub fn postprocess(&mut self, request: &PostprocessRequest) -> Result<RunReport, SessionError> {
        let Self { solver, job } = self;
        let job = job.as_path();
        extract_job(job).map_err(SessionError::Extract)?;
        info!(job = %job.display(), code = request.code.code(), "post-processing");

        let (status, output) = capture_output(NativeRoutine::Postprocess, |out| {
            solver.postprocess(job, request, out)
        });
        if !status.is_success() {
            warn!(%status, "post-process failed");
        }

        let archive = compress_job(job).map_err(|source| SessionError::Archive { status, source })?;
        Ok(RunReport {
            status,
            routine: NativeRoutine::Postprocess,
            output,
            archive: Some(archive),
        })
    }
}
