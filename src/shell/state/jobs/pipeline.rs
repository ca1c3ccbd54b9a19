use std::os::fd::{AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{close, dup2, pipe};
use tracing::{debug, warn};

use super::super::super::error::{Error, Result};
use super::super::super::syntax::ast::Command;
use super::{Job, Status};

/// One command of a pipeline together with the pipe ends it touches.
struct Stage<'a> {
    command: Command<'a>,
    /// Read end of the pipe from the previous stage.
    input: Option<OwnedFd>,
    /// Write end of the pipe to the next stage.
    output: Option<OwnedFd>,
    /// Read end of the pipe to the next stage; kept by the controller for the
    /// next stage, closed in this stage's child.
    downstream: Option<&'a OwnedFd>,
}

impl<'a> Stage<'a> {
    /// Forks the stage. The controller's copies of `input` and `output` are
    /// closed when this returns, whether or not the fork succeeded.
    fn spawn(self) -> Result<Job> {
        let Stage {
            command,
            input,
            output,
            downstream,
        } = self;
        Job::spawn(&command, || {
            wire(input.as_ref(), output.as_ref(), downstream)
        })
    }
}

// Runs in the child: stdin from the previous pipe, stdout into the next, and
// every pipe end closed once it sits in its standard slot.
fn wire(
    input: Option<&OwnedFd>,
    output: Option<&OwnedFd>,
    downstream: Option<&OwnedFd>,
) -> nix::Result<()> {
    if let Some(fd) = input {
        dup2(fd.as_raw_fd(), STDIN_FILENO)?;
        close(fd.as_raw_fd())?;
    }
    if let Some(fd) = output {
        dup2(fd.as_raw_fd(), STDOUT_FILENO)?;
        close(fd.as_raw_fd())?;
    }
    if let Some(fd) = downstream {
        close(fd.as_raw_fd())?;
    }
    Ok(())
}

/// Runs `commands` as one pipeline and returns the status of the last stage.
///
/// All stages are forked before any is waited for. If a pipe or fork fails
/// part-way, the stages already running are still waited for before the
/// error is returned, and no pipe descriptor outlives this call.
pub fn run_pipeline(commands: &[Command]) -> Result<Status> {
    let mut jobs: Vec<Job> = Vec::with_capacity(commands.len());
    let mut upstream: Option<OwnedFd> = None;
    let mut failure: Option<Error> = None;

    for (index, command) in commands.iter().enumerate() {
        let last = index + 1 == commands.len();
        let (downstream, output) = if last {
            (None, None)
        } else {
            match pipe() {
                Ok((reader, writer)) => (Some(reader), Some(writer)),
                Err(errno) => {
                    failure = Some(Error::resource("pipe", errno));
                    break;
                }
            }
        };
        let stage = Stage {
            command: *command,
            input: upstream.take(),
            output,
            downstream: downstream.as_ref(),
        };
        match stage.spawn() {
            Ok(job) => {
                debug!(stage = index, pid = job.pid().as_raw(), "pipeline stage started");
                jobs.push(job);
            }
            Err(error) => {
                failure = Some(error);
                break;
            }
        }
        upstream = downstream;
    }
    drop(upstream);

    let mut last_status = None;
    for job in jobs.iter_mut() {
        match job.wait() {
            Ok(status) => last_status = Some(status),
            Err(error) => {
                warn!(pid = job.pid().as_raw(), %error, "could not collect pipeline stage");
                failure.get_or_insert(error);
            }
        }
    }

    match failure {
        Some(error) => Err(error),
        None => last_status.ok_or_else(|| Error::resource("waitpid", Errno::ECHILD)),
    }
}
