use std::ffi::CString;
use std::io::{self, Write};
use std::process;

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};
use tracing::{debug, trace};

use super::super::error::{Error, Result};
use super::super::signals::{self, Interrupts};
use super::super::syntax::ast::Command;

pub mod pipeline;
pub mod redirect;

/// Exit status in the shell sense: 0 is success, `128 + n` is death by signal `n`.
pub type Status = i32;

pub const STATUS_FAILURE: Status = 1;
/// Exec failed for a reason other than a missing program.
pub const STATUS_NOT_EXECUTABLE: Status = 126;
pub const STATUS_NOT_FOUND: Status = 127;
const SIGNAL_OFFSET: Status = 128;

/// A forked child and, once waited for, its terminal status.
#[derive(Debug)]
pub struct Job {
    pid: Pid,
    status: Option<Status>,
}

impl Job {
    /// Forks a child that runs `setup` and then execs `command`.
    ///
    /// A failed fork is returned here. A program that cannot be loaded is
    /// reported by the child itself, which then exits with
    /// [`STATUS_NOT_FOUND`] or [`STATUS_NOT_EXECUTABLE`].
    pub fn spawn<F>(command: &Command, setup: F) -> Result<Job>
    where
        F: FnOnce() -> nix::Result<()>,
    {
        let argv = command.to_cstrings()?;
        // The child gets a copy of anything still buffered.
        io::stdout().flush()?;
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = child.as_raw(), argv = ?command.argv(), "forked");
                Ok(Job {
                    pid: child,
                    status: None,
                })
            }
            Ok(ForkResult::Child) => exec_child(&argv, setup),
            Err(errno) => Err(Error::resource("fork", errno)),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Blocks until the child terminates.
    pub fn wait(&mut self) -> Result<Status> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        loop {
            match waitpid(self.pid, None) {
                Ok(wait_status) => {
                    trace!(?wait_status, "waited");
                    if let Some(status) = status_of(wait_status) {
                        self.status = Some(status);
                        return Ok(status);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(Error::resource("waitpid", errno)),
            }
        }
    }
}

/// Collapses a termination report into a single status.
pub fn status_of(wait_status: WaitStatus) -> Option<Status> {
    match wait_status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(SIGNAL_OFFSET + signal as Status),
        _ => None,
    }
}

/// Forks, execs and waits for a single command with the controller's current
/// descriptors.
pub fn launch(command: &Command) -> Result<Status> {
    let mut job = Job::spawn(command, || Ok(()))?;
    job.wait()
}

fn exec_child<F>(argv: &[CString], setup: F) -> !
where
    F: FnOnce() -> nix::Result<()>,
{
    let program = argv[0].to_string_lossy().into_owned();
    let prepared = Interrupts::Default
        .apply()
        .and_then(|()| signals::restore_broken_pipe())
        .and_then(|()| setup());
    if let Err(errno) = prepared {
        eprintln!("{}: {}", program, errno.desc());
        process::exit(STATUS_FAILURE);
    }
    let errno = match execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    eprintln!("{}: {}", program, errno.desc());
    process::exit(exec_failure_status(errno))
}

fn exec_failure_status(errno: Errno) -> Status {
    match errno {
        Errno::ENOENT | Errno::ENOTDIR => STATUS_NOT_FOUND,
        _ => STATUS_NOT_EXECUTABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    #[test]
    fn normal_exit_keeps_its_code() {
        let pid = Pid::from_raw(42);
        assert_eq!(status_of(WaitStatus::Exited(pid, 0)), Some(0));
        assert_eq!(status_of(WaitStatus::Exited(pid, 7)), Some(7));
    }

    #[test]
    fn death_by_signal_is_offset() {
        let pid = Pid::from_raw(42);
        assert_eq!(
            status_of(WaitStatus::Signaled(pid, Signal::SIGINT, false)),
            Some(130)
        );
        assert_eq!(
            status_of(WaitStatus::Signaled(pid, Signal::SIGKILL, true)),
            Some(137)
        );
    }

    #[test]
    fn stops_are_not_terminal() {
        let pid = Pid::from_raw(42);
        assert_eq!(status_of(WaitStatus::Stopped(pid, Signal::SIGTSTP)), None);
        assert_eq!(status_of(WaitStatus::StillAlive), None);
    }

    #[test]
    fn exec_failures_are_distinguished() {
        assert_eq!(exec_failure_status(Errno::ENOENT), STATUS_NOT_FOUND);
        assert_eq!(exec_failure_status(Errno::EACCES), STATUS_NOT_EXECUTABLE);
        assert_eq!(exec_failure_status(Errno::ENOEXEC), STATUS_NOT_EXECUTABLE);
    }
}
