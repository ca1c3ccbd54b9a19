use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::dup2;
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use tracing::{error, trace};

use super::super::super::error::{Error, Result};
use super::super::super::syntax::ast::Redirection;

/// Saved copies land above the standard descriptors.
const FIRST_SAVED_FD: RawFd = 3;

/// A standard descriptor slot whose original target is put back on drop.
struct SavedDescriptor {
    slot: RawFd,
    saved: OwnedFd,
}

impl SavedDescriptor {
    fn save(slot: RawFd) -> Result<SavedDescriptor> {
        // close-on-exec, so launched programs never inherit the copy
        let raw = fcntl(slot, FcntlArg::F_DUPFD_CLOEXEC(FIRST_SAVED_FD))
            .map_err(|errno| Error::resource("dup", errno))?;
        trace!(slot, saved = raw, "saved descriptor");
        Ok(SavedDescriptor {
            slot,
            saved: unsafe { OwnedFd::from_raw_fd(raw) },
        })
    }

    /// Points the slot at `fd`; `fd` itself is closed on return.
    fn replace_with(&self, fd: OwnedFd) -> Result<()> {
        dup2(fd.as_raw_fd(), self.slot).map_err(|errno| Error::resource("dup2", errno))?;
        trace!(slot = self.slot, "redirected descriptor");
        Ok(())
    }
}

impl Drop for SavedDescriptor {
    fn drop(&mut self) {
        if let Err(errno) = dup2(self.saved.as_raw_fd(), self.slot) {
            error!(slot = self.slot, %errno, "failed to restore descriptor");
            eprintln!("dup2: failed to restore descriptor {}: {}", self.slot, errno.desc());
        }
        trace!(slot = self.slot, "restored descriptor");
    }
}

/// The controller's standard input and output for the length of one external
/// invocation. Both are restored, and the saved copies closed, when the
/// context is dropped, whichever way the invocation ends.
pub struct ExecutionContext {
    stdin: SavedDescriptor,
    stdout: SavedDescriptor,
}

impl ExecutionContext {
    pub fn enter() -> Result<ExecutionContext> {
        io::stdout().flush()?;
        Ok(ExecutionContext {
            stdin: SavedDescriptor::save(STDIN_FILENO)?,
            stdout: SavedDescriptor::save(STDOUT_FILENO)?,
        })
    }

    /// Opens the named files and points the controller's own stdin and stdout
    /// at them, so that the next launched child inherits them.
    ///
    /// The input file is opened first: a missing input never truncates the
    /// output file.
    pub fn redirect(&self, redirection: &Redirection) -> Result<()> {
        let input = redirection.input.map(open_input).transpose()?;
        let output = redirection.output.map(open_output).transpose()?;
        if let Some(fd) = input {
            self.stdin.replace_with(fd)?;
        }
        if let Some(fd) = output {
            self.stdout.replace_with(fd)?;
        }
        Ok(())
    }
}

fn open_input(path: &str) -> Result<OwnedFd> {
    open_owned(path, OFlag::O_RDONLY, Mode::empty())
}

fn open_output(path: &str) -> Result<OwnedFd> {
    open_owned(
        path,
        OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
        Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH,
    )
}

fn open_owned(path: &str, flags: OFlag, mode: Mode) -> Result<OwnedFd> {
    let raw = open(path, flags | OFlag::O_CLOEXEC, mode).map_err(|source| Error::Open {
        path: path.to_string(),
        source,
    })?;
    trace!(path, fd = raw, "opened");
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}
