use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

/// How SIGINT is treated by the current process.
///
/// The controller applies `Ignore` whenever it goes idle so that ^C never
/// kills the interpreter itself; every child applies `Default` right after
/// fork, before loading its program, so ^C stops the running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupts {
    Ignore,
    Default,
}

impl Interrupts {
    pub fn apply(self) -> nix::Result<()> {
        let handler = match self {
            Interrupts::Ignore => SigHandler::SigIgn,
            Interrupts::Default => SigHandler::SigDfl,
        };
        let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
        // Only SIG_IGN and SIG_DFL are installed, never a Rust handler.
        unsafe { sigaction(Signal::SIGINT, &action) }?;
        Ok(())
    }
}

/// Puts SIGPIPE back to its default in a child. The Rust runtime starts with
/// it ignored, and an ignored disposition survives exec.
pub fn restore_broken_pipe() -> nix::Result<()> {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(Signal::SIGPIPE, &action) }?;
    Ok(())
}
