mod error;
mod signals;
mod state;
mod syntax;

use std::io::{self, BufRead, Write};

use nix::libc::STDIN_FILENO;
use tracing::{debug, warn};

use self::signals::Interrupts;
use self::state::jobs::{Status, STATUS_FAILURE};
use self::state::{Outcome, ShellState};

pub struct Shell {
    state: ShellState,
}

/// Whether commands come from a person at a terminal, in which case a prompt
/// is shown.
pub fn stdin_is_terminal() -> bool {
    nix::unistd::isatty(STDIN_FILENO).unwrap_or(false)
}

impl Shell {
    pub fn new() -> Self {
        Shell {
            state: ShellState::new(),
        }
    }

    /// Reads and runs lines until end of input or `exit`, returning the status
    /// the interpreter should exit with.
    pub fn run<R: BufRead>(&mut self, mut input: R, interactive: bool) -> io::Result<Status> {
        let mut status: Status = 0;
        let mut line = Vec::new();
        loop {
            if let Err(errno) = Interrupts::Ignore.apply() {
                warn!(%errno, "could not ignore SIGINT");
            }
            if interactive {
                print!("$ ");
                io::stdout().flush()?;
            }
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\n', '\r']);
            let tokens = match syntax::lexer::tokenize(text) {
                Ok(tokens) => tokens,
                Err(e) => {
                    eprintln!("{}", error::Error::from(e));
                    status = STATUS_FAILURE;
                    continue;
                }
            };
            if tokens.is_empty() {
                continue;
            }
            match self.state.dispatch(&tokens, status) {
                Outcome::Continue(next) => status = next,
                Outcome::Exit(code) => {
                    debug!(code, "exit requested");
                    return Ok(code);
                }
            }
        }
        if interactive {
            println!();
        }
        Ok(status)
    }
}
