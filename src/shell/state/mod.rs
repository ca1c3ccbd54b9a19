use std::collections::HashMap;
use std::io::{self, Write};

use tracing::debug;

use super::error::{Result, SyntaxError};
use super::syntax::ast::Command;
use super::syntax::parser;
use super::syntax::tokens::{Operator, STATUS_QUERY};
use self::builtins::{Builtin, Invocation};
use self::jobs::pipeline::run_pipeline;
use self::jobs::redirect::ExecutionContext;
use self::jobs::{launch, Status, STATUS_FAILURE};

pub mod builtins;
pub mod jobs;

/// What the caller should do after a command line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading; the status becomes the new last status.
    Continue(Status),
    /// Stop the interpreter with this status.
    Exit(Status),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Builtin,
    Piped,
    Redirected,
    Plain,
}

pub struct ShellState {
    builtins: HashMap<&'static str, Builtin>,
}

impl ShellState {
    pub fn new() -> Self {
        let mut s = ShellState {
            builtins: HashMap::new(),
        };
        s.builtins.insert("cd", builtins::cd);
        s.builtins.insert("pwd", builtins::pwd);
        s.builtins.insert("exit", builtins::exit);
        s.builtins.insert(STATUS_QUERY, builtins::status);
        s
    }

    /// Runs one tokenized command line.
    ///
    /// Every failure is reported on stderr and turned into a status here, so
    /// the caller only ever sees an [`Outcome`].
    pub fn dispatch(&self, tokens: &[String], last_status: Status) -> Outcome {
        if tokens.is_empty() {
            return Outcome::Continue(last_status);
        }
        let route = self.route(tokens);
        debug!(?route, program = %tokens[0], "dispatching");
        let result = match route {
            Route::Builtin => self.run_builtin(tokens, last_status),
            Route::Piped => run_piped(tokens).map(Outcome::Continue),
            Route::Redirected => run_redirected(tokens).map(Outcome::Continue),
            Route::Plain => run_plain(tokens).map(Outcome::Continue),
        };
        match result {
            Ok(outcome) => outcome,
            Err(error) => {
                eprintln!("{}", error);
                Outcome::Continue(STATUS_FAILURE)
            }
        }
    }

    fn route(&self, tokens: &[String]) -> Route {
        if is_echo_status(tokens) || self.builtins.contains_key(tokens[0].as_str()) {
            return Route::Builtin;
        }
        let operators: Vec<Operator> = tokens.iter().filter_map(|t| Operator::parse(t)).collect();
        if operators.contains(&Operator::Pipe) {
            Route::Piped
        } else if operators.iter().any(|op| op.is_redirection()) {
            Route::Redirected
        } else {
            Route::Plain
        }
    }

    fn run_builtin(&self, tokens: &[String], last_status: Status) -> Result<Outcome> {
        let echo_status = is_echo_status(tokens);
        let builtin: Builtin = if echo_status {
            builtins::status
        } else {
            self.builtins[tokens[0].as_str()]
        };
        let args: &[String] = if echo_status { &[] } else { &tokens[1..] };
        let invocation = Invocation { args, last_status };
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let outcome = builtin(&invocation, &mut out)?;
        out.flush()?;
        Ok(outcome)
    }
}

/// `echo $?` is answered in-process, like a bare `$?`.
fn is_echo_status(tokens: &[String]) -> bool {
    matches!(tokens, [echo, query] if echo == "echo" && query == STATUS_QUERY)
}

fn run_piped(tokens: &[String]) -> Result<Status> {
    parser::validate(tokens)?;
    let stages = parser::split_pipeline(tokens)?;
    let _context = ExecutionContext::enter()?;
    run_pipeline(&stages)
}

fn run_redirected(tokens: &[String]) -> Result<Status> {
    parser::validate(tokens)?;
    let (command, redirection) = parser::resolve_redirections(tokens)?;
    let context = ExecutionContext::enter()?;
    context.redirect(&redirection)?;
    launch(&command)
}

fn run_plain(tokens: &[String]) -> Result<Status> {
    let command = Command::new(tokens).ok_or(SyntaxError::EmptyCommand)?;
    let _context = ExecutionContext::enter()?;
    launch(&command)
}
