use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use super::syntax::tokens::Operator;

/// Malformed operator placement, detected before any process is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unexpected `{0}` at start of command")]
    LeadingOperator(Operator),
    #[error("unexpected `{0}` at end of command")]
    TrailingOperator(Operator),
    #[error("unexpected `{1}` after `{0}`")]
    AdjacentOperators(Operator, Operator),
    #[error("{operators} operator(s) cannot join {commands} command(s)")]
    OperatorCount { operators: usize, commands: usize },
    #[error("missing file name after `{0}`")]
    MissingTarget(Operator),
    #[error("more than one `{0}` redirection")]
    DuplicateRedirection(Operator),
    #[error("unexpected `{0}` after redirection")]
    TrailingWord(String),
    #[error("redirection is not supported inside a pipeline")]
    RedirectionInPipeline,
    #[error("empty command")]
    EmptyCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated quote or trailing escape")]
    Unbalanced,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("syntax error: {0}")]
    Lex(#[from] LexError),
    #[error("{call}: {}", .source.desc())]
    Resource {
        call: &'static str,
        #[source]
        source: Errno,
    },
    #[error("{path}: {}", .source.desc())]
    Open {
        path: String,
        #[source]
        source: Errno,
    },
    #[error("{0}: argument contains a NUL byte")]
    NulByte(String),
    #[error("{builtin}: {reason}")]
    Usage {
        builtin: &'static str,
        reason: &'static str,
    },
    #[error("cd: {}: {source}", .path.display())]
    ChangeDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pwd: {source}")]
    WorkingDirectory {
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn resource(call: &'static str, source: Errno) -> Self {
        Error::Resource { call, source }
    }

    pub fn usage(builtin: &'static str, reason: &'static str) -> Self {
        Error::Usage { builtin, reason }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
