use std::ffi::CString;

use super::super::error::{Error, Result};

/// One process image: a non-empty view over the tokens of a line.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Command<'a> {
    argv: &'a [String],
}

impl<'a> Command<'a> {
    pub fn new(argv: &'a [String]) -> Option<Command<'a>> {
        if argv.is_empty() {
            None
        } else {
            Some(Command { argv })
        }
    }

    pub fn program(&self) -> &'a str {
        &self.argv[0]
    }

    pub fn argv(&self) -> &'a [String] {
        self.argv
    }

    /// The argument vector in the form `execvp` wants.
    pub fn to_cstrings(&self) -> Result<Vec<CString>> {
        self.argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()).map_err(|_| Error::NulByte(self.program().to_string())))
            .collect()
    }
}

/// Files that replace the standard streams of a single, non-piped command.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct Redirection<'a> {
    pub input: Option<&'a str>,
    pub output: Option<&'a str>,
}
