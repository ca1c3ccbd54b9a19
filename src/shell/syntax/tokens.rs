use std::fmt;

/// The literal token that queries the last status.
pub const STATUS_QUERY: &str = "$?";

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Operator {
    Pipe,
    Input,
    Output,
}

impl Operator {
    /// Operators are only recognized as whole tokens.
    pub fn parse(token: &str) -> Option<Operator> {
        match token {
            "|" => Some(Operator::Pipe),
            "<" => Some(Operator::Input),
            ">" => Some(Operator::Output),
            _ => None,
        }
    }

    pub fn is_redirection(self) -> bool {
        self != Operator::Pipe
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Pipe => "|",
            Operator::Input => "<",
            Operator::Output => ">",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
