use std::env;
use std::io::Write;
use std::path::PathBuf;

use super::super::error::{Error, Result};
use super::jobs::Status;
use super::Outcome;

/// Arguments handed to a builtin. `args` excludes the builtin's own name.
pub struct Invocation<'a> {
    pub args: &'a [String],
    pub last_status: Status,
}

pub type Builtin = fn(&Invocation, &mut dyn Write) -> Result<Outcome>;

pub fn cd(invocation: &Invocation, _out: &mut dyn Write) -> Result<Outcome> {
    let target = match invocation.args {
        [] => env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or(Error::usage("cd", "HOME not set"))?,
        [path] => PathBuf::from(path),
        _ => return Err(Error::usage("cd", "wrong number of arguments")),
    };
    env::set_current_dir(&target).map_err(|source| Error::ChangeDirectory { path: target, source })?;
    Ok(Outcome::Continue(0))
}

pub fn pwd(invocation: &Invocation, out: &mut dyn Write) -> Result<Outcome> {
    if !invocation.args.is_empty() {
        return Err(Error::usage("pwd", "wrong number of arguments"));
    }
    let cwd = env::current_dir().map_err(|source| Error::WorkingDirectory { source })?;
    writeln!(out, "{}", cwd.display())?;
    Ok(Outcome::Continue(0))
}

pub fn exit(invocation: &Invocation, _out: &mut dyn Write) -> Result<Outcome> {
    match invocation.args {
        [] => Ok(Outcome::Exit(invocation.last_status)),
        [code] => Ok(Outcome::Exit(parse_status(code))),
        _ => Err(Error::usage("exit", "too many arguments")),
    }
}

/// Prints the last status. Querying leaves the status as it was.
pub fn status(invocation: &Invocation, out: &mut dyn Write) -> Result<Outcome> {
    if !invocation.args.is_empty() {
        return Err(Error::usage("$?", "wrong number of arguments"));
    }
    writeln!(out, "{}", invocation.last_status)?;
    Ok(Outcome::Continue(invocation.last_status))
}

/// `atoi`: optional leading whitespace and sign, then as many digits as
/// follow. Anything that does not start like a number is 0.
pub fn parse_status(text: &str) -> Status {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0 as Status, |acc, digit| {
            acc.wrapping_mul(10).wrapping_add(Status::from(digit - b'0'))
        });
    if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn call(builtin: Builtin, args: &str, last_status: Status) -> (Result<Outcome>, String) {
        let args = words(args);
        let mut out = Vec::new();
        let result = builtin(&Invocation { args: &args, last_status }, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parse_status_follows_atoi() {
        assert_eq!(parse_status("7"), 7);
        assert_eq!(parse_status("  42"), 42);
        assert_eq!(parse_status("-3"), -3);
        assert_eq!(parse_status("+5"), 5);
        assert_eq!(parse_status("12abc"), 12);
        assert_eq!(parse_status("abc"), 0);
        assert_eq!(parse_status(""), 0);
        assert_eq!(parse_status("-"), 0);
    }

    #[test]
    fn exit_without_arguments_uses_last_status() {
        let (result, _) = call(exit, "", 3);
        assert!(matches!(result, Ok(Outcome::Exit(3))));
    }

    #[test]
    fn exit_with_code() {
        let (result, _) = call(exit, "7", 0);
        assert!(matches!(result, Ok(Outcome::Exit(7))));
        let (result, _) = call(exit, "abc", 5);
        assert!(matches!(result, Ok(Outcome::Exit(0))));
    }

    #[test]
    fn exit_with_too_many_arguments_continues() {
        let (result, _) = call(exit, "1 2", 0);
        match result {
            Err(error) => assert_eq!(error.to_string(), "exit: too many arguments"),
            Ok(_) => panic!("exit accepted two arguments"),
        }
    }

    #[test]
    fn pwd_prints_working_directory() {
        let (result, out) = call(pwd, "", 0);
        assert!(matches!(result, Ok(Outcome::Continue(0))));
        let cwd = env::current_dir().unwrap();
        assert_eq!(out, format!("{}\n", cwd.display()));
    }

    #[test]
    fn pwd_takes_no_arguments() {
        let (result, out) = call(pwd, "/tmp", 0);
        assert!(matches!(result, Err(Error::Usage { builtin: "pwd", .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn cd_rejects_extra_arguments_without_moving() {
        let before = env::current_dir().unwrap();
        let (result, _) = call(cd, "/ /tmp", 0);
        assert!(matches!(result, Err(Error::Usage { builtin: "cd", .. })));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn cd_reports_missing_directory() {
        let before = env::current_dir().unwrap();
        let (result, _) = call(cd, "/nonexistent/minish-test-dir", 0);
        match result {
            Err(error @ Error::ChangeDirectory { .. }) => {
                assert!(error.to_string().starts_with("cd: /nonexistent/minish-test-dir: "));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn status_query_prints_and_preserves() {
        let (result, out) = call(status, "", 130);
        assert!(matches!(result, Ok(Outcome::Continue(130))));
        assert_eq!(out, "130\n");
    }
}
