use nom::branch::alt;
use nom::bytes::complete::{is_not, take_while1};
use nom::character::complete::{anychar, char, multispace0, multispace1};
use nom::combinator::{all_consuming, map, opt};
use nom::multi::{many0, many1, separated_list0};
use nom::sequence::{delimited, preceded};
use nom::IResult;

use super::super::error::LexError;

fn is_bare_char(c: char) -> bool {
    !c.is_whitespace() && c != '\'' && c != '"' && c != '\\'
}

fn bare(input: &str) -> IResult<&str, String> {
    map(take_while1(is_bare_char), String::from)(input)
}

fn escaped(input: &str) -> IResult<&str, String> {
    map(preceded(char('\\'), anychar), String::from)(input)
}

fn single_quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('\''), opt(is_not("'")), char('\'')),
        |inner: Option<&str>| inner.unwrap_or_default().to_string(),
    )(input)
}

// Inside double quotes only `\"` and `\\` are escapes; any other
// backslash is kept as written.
fn double_quoted_escape(input: &str) -> IResult<&str, String> {
    map(preceded(char('\\'), anychar), |c| match c {
        '"' | '\\' => c.to_string(),
        other => format!("\\{}", other),
    })(input)
}

fn double_quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            many0(alt((map(is_not("\"\\"), String::from), double_quoted_escape))),
            char('"'),
        ),
        |parts: Vec<String>| parts.concat(),
    )(input)
}

fn word(input: &str) -> IResult<&str, String> {
    map(
        many1(alt((bare, escaped, single_quoted, double_quoted))),
        |parts: Vec<String>| parts.concat(),
    )(input)
}

fn line(input: &str) -> IResult<&str, Vec<String>> {
    all_consuming(delimited(
        multispace0,
        separated_list0(multispace1, word),
        multispace0,
    ))(input)
}

/// Splits one input line into the flat token sequence the dispatcher works on.
///
/// Quotes and escapes are resolved here; words that resolve to nothing are
/// dropped so that no token is ever empty.
pub fn tokenize(input: &str) -> Result<Vec<String>, LexError> {
    match line(input) {
        Ok((_, words)) => Ok(words.into_iter().filter(|w| !w.is_empty()).collect()),
        Err(_) => Err(LexError::Unbalanced),
    }
}
