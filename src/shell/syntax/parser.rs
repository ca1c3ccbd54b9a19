use super::super::error::SyntaxError;
use super::ast::{Command, Redirection};
use super::tokens::Operator;

/// Checks the placement of `|`, `<` and `>` across a whole line.
///
/// Every operator must sit between two commands: never first, never last,
/// never next to another operator, and the number of operators must be one
/// less than the number of command groups (maximal runs of plain words).
pub fn validate(tokens: &[String]) -> Result<(), SyntaxError> {
    let mut operators = 0;
    let mut commands = 0;
    let mut previous: Option<Option<Operator>> = None;
    for (index, token) in tokens.iter().enumerate() {
        let current = Operator::parse(token);
        match current {
            Some(op) => {
                if index == 0 {
                    return Err(SyntaxError::LeadingOperator(op));
                }
                if index == tokens.len() - 1 {
                    return Err(SyntaxError::TrailingOperator(op));
                }
                if let Some(Some(prev)) = previous {
                    return Err(SyntaxError::AdjacentOperators(prev, op));
                }
                operators += 1;
            }
            None => {
                if !matches!(previous, Some(None)) {
                    commands += 1;
                }
            }
        }
        previous = Some(current);
    }
    if !tokens.is_empty() && operators + 1 != commands {
        return Err(SyntaxError::OperatorCount { operators, commands });
    }
    Ok(())
}

/// Splits a validated line on `|` into its stages.
pub fn split_pipeline(tokens: &[String]) -> Result<Vec<Command<'_>>, SyntaxError> {
    tokens
        .split(|token| Operator::parse(token) == Some(Operator::Pipe))
        .map(|argv| {
            if argv.iter().any(|token| Operator::parse(token).is_some()) {
                return Err(SyntaxError::RedirectionInPipeline);
            }
            Command::new(argv).ok_or(SyntaxError::EmptyCommand)
        })
        .collect()
}

/// Separates a non-piped line into its command and the files named by its
/// `<` and `>` operators. The command's argv ends at the first operator.
pub fn resolve_redirections(
    tokens: &[String],
) -> Result<(Command<'_>, Redirection<'_>), SyntaxError> {
    let end = tokens
        .iter()
        .position(|token| Operator::parse(token).is_some())
        .unwrap_or(tokens.len());
    let mut redirection = Redirection::default();
    let mut rest = tokens[end..].iter();
    while let Some(token) = rest.next() {
        let op = match Operator::parse(token) {
            Some(op) => op,
            None => return Err(SyntaxError::TrailingWord(token.clone())),
        };
        let target = match rest.next() {
            Some(target) if Operator::parse(target).is_none() => target.as_str(),
            _ => return Err(SyntaxError::MissingTarget(op)),
        };
        let slot = match op {
            Operator::Input => &mut redirection.input,
            Operator::Output => &mut redirection.output,
            Operator::Pipe => return Err(SyntaxError::RedirectionInPipeline),
        };
        if slot.replace(target).is_some() {
            return Err(SyntaxError::DuplicateRedirection(op));
        }
    }
    match Command::new(&tokens[..end]) {
        Some(command) => Ok((command, redirection)),
        None => match tokens.first().and_then(|t| Operator::parse(t)) {
            Some(op) => Err(SyntaxError::LeadingOperator(op)),
            None => Err(SyntaxError::EmptyCommand),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn check(line: &str) -> Result<(), SyntaxError> {
        validate(&words(line))
    }

    #[test]
    fn accepts_well_formed_lines() {
        assert_eq!(check("ls"), Ok(()));
        assert_eq!(check("ls -l /tmp"), Ok(()));
        assert_eq!(check("ls -l | wc -l"), Ok(()));
        assert_eq!(check("cat a | sort | uniq -c | head -n 3"), Ok(()));
        assert_eq!(check("sort < in.txt > out.txt"), Ok(()));
        assert_eq!(check("echo hello > out.txt"), Ok(()));
        assert_eq!(check(""), Ok(()));
    }

    #[test]
    fn rejects_operator_at_either_edge() {
        assert_eq!(check("| wc"), Err(SyntaxError::LeadingOperator(Operator::Pipe)));
        assert_eq!(check("> out"), Err(SyntaxError::LeadingOperator(Operator::Output)));
        assert_eq!(check("ls |"), Err(SyntaxError::TrailingOperator(Operator::Pipe)));
        assert_eq!(check("cat <"), Err(SyntaxError::TrailingOperator(Operator::Input)));
    }

    #[test]
    fn rejects_lone_operator() {
        assert_eq!(check("|"), Err(SyntaxError::LeadingOperator(Operator::Pipe)));
        assert_eq!(check("<"), Err(SyntaxError::LeadingOperator(Operator::Input)));
    }

    #[test]
    fn rejects_adjacent_operators() {
        assert_eq!(
            check("ls | | wc"),
            Err(SyntaxError::AdjacentOperators(Operator::Pipe, Operator::Pipe))
        );
        assert_eq!(
            check("ls > | wc"),
            Err(SyntaxError::AdjacentOperators(Operator::Output, Operator::Pipe))
        );
        assert_eq!(
            check("cat < > x"),
            Err(SyntaxError::AdjacentOperators(Operator::Input, Operator::Output))
        );
    }

    #[test]
    fn splits_pipeline_into_stages() {
        let tokens = words("cat notes.txt | sort -r | head -n 1");
        let stages = split_pipeline(&tokens).unwrap();
        let argvs: Vec<&[String]> = stages.iter().map(|c| c.argv()).collect();
        assert_eq!(argvs.len(), 3);
        assert_eq!(argvs[0], &tokens[0..2]);
        assert_eq!(argvs[1], &tokens[3..5]);
        assert_eq!(argvs[2], &tokens[6..9]);
        assert_eq!(stages[2].program(), "head");
    }

    #[test]
    fn pipeline_stages_cannot_redirect() {
        let tokens = words("ls | wc > out.txt");
        assert_eq!(split_pipeline(&tokens), Err(SyntaxError::RedirectionInPipeline));
    }

    #[test]
    fn pipeline_stages_are_not_empty() {
        let tokens = words("ls | | wc");
        assert_eq!(split_pipeline(&tokens), Err(SyntaxError::EmptyCommand));
    }

    #[test]
    fn resolves_output_redirection() {
        let tokens = words("echo hello > out.txt");
        let (command, redirection) = resolve_redirections(&tokens).unwrap();
        assert_eq!(command.argv(), &tokens[0..2]);
        assert_eq!(redirection.output, Some("out.txt"));
        assert_eq!(redirection.input, None);
    }

    #[test]
    fn resolves_both_directions() {
        let tokens = words("sort -u < in.txt > out.txt");
        let (command, redirection) = resolve_redirections(&tokens).unwrap();
        assert_eq!(command.argv(), &tokens[0..2]);
        assert_eq!(redirection.input, Some("in.txt"));
        assert_eq!(redirection.output, Some("out.txt"));
    }

    #[test]
    fn redirection_needs_a_file_name() {
        let tokens = words("cat <");
        assert_eq!(
            resolve_redirections(&tokens),
            Err(SyntaxError::MissingTarget(Operator::Input))
        );
        let tokens = words("cat > < in");
        assert_eq!(
            resolve_redirections(&tokens),
            Err(SyntaxError::MissingTarget(Operator::Output))
        );
    }

    #[test]
    fn redirection_rejects_garbage() {
        let tokens = words("cat < in.txt extra");
        assert_eq!(
            resolve_redirections(&tokens),
            Err(SyntaxError::TrailingWord("extra".to_string()))
        );
        let tokens = words("echo a > one > two");
        assert_eq!(
            resolve_redirections(&tokens),
            Err(SyntaxError::DuplicateRedirection(Operator::Output))
        );
        let tokens = words("> out");
        assert_eq!(
            resolve_redirections(&tokens),
            Err(SyntaxError::LeadingOperator(Operator::Output))
        );
    }
}
