//! Placeholder resolution.
//!
//! Variables are looked up, quotes are re-evaluated against the same token
//! table, and parenthesized sub-commands are executed through the dispatcher
//! with output suppressed. A failing sub-command fails the whole evaluation.

use cterm_types::error::{Result, TermError};

use crate::interpreter::{CommandOutput, Terminal};
use crate::tokenizer::{Token, TokenKind, tokenize};

impl Terminal {
    /// Tokenize the raw argument list and resolve every placeholder.
    pub fn tokenize_and_eval(&mut self, args: &[String]) -> Result<Vec<String>> {
        let tokenized = tokenize(&args.join(" "))?;
        self.eval_tokens(&tokenized.args, &tokenized.tokens)
    }

    /// Resolve every placeholder in `args`.
    pub fn eval_tokens(&mut self, args: &[String], tokens: &[Token]) -> Result<Vec<String>> {
        args.iter().map(|arg| self.substitute(arg, tokens)).collect()
    }

    /// Replace placeholders left to right. Inserted values are never scanned
    /// again, so a variable holding placeholder-like text stays literal.
    fn substitute(&mut self, arg: &str, tokens: &[Token]) -> Result<String> {
        let mut out = String::with_capacity(arg.len());
        let mut rest = arg;
        while let Some((pos, token)) = next_placeholder(rest, tokens) {
            out.push_str(&rest[..pos]);
            out.push_str(&self.resolve_token(token, tokens)?);
            rest = &rest[pos + token.placeholder.len()..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn resolve_token(&mut self, token: &Token, tokens: &[Token]) -> Result<String> {
        match token.kind {
            TokenKind::Variable => self
                .session
                .variables
                .get(&token.raw)
                .map(str::to_string)
                .ok_or_else(|| TermError::Reference(token.raw.clone())),
            TokenKind::Quote => {
                let mut value = self.eval_tokens(&[token.raw.clone()], tokens)?;
                Ok(value.pop().unwrap_or_default())
            },
            TokenKind::Paren => {
                let parts: Vec<String> = token.raw.split(' ').map(String::from).collect();
                let command = self.eval_tokens(&parts, tokens)?.join(" ");
                self.eval_expression(&command).map(|out| out.to_string())
            },
        }
    }

    /// Run `command` for its value with output suppressed.
    ///
    /// Fails with a runtime error when the command leaves a non-zero status.
    pub fn eval_expression(&mut self, command: &str) -> Result<CommandOutput> {
        let mut guard = self.suppress_output();
        let out = guard.process_cmd(command);
        if guard.session.status != 0 {
            return Err(TermError::runtime("expression evaluation failed."));
        }
        Ok(out)
    }
}

/// Earliest placeholder in `text` and its token.
fn next_placeholder<'t>(text: &str, tokens: &'t [Token]) -> Option<(usize, &'t Token)> {
    tokens
        .iter()
        .filter_map(|t| text.find(&t.placeholder).map(|pos| (pos, t)))
        .min_by_key(|&(pos, _)| pos)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::terminal;
    use crate::tokenizer::tokenize;
    use cterm_types::error::TermError;

    fn eval(term: &mut crate::Terminal, line: &str) -> Result<Vec<String>, TermError> {
        let t = tokenize(line)?;
        term.eval_tokens(&t.args, &t.tokens)
    }

    #[test]
    fn variables_substitute() {
        let (mut term, _console) = terminal();
        term.session.variables.set("X", "hello");
        assert_eq!(eval(&mut term, "PRINT $X!").unwrap(), vec!["PRINT", "hello!"]);
    }

    #[test]
    fn unbound_variable_is_reference_error() {
        let (mut term, _console) = terminal();
        let err = eval(&mut term, "PRINT $NOPE").unwrap_err();
        assert_eq!(err.to_string(), "Reference error; variable NOPE does not exist.");
    }

    #[test]
    fn variable_values_are_not_retokenized() {
        let (mut term, _console) = terminal();
        term.session.variables.set("X", "(ADD 1 2) $Y");
        assert_eq!(eval(&mut term, "PRINT $X").unwrap(), vec!["PRINT", "(ADD 1 2) $Y"]);
    }

    #[test]
    fn quotes_unwrap_and_resolve_inner_variables() {
        let (mut term, _console) = terminal();
        term.session.variables.set("NAME", "Ada");
        assert_eq!(
            eval(&mut term, "PRINT \"hi $NAME\"").unwrap(),
            vec!["PRINT", "hi Ada"]
        );
    }

    #[test]
    fn paren_runs_subcommand_silently() {
        let (mut term, console) = terminal();
        assert_eq!(eval(&mut term, "X (ADD 2 3)").unwrap(), vec!["X", "5"]);
        assert_eq!(console.output(), "");
        assert!(!term.session.output_suppressed);
    }

    #[test]
    fn nested_parens() {
        let (mut term, _console) = terminal();
        assert_eq!(
            eval(&mut term, "X (ADD (MULTIPLY 2 3) 1)").unwrap(),
            vec!["X", "7"]
        );
    }

    #[test]
    fn paren_with_quoted_text() {
        let (mut term, _console) = terminal();
        assert_eq!(
            eval(&mut term, "X (PRINT \"a b\")").unwrap(),
            vec!["X", "a b"]
        );
    }

    #[test]
    fn failing_paren_is_runtime_error() {
        let (mut term, console) = terminal();
        let err = eval(&mut term, "X (DIVIDE 1 0)").unwrap_err();
        assert_eq!(err.to_string(), "Runtime error; expression evaluation failed.");
        assert_eq!(console.output(), "");
        assert!(!term.session.output_suppressed);
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let (mut term, _console) = terminal();
        term.session.variables.set("X", "%var%1%var%");
        term.session.variables.set("Y", "y");
        assert_eq!(
            eval(&mut term, "PRINT $X$Y").unwrap(),
            vec!["PRINT", "%var%1%var%y"]
        );
    }

    #[test]
    fn placeholder_inside_word() {
        let (mut term, _console) = terminal();
        term.session.variables.set("N", "3");
        assert_eq!(eval(&mut term, "X a$N-b").unwrap(), vec!["X", "a3-b"]);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn evaluation_is_idempotent(
                words in proptest::collection::vec("[A-Za-z0-9.,!?]{1,6}", 1..5),
                quoted in "[A-Za-z0-9 ]{0,12}",
            ) {
                let (mut term, _console) = terminal();
                let line = format!("CMD {} \"{}\"", words.join(" "), quoted);
                let t = tokenize(&line).unwrap();
                let once = term.eval_tokens(&t.args, &t.tokens).unwrap();
                let twice = term.eval_tokens(&once, &t.tokens).unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
