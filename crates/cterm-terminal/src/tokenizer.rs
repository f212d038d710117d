//! Placeholder tokenizer for command lines.
//!
//! Three passes run in a fixed order, each replacing what it finds with a
//! unique placeholder so later passes never look inside it:
//!
//! 1. `$name` variable references become `%var%N%var%`.
//! 2. `"..."` spans (non-greedy, no escapes) become `%quote%N%quote%`.
//! 3. `(...)` spans without a nested `(` become `%paren%N%paren%`, repeated
//!    until none are left, so nesting resolves from the inside out.
//!
//! The rewritten line is then split on single spaces.

use cterm_types::error::{Result, TermError};

/// What a placeholder stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Variable,
    Quote,
    Paren,
}

impl TokenKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Variable => "var",
            Self::Quote => "quote",
            Self::Paren => "paren",
        }
    }
}

/// One extracted span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Marker substituted into the line.
    pub placeholder: String,
    /// Span content without its delimiters (variable name without `$`).
    pub raw: String,
    pub kind: TokenKind,
}

impl Token {
    fn new(kind: TokenKind, index: usize, raw: &str) -> Self {
        let tag = kind.tag();
        Self {
            placeholder: format!("%{tag}%{index}%{tag}%"),
            raw: raw.to_string(),
            kind,
        }
    }
}

/// A tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenized {
    /// Placeholder-substituted arguments; index 0 is the command word.
    pub args: Vec<String>,
    /// Tokens ordered parens first, then quotes, then variables.
    pub tokens: Vec<Token>,
}

/// Tokenize a raw command line.
///
/// Fails only on unbalanced quotes or parentheses. Unbound variables are not
/// an error here; they fail during evaluation.
pub fn tokenize(input: &str) -> Result<Tokenized> {
    let (line, vars) = extract_vars(input);
    let (line, quotes) = extract_quotes(&line)?;
    let (line, parens) = extract_parens(&line)?;

    let mut tokens = parens;
    tokens.extend(quotes);
    tokens.extend(vars);

    Ok(Tokenized {
        args: line.split(' ').map(String::from).collect(),
        tokens,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn extract_vars(input: &str) -> (String, Vec<Token>) {
    let mut out = String::with_capacity(input.len());
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .find(|c: char| !is_word_char(c))
            .unwrap_or(after.len());
        if name_len == 0 {
            out.push('$');
        } else {
            let token = Token::new(TokenKind::Variable, tokens.len(), &after[..name_len]);
            out.push_str(&token.placeholder);
            tokens.push(token);
        }
        rest = &after[name_len..];
    }
    out.push_str(rest);
    (out, tokens)
}

fn extract_quotes(input: &str) -> Result<(String, Vec<Token>)> {
    let mut out = String::with_capacity(input.len());
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(open) = rest.find('"') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('"') else {
            return Err(TermError::syntax("Unmatched opening double quote."));
        };
        let token = Token::new(TokenKind::Quote, tokens.len(), &after[..close]);
        out.push_str(&token.placeholder);
        tokens.push(token);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok((out, tokens))
}

fn extract_parens(input: &str) -> Result<(String, Vec<Token>)> {
    let mut line = input.to_string();
    let mut tokens = Vec::new();

    loop {
        let (next, found) = replace_innermost_parens(&line, &mut tokens);
        line = next;
        if !found {
            break;
        }
    }

    if line.contains('(') {
        return Err(TermError::syntax("Unmatched opening parenthesis."));
    }
    if line.contains(')') {
        return Err(TermError::syntax("Unmatched closing parenthesis."));
    }
    Ok((line, tokens))
}

/// One left-to-right pass replacing every `(` whose next delimiter is `)`.
fn replace_innermost_parens(line: &str, tokens: &mut Vec<Token>) -> (String, bool) {
    let mut out = String::with_capacity(line.len());
    let mut found = false;
    let mut rest = line;

    while let Some(open) = rest.find('(') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['(', ')']) {
            Some(close) if after[close..].starts_with(')') => {
                let token = Token::new(TokenKind::Paren, tokens.len(), &after[..close]);
                out.push_str(&token.placeholder);
                tokens.push(token);
                found = true;
                rest = &after[close + 1..];
            },
            _ => {
                out.push('(');
                rest = after;
            },
        }
    }
    out.push_str(rest);
    (out, found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_split_on_spaces() {
        let t = tokenize("PRINT a  b").unwrap();
        assert_eq!(t.args, vec!["PRINT", "a", "", "b"]);
        assert!(t.tokens.is_empty());
    }

    #[test]
    fn variable_extraction() {
        let t = tokenize("PRINT $X and $long_name1").unwrap();
        assert_eq!(t.args, vec!["PRINT", "%var%0%var%", "and", "%var%1%var%"]);
        assert_eq!(t.tokens[0].raw, "X");
        assert_eq!(t.tokens[1].raw, "long_name1");
        assert!(t.tokens.iter().all(|t| t.kind == TokenKind::Variable));
    }

    #[test]
    fn unbound_variable_is_not_a_tokenizer_error() {
        let t = tokenize("$X").unwrap();
        assert_eq!(t.args, vec!["%var%0%var%"]);
    }

    #[test]
    fn bare_dollar_kept() {
        let t = tokenize("PRINT $ 5$").unwrap();
        assert_eq!(t.args, vec!["PRINT", "$", "5$"]);
        assert!(t.tokens.is_empty());
    }

    #[test]
    fn quote_keeps_spaces_together() {
        let t = tokenize("PRINT \"hello world\"").unwrap();
        assert_eq!(t.args, vec!["PRINT", "%quote%0%quote%"]);
        assert_eq!(t.tokens[0].raw, "hello world");
        assert_eq!(t.tokens[0].kind, TokenKind::Quote);
    }

    #[test]
    fn variables_inside_quotes_extracted_first() {
        let t = tokenize("PRINT \"hi $NAME\"").unwrap();
        let quote = t.tokens.iter().find(|t| t.kind == TokenKind::Quote).unwrap();
        assert_eq!(quote.raw, "hi %var%0%var%");
    }

    #[test]
    fn unmatched_quote() {
        let err = tokenize("PRINT \"abc").unwrap_err();
        assert_eq!(err.to_string(), "Syntax error; Unmatched opening double quote.");
    }

    #[test]
    fn paren_extraction() {
        let t = tokenize("ASSIGN (ADD 2 3) TO X").unwrap();
        assert_eq!(t.args, vec!["ASSIGN", "%paren%0%paren%", "TO", "X"]);
        assert_eq!(t.tokens[0].raw, "ADD 2 3");
    }

    #[test]
    fn nested_parens_resolve_inside_out() {
        let t = tokenize("PRINT (ADD (MULTIPLY 2 3) 1)").unwrap();
        assert_eq!(t.args, vec!["PRINT", "%paren%1%paren%"]);
        assert_eq!(t.tokens[0].raw, "MULTIPLY 2 3");
        assert_eq!(t.tokens[1].raw, "ADD %paren%0%paren% 1");
    }

    #[test]
    fn sibling_parens_in_one_pass() {
        let t = tokenize("ADD (A) (B)").unwrap();
        assert_eq!(t.args, vec!["ADD", "%paren%0%paren%", "%paren%1%paren%"]);
    }

    #[test]
    fn parens_inside_quotes_are_literal() {
        let t = tokenize("INPUT -P \"CONTINUE? (Y/N)\" X").unwrap();
        assert_eq!(t.tokens.len(), 1);
        assert_eq!(t.tokens[0].raw, "CONTINUE? (Y/N)");
    }

    #[test]
    fn unmatched_parens() {
        let err = tokenize("PRINT (ADD 1 2").unwrap_err();
        assert_eq!(err.to_string(), "Syntax error; Unmatched opening parenthesis.");
        let err = tokenize("PRINT ADD 1 2)").unwrap_err();
        assert_eq!(err.to_string(), "Syntax error; Unmatched closing parenthesis.");
    }

    #[test]
    fn token_order_parens_quotes_vars() {
        let t = tokenize("X $A \"q\" (P)").unwrap();
        let kinds: Vec<TokenKind> = t.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Paren, TokenKind::Quote, TokenKind::Variable]);
    }

    #[test]
    fn unicode_text_survives() {
        let t = tokenize("PRINT \"héllo wörld\" ünï").unwrap();
        assert_eq!(t.tokens[0].raw, "héllo wörld");
        assert_eq!(t.args[2], "ünï");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn plain_text_is_untouched(line in "[A-Za-z0-9 .,!?-]{0,40}") {
                let t = tokenize(&line).unwrap();
                prop_assert!(t.tokens.is_empty());
                prop_assert_eq!(t.args.join(" "), line);
            }

            #[test]
            fn no_delimiters_survive(words in proptest::collection::vec("[a-z]{1,5}", 1..6)) {
                let line = format!("CMD \"{}\" ({}) ${}", words.join(" "), words.join(" "), words[0]);
                let t = tokenize(&line).unwrap();
                let joined = t.args.join(" ");
                prop_assert!(!joined.contains('"'));
                prop_assert!(!joined.contains('('));
                prop_assert!(!joined.contains('$'));
                prop_assert_eq!(t.tokens.len(), 3);
            }
        }
    }
}
