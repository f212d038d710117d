//! Numeric coercion for the string-valued interpreter.
//!
//! Variables and arguments are always strings. Arithmetic commands go through
//! these helpers instead of parsing ad hoc.

use cterm_types::error::{Result, TermError};

/// Parse a decimal number, ignoring surrounding whitespace.
///
/// Empty input and NaN are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Parse one numeric operand of `cmd`.
pub fn number_arg(cmd: &str, text: &str) -> Result<f64> {
    parse_number(text)
        .ok_or_else(|| TermError::syntax(format!("{cmd} requires numeric arguments.")))
}

/// Validate `CMD a b` and return both operands.
pub fn binary_operands(cmd: &str, args: &[String]) -> Result<(f64, f64)> {
    if args.len() != 3 {
        return Err(TermError::syntax(format!("{cmd} requires two arguments.")));
    }
    Ok((number_arg(cmd, &args[1])?, number_arg(cmd, &args[2])?))
}

/// Render a number the way values are stored in variables: integers without
/// a fractional part, infinities spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        // Folds -0 into 0.
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Condition truthiness: the literal `TRUE`, or any number above zero.
pub fn is_truthy(text: &str) -> bool {
    text == "TRUE" || parse_number(text).is_some_and(|n| n > 0.0)
}

/// Parse a non-negative whole number such as a program line.
///
/// Returns `Err(true)` when the text is a number below zero and `Err(false)`
/// when it is not an integer at all.
pub fn parse_index(text: &str) -> std::result::Result<usize, bool> {
    let n = parse_number(text).ok_or(false)?;
    if n.fract() != 0.0 || n.is_infinite() {
        return Err(false);
    }
    if n < 0.0 {
        return Err(true);
    }
    // `usize::MAX as f64` rounds up to 2^64, which does not fit.
    if n >= usize::MAX as f64 {
        return Err(false);
    }
    Ok(n as usize)
}
