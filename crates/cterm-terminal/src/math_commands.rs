//! Arithmetic and comparison commands.
//!
//! Each prints its result and returns it, so it can be used both at the
//! prompt and as a `( ... )` sub-expression.

use std::cmp::Ordering;

use rand::Rng;

use cterm_types::error::{Result, TermError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Terminal};
use crate::numeric::{binary_operands, format_number, number_arg, parse_number};

/// Register math and comparison commands.
pub fn register_math_commands(reg: &mut CommandRegistry) {
    for (name, help, op) in ARITHMETIC {
        reg.register(Box::new(ArithmeticCmd { name, help, op }));
    }
    reg.register(Box::new(SqrtCmd));
    reg.register(Box::new(LogarithmCmd));
    reg.register(Box::new(RndCmd));
    reg.register(Box::new(CompareCmd {
        name: "EQUALS",
        help: "Returns TRUE when both values are identical, FALSE otherwise.",
        op: Comparison::Equal,
    }));
    reg.register(Box::new(CompareCmd {
        name: "GT",
        help: "Returns TRUE when the first value is greater than the second.",
        op: Comparison::Greater,
    }));
    reg.register(Box::new(CompareCmd {
        name: "LT",
        help: "Returns TRUE when the first value is less than the second.",
        op: Comparison::Less,
    }));
}

/// Print a computed number and hand it back as the command value.
fn emit_number(term: &mut Terminal, value: f64) -> CommandOutput {
    let out = format_number(value);
    term.println(&out);
    CommandOutput::Text(out)
}

// ---------------------------------------------------------------------------
// ADD / SUBTRACT / MULTIPLY / DIVIDE / EXP
// ---------------------------------------------------------------------------

type BinaryOp = fn(f64, f64) -> Result<f64>;

const ARITHMETIC: [(&str, &str, BinaryOp); 5] = [
    ("ADD", "Adds two numbers.", |a, b| Ok(a + b)),
    ("SUBTRACT", "Subtracts the second number from the first.", |a, b| Ok(a - b)),
    ("MULTIPLY", "Multiplies two numbers.", |a, b| Ok(a * b)),
    ("DIVIDE", "Divides the first number by the second.", |a, b| {
        if b == 0.0 {
            return Err(TermError::syntax("cannot divide by zero."));
        }
        Ok(a / b)
    }),
    ("EXP", "Raises the first number to the power of the second.", |a, b| Ok(a.powf(b))),
];

struct ArithmeticCmd {
    name: &'static str,
    help: &'static str,
    op: BinaryOp,
}

impl Command for ArithmeticCmd {
    fn name(&self) -> &str {
        self.name
    }
    fn args(&self) -> &'static [&'static str] {
        &["value1", "value2"]
    }
    fn help(&self) -> &str {
        self.help
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let (a, b) = binary_operands(self.name, &args)?;
        let value = (self.op)(a, b)?;
        Ok(emit_number(term, value))
    }
}

// ---------------------------------------------------------------------------
// SQRT
// ---------------------------------------------------------------------------

struct SqrtCmd;
impl Command for SqrtCmd {
    fn name(&self) -> &str {
        "SQRT"
    }
    fn args(&self) -> &'static [&'static str] {
        &["value", "root"]
    }
    fn help(&self) -> &str {
        "Returns the root of a number; the square root unless another root is given."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let mut args = term.tokenize_and_eval(args)?;
        if args.len() == 2 {
            args.push("2".to_string());
        }
        let (value, root) = binary_operands("SQRT", &args)?;
        if root <= 0.0 {
            return Err(TermError::syntax("base cannot be less than zero."));
        }
        Ok(emit_number(term, value.powf(1.0 / root)))
    }
}

// ---------------------------------------------------------------------------
// LOGARITHM
// ---------------------------------------------------------------------------

struct LogarithmCmd;
impl Command for LogarithmCmd {
    fn name(&self) -> &str {
        "LOGARITHM"
    }
    fn args(&self) -> &'static [&'static str] {
        &["value", "base"]
    }
    fn help(&self) -> &str {
        "Returns the logarithm of a number; the natural logarithm unless a base is given."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        if args.len() == 2 {
            let value = number_arg("LOGARITHM", &args[1])?;
            return Ok(emit_number(term, value.ln()));
        }
        let (value, base) = binary_operands("LOGARITHM", &args)?;
        if base <= 0.0 {
            return Err(TermError::syntax("base cannot be less than zero."));
        }
        Ok(emit_number(term, value.ln() / base.ln()))
    }
}

// ---------------------------------------------------------------------------
// RND
// ---------------------------------------------------------------------------

const DEFAULT_RND_MAX: f64 = 10.0;

struct RndCmd;
impl Command for RndCmd {
    fn name(&self) -> &str {
        "RND"
    }
    fn args(&self) -> &'static [&'static str] {
        &["max"]
    }
    fn help(&self) -> &str {
        "Returns a random whole number from 0 up to and including max (default 10)."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let max = match args.get(1) {
            None => DEFAULT_RND_MAX,
            Some(text) => parse_number(text)
                .filter(|&n| n >= 1.0 && n.is_finite())
                .ok_or_else(|| {
                    TermError::command("Invalid maximum; must be integer value greater than 1.")
                })?,
        };
        let value = term.rng().gen_range(0..=max.floor() as u64);
        let out = value.to_string();
        term.println(&out);
        Ok(CommandOutput::Text(out))
    }
}

// ---------------------------------------------------------------------------
// EQUALS / GT / LT
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Equal,
    Greater,
    Less,
}

impl Comparison {
    /// Numbers compare numerically; anything else compares as text.
    fn holds(self, a: &str, b: &str) -> bool {
        let ordering = || match (parse_number(a), parse_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(a.cmp(b)),
        };
        match self {
            Comparison::Equal => a == b,
            Comparison::Greater => ordering() == Some(Ordering::Greater),
            Comparison::Less => ordering() == Some(Ordering::Less),
        }
    }
}

struct CompareCmd {
    name: &'static str,
    help: &'static str,
    op: Comparison,
}

impl Command for CompareCmd {
    fn name(&self) -> &str {
        self.name
    }
    fn args(&self) -> &'static [&'static str] {
        &["value1", "value2"]
    }
    fn help(&self) -> &str {
        self.help
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        if args.len() != 3 {
            return Err(TermError::syntax(format!(
                "{} requires two arguments.",
                self.name
            )));
        }
        let out = if self.op.holds(&args[1], &args[2]) {
            "TRUE"
        } else {
            "FALSE"
        };
        term.println(out);
        Ok(CommandOutput::text(out))
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{CommandOutput, FAILURE};
    use crate::test_utils::{output_of, terminal};

    #[test]
    fn add_prints_and_returns() {
        let (mut term, console) = terminal();
        assert_eq!(term.process_cmd("ADD 2 3"), CommandOutput::text("5"));
        assert_eq!(console.output(), "5\n");
        assert_eq!(term.session.status, 0);
    }

    #[test]
    fn arithmetic_results() {
        let (mut term, _console) = terminal();
        assert_eq!(term.process_cmd("SUBTRACT 2 5"), CommandOutput::text("-3"));
        assert_eq!(term.process_cmd("MULTIPLY 1.5 4"), CommandOutput::text("6"));
        assert_eq!(term.process_cmd("DIVIDE 7 2"), CommandOutput::text("3.5"));
        assert_eq!(term.process_cmd("EXP 2 10"), CommandOutput::text("1024"));
    }

    #[test]
    fn operands_may_be_variables() {
        let (mut term, _console) = terminal();
        term.session.variables.set("X", "4");
        assert_eq!(term.process_cmd("ADD $X 1"), CommandOutput::text("5"));
    }

    #[test]
    fn divide_by_zero() {
        let (mut term, console) = terminal();
        let out = output_of(&mut term, &console, "DIVIDE 1 0");
        assert_eq!(out, "Syntax error; cannot divide by zero.\n");
        assert_eq!(term.session.status, 1);
    }

    #[test]
    fn arity_and_type_errors() {
        let (mut term, console) = terminal();
        assert_eq!(
            output_of(&mut term, &console, "ADD 1"),
            "Syntax error; ADD requires two arguments.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "ADD one 2"),
            "Syntax error; ADD requires numeric arguments.\n"
        );
        assert_eq!(term.process_cmd("ADD"), CommandOutput::text(FAILURE));
    }

    #[test]
    fn sqrt_default_and_custom_root() {
        let (mut term, console) = terminal();
        assert_eq!(term.process_cmd("SQRT 16"), CommandOutput::text("4"));
        assert_eq!(term.process_cmd("SQRT 9 0.5"), CommandOutput::text("81"));
        assert_eq!(
            output_of(&mut term, &console, "SQRT 4 0"),
            "Syntax error; base cannot be less than zero.\n"
        );
    }

    #[test]
    fn logarithm_natural_and_based() {
        let (mut term, console) = terminal();
        assert_eq!(term.process_cmd("LOGARITHM 1"), CommandOutput::text("0"));
        assert_eq!(term.process_cmd("LOGARITHM 4 2"), CommandOutput::text("2"));
        assert_eq!(
            output_of(&mut term, &console, "LOGARITHM 8 -2"),
            "Syntax error; base cannot be less than zero.\n"
        );
    }

    #[test]
    fn rnd_stays_in_range() {
        let (mut term, _console) = terminal();
        term.seed_rng(7);
        for _ in 0..50 {
            let CommandOutput::Text(out) = term.process_cmd("RND 3") else {
                panic!("expected text");
            };
            let n: u64 = out.parse().unwrap();
            assert!(n <= 3);
        }
        let CommandOutput::Text(out) = term.process_cmd("RND") else {
            panic!("expected text");
        };
        assert!(out.parse::<u64>().unwrap() <= 10);
    }

    #[test]
    fn rnd_rejects_bad_maximum() {
        let (mut term, console) = terminal();
        for bad in ["RND 0", "RND x", "RND -4"] {
            assert_eq!(
                output_of(&mut term, &console, bad),
                "Invalid maximum; must be integer value greater than 1.\n"
            );
            assert_eq!(term.session.status, 1);
        }
    }

    #[test]
    fn comparisons() {
        let (mut term, _console) = terminal();
        assert_eq!(term.process_cmd("GT 3 2"), CommandOutput::text("TRUE"));
        assert_eq!(term.process_cmd("GT 10 9"), CommandOutput::text("TRUE"));
        assert_eq!(term.process_cmd("LT 10 9"), CommandOutput::text("FALSE"));
        assert_eq!(term.process_cmd("LT apple banana"), CommandOutput::text("TRUE"));
        assert_eq!(term.process_cmd("EQUALS a a"), CommandOutput::text("TRUE"));
        assert_eq!(term.process_cmd("EQUALS 1 1.0"), CommandOutput::text("FALSE"));
    }

    #[test]
    fn comparison_arity() {
        let (mut term, console) = terminal();
        assert_eq!(
            output_of(&mut term, &console, "GT 1"),
            "Syntax error; GT requires two arguments.\n"
        );
    }
}
