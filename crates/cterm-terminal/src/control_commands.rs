//! Control flow: IF, FOR, GOTO, EXIT.
//!
//! IF and FOR work on the raw argument list. Their operands are located by
//! keyword (`THEN`/`ELSE`, `IN`/`DO`) at the top nesting level, so keywords
//! inside a parenthesized or quoted operand are never mistaken for the
//! statement's own.

use cterm_types::error::{Result, TermError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Terminal};
use crate::numeric::{is_truthy, parse_index};
use crate::var_commands::check_var_name;

/// Register control flow commands.
pub fn register_control_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(IfCmd));
    reg.register(Box::new(ForCmd));
    reg.register(Box::new(GotoCmd));
    reg.register(Box::new(ExitCmd));
}

// ---------------------------------------------------------------------------
// Operand extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandKind {
    /// A bare word, used as is.
    Bare,
    /// `( ... )`: a command to run.
    Expr,
    /// `" ... "`: literal text.
    Str,
    /// `$name`: a variable's value.
    Var,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Operand {
    kind: OperandKind,
    /// Delimiters stripped; already looked up for variables.
    value: String,
}

/// Paren depth and quote state while scanning raw tokens.
#[derive(Debug, Default)]
struct Nesting {
    depth: i32,
    quoted: bool,
}

impl Nesting {
    fn feed(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '"' => self.quoted = !self.quoted,
                '(' if !self.quoted => self.depth += 1,
                ')' if !self.quoted => self.depth -= 1,
                _ => {},
            }
        }
    }

    fn top_level(&self) -> bool {
        self.depth == 0 && !self.quoted
    }
}

/// Index of the first top-level `keyword` at or after `from`.
fn find_keyword(args: &[String], keyword: &str, from: usize) -> Option<usize> {
    let mut nesting = Nesting::default();
    for (i, arg) in args.iter().enumerate() {
        if i >= from && nesting.top_level() && arg.eq_ignore_ascii_case(keyword) {
            return Some(i);
        }
        nesting.feed(arg);
    }
    None
}

/// Classify the first interesting token of `args` and collect the operand
/// it starts, re-joining tokens with spaces up to its closing delimiter.
fn extract_operand(term: &Terminal, args: &[String]) -> Result<Operand> {
    let first = args.iter().position(|a| {
        a.starts_with('(') || a.starts_with('"') || a.starts_with('$')
    });
    let Some(start) = first else {
        return Ok(Operand {
            kind: OperandKind::Bare,
            value: args.last().cloned().unwrap_or_default(),
        });
    };

    let head = &args[start];
    if let Some(name) = head.strip_prefix('$') {
        let value = term
            .session
            .variables
            .get(name)
            .ok_or_else(|| TermError::Reference(name.to_string()))?;
        return Ok(Operand {
            kind: OperandKind::Var,
            value: value.to_string(),
        });
    }

    let kind = if head.starts_with('(') {
        OperandKind::Expr
    } else {
        OperandKind::Str
    };
    let mut text = String::new();
    let mut nesting = Nesting::default();
    for (i, arg) in args[start..].iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(arg);
        let closed = match kind {
            OperandKind::Expr => {
                nesting.feed(arg);
                nesting.top_level() && text.ends_with(')')
            },
            _ => text.len() > 1 && text.ends_with('"'),
        };
        if closed {
            return Ok(Operand {
                kind,
                value: text[1..text.len() - 1].to_string(),
            });
        }
    }

    Err(match kind {
        OperandKind::Expr => TermError::syntax("missing closing parenthesis."),
        _ => TermError::syntax("missing closing double quote."),
    })
}

/// Produce an operand's value. Expressions run as commands, silently when
/// `quiet`; a failing expression is a runtime error.
fn eval_operand(term: &mut Terminal, operand: Operand, quiet: bool) -> Result<CommandOutput> {
    match operand.kind {
        OperandKind::Expr if quiet => term.eval_expression(&operand.value),
        OperandKind::Expr => {
            let out = term.process_cmd(&operand.value);
            if term.session.status != 0 {
                return Err(TermError::runtime("expression evaluation failed."));
            }
            Ok(out)
        },
        _ => Ok(CommandOutput::Text(operand.value)),
    }
}

// ---------------------------------------------------------------------------
// IF
// ---------------------------------------------------------------------------

struct IfCmd;
impl Command for IfCmd {
    fn name(&self) -> &str {
        "IF"
    }
    fn args(&self) -> &'static [&'static str] {
        &["condition", "THEN", "expression", "ELSE", "expression"]
    }
    fn help(&self) -> &str {
        "Runs the THEN expression when the condition is TRUE or a number above zero, \
         otherwise the optional ELSE expression."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let Some(then_pos) = find_keyword(args, "THEN", 1) else {
            return Err(TermError::syntax("THEN argument is required for IF statement."));
        };
        if then_pos == 1 {
            return Err(TermError::syntax("missing conditional after IF."));
        }
        if then_pos == args.len() - 1 {
            return Err(TermError::syntax("missing expression after THEN argument."));
        }
        let else_pos = find_keyword(args, "ELSE", then_pos + 1);
        if else_pos == Some(args.len() - 1) {
            return Err(TermError::syntax("missing expression after ELSE argument."));
        }
        let then_end = else_pos.unwrap_or(args.len());

        let condition = extract_operand(term, &args[1..then_pos])?;
        let result = eval_operand(term, condition, true)?;

        if is_truthy(&result.to_string()) {
            let branch = extract_operand(term, &args[then_pos + 1..then_end])?;
            eval_operand(term, branch, false)
        } else if let Some(else_pos) = else_pos {
            let branch = extract_operand(term, &args[else_pos + 1..])?;
            eval_operand(term, branch, false)
        } else {
            Ok(CommandOutput::empty())
        }
    }
}

// ---------------------------------------------------------------------------
// FOR
// ---------------------------------------------------------------------------

struct ForCmd;
impl Command for ForCmd {
    fn name(&self) -> &str {
        "FOR"
    }
    fn args(&self) -> &'static [&'static str] {
        &["name", "IN", "list", "DO", "command"]
    }
    fn help(&self) -> &str {
        "Runs a command once per line of a newline-separated list, with the line stored in the named variable."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let Some(in_pos) = find_keyword(args, "IN", 1) else {
            return Err(TermError::syntax("IN argument is required with FOR statement."));
        };
        let Some(do_pos) = find_keyword(args, "DO", in_pos + 1) else {
            return Err(TermError::syntax("DO argument is required with FOR statement."));
        };
        match in_pos {
            1 => check_var_name("")?,
            2 => {},
            _ => return Err(TermError::syntax("FOR requires one variable name before IN.")),
        }
        let command = args[do_pos + 1..].join(" ");

        let head = term.tokenize_and_eval(&args[..do_pos])?;
        let name = head.get(1).cloned().unwrap_or_default();
        check_var_name(&name)?;
        let list = head.get(3..).map(|rest| rest.join(" ")).unwrap_or_default();
        if list.is_empty() {
            return Ok(CommandOutput::empty());
        }

        let mut guard = term.enter_program();
        let mut results = Vec::new();
        for item in list.split('\n') {
            guard.session.variables.set(&name, item);
            guard.save_program_state();
            let out = guard.process_cmd(&command);
            if guard.session.status != 0 {
                return Err(TermError::Execution {
                    status: guard.session.status,
                });
            }
            match out {
                CommandOutput::Text(text) => results.push(text),
                control => return Ok(control),
            }
            if guard.take_stop_request() {
                break;
            }
        }
        Ok(CommandOutput::Text(results.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// GOTO / EXIT
// ---------------------------------------------------------------------------

struct GotoCmd;
impl Command for GotoCmd {
    fn name(&self) -> &str {
        "GOTO"
    }
    fn args(&self) -> &'static [&'static str] {
        &["line"]
    }
    fn help(&self) -> &str {
        "Continues the running program at the given line."
    }
    fn hidden(&self) -> bool {
        true
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        match args.as_slice() {
            [_, line] => parse_index(line)
                .map(CommandOutput::Jump)
                .map_err(|_| TermError::syntax("GOTO requires one integer argument.")),
            _ => Err(TermError::syntax("GOTO requires one integer argument.")),
        }
    }
}

struct ExitCmd;
impl Command for ExitCmd {
    fn name(&self) -> &str {
        "EXIT"
    }
    fn help(&self) -> &str {
        "Ends the running program."
    }
    fn hidden(&self) -> bool {
        true
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, _args: &[String], _term: &mut Terminal) -> Result<CommandOutput> {
        Ok(CommandOutput::Exit)
    }
}
