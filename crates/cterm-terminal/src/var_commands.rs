//! Variable commands: ASSIGN, UNASSIGN, VARS, INPUT.

use cterm_types::error::{Result, TermError};

use crate::flags::{ParseOptions, STANDARD_FLAGS};
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Terminal};

/// Register variable commands.
pub fn register_var_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(AssignCmd));
    reg.register(Box::new(UnassignCmd));
    reg.register(Box::new(VarsCmd));
    reg.register(Box::new(InputCmd));
}

/// Names are bare identifiers: no leading `$`, never empty.
pub(crate) fn check_var_name(name: &str) -> Result<()> {
    if name.starts_with('$') {
        return Err(TermError::syntax("variable name cannot begin with $."));
    }
    if name.is_empty() {
        return Err(TermError::syntax("missing variable name."));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ASSIGN
// ---------------------------------------------------------------------------

struct AssignCmd;
impl Command for AssignCmd {
    fn name(&self) -> &str {
        "ASSIGN"
    }
    fn args(&self) -> &'static [&'static str] {
        &["value", "TO", "name"]
    }
    fn help(&self) -> &str {
        "Stores a value in a named variable: ASSIGN value TO name. Read it back with $name."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        if args.len() != 4 {
            return Err(TermError::syntax("ASSIGN takes four arguments."));
        }
        if !args[2].eq_ignore_ascii_case("TO") {
            return Err(TermError::syntax("second argument of ASSIGN must be TO."));
        }
        let (value, name) = (&args[1], &args[3]);
        check_var_name(name)?;
        term.session.variables.set(name, value);
        term.save_program_state();
        Ok(CommandOutput::Text(value.clone()))
    }
}

// ---------------------------------------------------------------------------
// UNASSIGN
// ---------------------------------------------------------------------------

struct UnassignCmd;
impl Command for UnassignCmd {
    fn name(&self) -> &str {
        "UNASSIGN"
    }
    fn args(&self) -> &'static [&'static str] {
        &["name"]
    }
    fn help(&self) -> &str {
        "Removes a variable."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let name = args.get(1).map(String::as_str).unwrap_or_default();
        check_var_name(name)?;
        if term.session.variables.remove(name).is_none() {
            term.println(&format!("Variable \"{name}\" does not exist."));
            return Ok(CommandOutput::empty());
        }
        term.save_program_state();
        Ok(CommandOutput::empty())
    }
}

// ---------------------------------------------------------------------------
// VARS
// ---------------------------------------------------------------------------

struct VarsCmd;
impl Command for VarsCmd {
    fn name(&self) -> &str {
        "VARS"
    }
    fn help(&self) -> &str {
        "Lists every variable and its value."
    }
    fn execute(&self, _args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let list: String = term
            .session
            .variables
            .iter()
            .map(|(name, value)| format!("{name} = {value}\n"))
            .collect();
        term.print(&list);
        Ok(CommandOutput::Text(list))
    }
}

// ---------------------------------------------------------------------------
// INPUT
// ---------------------------------------------------------------------------

const INPUT_OPTIONS: ParseOptions = ParseOptions {
    eval_tokens: true,
    look_for_action: false,
    with_argument: &['P'],
};

struct InputCmd;
impl Command for InputCmd {
    fn name(&self) -> &str {
        "INPUT"
    }
    fn args(&self) -> &'static [&'static str] {
        &["-p prompt", "-u", "name"]
    }
    fn help(&self) -> &str {
        "Reads a line from the user into a variable. -p sets the prompt, -u uppercases the reply."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let parsed = term.parse_command_line(args, &INPUT_OPTIONS, &STANDARD_FLAGS)?;
        check_var_name(&parsed.name)?;

        let prompt = parsed.value('P').unwrap_or("INPUT");
        let prompt = format!("{prompt}{} ", term.session.display.prompt);
        term.print(&prompt);

        let Some(mut reply) = term.console_mut().read_line() else {
            return Err(TermError::runtime("input closed."));
        };
        if parsed.has('U') {
            reply = reply.to_uppercase();
        }
        term.session.variables.set(&parsed.name, &reply);
        term.save_program_state();
        Ok(CommandOutput::Text(reply))
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::CommandOutput;
    use crate::test_utils::{output_of, run_lines, terminal};

    #[test]
    fn assign_then_print() {
        let (mut term, console) = terminal();
        assert_eq!(
            term.process_cmd("ASSIGN \"hello\" TO X"),
            CommandOutput::text("hello")
        );
        assert_eq!(output_of(&mut term, &console, "PRINT $X"), "hello\n");
        assert_eq!(term.session.status, 0);
    }

    #[test]
    fn assign_subexpression() {
        let (mut term, console) = terminal();
        term.process_cmd("ASSIGN (ADD 2 3) TO X");
        assert_eq!(console.output(), "");
        assert_eq!(output_of(&mut term, &console, "PRINT $X"), "5\n");
    }

    #[test]
    fn assign_keyword_case_insensitive() {
        let (mut term, _console) = terminal();
        term.process_cmd("assign 1 to Y");
        assert_eq!(term.session.variables.get("Y"), Some("1"));
    }

    #[test]
    fn assign_syntax_errors() {
        let (mut term, console) = terminal();
        assert_eq!(
            output_of(&mut term, &console, "ASSIGN 1 TO"),
            "Syntax error; ASSIGN takes four arguments.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "ASSIGN 1 AS X"),
            "Syntax error; second argument of ASSIGN must be TO.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "ASSIGN 1 TO $"),
            "Syntax error; variable name cannot begin with $.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "ASSIGN 1 TO \"\""),
            "Syntax error; missing variable name.\n"
        );
        assert_eq!(term.session.status, 1);
        assert!(term.session.variables.is_empty());
    }

    #[test]
    fn assign_persists() {
        let (mut term, _console) = terminal();
        term.process_cmd("ASSIGN 9 TO N");
        let saved = term.store().load("cterm--programInput").unwrap().unwrap();
        assert!(saved.contains("\"N\":\"9\""));
    }

    #[test]
    fn unassign() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["ASSIGN 1 TO X"]);
        assert_eq!(output_of(&mut term, &console, "UNASSIGN X"), "");
        assert!(term.session.variables.get("X").is_none());
        assert_eq!(
            output_of(&mut term, &console, "UNASSIGN X"),
            "Variable \"X\" does not exist.\n"
        );
        assert_eq!(term.session.status, 0);
    }

    #[test]
    fn vars_lists_sorted() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["ASSIGN 2 TO B", "ASSIGN 1 TO A"]);
        assert_eq!(output_of(&mut term, &console, "VARS"), "A = 1\nB = 2\n");
    }

    #[test]
    fn input_with_prompt_and_uppercase() {
        let (mut term, console) = terminal();
        console.push_input("yes");
        let out = output_of(&mut term, &console, "INPUT -U -P \"CONTINUE? (Y/N)\" USERIN");
        assert_eq!(out, "CONTINUE? (Y/N)$ ");
        assert_eq!(term.session.variables.get("USERIN"), Some("YES"));
    }

    #[test]
    fn input_default_prompt() {
        let (mut term, console) = terminal();
        console.push_input("abc");
        assert_eq!(output_of(&mut term, &console, "INPUT NAME"), "INPUT$ ");
        assert_eq!(term.session.variables.get("NAME"), Some("abc"));
    }

    #[test]
    fn input_needs_name_and_open_input() {
        let (mut term, console) = terminal();
        assert_eq!(
            output_of(&mut term, &console, "INPUT -U"),
            "Syntax error; missing variable name.\n"
        );
        let out = output_of(&mut term, &console, "INPUT X");
        assert!(out.ends_with("Runtime error; input closed.\n"));
        assert_eq!(term.session.status, 1);
    }
}
