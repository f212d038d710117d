//! Built-in commands for the cterm terminal.
//!
//! This file holds the console commands (PRINT, HELP, CLEAR, COLOR, THEME,
//! SETCURSOR, SYSTEM); math, variable, control and program commands live in
//! their own modules and are pulled in by [`register_builtins`].

use cterm_types::color::{Color, Theme};
use cterm_types::error::{Result, TermError};

use crate::control_commands::register_control_commands;
use crate::format::columnize;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Terminal};
use crate::math_commands::register_math_commands;
use crate::numeric::parse_index;
use crate::program_commands::register_program_commands;
use crate::var_commands::register_var_commands;

/// Register all built-in commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(PrintCmd));
    reg.register(Box::new(HelpCmd));
    reg.register(Box::new(ClearCmd("CLEAR")));
    reg.register(Box::new(ClearCmd("CLR")));
    reg.register(Box::new(ClearCmd("CLS")));
    reg.register(Box::new(ColorCmd));
    reg.register(Box::new(ThemeCmd));
    reg.register(Box::new(SetCursorCmd));
    reg.register(Box::new(SystemCmd));
    register_math_commands(reg);
    register_var_commands(reg);
    register_control_commands(reg);
    register_program_commands(reg);
}

// ---------------------------------------------------------------------------
// PRINT
// ---------------------------------------------------------------------------

struct PrintCmd;
impl Command for PrintCmd {
    fn name(&self) -> &str {
        "PRINT"
    }
    fn args(&self) -> &'static [&'static str] {
        &["text"]
    }
    fn help(&self) -> &str {
        "Prints text to the terminal."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let text = args[1..].join(" ");
        term.println(&text);
        Ok(CommandOutput::Text(text))
    }
}

// ---------------------------------------------------------------------------
// HELP
// ---------------------------------------------------------------------------

const PROGRAM_HELP: &str = "Specifying a line number followed by the command will update the stored program. \
Lines will be executed in order from lowest to highest, ignoring missing line numbers.
For example:
  10 PRINT \"HELLO WORLD!\"
  20 INPUT -U -P \"CONTINUE? (Y/N)\" USERIN
  30 IF (EQUALS $USERIN Y) THEN (GOTO 10)
  40 PRINT \"GOODBYE WORLD!\"
  RUN
If you want to save the stored program, use the SAVE command. \
This will save the program as an alias that can be called using the provided name.
For example: SAVE TESTPROG";

const GENERAL_HELP: &str = "You can also specify a line number and commands to add to the stored program.
For example:
  10 PRINT \"HELLO WORLD!\"
For more information on the stored program and aliases, type HELP PROGRAM";

struct HelpCmd;

impl HelpCmd {
    /// Print a header, a column listing of the commands matching `filter`
    /// and a trailer. Returns everything printed.
    fn listing(
        term: &mut Terminal,
        header: &str,
        filter: impl Fn(&dyn Command) -> bool,
        trailer: &str,
    ) -> String {
        let names: Vec<String> = term
            .registry()
            .iter()
            .filter(|c| filter(*c))
            .map(|c| c.name().to_uppercase())
            .collect();
        let columns = columnize(&names, term.console().size().0);
        term.println(header);
        term.print(&columns);
        term.println(trailer);
        format!("{header}\n{columns}{trailer}")
    }
}

impl Command for HelpCmd {
    fn name(&self) -> &str {
        "HELP"
    }
    fn args(&self) -> &'static [&'static str] {
        &["cmd"]
    }
    fn help(&self) -> &str {
        "Lists the available commands, or describes one. HELP PROGRAM explains the stored program."
    }

    fn complete(&self, args: &[String], term: &Terminal) -> Option<String> {
        let [_, partial] = args else {
            return None;
        };
        match term.registry().completions(partial).as_slice() {
            [only] => Some(format!("{} {only}", args[0])),
            _ => None,
        }
    }

    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let Some(topic) = args.get(1) else {
            let out = Self::listing(term, "Available commands are:", |c| !c.hidden(), GENERAL_HELP);
            return Ok(CommandOutput::Text(out));
        };

        let name = topic.to_uppercase();
        let registry = term.registry();
        if let Some(cmd) = registry.get(&name) {
            let hints = cmd.args();
            let usage = if hints.is_empty() {
                format!("There are no arguments for {name}.")
            } else {
                format!("Arguments for {name} are: {}.", hints.join(", "))
            };
            let out = format!("{}\n{usage}", cmd.help());
            term.println(&out);
            return Ok(CommandOutput::Text(out));
        }

        if name == "PROGRAM" {
            let out = Self::listing(
                term,
                "Available commands for use with the stored program are:",
                |c| c.program(),
                PROGRAM_HELP,
            );
            return Ok(CommandOutput::Text(out));
        }

        Err(TermError::command(format!(
            "\"{topic}\" is not recognized as a valid command."
        )))
    }
}

// ---------------------------------------------------------------------------
// CLEAR / CLR / CLS
// ---------------------------------------------------------------------------

/// One command under several names; only `CLEAR` is listed.
struct ClearCmd(&'static str);
impl Command for ClearCmd {
    fn name(&self) -> &str {
        self.0
    }
    fn help(&self) -> &str {
        "Clears the screen and homes the cursor."
    }
    fn hidden(&self) -> bool {
        self.0 != "CLEAR"
    }
    fn execute(&self, _args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let console = term.console_mut();
        console.clear();
        console.set_cursor(0, 0);
        Ok(CommandOutput::text("[0,0]"))
    }
}

// ---------------------------------------------------------------------------
// COLOR / THEME
// ---------------------------------------------------------------------------

struct ColorCmd;
impl Command for ColorCmd {
    fn name(&self) -> &str {
        "COLOR"
    }
    fn args(&self) -> &'static [&'static str] {
        &["color"]
    }
    fn help(&self) -> &str {
        "Sets the text color: WHITE, RED, GREEN, BLUE, YELLOW or ORANGE."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let color: Color = args.get(1).map(String::as_str).unwrap_or_default().parse()?;
        term.session.display.color = color;
        Ok(CommandOutput::empty())
    }
}

struct ThemeCmd;
impl Command for ThemeCmd {
    fn name(&self) -> &str {
        "THEME"
    }
    fn args(&self) -> &'static [&'static str] {
        &["theme"]
    }
    fn help(&self) -> &str {
        "Shows or sets the terminal theme."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let Some(name) = args.get(1) else {
            let current = term.session.display.theme.name().to_uppercase();
            term.println(&format!("Current theme is: {current}."));
            term.println("Available themes are: DEFAULT, BLUE, GREEN, and AMBER");
            return Ok(CommandOutput::empty());
        };
        let theme: Theme = name.parse()?;
        term.session.display.theme = theme;
        term.console_mut().set_theme(theme);
        Ok(CommandOutput::empty())
    }
}

// ---------------------------------------------------------------------------
// SETCURSOR
// ---------------------------------------------------------------------------

struct SetCursorCmd;
impl Command for SetCursorCmd {
    fn name(&self) -> &str {
        "SETCURSOR"
    }
    fn args(&self) -> &'static [&'static str] {
        &["x", "y"]
    }
    fn help(&self) -> &str {
        "Moves the cursor to column x, row y."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let [_, x, y] = args.as_slice() else {
            return Err(TermError::syntax("SETCURSOR requires two arguments."));
        };
        let (Ok(x), Ok(y)) = (parse_index(x), parse_index(y)) else {
            return Err(TermError::syntax("SETCURSOR requires integer arguments."));
        };
        let (columns, rows) = term.console().size();
        if x >= columns || y >= rows {
            return Err(TermError::command(format!(
                "Cursor position must be within {columns} columns and {rows} rows."
            )));
        }
        term.console_mut().set_cursor(x, y);
        Ok(CommandOutput::Text(format!("[{x},{y}]")))
    }
}

// ---------------------------------------------------------------------------
// SYSTEM
// ---------------------------------------------------------------------------

const SYSTEM_PARAMETERS: [&str; 10] = [
    "ROWS", "COLS", "X", "Y", "STATUS", "DEBUG", "PROMPT", "COLOR", "THEME", "VERSION",
];

struct SystemCmd;
impl Command for SystemCmd {
    fn name(&self) -> &str {
        "SYSTEM"
    }
    fn args(&self) -> &'static [&'static str] {
        &["parameter"]
    }
    fn help(&self) -> &str {
        "Shows a terminal setting. SYSTEM LIST names the available parameters."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let param = args.get(1).map(String::as_str).unwrap_or("LIST");

        let (columns, rows) = term.console().size();
        let (x, y) = term.console().cursor();
        let display = &term.session.display;
        let out = match param.to_uppercase().as_str() {
            "LIST" => {
                let names: Vec<String> = SYSTEM_PARAMETERS.iter().map(|s| s.to_string()).collect();
                let listing = columnize(&names, columns);
                term.print(&listing);
                return Ok(CommandOutput::Text(SYSTEM_PARAMETERS.join(",")));
            },
            "ROWS" => rows.to_string(),
            "COLS" => columns.to_string(),
            "X" => x.to_string(),
            "Y" => y.to_string(),
            "STATUS" => term.session.status.to_string(),
            "DEBUG" => (if display.debug { "TRUE" } else { "FALSE" }).to_string(),
            "PROMPT" => display.prompt.clone(),
            "COLOR" => display.color.name().to_uppercase(),
            "THEME" => display.theme.name().to_uppercase(),
            "VERSION" => format!(
                "{} - version {}\n  {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION")
            ),
            _ => {
                return Err(TermError::command(format!(
                    "Invalid SYSTEM parameter: {param}."
                )));
            },
        };
        term.println(&out);
        Ok(CommandOutput::Text(out))
    }
}
