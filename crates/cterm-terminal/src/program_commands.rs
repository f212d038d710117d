//! Stored program management: LIST, RUN, NEW, SAVE, ALIAS, MOVE, DELETE,
//! DOWNLOAD.

use cterm_types::error::{Result, TermError};

use crate::flags::{ParseOptions, STANDARD_FLAGS, parse_args};
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Terminal};
use crate::numeric::parse_index;
use crate::session::Program;

/// Store key DOWNLOAD writes to when none is given.
const DEFAULT_DOWNLOAD_KEY: &str = "terminal-program";

/// Register program commands.
pub fn register_program_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(ListCmd));
    reg.register(Box::new(RunCmd));
    reg.register(Box::new(NewCmd));
    reg.register(Box::new(SaveCmd));
    reg.register(Box::new(AliasCmd));
    reg.register(Box::new(MoveCmd));
    reg.register(Box::new(DeleteCmd));
    reg.register(Box::new(DownloadCmd));
}

/// Print `n text` for every line of `program` in `range`, then the end
/// marker. Returns the printed lines.
fn print_listing(
    term: &mut Terminal,
    program: &Program,
    range: std::ops::RangeInclusive<usize>,
) -> String {
    let mut out = String::new();
    for (n, text) in program.iter().filter(|(n, _)| range.contains(n)) {
        let line = format!("{n} {text}");
        term.println(&line);
        out.push_str(&line);
        out.push('\n');
    }
    term.println("End of Program.");
    out
}

/// Run `program`, persisting state whether or not it succeeds.
fn run_and_save(term: &mut Terminal, program: &Program) -> Result<CommandOutput> {
    let result = term.run(program);
    term.save_program_state();
    result.map(|()| CommandOutput::empty())
}

// ---------------------------------------------------------------------------
// LIST / RUN / NEW
// ---------------------------------------------------------------------------

struct ListCmd;
impl Command for ListCmd {
    fn name(&self) -> &str {
        "LIST"
    }
    fn args(&self) -> &'static [&'static str] {
        &["start", "end"]
    }
    fn help(&self) -> &str {
        "Lists the stored program, optionally only the lines from start to end."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let bound = |i: usize, default: usize| match args.get(i) {
            Some(text) => parse_index(text)
                .map_err(|_| TermError::syntax("LIST requires integer arguments.")),
            None => Ok(default),
        };
        let start = bound(1, 0)?;
        let end = bound(2, usize::MAX)?;

        let program = term.session.program.clone();
        Ok(CommandOutput::Text(print_listing(term, &program, start..=end)))
    }
}

struct RunCmd;
impl Command for RunCmd {
    fn name(&self) -> &str {
        "RUN"
    }
    fn help(&self) -> &str {
        "Executes the stored program from its lowest line number."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, _args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        term.ensure_not_executing()?;
        let program = term.session.program.clone();
        run_and_save(term, &program)
    }
}

struct NewCmd;
impl Command for NewCmd {
    fn name(&self) -> &str {
        "NEW"
    }
    fn help(&self) -> &str {
        "Clears the stored program."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, _args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        term.session.program.clear();
        term.println("Stored program cleared.");
        term.save_program_state();
        Ok(CommandOutput::empty())
    }
}

// ---------------------------------------------------------------------------
// SAVE / ALIAS
// ---------------------------------------------------------------------------

struct SaveCmd;
impl Command for SaveCmd {
    fn name(&self) -> &str {
        "SAVE"
    }
    fn args(&self) -> &'static [&'static str] {
        &["name"]
    }
    fn help(&self) -> &str {
        "Saves the stored program as an alias that runs it when its name is entered."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        term.ensure_not_executing()?;
        let args = term.tokenize_and_eval(args)?;
        let [_, name] = args.as_slice() else {
            return Err(TermError::syntax("SAVE requires one argument."));
        };
        let name = name.to_uppercase();
        if term.registry().contains(&name) {
            return Err(TermError::command(
                "Cannot SAVE an alias with the same name as built in command.",
            ));
        }

        let program = term.session.program.clone();
        log::info!("Saving {} program lines as alias {name}", program.len());
        term.session.aliases.insert(name, program);
        term.save_program_state();
        Ok(CommandOutput::empty())
    }
}

struct AliasCmd;

impl AliasCmd {
    fn list_aliases(term: &mut Terminal) -> CommandOutput {
        let names: Vec<String> = term.session.aliases.keys().cloned().collect();
        if names.is_empty() {
            term.println("No available aliases yet");
        } else {
            term.println("Available aliases:");
            for name in &names {
                term.println(name);
            }
        }
        CommandOutput::empty()
    }
}

impl Command for AliasCmd {
    fn name(&self) -> &str {
        "ALIAS"
    }
    fn args(&self) -> &'static [&'static str] {
        &["action", "name"]
    }
    fn help(&self) -> &str {
        "Lists, recalls, deletes or runs saved aliases. Actions: -L list, -R recall into the stored program, -D delete."
    }
    fn program(&self) -> bool {
        true
    }

    fn complete(&self, args: &[String], term: &Terminal) -> Option<String> {
        let parsed = parse_args(args, &ParseOptions::default(), &STANDARD_FLAGS);
        let partial = parsed.name.to_uppercase();
        let mut matches = term
            .session
            .aliases
            .keys()
            .filter(|name| name.starts_with(&partial));
        let only = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        let prefix = args[..parsed.start.min(args.len())].join(" ");
        Some(format!("{prefix} {only}"))
    }

    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Ok(Self::list_aliases(term));
        }
        let parsed = term.parse_command_line(args, &ParseOptions::default(), &STANDARD_FLAGS)?;
        let name = parsed.name.to_uppercase();

        let acting = ["delete", "list", "recall"]
            .into_iter()
            .zip(['D', 'L', 'R'])
            .find(|&(action, flag)| parsed.wants(action, flag));
        let Some((action, _)) = acting else {
            return match term.session.aliases.get(&name).cloned() {
                Some(program) => {
                    log::debug!("Running alias {name} through ALIAS");
                    run_and_save(term, &program)
                },
                None => Ok(Self::list_aliases(term)),
            };
        };

        if name.is_empty() {
            term.println("Alias name required.");
            return Ok(CommandOutput::empty());
        }
        let Some(program) = term.session.aliases.get(&name).cloned() else {
            let suffix = match action {
                "delete" => "; nothing deleted",
                "recall" => "; nothing recalled",
                _ => "",
            };
            term.println(&format!("Alias {name} does not exist{suffix}."));
            return Ok(CommandOutput::empty());
        };

        match action {
            "delete" => {
                term.session.aliases.remove(&name);
                term.save_program_state();
                term.println(&format!("Alias {name} deleted."));
                Ok(CommandOutput::empty())
            },
            "recall" => {
                term.session.program = program;
                term.save_program_state();
                term.println(&format!("Alias {name} recalled."));
                Ok(CommandOutput::empty())
            },
            _ => Ok(CommandOutput::Text(print_listing(term, &program, 0..=usize::MAX))),
        }
    }
}

// ---------------------------------------------------------------------------
// MOVE / DELETE
// ---------------------------------------------------------------------------

struct MoveCmd;
impl Command for MoveCmd {
    fn name(&self) -> &str {
        "MOVE"
    }
    fn args(&self) -> &'static [&'static str] {
        &["from", "to"]
    }
    fn help(&self) -> &str {
        "Moves a stored program line to a new line number, replacing any line already there."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        term.ensure_not_executing()?;
        let args = term.tokenize_and_eval(args)?;
        let [_, from, to] = args.as_slice() else {
            return Err(TermError::syntax("MOVE requires two arguments."));
        };
        let (from, to) = match (parse_index(from), parse_index(to)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(false), _) | (_, Err(false)) => {
                return Err(TermError::syntax("MOVE command requires two integer arguments."));
            },
            _ => return Err(TermError::syntax("MOVE arguments cannot be less than 0.")),
        };

        let Some(text) = term.session.program.move_line(from, to).map(str::to_string) else {
            return Err(TermError::command(format!(
                "Line {from} does not exist; nothing moved."
            )));
        };
        term.save_program_state();
        let out = format!("{to} {text}");
        term.println(&out);
        Ok(CommandOutput::Text(out))
    }
}

struct DeleteCmd;
impl Command for DeleteCmd {
    fn name(&self) -> &str {
        "DELETE"
    }
    fn args(&self) -> &'static [&'static str] {
        &["line"]
    }
    fn help(&self) -> &str {
        "Removes a line from the stored program."
    }
    fn program(&self) -> bool {
        true
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        term.ensure_not_executing()?;
        let args = term.tokenize_and_eval(args)?;
        let [_, line] = args.as_slice() else {
            return Err(TermError::syntax("DELETE requires one argument."));
        };
        let line = parse_index(line).map_err(|negative| {
            if negative {
                TermError::syntax("DELETE argument cannot be less than 0.")
            } else {
                TermError::syntax("DELETE command requires one integer argument.")
            }
        })?;

        let Some(text) = term.session.program.remove_line(line) else {
            return Err(TermError::command(format!(
                "Line {line} does not exist; nothing deleted."
            )));
        };
        term.save_program_state();
        let out = format!("{line} {text}");
        term.println(&out);
        Ok(CommandOutput::Text(out))
    }
}

// ---------------------------------------------------------------------------
// DOWNLOAD
// ---------------------------------------------------------------------------

struct DownloadCmd;
impl Command for DownloadCmd {
    fn name(&self) -> &str {
        "DOWNLOAD"
    }
    fn args(&self) -> &'static [&'static str] {
        &["file"]
    }
    fn help(&self) -> &str {
        "Exports the stored program listing as a JSON string to the given file (default terminal-program)."
    }
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput> {
        let args = term.tokenize_and_eval(args)?;
        let key = args
            .get(1)
            .map(String::as_str)
            .unwrap_or(DEFAULT_DOWNLOAD_KEY)
            .to_string();

        let mut listing = term.session.program.listing().join("\n");
        if !listing.is_empty() {
            listing.push('\n');
        }
        let json = serde_json::to_string(&listing)?;
        term.store_mut().save(&key, &json)?;
        log::info!("Exported program listing to {key}");
        term.println(&format!("Program saved to {key}."));
        Ok(CommandOutput::Text(listing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{output_of, run_lines, terminal};

    #[test]
    fn list_prints_program_in_order() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["20 PRINT B", "10 PRINT A"]);
        let out = output_of(&mut term, &console, "LIST");
        assert_eq!(out, "10 PRINT A\n20 PRINT B\nEnd of Program.\n");
    }

    #[test]
    fn list_range() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 A", "20 B", "30 C", "40 D"]);
        assert_eq!(
            term.process_cmd("LIST 20 30"),
            CommandOutput::text("20 B\n30 C\n")
        );
        let out = output_of(&mut term, &console, "LIST x");
        assert_eq!(out, "Syntax error; LIST requires integer arguments.\n");
    }

    #[test]
    fn run_prints_hello() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT \"HELLO\"", "20 PRINT \"WORLD\""]);
        let out = output_of(&mut term, &console, "RUN");
        assert_eq!(out, "HELLO\nWORLD\n");
        assert_eq!(term.session.status, 0);
    }

    #[test]
    fn goto_loop_hits_jump_budget() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "20 GOTO 10"]);
        let out = output_of(&mut term, &console, "RUN");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 101);
        assert!(lines[..100].iter().all(|l| *l == "A"));
        assert_eq!(lines[100], "Stack limit exceeded.");
        assert_eq!(term.session.status, 1);
        assert!(!term.session.executing);
    }

    #[test]
    fn goto_missing_line() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 GOTO 99"]);
        let out = output_of(&mut term, &console, "RUN");
        assert_eq!(out, "Invalid program line 99 specified.\n");
    }

    #[test]
    fn exit_ends_program_cleanly() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "20 EXIT", "30 PRINT B"]);
        assert_eq!(output_of(&mut term, &console, "RUN"), "A\n");
        assert_eq!(term.session.status, 0);
    }

    #[test]
    fn conditional_loop_with_variable() {
        let (mut term, console) = terminal();
        run_lines(
            &mut term,
            &[
                "10 ASSIGN 0 TO N",
                "20 ASSIGN (ADD $N 1) TO N",
                "30 IF (LT $N 3) THEN (GOTO 20)",
                "40 PRINT done $N",
            ],
        );
        let out = output_of(&mut term, &console, "RUN");
        assert_eq!(out, "done 3\n");
        assert_eq!(term.session.variables.get("N"), Some("3"));
    }

    #[test]
    fn save_inside_program_is_refused() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "20 SAVE X"]);
        let out = output_of(&mut term, &console, "RUN");
        assert_eq!(out, "A\nCannot execute control command within a program.\n");
        assert_eq!(term.session.status, 1);
        assert!(term.session.aliases.is_empty());
    }

    #[test]
    fn new_clears_program() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A"]);
        assert_eq!(output_of(&mut term, &console, "NEW"), "Stored program cleared.\n");
        assert!(term.session.program.is_empty());
    }

    #[test]
    fn save_and_recall_round_trip() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "20 PRINT B", "SAVE foo"]);
        let saved = term.session.program.clone();
        assert_eq!(term.session.aliases.get("FOO"), Some(&saved));

        run_lines(&mut term, &["NEW"]);
        assert_eq!(
            output_of(&mut term, &console, "ALIAS -R FOO"),
            "Alias FOO recalled.\n"
        );
        assert_eq!(term.session.program, saved);
    }

    #[test]
    fn save_errors() {
        let (mut term, console) = terminal();
        assert_eq!(
            output_of(&mut term, &console, "SAVE"),
            "Syntax error; SAVE requires one argument.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "SAVE list"),
            "Cannot SAVE an alias with the same name as built in command.\n"
        );
    }

    #[test]
    fn alias_runs_by_name() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT hi", "SAVE GREET", "NEW"]);
        assert_eq!(output_of(&mut term, &console, "greet"), "hi\n");
        assert_eq!(output_of(&mut term, &console, "ALIAS GREET"), "hi\n");
    }

    #[test]
    fn alias_listing_and_delete() {
        let (mut term, console) = terminal();
        assert_eq!(output_of(&mut term, &console, "ALIAS"), "No available aliases yet\n");
        run_lines(&mut term, &["10 PRINT hi", "SAVE A1", "SAVE B2"]);
        assert_eq!(
            output_of(&mut term, &console, "ALIAS"),
            "Available aliases:\nA1\nB2\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "ALIAS LIST a1"),
            "10 PRINT hi\nEnd of Program.\n"
        );
        assert_eq!(output_of(&mut term, &console, "ALIAS -d a1"), "Alias A1 deleted.\n");
        assert_eq!(
            output_of(&mut term, &console, "ALIAS -d a1"),
            "Alias A1 does not exist; nothing deleted.\n"
        );
        assert_eq!(output_of(&mut term, &console, "ALIAS -r"), "Alias name required.\n");
        assert_eq!(term.session.status, 0);
    }

    #[test]
    fn alias_completion() {
        let (mut term, _console) = terminal();
        run_lines(&mut term, &["10 PRINT hi", "SAVE FOO", "SAVE FIZZ"]);
        assert_eq!(term.complete("ALIAS -d FO").as_deref(), Some("ALIAS -d FOO"));
        assert_eq!(term.complete("ALIAS F"), None);
    }

    #[test]
    fn delete_then_list() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "20 PRINT B"]);
        assert_eq!(output_of(&mut term, &console, "DELETE 10"), "10 PRINT A\n");
        assert_eq!(
            output_of(&mut term, &console, "LIST"),
            "20 PRINT B\nEnd of Program.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "DELETE 10"),
            "Line 10 does not exist; nothing deleted.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "DELETE -1"),
            "Syntax error; DELETE argument cannot be less than 0.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "DELETE x"),
            "Syntax error; DELETE command requires one integer argument.\n"
        );
    }

    #[test]
    fn move_then_list() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "20 PRINT B"]);
        assert_eq!(output_of(&mut term, &console, "MOVE 10 30"), "30 PRINT A\n");
        assert_eq!(
            output_of(&mut term, &console, "LIST"),
            "20 PRINT B\n30 PRINT A\nEnd of Program.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "MOVE 10"),
            "Syntax error; MOVE requires two arguments.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "MOVE a 10"),
            "Syntax error; MOVE command requires two integer arguments.\n"
        );
        assert_eq!(
            output_of(&mut term, &console, "MOVE 20 -5"),
            "Syntax error; MOVE arguments cannot be less than 0.\n"
        );
    }

    #[test]
    fn download_writes_listing_to_store() {
        let (mut term, console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "20 PRINT B"]);
        assert_eq!(
            output_of(&mut term, &console, "DOWNLOAD"),
            "Program saved to terminal-program.\n"
        );
        let saved = term.store().load("terminal-program").unwrap().unwrap();
        assert_eq!(saved, r#""10 PRINT A\n20 PRINT B\n""#);
        assert_eq!(
            serde_json::from_str::<String>(&saved).unwrap(),
            "10 PRINT A\n20 PRINT B\n"
        );
        term.process_cmd("DOWNLOAD backup");
        assert!(term.store().load("backup").unwrap().is_some());
    }

    #[test]
    fn mutations_are_persisted() {
        let (mut term, _console) = terminal();
        run_lines(&mut term, &["10 PRINT A", "SAVE KEEP", "MOVE 10 20"]);
        let key = term.config().storage_key.clone();
        let json = term.store().load(&key).unwrap().unwrap();
        assert!(json.contains("\"20\":\"PRINT A\""));
        assert!(json.contains("KEEP"));
    }
}
