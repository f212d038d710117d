//! Action and flag grammar shared by commands.
//!
//! A command line is `CMD [action] [-flags [value]]... name...`. Actions are
//! whole words (`LIST`, `--LIST`, `L`) recognised only right after the
//! command word. Flags are clusters of single letters (`-dl`); a letter marked
//! as taking an argument consumes the next token as its value. Whatever is
//! left is joined back into the free-text `name`.
//!
//! Arguments are tokenized and evaluated before flags are extracted, so a
//! flag value may be a quoted string or a sub-command.

use std::collections::BTreeMap;

use cterm_types::error::Result;

use crate::interpreter::Terminal;

/// One named action and the words that select it.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub name: &'static str,
    pub spellings: &'static [&'static str],
}

/// Recognised actions and flag letters for a command.
#[derive(Debug, Clone, Copy)]
pub struct FlagDictionary {
    pub actions: &'static [ActionSpec],
    /// Valid flag letters, uppercase.
    pub modifiers: &'static [char],
}

/// Actions and flags understood by ALIAS and INPUT.
pub const STANDARD_FLAGS: FlagDictionary = FlagDictionary {
    actions: &[
        ActionSpec {
            name: "list",
            spellings: &["--LIST", "LIST", "L"],
        },
        ActionSpec {
            name: "recall",
            spellings: &["--RECALL", "RECALL", "R"],
        },
        ActionSpec {
            name: "delete",
            spellings: &["--DELETE", "DELETE", "D"],
        },
    ],
    modifiers: &['D', 'L', 'P', 'R', 'U'],
};

/// How to parse a particular command.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub eval_tokens: bool,
    pub look_for_action: bool,
    /// Flag letters whose value is the following token.
    pub with_argument: &'static [char],
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            eval_tokens: true,
            look_for_action: true,
            with_argument: &[],
        }
    }
}

/// Value of a parsed flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Set,
    Value(String),
}

/// A command line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedArgs {
    /// Uppercased command word.
    pub cmd: String,
    /// Name of the matched action.
    pub action: Option<&'static str>,
    pub flags: BTreeMap<char, FlagValue>,
    /// Free text after action and flags.
    pub name: String,
    /// Number of tokens consumed by the command word, action and flags.
    pub start: usize,
}

impl ParsedArgs {
    pub fn has(&self, flag: char) -> bool {
        self.flags.contains_key(&flag)
    }

    /// Value of an argument-taking flag.
    pub fn value(&self, flag: char) -> Option<&str> {
        match self.flags.get(&flag) {
            Some(FlagValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// True when the action `name` was given as a word or as `flag`.
    pub fn wants(&self, name: &str, flag: char) -> bool {
        self.action == Some(name) || self.has(flag)
    }
}

fn is_flag_cluster(token: &str, dict: &FlagDictionary) -> bool {
    let upper = token.to_uppercase();
    let Some(letters) = upper.strip_prefix('-') else {
        return false;
    };
    !letters.is_empty() && letters.chars().all(|c| dict.modifiers.contains(&c))
}

fn find_action(token: &str, dict: &FlagDictionary) -> Option<&'static str> {
    let upper = token.to_uppercase();
    dict.actions
        .iter()
        .find(|a| a.spellings.contains(&upper.as_str()))
        .map(|a| a.name)
}

/// Split already-evaluated arguments into action, flags and name.
pub fn parse_args(args: &[String], options: &ParseOptions, dict: &FlagDictionary) -> ParsedArgs {
    let mut parsed = ParsedArgs {
        cmd: args.first().map(|a| a.to_uppercase()).unwrap_or_default(),
        start: 1,
        ..ParsedArgs::default()
    };

    let mut i = 1;
    if options.look_for_action
        && let Some(action) = args.get(i).and_then(|a| find_action(a, dict))
    {
        parsed.action = Some(action);
        parsed.start += 1;
        i += 1;
    }

    let mut rest = Vec::new();
    while i < args.len() {
        let token = &args[i];
        if !is_flag_cluster(token, dict) {
            rest.push(token.as_str());
            i += 1;
            continue;
        }

        let mut took_argument = false;
        for letter in token[1..].chars().map(|c| c.to_ascii_uppercase()) {
            let value = if options.with_argument.contains(&letter) {
                took_argument = true;
                FlagValue::Value(args.get(i + 1).cloned().unwrap_or_default())
            } else {
                FlagValue::Set
            };
            parsed.flags.insert(letter, value);
        }
        parsed.start += 1;
        i += 1;
        if took_argument {
            parsed.start += 1;
            i += 1;
        }
    }

    parsed.name = rest.join(" ");
    parsed
}

impl Terminal {
    /// Tokenize and evaluate (unless disabled), then parse flags.
    pub fn parse_command_line(
        &mut self,
        args: &[String],
        options: &ParseOptions,
        dict: &FlagDictionary,
    ) -> Result<ParsedArgs> {
        let args = if options.eval_tokens {
            self.tokenize_and_eval(args)?
        } else {
            args.to_vec()
        };
        Ok(parse_args(&args, options, dict))
    }
}
