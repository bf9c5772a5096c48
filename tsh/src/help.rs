pub struct CommandHelp {
    pub name: &'static str,
    pub summary: &'static str,
    pub usage: &'static str,
    pub options: &'static [(&'static str, &'static str)],
}

pub const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "alias",
        summary: "Define or list aliases",
        usage: "alias [NAME [VALUE]]",
        options: &[],
    },
    CommandHelp {
        name: "cd",
        summary: "Change the current directory",
        usage: "cd [DIR]",
        options: &[],
    },
    CommandHelp {
        name: "exit",
        summary: "Exit the shell",
        usage: "exit [CODE]",
        options: &[],
    },
    CommandHelp {
        name: "export",
        summary: "Pass a variable on to child processes",
        usage: "export NAME",
        options: &[],
    },
    CommandHelp {
        name: "help",
        summary: "Show help for builtin commands",
        usage: "help [COMMAND]",
        options: &[],
    },
    CommandHelp {
        name: "history",
        summary: "List previously entered lines, newest last",
        usage: "history [-c]",
        options: &[("-c", "Clear the history")],
    },
    CommandHelp {
        name: "set",
        summary: "Set a shell variable, or list unexported ones",
        usage: "set [NAME [VALUE]]",
        options: &[],
    },
    CommandHelp {
        name: "source",
        summary: "Execute each line of a file in the current shell",
        usage: "source FILE [ARG]...",
        options: &[],
    },
    CommandHelp {
        name: "unalias",
        summary: "Remove an alias",
        usage: "unalias NAME",
        options: &[],
    },
    CommandHelp {
        name: "unset",
        summary: "Remove a shell variable",
        usage: "unset NAME",
        options: &[],
    },
];

pub fn get_help(name: &str) -> Option<&'static CommandHelp> {
    COMMANDS.iter().find(|c| c.name == name)
}

pub fn format_help(cmd: &CommandHelp) -> String {
    let mut out = format!("{} - {}\n\nUsage: {}\n", cmd.name, cmd.summary, cmd.usage);
    if !cmd.options.is_empty() {
        out.push_str("\nOptions:\n");
        for (opt, desc) in cmd.options {
            out.push_str(&format!("  {opt:16} {desc}\n"));
        }
    }
    out
}

/// Summary of the given builtin names; names without an entry get a bare line.
pub fn format_help_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::from("Builtin commands:\n\n");
    for name in names {
        match get_help(name) {
            Some(cmd) => out.push_str(&format!("  {:12} {}\n", cmd.name, cmd.summary)),
            None => out.push_str(&format!("  {name}\n")),
        }
    }
    out.push_str("\nUse 'help COMMAND' or 'COMMAND --help' for more information.\n");
    out
}

pub fn wants_help(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == "--help" || a == "-h")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lookup() {
        let cmd = get_help("history").unwrap();
        let text = format_help(cmd);
        assert!(text.starts_with("history - "));
        assert!(text.contains("Usage: history [-c]"));
        assert!(text.contains("-c"));
        assert!(get_help("ls").is_none());
    }

    #[test]
    fn test_help_list_covers_unknown_names() {
        let text = format_help_list(["cd", "custom"]);
        assert!(text.contains("cd"));
        assert!(text.contains("  custom\n"));
    }

    #[test]
    fn test_wants_help_ignores_command_name() {
        let args = |v: &[&str]| v.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert!(wants_help(&args(&["cd", "--help"])));
        assert!(!wants_help(&args(&["-h"])));
        assert!(!wants_help(&args(&["cd", "dir"])));
    }
}
