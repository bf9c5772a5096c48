use crate::error::{ShError, ShResult};
use crate::help::{format_help, format_help_list, get_help};
use crate::shell::{BuiltinFn, Shell};
use std::io::{self, Write};

/// Builtins every shell starts with.
pub(crate) const DEFAULT_BUILTINS: &[(&str, BuiltinFn)] = &[
    ("exit", Shell::cmd_exit),
    ("cd", Shell::cmd_cd),
    ("set", Shell::cmd_set),
    ("unset", Shell::cmd_unset),
    ("export", Shell::cmd_export),
    ("alias", Shell::cmd_alias),
    ("unalias", Shell::cmd_unalias),
    ("history", Shell::cmd_history),
    ("source", Shell::cmd_source),
    ("help", Shell::cmd_help),
];

impl Shell {
    fn cmd_exit(&mut self, argv: &[String]) -> ShResult<i32> {
        match argv {
            [_] => Err(ShError::Exit(self.last_status())),
            [_, code] => match code.trim().parse::<i32>() {
                Ok(code) => Err(ShError::Exit(code)),
                Err(_) => {
                    eprintln!("exit: status is invalid");
                    Ok(1)
                }
            },
            _ => {
                eprintln!("exit: too many arguments");
                Ok(1)
            }
        }
    }

    fn cmd_cd(&mut self, argv: &[String]) -> ShResult<i32> {
        let target = match argv {
            [_] => match self.vars.get("HOME") {
                Some(home) => home.to_string(),
                None => {
                    eprintln!("cd: $HOME is not defined");
                    return Ok(1);
                }
            },
            [_, dir] => dir.clone(),
            _ => {
                eprintln!("cd: too many arguments");
                return Ok(1);
            }
        };

        if let Err(err) = std::env::set_current_dir(&target) {
            eprintln!("cd: {target}: {err}");
            return Ok(1);
        }
        let cwd = std::env::current_dir()?;
        self.vars.set("PWD", &cwd.to_string_lossy());
        Ok(0)
    }

    fn cmd_set(&mut self, argv: &[String]) -> ShResult<i32> {
        match argv {
            [_] => {
                let mut out = io::stdout().lock();
                for (name, value) in self.vars.iter() {
                    if !self.vars.is_exported(name) {
                        writeln!(out, "{name} = {value}")?;
                    }
                }
            }
            [_, name] => self.vars.set(name, ""),
            [_, name, value] => self.vars.set(name, value),
            _ => {
                eprintln!("set: too many arguments");
                return Ok(1);
            }
        }
        Ok(0)
    }

    fn cmd_unset(&mut self, argv: &[String]) -> ShResult<i32> {
        match argv {
            [_, name] => Ok(i32::from(!self.vars.unset(name))),
            _ => Ok(0),
        }
    }

    fn cmd_export(&mut self, argv: &[String]) -> ShResult<i32> {
        match argv {
            [_, name] => Ok(i32::from(!self.vars.export(name))),
            _ => Ok(0),
        }
    }

    fn cmd_alias(&mut self, argv: &[String]) -> ShResult<i32> {
        match argv {
            [_] => {
                let mut out = io::stdout().lock();
                for (name, value) in self.aliases.iter() {
                    writeln!(out, "{name} = {value}")?;
                }
            }
            [_, name] => self.aliases.set(name, ""),
            [_, name, value] => self.aliases.set(name, value),
            _ => {
                eprintln!("alias: too many arguments");
                return Ok(1);
            }
        }
        Ok(0)
    }

    fn cmd_unalias(&mut self, argv: &[String]) -> ShResult<i32> {
        match argv {
            [_, name] => Ok(i32::from(!self.aliases.unset(name))),
            _ => Ok(0),
        }
    }

    fn cmd_history(&mut self, argv: &[String]) -> ShResult<i32> {
        match argv {
            [_] => {
                let total = self.history.len();
                let width = total.to_string().len();
                let mut out = io::stdout().lock();
                for (i, line) in self.history.entries().enumerate() {
                    writeln!(out, "  {:>width$}  {line}", total - i)?;
                }
            }
            [_, flag] if flag == "-c" => self.history.clear(),
            _ => {
                eprintln!("history: usage: history [-c]");
                return Ok(1);
            }
        }
        Ok(0)
    }

    /// `source FILE [ARG]...`: run the file line by line with `0`, `1`, ...
    /// set to the file and its arguments.
    fn cmd_source(&mut self, argv: &[String]) -> ShResult<i32> {
        let Some(path) = argv.get(1) else {
            eprintln!("source: filename argument required");
            return Ok(1);
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                eprintln!("source: {path}: {err}");
                return Ok(1);
            }
        };

        for (i, arg) in argv[1..].iter().enumerate() {
            self.vars.set(&i.to_string(), arg);
        }
        for line in content.lines() {
            self.execute(line)?;
        }
        Ok(self.last_status())
    }

    fn cmd_help(&mut self, argv: &[String]) -> ShResult<i32> {
        let mut out = io::stdout().lock();
        match argv.get(1) {
            None => write!(out, "{}", format_help_list(self.builtin_names()))?,
            Some(name) => match get_help(name) {
                Some(help) => write!(out, "{}", format_help(help))?,
                None if self.is_builtin(name) => writeln!(out, "{name}: no help available")?,
                None => {
                    eprintln!("help: no help for '{name}'");
                    return Ok(1);
                }
            },
        }
        Ok(0)
    }
}
