//! Evaluator for tsh command lines

use crate::ast::{LogicalOp, Node};
use crate::error::{ShError, ShResult};
use crate::parser::parse;
use crate::shell::Shell;
use std::io::{self, Write};
use tracing::debug;

mod builtins_shell;
pub mod expansion;
pub mod launch;

pub(crate) use builtins_shell::DEFAULT_BUILTINS;

impl Shell {
    /// Run one line and store its status in `status`. Errors are reported
    /// on stderr; only `exit` is returned to the caller.
    pub fn execute(&mut self, line: &str) -> ShResult<()> {
        match self.run_line(line) {
            Ok(Some(status)) => {
                self.set_status(status);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(ShError::Exit(code)) => Err(ShError::Exit(code)),
            Err(err) => {
                self.report(line, &err);
                Ok(())
            }
        }
    }

    /// Parse, resolve and run one line. Returns `None` for a line without
    /// commands; every error is passed up.
    pub fn run_line(&mut self, line: &str) -> ShResult<Option<i32>> {
        let Some(mut tree) = parse(line)? else {
            return Ok(None);
        };
        debug!(?tree, "parsed");

        expansion::resolve_literals(&mut tree, &self.vars);
        self.expand(&mut tree)?;

        if self.print_tree {
            let mut out = io::stdout().lock();
            write!(out, "{tree}")?;
            out.flush()?;
        }

        self.execute_tree(&tree).map(Some)
    }

    /// Walk a resolved tree and return its exit status.
    pub fn execute_tree(&mut self, node: &Node) -> ShResult<i32> {
        match node {
            Node::Command(cmd) => {
                if cmd.words.is_empty() {
                    return Ok(0);
                }
                self.exec_and_return(&cmd.argv())
            }
            Node::Pipe(stages) => self.run_pipeline(stages),
            Node::Sequence { lhs, rhs } => {
                self.execute_tree(lhs)?;
                self.execute_tree(rhs)
            }
            Node::Logical { op, lhs, rhs } => {
                let status = self.execute_tree(lhs)?;
                match op {
                    LogicalOp::And if status == 0 => self.execute_tree(rhs),
                    LogicalOp::And => Ok(status),
                    LogicalOp::Or if status != 0 => self.execute_tree(rhs),
                    LogicalOp::Or => Ok(0),
                }
            }
        }
    }

    fn report(&self, line: &str, err: &ShError) {
        let _ = write_report(&mut io::stderr().lock(), &self.name, line, err);
    }
}

/// Echo the line, put a caret under the failing column and name the error.
fn write_report(out: &mut impl Write, name: &str, line: &str, err: &ShError) -> io::Result<()> {
    writeln!(out, "{line}")?;
    writeln!(out, "{:>width$}", "^", width = err.position() + 1)?;
    writeln!(out, "{name}: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell {
        Shell::builder().isolated().build()
    }

    #[test]
    fn test_blank_line_keeps_status() {
        let mut sh = shell();
        sh.set_status(4);
        assert_eq!(sh.run_line("   # nothing").unwrap(), None);
        sh.execute("").unwrap();
        assert_eq!(sh.last_status(), 4);
    }

    #[test]
    fn test_builtin_status_is_stored() {
        let mut sh = shell();
        sh.execute("unset NOT_THERE").unwrap();
        assert_eq!(sh.last_status(), 1);
        sh.execute("set X 1").unwrap();
        assert_eq!(sh.last_status(), 0);
    }

    #[test]
    fn test_sequence_runs_both_sides() {
        let mut sh = shell();
        assert_eq!(sh.run_line("set A 1; set B 2").unwrap(), Some(0));
        assert_eq!(sh.vars.get("A"), Some("1"));
        assert_eq!(sh.vars.get("B"), Some("2"));
        // Status is the right-hand side's.
        assert_eq!(sh.run_line("set C 3; unset NOPE").unwrap(), Some(1));
    }

    #[test]
    fn test_short_circuit() {
        let mut sh = shell();
        assert_eq!(sh.run_line("unset NOPE && set RAN yes").unwrap(), Some(1));
        assert_eq!(sh.vars.get("RAN"), None);

        assert_eq!(sh.run_line("unset NOPE || set RAN yes").unwrap(), Some(0));
        assert_eq!(sh.vars.get("RAN"), Some("yes"));

        assert_eq!(sh.run_line("set OK 1 || set SKIPPED 1").unwrap(), Some(0));
        assert_eq!(sh.vars.get("SKIPPED"), None);
    }

    #[test]
    fn test_variables_resolve_before_the_line_runs() {
        let mut sh = shell();
        sh.execute("set X old").unwrap();
        sh.execute("set X new; set Y $X").unwrap();
        assert_eq!(sh.vars.get("Y"), Some("old"));
    }

    #[test]
    fn test_alias_is_applied() {
        let mut sh = shell();
        sh.execute("alias remember 'set REMEMBERED'").unwrap();
        sh.execute("remember yes").unwrap();
        assert_eq!(sh.vars.get("REMEMBERED"), Some("yes"));
    }

    #[test]
    fn test_syntax_error_aborts_line() {
        let mut sh = shell();
        sh.set_status(5);
        let err = sh.run_line("set X (foo").unwrap_err();
        assert!(matches!(err, ShError::Syntax(ref e) if e.position == 10));
        assert_eq!(err.position(), 10);

        sh.execute("set X 1; set Y 'unterminated").unwrap();
        assert_eq!(sh.vars.get("X"), None);
        assert_eq!(sh.last_status(), 5);
    }

    fn report_text(line: &str, err: &ShError) -> String {
        let mut out = Vec::new();
        write_report(&mut out, "tsh", line, err).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_report_puts_caret_under_syntax_error() {
        let err = parse("echo 'abc").unwrap_err();
        assert_eq!(
            report_text("echo 'abc", &ShError::Syntax(err)),
            "echo 'abc\n         ^\ntsh: syntax error: unexpected end of input\n"
        );
    }

    #[test]
    fn test_report_puts_caret_at_column_zero_for_process_errors() {
        let err = ShError::Process("Resource temporarily unavailable".to_string());
        assert_eq!(
            report_text("echo a | cat", &err),
            "echo a | cat\n^\ntsh: process error: Resource temporarily unavailable\n"
        );
    }

    #[test]
    fn test_exit_escapes_execute() {
        let mut sh = shell();
        assert!(matches!(sh.execute("exit 3"), Err(ShError::Exit(3))));
        assert!(matches!(
            sh.execute("set A 1; exit 2; set B 1"),
            Err(ShError::Exit(2))
        ));
        assert_eq!(sh.vars.get("A"), Some("1"));
        assert_eq!(sh.vars.get("B"), None);
    }

    #[test]
    fn test_empty_command_after_expansion() {
        let mut sh = shell();
        sh.aliases.set("nothing", "");
        assert_eq!(sh.run_line("nothing").unwrap(), Some(0));
    }

    #[test]
    fn test_status_variable() {
        let mut sh = shell();
        sh.execute("unset NOPE").unwrap();
        sh.execute("set S $status").unwrap();
        assert_eq!(sh.vars.get("S"), Some("1"));
    }
}
