//! Shell state and construction

use crate::error::ShResult;
use crate::state::{history_capacity, Aliases, History, Vars};
use std::collections::HashMap;

/// In-process command. Receives the whole argv, `argv[0]` being the name it
/// was invoked under, and returns the exit status.
pub type BuiltinFn = fn(&mut Shell, &[String]) -> ShResult<i32>;

/// Capacity of the history when `HISTSIZE` is not usable.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

pub struct Shell {
    /// Prefix of diagnostics
    pub name: String,
    pub vars: Vars,
    pub aliases: Aliases,
    pub history: History,
    pub builtins: HashMap<String, BuiltinFn>,
    /// Dump each resolved tree before running it
    pub print_tree: bool,
    pub history_default: usize,
}

impl Shell {
    /// Shell with the default builtins and the process environment imported.
    pub fn new(name: &str) -> Self {
        ShellBuilder::new().name(name).build()
    }

    pub fn builder() -> ShellBuilder {
        ShellBuilder::new()
    }

    /// Import every variable of the process environment as exported.
    pub fn sync_vars(&mut self) {
        for (name, value) in std::env::vars_os() {
            if let (Some(name), Some(value)) = (name.to_str(), value.to_str()) {
                self.vars.import(name, value);
            }
        }
    }

    pub fn register_builtin(&mut self, name: &str, func: BuiltinFn) {
        self.builtins.insert(name.to_string(), func);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Builtin names, sorted.
    pub fn builtin_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builtins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Status of the last completed line, from the `status` variable.
    pub fn last_status(&self) -> i32 {
        self.vars
            .get("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_status(&mut self, status: i32) {
        self.vars.set("status", &status.to_string());
    }

    /// Record an entered line, bounded by `HISTSIZE`.
    pub fn add_history(&mut self, line: &str) {
        let capacity = history_capacity(self.vars.get("HISTSIZE"), self.history_default);
        self.history.push(line, capacity);
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new("tsh")
    }
}

/// Builder for embedding a shell with custom state.
pub struct ShellBuilder {
    name: String,
    vars: Vec<(String, String)>,
    aliases: Vec<(String, String)>,
    builtins: Vec<(String, BuiltinFn)>,
    print_tree: bool,
    history_default: usize,
    import_env: bool,
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self {
            name: "tsh".to_string(),
            vars: Vec::new(),
            aliases: Vec::new(),
            builtins: Vec::new(),
            print_tree: false,
            history_default: DEFAULT_HISTORY_SIZE,
            import_env: true,
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn var(mut self, name: &str, value: &str) -> Self {
        self.vars.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn alias(mut self, name: &str, value: &str) -> Self {
        self.aliases.push((name.to_string(), value.to_string()));
        self
    }

    /// Add or replace a builtin.
    #[must_use]
    pub fn builtin(mut self, name: &str, func: BuiltinFn) -> Self {
        self.builtins.push((name.to_string(), func));
        self
    }

    #[must_use]
    pub const fn print_tree(mut self, enabled: bool) -> Self {
        self.print_tree = enabled;
        self
    }

    #[must_use]
    pub const fn history_size(mut self, size: usize) -> Self {
        self.history_default = size;
        self
    }

    /// Skip importing the process environment.
    #[must_use]
    pub const fn isolated(mut self) -> Self {
        self.import_env = false;
        self
    }

    pub fn build(self) -> Shell {
        let mut shell = Shell {
            name: self.name,
            vars: Vars::new(),
            aliases: Aliases::new(),
            history: History::new(),
            builtins: HashMap::new(),
            print_tree: self.print_tree,
            history_default: self.history_default,
        };

        for &(name, func) in crate::eval::DEFAULT_BUILTINS {
            shell.register_builtin(name, func);
        }
        for (name, func) in self.builtins {
            shell.register_builtin(&name, func);
        }

        if self.import_env {
            shell.sync_vars();
        }
        for (name, value) in &self.vars {
            shell.vars.set(name, value);
        }
        for (name, value) in &self.aliases {
            shell.aliases.set(name, value);
        }
        shell.set_status(0);
        shell
    }
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(_shell: &mut Shell, _argv: &[String]) -> ShResult<i32> {
        Ok(42)
    }

    #[test]
    fn test_shell_creation() {
        let shell = Shell::builder().isolated().build();
        assert_eq!(shell.name, "tsh");
        assert_eq!(shell.vars.get("status"), Some("0"));
        assert_eq!(shell.last_status(), 0);
        for name in ["exit", "cd", "set", "unset", "export", "alias", "unalias", "history"] {
            assert!(shell.is_builtin(name), "missing builtin {name}");
        }
    }

    #[test]
    fn test_new_imports_environment() {
        std::env::set_var("TSH_TEST_IMPORTED", "yes");
        let shell = Shell::new("tsh");
        assert_eq!(shell.vars.get("TSH_TEST_IMPORTED"), Some("yes"));
        assert!(shell.vars.is_exported("TSH_TEST_IMPORTED"));
    }

    #[test]
    fn test_builder_state() {
        let mut shell = Shell::builder()
            .name("mysh")
            .isolated()
            .var("greeting", "hi")
            .alias("ll", "ls -l")
            .builtin("answer", answer)
            .print_tree(true)
            .build();
        assert_eq!(shell.name, "mysh");
        assert!(shell.print_tree);
        assert_eq!(shell.vars.get("greeting"), Some("hi"));
        assert_eq!(shell.aliases.get("ll"), Some("ls -l"));

        let func = shell.builtins["answer"];
        assert_eq!(func(&mut shell, &["answer".to_string()]).unwrap(), 42);
    }

    #[test]
    fn test_history_size_from_variable() {
        let mut shell = Shell::builder().isolated().history_size(2).build();
        for line in ["a", "b", "c"] {
            shell.add_history(line);
        }
        assert_eq!(shell.history.entries().collect::<Vec<_>>(), vec!["b", "c"]);

        shell.vars.set("HISTSIZE", "0");
        shell.add_history("d");
        assert_eq!(shell.history.len(), 2);

        shell.vars.set("HISTSIZE", "bogus");
        shell.add_history("e");
        assert_eq!(shell.history.entries().collect::<Vec<_>>(), vec!["c", "e"]);
    }
}
