//! Variable, alias and history stores

use std::collections::{BTreeMap, HashSet, VecDeque};

/// Shell variables. Exported names are mirrored into the process
/// environment so that children inherit them.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: BTreeMap<String, String>,
    exported: HashSet<String>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        if self.exported.contains(name) {
            std::env::set_var(name, value);
        }
        self.values.insert(name.to_string(), value.to_string());
    }

    /// Returns false if the variable was not defined.
    pub fn unset(&mut self, name: &str) -> bool {
        if self.exported.remove(name) {
            std::env::remove_var(name);
        }
        self.values.remove(name).is_some()
    }

    /// Returns false if the variable is not defined.
    pub fn export(&mut self, name: &str) -> bool {
        let Some(value) = self.values.get(name) else {
            return false;
        };
        std::env::set_var(name, value);
        self.exported.insert(name.to_string());
        true
    }

    pub fn is_exported(&self, name: &str) -> bool {
        self.exported.contains(name)
    }

    /// Record a variable that already lives in the environment.
    pub(crate) fn import(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
        self.exported.insert(name.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aliases {
    entries: BTreeMap<String, String>,
}

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_string(), value.to_string());
    }

    pub fn unset(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Bounded list of previously entered lines, oldest first.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line. Blank lines and repeats of the newest entry are
    /// skipped; at most one old entry is dropped per call.
    pub fn push(&mut self, line: &str, capacity: usize) {
        if capacity == 0 || line.trim().is_empty() {
            return;
        }
        if self.entries.back().is_some_and(|last| last == line) {
            return;
        }
        if self.entries.len() >= capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Capacity from a `HISTSIZE` value, falling back to `default` when the
/// value is missing or not a number.
pub fn history_capacity(histsize: Option<&str>, default: usize) -> usize {
    histsize
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vars_set_get_unset() {
        let mut vars = Vars::new();
        vars.set("TSH_TEST_A", "1");
        assert_eq!(vars.get("TSH_TEST_A"), Some("1"));
        assert!(vars.unset("TSH_TEST_A"));
        assert!(!vars.unset("TSH_TEST_A"));
        assert_eq!(vars.get("TSH_TEST_A"), None);
    }

    #[test]
    fn test_export_mirrors_environment() {
        let mut vars = Vars::new();
        assert!(!vars.export("TSH_TEST_UNDEFINED"));

        vars.set("TSH_TEST_EXPORTED", "one");
        assert!(vars.export("TSH_TEST_EXPORTED"));
        assert!(vars.is_exported("TSH_TEST_EXPORTED"));
        assert_eq!(std::env::var("TSH_TEST_EXPORTED").as_deref(), Ok("one"));

        vars.set("TSH_TEST_EXPORTED", "two");
        assert_eq!(std::env::var("TSH_TEST_EXPORTED").as_deref(), Ok("two"));

        assert!(vars.unset("TSH_TEST_EXPORTED"));
        assert!(!vars.is_exported("TSH_TEST_EXPORTED"));
        assert!(std::env::var("TSH_TEST_EXPORTED").is_err());
    }

    #[test]
    fn test_unexported_set_leaves_environment_alone() {
        let mut vars = Vars::new();
        vars.set("TSH_TEST_LOCAL", "x");
        assert!(std::env::var("TSH_TEST_LOCAL").is_err());
    }

    #[test]
    fn test_vars_iterate_sorted() {
        let mut vars = Vars::new();
        vars.set("b", "2");
        vars.set("a", "1");
        let names: Vec<&str> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_aliases() {
        let mut aliases = Aliases::new();
        aliases.set("ll", "ls -l");
        assert_eq!(aliases.get("ll"), Some("ls -l"));
        assert!(aliases.unset("ll"));
        assert!(!aliases.unset("ll"));
    }

    #[test]
    fn test_history_skips_blank_and_repeated_lines() {
        let mut history = History::new();
        history.push("ls", 10);
        history.push("ls", 10);
        history.push("   ", 10);
        history.push("pwd", 10);
        history.push("ls", 10);
        assert_eq!(history.entries().collect::<Vec<_>>(), vec!["ls", "pwd", "ls"]);
    }

    #[test]
    fn test_history_evicts_oldest_at_capacity() {
        let mut history = History::new();
        for line in ["a", "b", "c", "d"] {
            history.push(line, 3);
        }
        assert_eq!(history.entries().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_history_shrunk_capacity_drops_one_per_push() {
        let mut history = History::new();
        for line in ["a", "b", "c", "d"] {
            history.push(line, 10);
        }
        history.push("e", 2);
        assert_eq!(history.entries().collect::<Vec<_>>(), vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn test_history_zero_capacity_stores_nothing() {
        let mut history = History::new();
        history.push("ls", 0);
        assert!(history.is_empty());
    }

    #[test]
    fn test_history_capacity_parsing() {
        assert_eq!(history_capacity(None, 100), 100);
        assert_eq!(history_capacity(Some("5"), 100), 5);
        assert_eq!(history_capacity(Some("lots"), 100), 100);
        assert_eq!(history_capacity(Some("-1"), 100), 100);
    }
}
