use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Line editor helper: completes command names and paths, hints from
/// history.
pub struct TshHelper {
    /// Builtin and alias names, refreshed by the REPL before each prompt
    pub commands: Arc<RwLock<Vec<String>>>,
    hinter: HistoryHinter,
}

impl TshHelper {
    pub fn new(commands: Arc<RwLock<Vec<String>>>) -> Self {
        Self {
            commands,
            hinter: HistoryHinter::new(),
        }
    }

    fn command_candidates(&self, prefix: &str) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .commands
            .read()
            .map(|names| {
                names
                    .iter()
                    .filter(|n| n.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(paths) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&paths) {
                names.extend(matching_entries(&dir, prefix, false));
            }
        }
        names
    }
}

/// Entries of `dir` starting with `prefix`; directories get a trailing `/`
/// when `mark_dirs` is set.
fn matching_entries(dir: &Path, prefix: &str, mark_dirs: bool) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(prefix) || (prefix.is_empty() && name.starts_with('.')) {
                return None;
            }
            let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
            Some(if mark_dirs && is_dir { format!("{name}/") } else { name })
        })
        .collect()
}

fn find_word_start(line: &str) -> (usize, &str) {
    let mut start = line.len();
    for (i, c) in line.char_indices().rev() {
        if c.is_whitespace() || matches!(c, ';' | '|' | '&' | '(') {
            break;
        }
        start = i;
    }
    (start, &line[start..])
}

impl Completer for TshHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let (start, word) = find_word_start(line_to_cursor);

        let before = line_to_cursor[..start].trim_end();
        let is_first_word = before.is_empty() || before.ends_with([';', '|', '&', '(']);

        if is_first_word && !word.contains('/') {
            if word.is_empty() {
                return Ok((pos, Vec::new()));
            }
            let completions = self
                .command_candidates(word)
                .into_iter()
                .map(|name| Pair {
                    display: name.clone(),
                    replacement: name,
                })
                .collect();
            return Ok((start, completions));
        }

        let (dir, partial) = match word.rfind('/') {
            Some(slash) => (&word[..=slash], &word[slash + 1..]),
            None => ("", word),
        };
        let search_dir = if dir.is_empty() { "." } else { dir };
        let mut names = matching_entries(Path::new(search_dir), partial, true);
        names.sort();

        let completions = names
            .into_iter()
            .map(|name| Pair {
                replacement: format!("{dir}{name}"),
                display: name,
            })
            .collect();
        Ok((start, completions))
    }
}

impl Hinter for TshHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for TshHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

impl Validator for TshHelper {}

impl Helper for TshHelper {}
