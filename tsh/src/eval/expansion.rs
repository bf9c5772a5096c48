//! Tree resolution: literal fragments, subcommand capture and aliases

use crate::ast::{Command, Fragment, Node, Word};
use crate::error::{ShError, ShResult};
use crate::shell::Shell;
use crate::state::{Aliases, Vars};
use tracing::{debug, trace};

/// Character produced by `\c`.
const fn unescape(c: char) -> char {
    match c {
        'a' => '\x07',
        'b' => '\x08',
        'e' => '\x1b',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        other => other,
    }
}

fn resolve_fragment(part: &mut Fragment, vars: &Vars) {
    let text = match part {
        Fragment::Variable(name) => vars.get(name).unwrap_or_default().to_string(),
        Fragment::Tilde => vars.get("HOME").unwrap_or_default().to_string(),
        Fragment::SingleQuoted(text) => std::mem::take(text),
        Fragment::Escape(c) => unescape(*c).to_string(),
        Fragment::Regular(_) | Fragment::Subcommand(_) => return,
    };
    trace!(?part, %text, "resolved fragment");
    *part = Fragment::Regular(text);
}

/// Turn variables, tildes, quotes and escapes into plain text.
/// Subcommands are left for [`Shell::expand`].
pub fn resolve_literals(node: &mut Node, vars: &Vars) {
    for cmd in node.commands_mut() {
        for word in &mut cmd.words {
            for part in &mut word.parts {
                resolve_fragment(part, vars);
            }
        }
    }
}

/// Split captured output on `\n`. A final unterminated line is kept; the
/// empty piece after a trailing newline is not.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// One word per combination of the captured lines, first capture varying
/// slowest.
fn expand_word<F>(word: &Word, capture: &mut F) -> ShResult<Vec<Word>>
where
    F: FnMut(&str) -> ShResult<Vec<String>>,
{
    let mut captures = Vec::new();
    for part in &word.parts {
        if let Fragment::Subcommand(text) = part {
            captures.push(capture(text)?);
        }
    }

    let mut combos: Vec<Vec<&str>> = vec![Vec::new()];
    for lines in &captures {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                lines.iter().map(move |line| {
                    let mut next = prefix.clone();
                    next.push(line.as_str());
                    next
                })
            })
            .collect();
    }

    let words = combos
        .into_iter()
        .map(|combo| {
            let mut lines = combo.into_iter();
            let parts = word
                .parts
                .iter()
                .map(|part| match part {
                    Fragment::Subcommand(_) => {
                        Fragment::Regular(lines.next().unwrap_or_default().to_string())
                    }
                    other => other.clone(),
                })
                .collect();
            Word { parts }
        })
        .collect();
    Ok(words)
}

/// Expand the subcommands of a word list through `capture`, then flatten
/// every word into a single literal.
pub fn expand_words<F>(words: &mut Vec<Word>, capture: &mut F) -> ShResult<()>
where
    F: FnMut(&str) -> ShResult<Vec<String>>,
{
    let mut expanded = Vec::with_capacity(words.len());
    for word in std::mem::take(words) {
        if word.has_subcommand() {
            expanded.extend(expand_word(&word, capture)?);
        } else {
            expanded.push(word);
        }
    }

    for word in &mut expanded {
        word.flatten()
            .map_err(|part| ShError::Runtime(format!("unresolved fragment {part:?}")))?;
    }
    *words = expanded;
    Ok(())
}

/// Replace an aliased first word by the words of the alias text, once, and
/// cache the resulting command name.
pub fn substitute_alias(cmd: &mut Command, aliases: &Aliases) {
    let alias = cmd
        .words
        .first()
        .and_then(Word::as_literal)
        .and_then(|name| aliases.get(name));

    if let Some(text) = alias {
        debug!(alias = %text, "substituting alias");
        let rest = cmd.words.split_off(1);
        cmd.words = text.split_whitespace().map(Word::literal).collect();
        cmd.words.extend(rest);
    }

    cmd.name = cmd
        .words
        .first()
        .and_then(Word::as_literal)
        .unwrap_or_default()
        .to_string();
}

impl Shell {
    /// Run every subcommand of the tree and substitute aliases, leaving each
    /// command a list of literal words.
    pub fn expand(&mut self, node: &mut Node) -> ShResult<()> {
        for cmd in node.commands_mut() {
            expand_words(&mut cmd.words, &mut |text: &str| self.capture(text))?;
            substitute_alias(cmd, &self.aliases);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn tree(input: &str) -> Node {
        parse(input).unwrap().unwrap()
    }

    fn first_command(node: &mut Node) -> &mut Command {
        node.commands_mut().remove(0)
    }

    fn no_capture(text: &str) -> ShResult<Vec<String>> {
        Err(ShError::Runtime(format!("unexpected capture of {text:?}")))
    }

    fn argv_of(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.as_literal().unwrap()).collect()
    }

    #[test]
    fn test_literal_pass() {
        let mut vars = Vars::new();
        vars.set("X", "hello");
        vars.set("HOME", "/home/me");

        let mut node = tree(r"echo $X~/d 'a b'\t\q$MISSING(ls)");
        resolve_literals(&mut node, &vars);

        let cmd = first_command(&mut node);
        assert_eq!(
            cmd.words[1].parts,
            vec![
                Fragment::Regular("hello".to_string()),
                Fragment::Regular("/home/me".to_string()),
                Fragment::Regular("/d".to_string()),
            ]
        );
        assert_eq!(
            cmd.words[2].parts,
            vec![
                Fragment::Regular("a b".to_string()),
                Fragment::Regular("\t".to_string()),
                Fragment::Regular("q".to_string()),
                Fragment::Regular(String::new()),
                Fragment::Subcommand("ls".to_string()),
            ]
        );
    }

    #[test]
    fn test_escape_table() {
        let pairs = [
            ('a', '\x07'),
            ('b', '\x08'),
            ('e', '\x1b'),
            ('f', '\x0c'),
            ('n', '\n'),
            ('r', '\r'),
            ('t', '\t'),
            ('v', '\x0b'),
            ('\\', '\\'),
            (' ', ' '),
            ('$', '$'),
        ];
        for (input, expected) in pairs {
            assert_eq!(unescape(input), expected, "escape of {input:?}");
        }
    }

    #[test]
    fn test_literal_pass_is_idempotent() {
        let mut vars = Vars::new();
        vars.set("X", "$Y");
        let mut once = tree("a $X 'q' ~ | b; c && d");
        resolve_literals(&mut once, &vars);
        let mut twice = once.clone();
        resolve_literals(&mut twice, &vars);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_words_without_subcommands_are_flattened() {
        let mut node = tree("echo a'b'c");
        resolve_literals(&mut node, &Vars::new());
        let cmd = first_command(&mut node);
        expand_words(&mut cmd.words, &mut no_capture).unwrap();
        assert_eq!(argv_of(&cmd.words), vec!["echo", "abc"]);
    }

    #[test]
    fn test_capture_splits_word_per_line() {
        let mut node = tree(r"echo (printf 'a\nb\n')foo");
        resolve_literals(&mut node, &Vars::new());
        let cmd = first_command(&mut node);

        let mut seen = Vec::new();
        let mut capture = |text: &str| -> ShResult<Vec<String>> {
            seen.push(text.to_string());
            Ok(vec!["a".to_string(), "b".to_string()])
        };
        expand_words(&mut cmd.words, &mut capture).unwrap();

        assert_eq!(seen, vec![r"printf 'a\nb\n'"]);
        assert_eq!(argv_of(&cmd.words), vec!["echo", "afoo", "bfoo"]);
    }

    #[test]
    fn test_cartesian_product_order() {
        let mut node = tree("x (one)-(two) y");
        resolve_literals(&mut node, &Vars::new());
        let cmd = first_command(&mut node);

        let mut capture = |text: &str| -> ShResult<Vec<String>> {
            Ok(match text {
                "one" => vec!["1".to_string(), "2".to_string()],
                _ => vec!["a".to_string(), "b".to_string(), "c".to_string()],
            })
        };
        expand_words(&mut cmd.words, &mut capture).unwrap();
        assert_eq!(
            argv_of(&cmd.words),
            vec!["x", "1-a", "1-b", "1-c", "2-a", "2-b", "2-c", "y"]
        );
    }

    #[test]
    fn test_empty_capture_removes_word() {
        let mut node = tree("echo a(true)b c");
        resolve_literals(&mut node, &Vars::new());
        let cmd = first_command(&mut node);
        let mut capture = |_: &str| -> ShResult<Vec<String>> { Ok(Vec::new()) };
        expand_words(&mut cmd.words, &mut capture).unwrap();
        assert_eq!(argv_of(&cmd.words), vec!["echo", "c"]);
    }

    #[test]
    fn test_capture_error_propagates() {
        let mut node = tree("echo (boom)");
        let cmd = first_command(&mut node);
        assert!(matches!(
            expand_words(&mut cmd.words, &mut no_capture),
            Err(ShError::Runtime(_))
        ));
    }

    #[test]
    fn test_unresolved_fragment_is_runtime_error() {
        let mut node = tree("echo $X");
        let cmd = first_command(&mut node);
        assert!(matches!(
            expand_words(&mut cmd.words, &mut no_capture),
            Err(ShError::Runtime(_))
        ));
    }

    #[test]
    fn test_alias_substitution() {
        let mut aliases = Aliases::new();
        aliases.set("ll", "ls  -l");
        aliases.set("ls", "ls --color");

        let mut cmd = Command::new(vec![Word::literal("ll"), Word::literal("/tmp")]);
        substitute_alias(&mut cmd, &aliases);
        // Expanded once: the `ls` alias is not applied to the result.
        assert_eq!(argv_of(&cmd.words), vec!["ls", "-l", "/tmp"]);
        assert_eq!(cmd.name, "ls");
    }

    #[test]
    fn test_alias_only_applies_to_first_word() {
        let mut aliases = Aliases::new();
        aliases.set("ll", "ls -l");
        let mut cmd = Command::new(vec![Word::literal("echo"), Word::literal("ll")]);
        substitute_alias(&mut cmd, &aliases);
        assert_eq!(argv_of(&cmd.words), vec!["echo", "ll"]);
        assert_eq!(cmd.name, "echo");
    }

    #[test]
    fn test_empty_alias_and_empty_command() {
        let mut aliases = Aliases::new();
        aliases.set("nothing", "");
        let mut cmd = Command::new(vec![Word::literal("nothing"), Word::literal("x")]);
        substitute_alias(&mut cmd, &aliases);
        assert_eq!(cmd.name, "x");

        let mut empty = Command::new(Vec::new());
        substitute_alias(&mut empty, &aliases);
        assert_eq!(empty.name, "");
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines(b"a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines(b"a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines(b"a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines(b""), Vec::<String>::new());
        assert_eq!(split_lines(b"\n"), vec![""]);
        assert_eq!(split_lines(b"x\xffy"), vec!["x\u{fffd}y"]);
    }
}
