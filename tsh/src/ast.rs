//! Abstract Syntax Tree for one input line
//!
//! A line parses into a [`Node`]. The resolver rewrites the tree in place and
//! the executor consumes it; no node outlives one `execute` call.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Simple command: name and arguments
    Command(Command),
    /// Pipeline of two or more commands: cmd1 | cmd2 | ...
    Pipe(Vec<Command>),
    /// Short-circuit combination: lhs && rhs, lhs || rhs
    Logical {
        op: LogicalOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// Statement list: lhs ; rhs
    Sequence { lhs: Box<Node>, rhs: Box<Node> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// First word after alias substitution; empty until expansion has run.
    pub name: String,
    pub words: Vec<Word>,
}

impl Command {
    pub const fn new(words: Vec<Word>) -> Self {
        Self {
            name: String::new(),
            words,
        }
    }

    /// Literal argv, valid once every word has been flattened.
    pub fn argv(&self) -> Vec<String> {
        self.words
            .iter()
            .map(|w| w.as_literal().unwrap_or_default().to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    pub parts: Vec<Fragment>,
}

impl Word {
    pub fn literal(s: &str) -> Self {
        Self {
            parts: vec![Fragment::Regular(s.to_string())],
        }
    }

    /// Get the literal value if this is a simple literal word
    pub fn as_literal(&self) -> Option<&str> {
        if let [Fragment::Regular(s)] = self.parts.as_slice() {
            return Some(s);
        }
        None
    }

    pub fn has_subcommand(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Fragment::Subcommand(_)))
    }

    /// Concatenate the fragments into a single literal. Fails on the first
    /// fragment that is not plain text yet.
    pub fn flatten(&mut self) -> Result<(), Fragment> {
        if let Some(pending) = self
            .parts
            .iter()
            .find(|p| !matches!(p, Fragment::Regular(_)))
        {
            return Err(pending.clone());
        }
        let text: String = self
            .parts
            .drain(..)
            .map(|p| match p {
                Fragment::Regular(s) => s,
                _ => String::new(),
            })
            .collect();
        self.parts = vec![Fragment::Regular(text)];
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Regular(String),
    SingleQuoted(String),
    /// Raw text between `(` and `)`
    Subcommand(String),
    Variable(String),
    Tilde,
    /// The character following a backslash
    Escape(char),
}

impl Fragment {
    const fn tag(&self) -> &'static str {
        match self {
            Self::Regular(_) => "reg",
            Self::SingleQuoted(_) => "sq",
            Self::Subcommand(_) => "subcom",
            Self::Variable(_) => "var",
            Self::Tilde => "tilde",
            Self::Escape(_) => "esc",
        }
    }

    fn payload(&self) -> String {
        match self {
            Self::Regular(s) | Self::SingleQuoted(s) | Self::Subcommand(s) | Self::Variable(s) => {
                s.clone()
            }
            Self::Tilde => "~".to_string(),
            Self::Escape(c) => c.to_string(),
        }
    }
}

impl Node {
    /// Every command of the tree, left to right.
    pub fn commands_mut(&mut self) -> Vec<&mut Command> {
        let mut out = Vec::new();
        self.collect_commands(&mut out);
        out
    }

    fn collect_commands<'a>(&'a mut self, out: &mut Vec<&'a mut Command>) {
        match self {
            Self::Command(cmd) => out.push(cmd),
            Self::Pipe(stages) => out.extend(stages.iter_mut()),
            Self::Logical { lhs, rhs, .. } | Self::Sequence { lhs, rhs } => {
                lhs.collect_commands(out);
                rhs.collect_commands(out);
            }
        }
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, depth: usize, tag: &str, payload: &str) -> fmt::Result {
    writeln!(f, "{:indent$}{}: {:?}", "", tag, payload, indent = depth * 4)
}

fn write_block<F>(f: &mut fmt::Formatter<'_>, depth: usize, body: F) -> fmt::Result
where
    F: FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    writeln!(f, "{:indent$}{{", "", indent = depth * 4)?;
    body(f)?;
    writeln!(f, "{:indent$}}}", "", indent = depth * 4)
}

impl Word {
    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        // Flattened words carry their text on the word line itself.
        if let Some(text) = self.as_literal() {
            return write_line(f, depth, "word", text);
        }
        write_line(f, depth, "word", "")?;
        write_block(f, depth, |f| {
            for part in &self.parts {
                write_line(f, depth + 1, part.tag(), &part.payload())?;
            }
            Ok(())
        })
    }
}

impl Command {
    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write_line(f, depth, "com", &self.name)?;
        if self.words.is_empty() {
            return Ok(());
        }
        write_block(f, depth, |f| {
            for word in &self.words {
                word.dump(f, depth + 1)?;
            }
            Ok(())
        })
    }
}

impl Node {
    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Self::Command(cmd) => cmd.dump(f, depth),
            Self::Pipe(stages) => {
                write_line(f, depth, "pipe", "|")?;
                write_block(f, depth, |f| {
                    for stage in stages {
                        stage.dump(f, depth + 1)?;
                    }
                    Ok(())
                })
            }
            Self::Logical { op, lhs, rhs } => {
                write_line(f, depth, "logic", op.as_str())?;
                write_block(f, depth, |f| {
                    lhs.dump(f, depth + 1)?;
                    rhs.dump(f, depth + 1)
                })
            }
            Self::Sequence { lhs, rhs } => {
                write_line(f, depth, "comma", ";")?;
                write_block(f, depth, |f| {
                    lhs.dump(f, depth + 1)?;
                    rhs.dump(f, depth + 1)
                })
            }
        }
    }
}

/// Indented, bracketed tree dump used by `--print-tree`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}
