//! Parser for tsh command lines
//!
//! One recursive grammar, lowest binding first:
//!
//! ```text
//! line      := list? ws comment? EOI
//! list      := logical (';' logical)*
//! logical   := pipeline (('&&' | '||') pipeline)*
//! pipeline  := command ('|' command)*
//! command   := ws (word ws)+
//! word      := fragment+
//! fragment  := regular | '(' list? ')' | '\'' .. '\'' | '$' name | '~' | '\' char
//! ```
//!
//! Errors carry the character column of the furthest point the grammar
//! reached, which is where the caret is drawn.

use crate::ast::{Command, Fragment, LogicalOp, Node, Word};
use crate::error::SyntaxError;
use chumsky::error::SimpleReason;
use chumsky::prelude::*;
use std::ops::Range;

/// Characters that end a run of regular text.
const SPECIAL: &str = ";|&()'~$\\#";

fn ws() -> impl Parser<char, (), Error = Simple<char>> + Clone {
    filter(|c: &char| c.is_whitespace()).repeated().ignored()
}

fn regular() -> impl Parser<char, Fragment, Error = Simple<char>> + Clone {
    filter(|c: &char| !c.is_whitespace() && !SPECIAL.contains(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(Fragment::Regular)
}

fn single_quoted() -> impl Parser<char, Fragment, Error = Simple<char>> + Clone {
    just('\'')
        .ignore_then(filter(|c: &char| *c != '\'').repeated().collect::<String>())
        .then_ignore(just('\''))
        .map(Fragment::SingleQuoted)
}

fn variable() -> impl Parser<char, Fragment, Error = Simple<char>> + Clone {
    just('$')
        .ignore_then(
            filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .map(Fragment::Variable)
}

fn tilde() -> impl Parser<char, Fragment, Error = Simple<char>> + Clone {
    just('~').to(Fragment::Tilde)
}

fn escape() -> impl Parser<char, Fragment, Error = Simple<char>> + Clone {
    just('\\').ignore_then(any()).map(Fragment::Escape)
}

/// `( list )`, keeping the raw inner text for the subshell.
fn subcommand<'a>(
    list: impl Parser<char, Node, Error = Simple<char>> + Clone + 'a,
    src: &'a [char],
) -> impl Parser<char, Fragment, Error = Simple<char>> + Clone + 'a {
    let inner =
        list.map_with_span(move |_, span: Range<usize>| src[span].iter().collect::<String>());

    just('(')
        .ignore_then(ws().ignore_then(inner.or_not()))
        .then_ignore(just(')'))
        .map(|text| Fragment::Subcommand(text.unwrap_or_default()))
}

fn word<'a>(
    list: impl Parser<char, Node, Error = Simple<char>> + Clone + 'a,
    src: &'a [char],
) -> impl Parser<char, Word, Error = Simple<char>> + Clone + 'a {
    choice((
        regular(),
        subcommand(list, src),
        single_quoted(),
        variable(),
        tilde(),
        escape(),
    ))
    .repeated()
    .at_least(1)
    .map(|parts| Word { parts })
}

fn command<'a>(
    list: impl Parser<char, Node, Error = Simple<char>> + Clone + 'a,
    src: &'a [char],
) -> impl Parser<char, Command, Error = Simple<char>> + Clone + 'a {
    ws()
        .ignore_then(word(list, src).then_ignore(ws()).repeated().at_least(1))
        .map(Command::new)
}

/// Command list with `;`, `&&`, `||` and `|`, left-associative.
fn list(src: &[char]) -> impl Parser<char, Node, Error = Simple<char>> + Clone + '_ {
    recursive(move |list| {
        let command = command(list, src);

        // A command cannot start with `|`, so `||` never parses as a pipe.
        let pipeline = command
            .clone()
            .then(just('|').ignore_then(command).repeated())
            .map(|(first, rest)| {
                if rest.is_empty() {
                    Node::Command(first)
                } else {
                    let mut stages = Vec::with_capacity(rest.len() + 1);
                    stages.push(first);
                    stages.extend(rest);
                    Node::Pipe(stages)
                }
            });

        let logical_op = choice((
            just("&&").to(LogicalOp::And),
            just("||").to(LogicalOp::Or),
        ));

        let logical = pipeline
            .clone()
            .then(logical_op.then(pipeline).repeated())
            .foldl(|lhs, (op, rhs)| Node::Logical {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });

        logical
            .clone()
            .then(just(';').ignore_then(logical).repeated())
            .foldl(|lhs, rhs| Node::Sequence {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            })
    })
}

/// Parser for a whole input line; `None` when the line holds no command.
///
/// Input after the command list is only accepted as a `#` comment or as a
/// lone `&` and whatever follows it, which is dropped.
pub fn parser(src: &[char]) -> impl Parser<char, Option<Node>, Error = Simple<char>> + '_ {
    let comment = just('#').then(any().repeated()).ignored();
    let lone_ampersand = just('&')
        .ignore_then(any().repeated())
        .try_map(|rest: Vec<char>, span| match rest.first() {
            Some('&') => Err(Simple::custom(span, "unexpected '&'")),
            _ => Ok(()),
        });

    list(src)
        .or_not()
        .then_ignore(ws())
        .then_ignore(comment.or(lone_ampersand).or_not())
        .then_ignore(end())
}

fn to_syntax_error(err: &Simple<char>) -> SyntaxError {
    let message = match err.reason() {
        SimpleReason::Custom(msg) => msg.clone(),
        _ => match err.found() {
            Some(c) => format!("unexpected {c:?}"),
            None => "unexpected end of input".to_string(),
        },
    };
    SyntaxError {
        position: err.span().start,
        message,
    }
}

/// Parse one line of input into a tree.
pub fn parse(line: &str) -> Result<Option<Node>, SyntaxError> {
    let chars: Vec<char> = line.chars().collect();
    let result = parser(&chars).parse(chars.as_slice());

    result.map_err(|errs| {
        errs.iter()
            .map(to_syntax_error)
            .max_by_key(|e| e.position)
            .unwrap_or_else(|| SyntaxError {
                position: chars.len(),
                message: "invalid input".to_string(),
            })
    })
}
