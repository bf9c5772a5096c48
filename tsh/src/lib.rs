//! tsh - a small command shell
//!
//! This crate provides:
//! - A parser for command lines with pipes, `;`, `&&`, `||`, quoting,
//!   variables and `( ... )` subcommands
//! - A resolver that expands subcommands into words and applies aliases
//! - An executor that runs builtins in-process and everything else through
//!   fork/exec, wiring pipelines with pipes
//!
//! ```no_run
//! use tsh::Shell;
//!
//! let mut shell = Shell::builder().name("demo").var("who", "world").build();
//! shell.execute("echo hello $who | tr a-z A-Z").unwrap();
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub mod help;
pub mod parser;
pub mod shell;
pub mod state;

pub use error::{ShError, ShResult, SyntaxError};
pub use parser::parse;
pub use shell::{BuiltinFn, Shell, ShellBuilder};
