//! Command resolution and process management
//!
//! The shell is single-threaded: every fork happens from the one thread,
//! stdout is flushed right before, and children only touch their own copy of
//! the shell state.

#![allow(unsafe_code)]

use super::expansion::split_lines;
use crate::ast::Command;
use crate::error::{ShError, ShResult};
use crate::help::{format_help, get_help, wants_help};
use crate::shell::{BuiltinFn, Shell};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{access, dup2, execvp, fork, pipe, AccessFlags, ForkResult, Pid};
use std::ffi::CString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a resolved command runs.
#[derive(Debug)]
pub(crate) enum Launch {
    Builtin(BuiltinFn),
    /// argv handed to `execvp`; scripts have their interpreter in front
    Exec(Vec<String>),
}

/// Regular file with the owner-execute bit set.
pub fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o100 != 0)
}

/// Locate an executable: names containing `/` are taken as paths, anything
/// else is searched in `PATH` in order.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Interpreter named by a `#!` first line, or `None` when the file cannot be
/// read or has no shebang.
pub fn read_shebang(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first).ok()?;
    first
        .strip_prefix("#!")
        .map(|rest| rest.trim().to_string())
}

/// Exit status of a waited child. Anything but a normal exit counts as 1.
pub const fn translate_status(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        _ => 1,
    }
}

fn flush_stdout() {
    let _ = io::stdout().flush();
}

fn exit_child(code: i32) -> ! {
    flush_stdout();
    std::process::exit(code)
}

/// Ignore Ctrl-C in the interactive shell itself; children get it back.
pub fn ignore_interrupts() {
    // SAFETY: SIG_IGN installs no handler code, and this runs before any
    // child is forked.
    if let Err(err) = unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) } {
        debug!(%err, "could not ignore SIGINT");
    }
}

/// Put back the default dispositions a freshly exec'd program expects.
fn restore_default_signals() {
    for sig in [Signal::SIGINT, Signal::SIGPIPE] {
        // SAFETY: installing SIG_DFL in a single-threaded child before exec.
        let _ = unsafe { signal(sig, SigHandler::SigDfl) };
    }
}

fn to_cstrings(argv: &[String]) -> ShResult<Vec<CString>> {
    argv.iter()
        .map(|arg| {
            CString::new(arg.as_str())
                .map_err(|_| ShError::Runtime(format!("{arg}: argument contains a NUL byte")))
        })
        .collect()
}

/// Replace the current process image. Only returns by exiting.
fn exec_image(argv: &[CString]) -> ! {
    restore_default_signals();
    let err = match execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(err) => err,
    };
    eprintln!("{}: {}", argv[0].to_string_lossy(), err.desc());
    exit_child(1)
}

fn wait_child(child: Pid) -> ShResult<i32> {
    let status = waitpid(child, None)?;
    let code = translate_status(status);
    debug!(pid = child.as_raw(), ?status, code, "child finished");
    Ok(code)
}

fn redirect(fd: &OwnedFd, target: i32) {
    if let Err(err) = dup2(fd.as_raw_fd(), target) {
        eprintln!("dup2: {}", err.desc());
        exit_child(1);
    }
}

impl Shell {
    /// Decide how `argv` runs: builtin, executable, or `#!` script.
    pub(crate) fn resolve(&self, argv: &[String]) -> ShResult<Launch> {
        let name = argv
            .first()
            .ok_or_else(|| ShError::Runtime("empty command".to_string()))?;

        if let Some(func) = self.builtins.get(name) {
            debug!(%name, "builtin");
            return Ok(Launch::Builtin(*func));
        }

        if find_executable(name).is_some() {
            debug!(%name, "executable");
            return Ok(Launch::Exec(argv.to_vec()));
        }

        let interpreter =
            read_shebang(Path::new(name)).ok_or_else(|| ShError::CommandNotFound(name.clone()))?;

        access(name.as_str(), AccessFlags::X_OK).map_err(|source| ShError::PermissionDenied {
            command: name.clone(),
            source,
        })?;

        if find_executable(&interpreter).is_none() {
            return Err(ShError::InterpreterNotFound(name.clone()));
        }

        debug!(%name, %interpreter, "script");
        let mut exec_argv = Vec::with_capacity(argv.len() + 1);
        exec_argv.push(interpreter);
        exec_argv.extend_from_slice(argv);
        Ok(Launch::Exec(exec_argv))
    }

    /// Run a builtin, answering `--help` from the help table.
    pub(crate) fn call_builtin(&mut self, func: BuiltinFn, argv: &[String]) -> ShResult<i32> {
        if wants_help(argv) {
            if let Some(help) = argv.first().and_then(|name| get_help(name)) {
                write!(io::stdout(), "{}", format_help(help))?;
                return Ok(0);
            }
        }
        func(self, argv)
    }

    /// Run a command and wait for it. Resolution failures are reported here
    /// and give status 1.
    pub fn exec_and_return(&mut self, argv: &[String]) -> ShResult<i32> {
        let launch = match self.resolve(argv) {
            Ok(launch) => launch,
            Err(err) if err.is_resolution() => {
                eprintln!("{err}");
                return Ok(1);
            }
            Err(err) => return Err(err),
        };

        match launch {
            Launch::Builtin(func) => self.call_builtin(func, argv),
            Launch::Exec(exec_argv) => {
                let cargs = to_cstrings(&exec_argv)?;
                flush_stdout();
                // SAFETY: the shell is single-threaded; the child only execs
                // or exits.
                match unsafe { fork() }? {
                    ForkResult::Child => exec_image(&cargs),
                    ForkResult::Parent { child } => {
                        debug!(pid = child.as_raw(), argv = ?exec_argv, "forked");
                        wait_child(child)
                    }
                }
            }
        }
    }

    /// Child side of a launch: become the command or exit with its status.
    pub(crate) fn exec_and_exit(&mut self, argv: &[String]) -> ! {
        if argv.is_empty() {
            exit_child(0);
        }
        let code = match self.resolve(argv) {
            Ok(Launch::Builtin(func)) => match self.call_builtin(func, argv) {
                Ok(code) | Err(ShError::Exit(code)) => code,
                Err(err) => {
                    eprintln!("{}: {err}", self.name);
                    1
                }
            },
            Ok(Launch::Exec(exec_argv)) => match to_cstrings(&exec_argv) {
                Ok(cargs) => exec_image(&cargs),
                Err(err) => {
                    eprintln!("{}: {err}", self.name);
                    1
                }
            },
            Err(err) => {
                eprintln!("{err}");
                1
            }
        };
        exit_child(code)
    }

    /// Run `cmd1 | cmd2 | ...` and return the status of the last stage.
    pub fn run_pipeline(&mut self, stages: &[Command]) -> ShResult<i32> {
        let count = stages.len();
        let mut pipes: Vec<(OwnedFd, OwnedFd)> = Vec::with_capacity(count.saturating_sub(1));
        for _ in 1..count {
            pipes.push(pipe()?);
        }

        flush_stdout();
        let mut children = Vec::with_capacity(count);
        for (i, stage) in stages.iter().enumerate() {
            // SAFETY: the shell is single-threaded; the child wires its pipe
            // ends and then execs or exits.
            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    if i > 0 {
                        redirect(&pipes[i - 1].0, io::stdin().as_raw_fd());
                    }
                    if i + 1 < count {
                        redirect(&pipes[i].1, io::stdout().as_raw_fd());
                    }
                    pipes.clear();
                    self.exec_and_exit(&stage.argv())
                }
                Ok(ForkResult::Parent { child }) => {
                    debug!(pid = child.as_raw(), stage = i, "forked pipeline stage");
                    children.push(child);
                }
                Err(err) => {
                    pipes.clear();
                    for child in children {
                        let _ = waitpid(child, None);
                    }
                    return Err(err.into());
                }
            }
        }
        pipes.clear();

        let mut last = 0;
        for child in children {
            last = wait_child(child)?;
        }
        Ok(last)
    }

    /// Run `text` in a forked copy of the shell and collect its stdout as
    /// lines.
    pub fn capture(&mut self, text: &str) -> ShResult<Vec<String>> {
        let (reader, writer) = pipe()?;

        flush_stdout();
        // SAFETY: the shell is single-threaded; the child runs the line and
        // exits without returning here.
        match unsafe { fork() }? {
            ForkResult::Child => {
                drop(reader);
                redirect(&writer, io::stdout().as_raw_fd());
                drop(writer);
                self.print_tree = false;
                let code = match self.execute(text) {
                    Ok(()) => self.last_status(),
                    Err(ShError::Exit(code)) => code,
                    Err(_) => 1,
                };
                exit_child(code)
            }
            ForkResult::Parent { child } => {
                drop(writer);
                let mut output = Vec::new();
                let read = File::from(reader).read_to_end(&mut output);
                let status = wait_child(child);
                read?;
                debug!(
                    pid = child.as_raw(),
                    status = ?status.as_ref().ok(),
                    bytes = output.len(),
                    "captured"
                );
                status?;
                Ok(split_lines(&output))
            }
        }
    }
}
