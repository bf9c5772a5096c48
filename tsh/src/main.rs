use clap::Parser;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use tsh::eval::launch::ignore_interrupts;
use tsh::{ShError, Shell};
use tsh_config::{ShellConfig, TshConfig};

mod completer;

/// tsh - a small command shell with pipelines and subcommand capture
#[derive(Parser, Debug)]
#[command(name = "tsh", version, about)]
struct Args {
    /// Execute command and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Print the resolved tree of every line before running it
    #[arg(short = 'd', long)]
    print_tree: bool,

    /// Configuration file (replaces the default search)
    #[arg(long)]
    config: Option<String>,

    /// Do not run the init file
    #[arg(long)]
    no_init: bool,

    /// Script file to execute
    script: Option<String>,

    /// Arguments passed to the script as $1, $2, ...
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => tsh_config::load_from_file(path),
        None => tsh_config::load(),
    };
    let (config, config_err) = match loaded {
        Ok(config) => (config, None),
        Err(err) => (TshConfig::default(), Some(err)),
    };

    let log_level = config.logging.level.as_str();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    if let Some(err) = config_err {
        warn!(%err, "could not load configuration, using defaults");
    }

    let mut shell = Shell::builder()
        .name(&config.shell.name)
        .print_tree(args.print_tree || config.shell.print_tree)
        .history_size(config.shell.history.max_entries)
        .build();

    if !args.no_init {
        run_init_file(&mut shell, &config.shell);
    }

    let code = if let Some(command) = args.command {
        run_command(&mut shell, &command)
    } else if let Some(script) = args.script {
        run_script(&mut shell, &script, &args.args)
    } else {
        run_repl(&mut shell, &config.shell)
    };
    std::process::exit(code);
}

fn run_init_file(shell: &mut Shell, config: &ShellConfig) {
    let path = config.init_path();
    let Ok(content) = std::fs::read_to_string(&path) else {
        debug!(path = %path.display(), "no init file");
        return;
    };
    debug!(path = %path.display(), "running init file");
    for line in content.lines() {
        if let Err(ShError::Exit(code)) = shell.execute(line) {
            std::process::exit(code);
        }
    }
}

fn run_command(shell: &mut Shell, command: &str) -> i32 {
    match shell.execute(command) {
        Ok(()) => shell.last_status(),
        Err(ShError::Exit(code)) => code,
        Err(err) => {
            eprintln!("{}: {err}", shell.name);
            1
        }
    }
}

fn run_script(shell: &mut Shell, path: &str, script_args: &[String]) -> i32 {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("{}: failed to open file '{path}': {err}", shell.name);
            return 1;
        }
    };

    shell.vars.set("0", path);
    for (i, arg) in script_args.iter().enumerate() {
        shell.vars.set(&(i + 1).to_string(), arg);
    }

    for line in content.lines() {
        match shell.execute(line) {
            Ok(()) => {}
            Err(ShError::Exit(code)) => return code,
            Err(err) => {
                eprintln!("{}: {err}", shell.name);
                return 1;
            }
        }
    }
    shell.last_status()
}

/// Prompt text: the output of the `prompt` variable run as a subcommand, or
/// the configured prompt.
fn prompt_text(shell: &mut Shell, fallback: &str) -> String {
    let Some(command) = shell.vars.get("prompt").map(str::to_string) else {
        return fallback.to_string();
    };
    match shell.capture(&command) {
        Ok(lines) => lines.join("\n"),
        Err(err) => {
            warn!(%err, "prompt command failed");
            fallback.to_string()
        }
    }
}

fn run_repl(shell: &mut Shell, config: &ShellConfig) -> i32 {
    use completer::TshHelper;
    use rustyline::error::ReadlineError;
    use rustyline::{CompletionType, Config, Editor};

    ignore_interrupts();

    let rl_config = match Config::builder()
        .completion_type(CompletionType::List)
        .max_history_size(config.history.max_entries.max(1))
        .and_then(|b| b.history_ignore_dups(true))
    {
        Ok(builder) => builder.build(),
        Err(err) => {
            warn!(%err, "invalid line editor settings");
            Config::default()
        }
    };

    let commands = Arc::new(RwLock::new(Vec::new()));
    let mut rl = match Editor::with_config(rl_config) {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("{}: cannot start line editor: {err}", shell.name);
            return 1;
        }
    };
    rl.set_helper(Some(TshHelper::new(commands.clone())));

    let history_path = config.history.path();
    if config.history.enabled {
        if let Err(err) = rl.load_history(&history_path) {
            debug!(%err, path = %history_path.display(), "no history loaded");
        }
    }

    let code = loop {
        if let Ok(mut names) = commands.write() {
            *names = shell
                .builtin_names()
                .into_iter()
                .chain(shell.aliases.iter().map(|(name, _)| name))
                .map(str::to_string)
                .collect();
        }

        let prompt = prompt_text(shell, &config.prompt);
        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                    shell.add_history(&line);
                }
                if let Err(ShError::Exit(code)) = shell.execute(&line) {
                    break code;
                }
            }
            Err(ReadlineError::Interrupted) => {}
            Err(ReadlineError::Eof) => {
                println!("exit");
                break shell.last_status();
            }
            Err(err) => {
                eprintln!("{}: {err}", shell.name);
                break 1;
            }
        }
    };

    if config.history.enabled {
        if let Err(err) = rl.save_history(&history_path) {
            warn!(%err, path = %history_path.display(), "could not save history");
        }
    }
    code
}
