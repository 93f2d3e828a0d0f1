use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::process::ExitCode;
use tinylisp::{Environment, evaluator};

#[derive(Parser, Debug)]
#[command(name = "tinylisp")]
#[command(about = "Minimal Lisp interpreter", version)]
struct ReplConfig {
    /// Prompt shown before each input line
    #[arg(long, env = "TINYLISP_PROMPT", default_value = "> ")]
    prompt: String,

    /// Print each input line before its result
    #[arg(long)]
    echo: bool,

    /// Evaluate a single expression, print the result and exit
    #[arg(short, long, value_name = "EXPR")]
    eval: Option<String>,

    /// History file, loaded at start and saved on exit
    #[arg(long, env = "TINYLISP_HISTORY", value_name = "PATH")]
    history: Option<PathBuf>,

    /// Tracing filter directive, overrides RUST_LOG (e.g. "tinylisp=trace")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

/// Install a stderr subscriber when a filter is given on the command line or in RUST_LOG
fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match log_level {
        Some(directive) => EnvFilter::new(directive),
        None if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        None => return,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let config = ReplConfig::parse();
    init_tracing(config.log_level.as_deref());

    let mut env = evaluator::create_global_env();

    if let Some(expr) = &config.eval {
        return match evaluator::eval_str(expr, &mut env) {
            Ok(result) => {
                println!("{}", result);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run_repl(&config, &mut env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_repl(config: &ReplConfig, env: &mut Environment) -> Result<(), ReadlineError> {
    println!("Simple LISP interpreter");
    println!("Type \"exit\" or :quit to exit, :help for commands.");
    println!();

    let mut rl = DefaultEditor::new()?;
    if let Some(path) = &config.history {
        if rl.load_history(path).is_err() {
            tracing::debug!(path = %path.display(), "no history loaded");
        }
    }

    loop {
        match rl.readline(&config.prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);
                if config.echo {
                    println!("{}", line);
                }

                // Handle special commands
                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(env);
                        continue;
                    }
                    "exit" | ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match evaluator::eval_str(line, env) {
                    Ok(result) => println!("{}", result),
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Use Ctrl+D or :quit to exit.");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => return Err(err),
        }
    }

    if let Some(path) = &config.history {
        if let Err(e) = rl.save_history(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to save history");
        }
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  :help    - Show this help message");
    println!("  :env     - Show current environment bindings");
    println!("  :quit    - Exit the interpreter (also :exit, exit)");
    println!();
    println!("Language:");
    println!("  Integers: 42, -5");
    println!("  Truth: t, nil (nil is also the empty list)");
    println!("  Special forms: quote, setq, defun, if");
    println!("  Arithmetic: + - * / abs");
    println!("  Comparison: = /= < <= > >=");
    println!("  Logic: and or not null atom equal");
    println!("  Lists: car cdr cons append list first last");
    println!();
    println!("Examples:");
    println!("  (setq x 42)");
    println!("  (defun square (n) (* n n))");
    println!("  (square x)");
    println!("  (quote (1 2 3))");
}

fn print_environment(env: &Environment) {
    for (name, value) in env.bindings() {
        println!("  {:<10} {}", name.to_uppercase(), value);
    }
}
