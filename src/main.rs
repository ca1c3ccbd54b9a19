mod shell;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use argh::FromArgs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(FromArgs)]
/// Run commands from a script file, or from standard input when no script is given.
struct Args {
    /// file to read commands from
    #[argh(positional)]
    script: Option<PathBuf>,
}

fn main() {
    // Logs go to stderr so redirected and piped output stays clean (RUST_LOG).
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Args = argh::from_env();
    match run(args) {
        Ok(status) => process::exit(status),
        Err(e) => {
            eprintln!("minish: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let mut shell = shell::Shell::new();
    let status = match args.script {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("{}", path.display()))?;
            shell.run(BufReader::new(file), false)
        }
        None => {
            let interactive = shell::stdin_is_terminal();
            shell.run(io::stdin().lock(), interactive)
        }
    };
    status.context("failed to read commands")
}
