//! helio - command-line front end.
//!
//! Zero arguments: an interactive prompt (or, when stdin is piped, one
//! script read from stdin). Otherwise every argument is a source file,
//! executed in order against the same interpreter. Script errors are
//! fatal and exit nonzero; unreadable files exit 1.

mod repl;

use std::env;
use std::fs;
use std::io::{IsTerminal, Read};
use std::process::ExitCode;

use helio_core::Interp;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut vm = Interp::new();

    if !args.is_empty() {
        for path in &args {
            let source = match fs::read_to_string(path) {
                Ok(source) => source,
                Err(error) => {
                    eprintln!("cannot read {}: {}", path, error);
                    return ExitCode::from(1);
                }
            };
            if let Err(error) = vm.run_source(&source).await {
                eprintln!("{}", error);
                return ExitCode::from(1);
            }
        }
        return ExitCode::SUCCESS;
    }

    if std::io::stdin().is_terminal() {
        match repl::run(&mut vm).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{}", error);
                ExitCode::from(1)
            }
        }
    } else {
        // Piped stdin: slurp it all and run it as one script.
        let mut source = String::new();
        if let Err(error) = std::io::stdin().read_to_string(&mut source) {
            eprintln!("cannot read stdin: {}", error);
            return ExitCode::from(1);
        }
        match vm.run_source(&source).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{}", error);
                ExitCode::from(1)
            }
        }
    }
}
