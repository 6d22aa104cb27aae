//! mermaid-render entry point.

use std::io::{self, IsTerminal, Read};
use std::process;
use std::str::FromStr;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{debug, LevelFilter};

use mermaid_render::cli::{self, Args};

fn main() {
    if std::env::args_os().len() <= 1 {
        let _ = Args::command().print_help();
        return;
    }

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                return;
            }
            _ => {
                let text = err.to_string();
                let first = text.lines().next().unwrap_or_default();
                eprintln!("Error: {}", first.trim_start_matches("error: "));
                process::exit(1);
            }
        },
    };

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::new().filter_level(log_level).init();
    debug!("parsed arguments: {:?}", args);

    let stdin = io::stdin();
    let mut piped = stdin.lock();
    let input: Option<&mut dyn Read> = if io::stdin().is_terminal() {
        None
    } else {
        Some(&mut piped)
    };

    let stdout = io::stdout();
    if let Err(err) = cli::run(&args, input, &mut stdout.lock()) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
