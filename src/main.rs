//! dupetree - duplicate file and directory finder
//!
//! Entry point for the dupetree CLI application.

use clap::Parser;
use dupetree::{
    cli::Cli,
    error::{ExitCode, StructuredError},
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are not failures
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ConfigError
            } else {
                ExitCode::Success
            };
            std::process::exit(code.as_i32());
        }
    };
    let json_errors = cli.json_errors;

    match dupetree::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
