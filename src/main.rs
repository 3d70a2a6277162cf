//! dupsweep command line entry point.

use clap::Parser;
use dupsweep::{
    cli::Cli,
    duplicates::FinderError,
    error::{ExitCode, StructuredError},
    logging::init_logging,
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    init_logging(cli.verbose, cli.quiet);

    let code = match dupsweep::run_app(cli) {
        Ok(code) => code,
        Err(err) => {
            let code = exit_code_for(&err);
            report_error(&err, code, json_errors);
            code
        }
    };
    std::process::exit(code.as_i32());
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<FinderError>() {
        Some(FinderError::Interrupted) => ExitCode::Interrupted,
        _ => ExitCode::GeneralError,
    }
}

fn report_error(err: &anyhow::Error, code: ExitCode, json: bool) {
    let structured = json
        .then(|| serde_json::to_string_pretty(&StructuredError::new(err, code)).ok())
        .flatten();
    match structured {
        Some(text) => eprintln!("{}", text),
        None => eprintln!("[{}] Error: {:#}", code.code_prefix(), err),
    }
}
