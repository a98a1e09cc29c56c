use std::process::ExitCode;

mod cli;
mod commands;
mod io;

fn main() -> ExitCode {
    let cli = cli::parse();
    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
