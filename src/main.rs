use clap::Parser;
use signalbook::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
