use clap::Parser;
use mainline::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
