use clap::Parser;
use trendscan::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    run(Cli::parse())
}
