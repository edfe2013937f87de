// main.rs
use clap::Parser;

use solve_dde_rk4::args::Args;
use solve_dde_rk4::runner::Runner;

fn main() {
    let args = Args::parse();
    let runner = Runner::new(args).unwrap_or_else(|err| {
        eprintln!("Unable to initialize runner: {err}.");
        std::process::exit(1);
    });
    runner.start().unwrap_or_else(|err| {
        eprintln!("Integration failed: {err}.");
        std::process::exit(1);
    });
}
