// args.rs
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Path to settings.
    #[clap(long)]
    pub settings: String,

    /// Path to trajectory output (csv file).
    #[clap(short, long, default_value = "trajectory.csv")]
    pub output: String,

    /// Path to log file.
    #[clap(long, default_value = "solve_dde.log")]
    pub log_file: String,

    /// Verbosity (-v for debug, -vv for trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable the progress bar.
    #[clap(long)]
    pub disable_progress_bar: bool,
}
