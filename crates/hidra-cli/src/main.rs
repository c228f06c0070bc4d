//! `hidra` — the CLI binary around `hidra-engine`.

use clap::Parser;
use log::error;

use hidra_cli::HidraCli;

fn main() {
    let cli = HidraCli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(err) = cli.execute() {
        error!("{err}");
        std::process::exit(1);
    }
}
