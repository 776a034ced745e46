mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Mbr { input, table } => {
            commands::read_input(input).and_then(|bytes| commands::partitions::run_mbr(&bytes, *table))
        }
        Commands::GptHeader { input } => {
            commands::read_input(input).and_then(|bytes| commands::partitions::run_gpt_header(&bytes))
        }
        Commands::GptEntry { input, sector_size } => commands::read_input(input)
            .and_then(|bytes| commands::partitions::run_gpt_entry(&bytes, *sector_size)),
        Commands::Fat32 { input, out_json } => commands::read_input(input)
            .and_then(|bytes| commands::directory::run(&bytes, out_json.as_deref())),
        Commands::Hash { input } => {
            commands::read_input(input).and_then(|bytes| commands::hash::run(&bytes))
        }
        Commands::Convert { conversion } => commands::convert::run(conversion),
    };

    if let Err(err) = result {
        eprintln!("[!] {err}");
        std::process::exit(1);
    }
}
