extern crate ansi_term;
extern crate anyhow;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate round_robin;

mod demo;

use anyhow::Result;
use clap::{Parser, Subcommand};

use demo::workers::WorkersArgs;

/// Walk-throughs of the round-robin queue
#[derive(Parser, Debug)]
#[command(name = "rr-demo", version = round_robin::version::VERSION, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cycle a few named tasks, then add and drain
    Basic {
        /// Full cycles to print before draining
        #[arg(long, default_value_t = 3)]
        rounds: usize,
    },
    /// Share one queue between worker threads behind a mutex
    Workers(WorkersArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("rr-demo {}", round_robin::version::version_string());

    match cli.command {
        Command::Basic { rounds } => demo::basic::run(rounds),
        Command::Workers(args) => demo::workers::run(&args),
    }
}
