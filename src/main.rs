use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

use duelist::{config, logger, sprt, tournament};

/// Engine-versus-engine match runner.
#[derive(Parser)]
#[command(name = "duelist", version, about)]
struct Cli {
    /// Write logs to a timestamped file instead of stderr.
    #[arg(long)]
    log_file: bool,

    /// Also log engine wire traffic.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a fixed-schedule tournament and print the Elo table.
    Tournament {
        /// Tournament configuration document.
        config: PathBuf,
    },
    /// Run a Sequential Probability Ratio Test.
    Sprt {
        /// SPRT configuration document.
        config: PathBuf,
    },
    /// Resume an SPRT run from its checkpoint file.
    Resume {
        /// Checkpoint written by a previous run.
        checkpoint: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    logger::init_logger(cli.log_file, level);

    match cli.command {
        Command::Tournament { config } => {
            let config = config::TournamentConfig::load(&config)?;
            let standings = tournament::run(&config)?;
            println!("{standings}");
        }
        Command::Sprt { config } | Command::Resume { checkpoint: config } => {
            let config = config::SprtConfig::load(&config)?;
            sprt::run(&config)?;
        }
    }

    Ok(())
}
