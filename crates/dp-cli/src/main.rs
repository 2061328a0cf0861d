//! Doorprize operator console
//!
//! Usage:
//!   doorprize status                          - Event overview
//!   doorprize add "Amy" "Budi"                - Add participants
//!   doorprize import guests.txt               - Add participants, one per line
//!   doorprize add-prize "Grand" "TV" -q 1     - Add a prize to a session
//!   doorprize draw grand                      - Fill every empty slot of a session
//!   doorprize reshuffle grand-1 0             - Redraw one filled slot
//!
//! Logging is controlled by `RUST_LOG`.

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dp_core::{JsonFileStore, WinnerLedger};
use dp_draw::{DrawOrchestrator, RevealScheduler, RevealTiming};
use dp_random::RandomSource;

use crate::config::DoorprizeConfig;

#[derive(Parser)]
#[command(name = "doorprize", about = "Doorprize draw console", version)]
struct Cli {
    /// Config file (overrides DOORPRIZE_CONFIG and ./doorprize.config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reveal winners without delays
    #[arg(long, global = true)]
    instant: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show participants, sessions and winners
    Status,
    /// Set the event label
    EventName { name: String },
    /// Add participants
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Add participants from a text file, one name per line
    Import { file: PathBuf },
    /// Remove a participant
    Remove { name: String },
    /// Remove every participant who has not won
    ResetParticipants,
    /// Add a prize, creating its session if needed
    AddPrize {
        session: String,
        prize: String,
        /// Number of winners for this prize
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Allow single-slot reshuffles in this session
        #[arg(long)]
        allow_reshuffle: bool,
    },
    /// Remove a prize and its winners
    RemovePrize { prize_id: String },
    /// Remove every session, prize and winner
    ResetPrizes,
    /// Clear every winner
    ResetDraw,
    /// Fill every empty slot of a session
    Draw { session_id: String },
    /// Replace the winner of one filled slot
    Reshuffle {
        prize_id: String,
        /// Slot index (0-based)
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = DoorprizeConfig::load(cli.config.as_deref())?;
    if cli.instant {
        config.reveal = RevealTiming::instant();
    }

    let store = Arc::new(JsonFileStore::from_config(&config.storage));
    log::debug!("Storage at {}", store.path_for(&config.storage.key).display());
    let mut ledger = WinnerLedger::open(store, &config.storage.key);
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Status => commands::status(&ledger, &mut out),
        Commands::EventName { name } => commands::set_event_name(&mut ledger, &name, &mut out),
        Commands::Add { names } => commands::add(&mut ledger, &names, &mut out),
        Commands::Import { file } => commands::import(&mut ledger, &file, &mut out),
        Commands::Remove { name } => commands::remove(&mut ledger, &name, &mut out),
        Commands::ResetParticipants => commands::reset_participants(&mut ledger, &mut out),
        Commands::AddPrize {
            session,
            prize,
            quantity,
            allow_reshuffle,
        } => commands::add_prize(&mut ledger, &session, &prize, quantity, allow_reshuffle, &mut out),
        Commands::RemovePrize { prize_id } => commands::remove_prize(&mut ledger, &prize_id, &mut out),
        Commands::ResetPrizes => commands::reset_prizes(&mut ledger, &mut out),
        Commands::ResetDraw => commands::reset_draw(&mut ledger, &mut out),
        Commands::Draw { session_id } => {
            let (orchestrator, mut reveal) = draw_engine(&config);
            commands::draw(&orchestrator, &mut reveal, &mut ledger, &session_id, &mut out).await
        }
        Commands::Reshuffle { prize_id, index } => {
            let (orchestrator, mut reveal) = draw_engine(&config);
            commands::reshuffle(&orchestrator, &mut reveal, &mut ledger, &prize_id, index, &mut out).await
        }
    }
}

fn draw_engine(config: &DoorprizeConfig) -> (DrawOrchestrator, RevealScheduler) {
    let source = RandomSource::from_config(&config.provider);
    (
        DrawOrchestrator::new(source),
        RevealScheduler::new(config.reveal.clone()),
    )
}
