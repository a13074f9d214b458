//! Command-line arguments and content resolution.
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use combat_content::{CatalogLoader, ConfigLoader, ContentFactory};
use combat_core::{ArchetypeCatalog, CombatConfig};

#[derive(Debug, Parser)]
#[command(name = "encounter-sim")]
#[command(about = "Run a headless wave-combat encounter and print its event stream", long_about = None)]
#[command(version)]
pub struct Args {
    /// Combat tuning (TOML). Defaults to the bundled combat.toml.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Archetype catalog (RON). Defaults to the bundled catalog.ron.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Root seed for every random roll
    #[arg(short, long, default_value_t = 0)]
    pub seed: u64,

    /// Stop after this many ticks
    #[arg(short, long, default_value_t = 3000)]
    pub ticks: u64,

    /// Stop once this many waves have been cleared
    #[arg(short, long)]
    pub waves: Option<u32>,

    /// Ticks simulated between player decisions
    #[arg(long, default_value_t = 5)]
    pub ticks_per_step: u32,

    /// Leave the player standing still instead of running the brawler bot
    #[arg(long)]
    pub idle: bool,

    /// Which events to print
    #[arg(long, value_enum, default_value = "encounter")]
    pub events: EventFilter,

    /// Output format for events
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventFilter {
    None,
    Encounter,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    pub fn load_config(&self) -> Result<CombatConfig> {
        match &self.config {
            Some(path) => ConfigLoader::load(path),
            None => ContentFactory::bundled().load_config(),
        }
    }

    pub fn load_catalog(&self) -> Result<ArchetypeCatalog> {
        match &self.catalog {
            Some(path) => CatalogLoader::load(path),
            None => ContentFactory::bundled().load_catalog(),
        }
    }
}
