mod name;
mod scan;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relic-scanner")]
#[command(about = "Read relic effects, color and quality off a photographed relic card")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a card photo and print the result as JSON.
    Scan {
        /// Full (uncropped) frame containing the card.
        image: PathBuf,

        /// Already-cropped card image. Without it the settings crop box is applied to IMAGE.
        #[arg(long)]
        card: Option<PathBuf>,

        /// Directory holding effects.json and relic_names.json.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Scan settings JSON file.
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Print the generic relic name for a color, variant and effect count.
    Name {
        /// Red, Green, Blue, Yellow or "unknown".
        color: String,

        /// Deep night variant (true/false).
        #[arg(action = ArgAction::Set)]
        deep_night: bool,

        /// Number of effects on the relic.
        effect_count: usize,

        /// Quality read off the card (Delicate, Polished, Grand).
        quality: Option<String>,
    },
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Scan {
            image,
            card,
            data,
            settings,
        } => scan::run(image, card, data, settings).await,
        Commands::Name {
            color,
            deep_night,
            effect_count,
            quality,
        } => name::run(&color, deep_night, effect_count, quality.as_deref()),
    }
}
