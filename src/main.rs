mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bip39kit::{Carrier, Direction, Mnemonic, Transformation, WordCount, stego, transform};
use clap::{ArgAction, Parser, Subcommand};
use image::ImageFormat;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "bip39kit",
    version,
    author,
    about = "BIP-39 mnemonic toolkit: generation, checksum repair, side mnemonics and steganography"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log library events to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print only the result
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new mnemonic from operating system entropy
    Generate {
        /// Number of words: 12, 15, 18, 21 or 24
        #[arg(short, long, default_value = "12", value_parser = parse_word_count)]
        words: WordCount,

        /// Show entropy, checksum and word positions
        #[arg(short, long)]
        info: bool,
    },

    /// Validate a mnemonic read from stdin
    Validate {
        /// Replace the last word so that the checksum matches
        #[arg(short, long)]
        fix_checksum: bool,

        #[arg(short, long)]
        info: bool,
    },

    /// Derive a side mnemonic by transforming the entropy
    Transform {
        /// negative, reversal or mirror
        #[arg(short, long, default_value = "negative")]
        transformation: Transformation,

        /// Split a transformed 24-word mnemonic into two 12-word mnemonics
        #[arg(long, conflicts_with = "join")]
        split: bool,

        /// Join two 12-word mnemonics into a transformed 24-word mnemonic
        #[arg(long)]
        join: bool,

        #[arg(short, long)]
        info: bool,
    },

    /// Derive the 64-byte BIP-39 seed
    Seed,

    /// Hide a mnemonic in an image, or recover it
    Steganography {
        #[command(subcommand)]
        action: StegoAction,
    },
}

#[derive(Subcommand)]
enum StegoAction {
    /// Hide a mnemonic in the least significant bits of an image
    Encode {
        /// Carrier image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image, always written as PNG
        #[arg(short, long)]
        output: PathBuf,

        /// horizontal, vertical, reverse-horizontal or reverse-vertical
        #[arg(short = 'r', long, default_value = "horizontal")]
        direction: Direction,
    },

    /// Recover a mnemonic hidden in an image
    Decode {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'r', long, default_value = "horizontal")]
        direction: Direction,
    },
}

fn parse_word_count(s: &str) -> std::result::Result<WordCount, String> {
    let words: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("\"{}\" is not a word count", s))?;
    WordCount::try_from(words).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => return,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_mnemonic(label: &str, fix_checksum: bool) -> Result<Mnemonic> {
    let phrase = ui::prompt_mnemonic(label)?;
    Mnemonic::from_phrase(&phrase, fix_checksum).context("Invalid mnemonic")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = ui::DisplayOptions::detect(cli.quiet);

    match cli.command {
        Command::Generate { words, info } => {
            let mnemonic = Mnemonic::generate(words).context("Failed to generate mnemonic")?;
            ui::display_mnemonic(0, &mnemonic, &options);
            if info {
                ui::display_info(&mnemonic.info(), &options);
            }
        }

        Command::Validate { fix_checksum, info } => {
            let phrase = ui::prompt_mnemonic("Mnemonic")?;
            let mnemonic =
                Mnemonic::from_phrase(&phrase, fix_checksum).context("Invalid mnemonic")?;

            if phrase.split_whitespace().eq(mnemonic.words()) {
                ui::display_valid(&options);
            } else {
                ui::display_checksum_fixed(&phrase, &mnemonic, &options);
                ui::display_mnemonic(0, &mnemonic, &options);
            }
            if info {
                ui::display_info(&mnemonic.info(), &options);
            }
        }

        Command::Transform {
            transformation,
            split,
            join,
            info,
        } => {
            ui::display_transformation(transformation, &options);

            let outputs = if split {
                let mnemonic = read_mnemonic("Mnemonic", false)?;
                let (first, second) = transform::split(&mnemonic, transformation)?;
                vec![first, second]
            } else if join {
                let first = read_mnemonic("Mnemonic 1", false)?;
                let second = read_mnemonic("Mnemonic 2", false)?;
                vec![transform::join(&first, &second, transformation)?]
            } else {
                vec![read_mnemonic("Mnemonic", false)?.transform(transformation)]
            };

            for (index, mnemonic) in outputs.iter().enumerate() {
                ui::display_mnemonic(index, mnemonic, &options);
                if info {
                    ui::display_info(&mnemonic.info(), &options);
                }
            }
        }

        Command::Seed => {
            let mnemonic = read_mnemonic("Mnemonic", false)?;
            let passphrase = ui::prompt_passphrase()?;

            let (seed, elapsed) = ui::show_progress(&options, "Deriving seed...", || {
                Ok(mnemonic.to_seed(&passphrase))
            })?;
            ui::display_seed(&seed, elapsed, &options);
        }

        Command::Steganography { action } => match action {
            StegoAction::Encode {
                input,
                output,
                direction,
            } => {
                let mnemonic = read_mnemonic("Mnemonic", false)?;
                let password = ui::prompt_password(true)?;
                if let Some(password) = &password {
                    ui::password_strength_hint(password, &options);
                }

                let image = image::open(&input)
                    .with_context(|| format!("Failed to open carrier image {}", input.display()))?;
                let mut carrier = Carrier::from_image(&image)?;
                let available = stego::capacity(&carrier);

                let (used, elapsed) = ui::show_progress(&options, "Hiding mnemonic...", || {
                    let password = password.as_deref().map(String::as_str);
                    Ok(stego::hide(&mut carrier, &mnemonic, password, direction)?)
                })?;

                let report = ui::CarrierReport {
                    width: carrier.width(),
                    height: carrier.height(),
                    channels: carrier.channels(),
                    capacity: available,
                    used,
                    direction,
                    encrypted: password.is_some(),
                };

                carrier
                    .into_image()?
                    .save_with_format(&output, ImageFormat::Png)
                    .with_context(|| format!("Failed to write {}", output.display()))?;

                ui::display_carrier(&report, elapsed, &options);
            }

            StegoAction::Decode { input, direction } => {
                let image = image::open(&input)
                    .with_context(|| format!("Failed to open carrier image {}", input.display()))?;
                let carrier = Carrier::from_image(&image)?;
                let password = ui::prompt_password(false)?;

                let (mnemonic, _) = ui::show_progress(&options, "Recovering mnemonic...", || {
                    let password = password.as_deref().map(String::as_str);
                    stego::reveal(&carrier, password, direction)
                        .context("No mnemonic recovered (check password and direction)")
                })?;

                ui::display_mnemonic(0, &mnemonic, &options);
            }
        },
    }

    Ok(())
}
