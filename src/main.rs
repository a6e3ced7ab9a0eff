//! `peripage` command line tool.
//!
//! ```bash
//! # print a picture with halftone
//! peripage --device /dev/rfcomm0 image photo.jpg --dither
//!
//! # feed 100 blank rows
//! peripage feed 100
//!
//! # capture the protocol stream instead of printing
//! peripage --device out.bin image label.png
//! ```

use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use peripage::{
    load_image, to_grayscale, Config, Error, Fill, Printer, QuantizeMode, RfcommPort,
    DEFAULT_DEVICE, DEFAULT_THRESHOLD, DEVICE_WIDTH,
};

/// PeriPage thermal printer utility
#[derive(Parser, Debug)]
#[command(name = "peripage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer device path
    #[arg(long, env = "PERIPAGE_DEVICE", default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Delay between rows in milliseconds
    #[arg(long, default_value = "20")]
    pacing: u64,

    /// Log every frame
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an image file scaled to the paper width
    Image {
        file: PathBuf,

        /// Luminance below this value prints a dot
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u8,

        /// Halftone with ordered dithering instead of a fixed threshold
        #[arg(long, conflicts_with = "threshold")]
        dither: bool,

        /// Blank rows fed after the image
        #[arg(long, default_value = "30")]
        feed: u16,
    },
    /// Feed paper without printing an image
    Feed {
        rows: u32,

        /// Print solid black rows instead of blank ones
        #[arg(long)]
        filled: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = Config::new().pacing(std::time::Duration::from_millis(cli.pacing));

    match cli.command {
        Commands::Image {
            file,
            threshold,
            dither,
            feed,
        } => {
            let mode = if dither {
                QuantizeMode::Dither
            } else {
                QuantizeMode::Threshold(threshold)
            };
            let pixels = to_grayscale(&load_image(&file, DEVICE_WIDTH)?);
            info!(
                "{} scaled to {}x{}",
                file.display(),
                pixels.width(),
                pixels.height()
            );

            let port = RfcommPort::open(&cli.device)?;
            let mut printer = Printer::new(port, config.mode(mode).trailing_feed(feed));
            printer.print_pixels(&pixels)?;
        }
        Commands::Feed { rows, filled } => {
            let fill = if filled { Fill::Solid } else { Fill::Blank };
            let port = RfcommPort::open(&cli.device)?;
            Printer::new(port, config).send_feed(rows, fill)?;
        }
    }
    Ok(())
}
