//! PeriPage Printer Driver
//!
//! This crate turns images into the PeriPage thermal printer protocol and
//! streams it to the device over any ordered byte sink, typically a
//! Bluetooth RFCOMM tty.
//!
//! # Example
//!
//! ```rust,no_run
//! use peripage::{load_image, Config, Printer, RfcommPort, DEVICE_WIDTH};
//!
//! let pixels = load_image("receipt.png", DEVICE_WIDTH).unwrap();
//! let port = RfcommPort::open("/dev/rfcomm0").unwrap();
//! let mut printer = Printer::new(port, Config::new());
//! printer.print_pixels(&pixels).unwrap();
//! ```

mod bitmap;
mod error;
mod printer;
mod protocol;
mod transport;
mod utils;

pub use crate::{
    bitmap::{
        quantize, quantize_with, to_grayscale, BitmapPlane, GrayscaleBuffer, PixelBuffer,
        QuantizeMode, DEFAULT_THRESHOLD,
    },
    error::Error,
    printer::{Config, PrintJob, Printer, DEFAULT_PACING, DEFAULT_TRAILING_FEED},
    protocol::{
        feed_row, height_command, Command, Fill, MAX_ROWS, PRINT_END, PRINT_START,
        SET_PRINT_INFO,
    },
    transport::{RfcommPort, DEFAULT_DEVICE},
    utils::{fit_to_width, load_image},
};

/// Width in dots of the PeriPage print head.
///
/// Images must be scaled to this width before quantizing; one raster row is
/// 48 bytes when packed (384 / 8 = 48).
pub const DEVICE_WIDTH: u32 = 384;

/// Bytes per packed raster row at [`DEVICE_WIDTH`].
pub const BYTES_PER_ROW: usize = (DEVICE_WIDTH / 8) as usize;
