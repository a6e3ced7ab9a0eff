//! Error types for PeriPage printer operations.
//!
//! This module defines all possible errors that can occur while converting
//! images into the printer protocol and streaming it to the device.

use thiserror::Error;

/// Main error type for PeriPage printer operations.
///
/// Every failure aborts the remaining frame sequence. Nothing is retried
/// internally, and bytes already delivered to the device are not undone.
#[derive(Error, Debug)]
pub enum Error {
    /// Zero width or height handed to the quantizer.
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Raw buffer length does not match the declared dimensions.
    #[error("Buffer size mismatch: expected {expected} bytes, found {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Row count does not fit the 16-bit height field of the print info command.
    ///
    /// The printer pump also rejects jobs of zero rows with this error.
    #[error("Height of {0} rows is out of range (1..=65535)")]
    HeightOutOfRange(u32),

    /// Write, flush or open failure on the byte sink.
    ///
    /// Partial output already sent to the printer leaves it in an undefined
    /// state; the protocol has no abort command.
    #[error(transparent)]
    TransportError(#[from] std::io::Error),

    /// Image decoding failure.
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
}
