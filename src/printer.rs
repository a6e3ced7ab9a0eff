use log::{debug, info, warn};
use std::convert::TryFrom;
use std::io::Write;
use std::thread;
use std::time::Duration;

use crate::{
    bitmap::{quantize_with, BitmapPlane, PixelBuffer, QuantizeMode},
    error::Error,
    protocol::{feed_row, Command, Fill},
    BYTES_PER_ROW, DEVICE_WIDTH,
};

/// Minimum delay after every row write.
pub const DEFAULT_PACING: Duration = Duration::from_millis(20);

/// Blank rows fed after an image so the tear line clears it.
pub const DEFAULT_TRAILING_FEED: u16 = 30;

/// A single unit of work for the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintJob {
    Bitmap(BitmapPlane),
    Feed { rows: u32, fill: Fill },
}

/// Drives a PeriPage printer over an ordered byte sink.
///
/// Writes are strictly sequential: start frame, print info, rows paced by
/// [`Config::pacing`], end frame, flush. There is no cancellation; a
/// transport failure aborts the job where it stands and the printer is left
/// in an undefined state until the next start frame.
///
/// One job runs at a time per printer. Methods take `&mut self`, and
/// [`Printer::spawn`] moves the printer into the worker thread, so
/// overlapping jobs on the same sink cannot be expressed.
pub struct Printer<W: Write> {
    sink: W,
    config: Config,
}

impl<W: Write> Printer<W> {
    pub fn new(sink: W, config: Config) -> Self {
        Printer { sink, config }
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Give the sink back.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Run one job.
    pub fn run(&mut self, job: &PrintJob) -> Result<(), Error> {
        match job {
            PrintJob::Bitmap(plane) => self.send_bitmap(plane),
            PrintJob::Feed { rows, fill } => self.send_feed(*rows, *fill),
        }
    }

    /// Quantize `pixels` with the configured mode and print them.
    ///
    /// The buffer should already be [`DEVICE_WIDTH`] pixels wide.
    pub fn print_pixels(&mut self, pixels: &PixelBuffer) -> Result<(), Error> {
        let plane = quantize_with(pixels, self.config.mode)?;
        self.send_bitmap(&plane)
    }

    /// Print a packed bitmap followed by the trailing feed.
    ///
    /// Data goes out in [`BYTES_PER_ROW`] chunks; the last chunk carries
    /// whatever is left and is not padded.
    pub fn send_bitmap(&mut self, plane: &BitmapPlane) -> Result<(), Error> {
        let rows = check_rows(plane.height())?;
        if plane.width() != DEVICE_WIDTH {
            warn!(
                "bitmap is {} dots wide, printer expects {}",
                plane.width(),
                DEVICE_WIDTH
            );
        }

        info!("printing bitmap of {} rows", rows);
        self.send(Command::PrintStart)?;
        self.send(Command::SetPrintInfo(rows))?;
        self.write_rows(plane.data().chunks(BYTES_PER_ROW))?;

        let trailing = self.config.trailing_feed;
        if trailing > 0 {
            debug!("trailing feed of {} rows", trailing);
            self.send(Command::SetPrintInfo(trailing))?;
            self.write_feed_rows(trailing, Fill::Blank)?;
        }

        self.finish()
    }

    /// Feed `rows` full-width rows of a constant pattern.
    pub fn send_feed(&mut self, rows: u32, fill: Fill) -> Result<(), Error> {
        let rows = check_rows(rows)?;

        info!("feeding {} {:?} rows", rows, fill);
        self.send(Command::PrintStart)?;
        self.send(Command::SetPrintInfo(rows))?;
        self.write_feed_rows(rows, fill)?;
        self.finish()
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.send(Command::PrintEnd)?;
        self.sink.flush()?;
        debug!("job complete");
        Ok(())
    }

    fn send(&mut self, command: Command) -> Result<(), Error> {
        debug!("{:?}", command);
        self.sink.write_all(&command.encode())?;
        Ok(())
    }

    fn write_feed_rows(&mut self, rows: u16, fill: Fill) -> Result<(), Error> {
        let row = feed_row(fill);
        self.write_rows((0..rows).map(|_| &row[..]))
    }

    fn write_rows<'a>(&mut self, rows: impl Iterator<Item = &'a [u8]>) -> Result<(), Error> {
        let mut count = 0usize;
        for row in rows {
            self.sink.write_all(row)?;
            count += 1;
            if !self.config.pacing.is_zero() {
                thread::sleep(self.config.pacing);
            }
        }
        debug!("wrote {} rows", count);
        Ok(())
    }
}

impl<W: Write + Send + 'static> Printer<W> {
    /// Run `job` on a dedicated thread.
    ///
    /// The handle yields the printer back along with the job result so the
    /// next job can be queued on the same sink.
    pub fn spawn(mut self, job: PrintJob) -> thread::JoinHandle<(Self, Result<(), Error>)> {
        thread::spawn(move || {
            let result = self.run(&job);
            (self, result)
        })
    }
}

fn check_rows(rows: u32) -> Result<u16, Error> {
    match u16::try_from(rows) {
        Ok(rows) if rows > 0 => Ok(rows),
        _ => Err(Error::HeightOutOfRange(rows)),
    }
}

/// Config
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pacing: Duration,
    trailing_feed: u16,
    mode: QuantizeMode,
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// Initialize configuration data with default values.
    ///
    /// # Example
    ///
    /// ```
    /// use peripage::{Config, QuantizeMode};
    /// use std::time::Duration;
    ///
    /// let config = Config::new()
    ///     .pacing(Duration::from_millis(25))
    ///     .mode(QuantizeMode::Dither);
    /// assert_eq!(config.get_pacing(), Duration::from_millis(25));
    /// ```
    ///
    pub fn new() -> Config {
        Config {
            pacing: DEFAULT_PACING,
            trailing_feed: DEFAULT_TRAILING_FEED,
            mode: QuantizeMode::default(),
        }
    }

    /// Delay after each row write. Lowering it risks dropped rows on the device.
    pub fn pacing(self, pacing: Duration) -> Self {
        Config { pacing, ..self }
    }

    /// Blank rows fed after every bitmap, 0 disables the trailing feed frame.
    pub fn trailing_feed(self, rows: u16) -> Self {
        Config {
            trailing_feed: rows,
            ..self
        }
    }

    pub fn threshold(self, threshold: u8) -> Self {
        Config {
            mode: QuantizeMode::Threshold(threshold),
            ..self
        }
    }

    pub fn mode(self, mode: QuantizeMode) -> Self {
        Config { mode, ..self }
    }

    pub fn get_pacing(&self) -> Duration {
        self.pacing
    }

    pub fn get_trailing_feed(&self) -> u16 {
        self.trailing_feed
    }

    pub fn get_mode(&self) -> QuantizeMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;

    /// Records every write; fails once `fail_at` writes have succeeded.
    #[derive(Default)]
    struct Recorder {
        writes: Vec<Vec<u8>>,
        flushes: usize,
        fail_at: Option<usize>,
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if Some(self.writes.len()) == self.fail_at {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link lost"));
            }
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn fast() -> Config {
        Config::new().pacing(Duration::ZERO)
    }

    #[test]
    fn test_chunks_keep_short_tail() {
        let plane = BitmapPlane::from_raw(400, 2, vec![0xAA; 100]).unwrap();
        let mut printer = Printer::new(Recorder::default(), fast().trailing_feed(0));
        printer.send_bitmap(&plane).unwrap();

        let sizes: Vec<usize> = printer.get_ref().writes[2..5].iter().map(|w| w.len()).collect();
        assert_eq!(sizes, vec![48, 48, 4]);
        assert_eq!(printer.get_ref().writes.len(), 6);
    }

    #[test]
    fn test_zero_rows_rejected() {
        let mut printer = Printer::new(Recorder::default(), fast());
        match printer.send_feed(0, Fill::Blank) {
            Err(Error::HeightOutOfRange(0)) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(printer.get_ref().writes.is_empty());
    }

    #[test]
    fn test_run_dispatches_feed() {
        let mut printer = Printer::new(Recorder::default(), fast());
        printer
            .run(&PrintJob::Feed {
                rows: 2,
                fill: Fill::Solid,
            })
            .unwrap();
        let writes = &printer.get_ref().writes;
        assert_eq!(writes.len(), 5);
        assert_eq!(writes[2], vec![0xFF; 48]);
        assert_eq!(printer.get_ref().flushes, 1);
    }

    #[test]
    fn test_failure_in_trailing_feed_skips_end() {
        let plane = BitmapPlane::from_raw(384, 1, vec![0x00; 48]).unwrap();
        // start, info, 1 row, info(30), then fail on the first feed row
        let sink = Recorder {
            fail_at: Some(4),
            ..Recorder::default()
        };
        let mut printer = Printer::new(sink, fast());
        assert!(matches!(
            printer.send_bitmap(&plane),
            Err(Error::TransportError(_))
        ));
        let sink = printer.into_inner();
        assert_eq!(sink.writes.len(), 4);
        assert_eq!(sink.flushes, 0);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new().threshold(90).trailing_feed(5);
        assert_eq!(config.get_mode(), QuantizeMode::Threshold(90));
        assert_eq!(config.get_trailing_feed(), 5);
        assert_eq!(config.get_pacing(), DEFAULT_PACING);
    }
}
