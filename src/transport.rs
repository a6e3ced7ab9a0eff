//! RFCOMM serial port sink.
//!
//! The printer must already be paired and bound to a tty, for example with
//! `sudo rfcomm bind 0 <MAC>`, which creates `/dev/rfcomm0`. The port is
//! switched to raw mode so raster bytes such as `0x11`/`0x13` (XON/XOFF) or
//! `0x0A` pass through untouched.
//!
//! Paths that are not a tty are written as plain files, which is handy for
//! capturing the protocol stream.

use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::Error;

/// Default RFCOMM device path.
pub const DEFAULT_DEVICE: &str = "/dev/rfcomm0";

pub struct RfcommPort {
    file: File,
}

impl RfcommPort {
    /// Open `device` for writing, truncating plain files.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, Error> {
        let path = device.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(!path.starts_with("/dev"))
            .truncate(!path.starts_with("/dev"))
            .open(path)?;

        if is_tty(&file) {
            debug!("configuring {} for raw output", path.display());
            configure_tty_raw(&file).map_err(Error::TransportError)?;
        } else {
            debug!("{} is not a tty, writing as-is", path.display());
        }

        Ok(RfcommPort { file })
    }
}

impl Write for RfcommPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(unix)]
fn is_tty(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;

    unsafe { libc::isatty(file.as_raw_fd()) == 1 }
}

#[cfg(not(unix))]
fn is_tty(_file: &File) -> bool {
    false
}

/// Put the tty into raw mode and turn off XON/XOFF in both directions.
#[cfg(unix)]
fn configure_tty_raw(file: &File) -> io::Result<()> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    let mut termios = unsafe {
        if libc::tcgetattr(fd, termios.as_mut_ptr()) != 0 {
            return Err(io::Error::last_os_error());
        }
        termios.assume_init()
    };

    unsafe { libc::cfmakeraw(&mut termios) };
    // raster bytes 0x11 and 0x13 must not be taken as flow control
    termios.c_iflag &= !(libc::IXOFF | libc::IXANY);

    match unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } {
        0 => Ok(()),
        _ => Err(io::Error::last_os_error()),
    }
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_plain_file_captures_bytes() {
        let path = std::env::temp_dir().join(format!("peripage-capture-{}.bin", std::process::id()));
        {
            let mut port = RfcommPort::open(&path).unwrap();
            port.write_all(&[0x10, 0x11, 0x13, 0x0A]).unwrap();
            port.flush().unwrap();
        }
        assert_eq!(fs::read(&path).unwrap(), vec![0x10, 0x11, 0x13, 0x0A]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_device_is_transport_error() {
        match RfcommPort::open("/dev/peripage-does-not-exist") {
            Err(Error::TransportError(_)) => {}
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("opened a missing device"),
        }
    }
}
