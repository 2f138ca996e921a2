//! Wrapper for a reader, implements [BufferedReaderWrapper].
//!
//! The wrapper can wrap both [BufReader](io::BufReader) and [StdInReaderSeeker].
//! Needed because [Stdin](io::Stdin) does not implement seek_relative, and this serves as a convenient way to skip unwanted data.
//! seek_relative is used to skip over unwanted bytes in the input stream, such as packets of packet ids not selected by the user
use super::bufreader_wrapper::BufferedReaderWrapper;
use std::io::{self, Read, SeekFrom};

/// Wrapper for a reader where input data can be read from, implements [BufferedReaderWrapper].
#[derive(Debug)]
pub struct StdInReaderSeeker<R> {
    /// Generic reader that is wrapped
    pub reader: R,
}

/// Specialization for [io::Stdin]
impl BufferedReaderWrapper for StdInReaderSeeker<io::Stdin> {
    fn seek_relative(&mut self, offset: i64) -> io::Result<()> {
        let Ok(offset) = u64::try_from(offset) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Cannot seek backwards in stdin (offset {offset})"),
            ));
        };
        // Seeking is not supported in stdin, so we have to read the bytes and discard them
        let discarded = io::copy(&mut self.reader.lock().take(offset), &mut io::sink())?;
        if discarded < offset {
            // If we're seeking the offset amount and reached EOF then the packet length read before is wrong
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Failed to read and discard a payload from stdin of size {offset} (according to previously loaded packet header), reached EOF after {discarded} bytes"),
            ));
        }
        Ok(())
    }
}

impl io::Read for StdInReaderSeeker<io::Stdin> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.lock().read(buf)
    }
}
impl io::Seek for StdInReaderSeeker<io::Stdin> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("Cannot seek to {pos:?} in stdin"),
        ))
    }
}
