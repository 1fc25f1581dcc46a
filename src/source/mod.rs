//! Event-log sources.
//!
//! An event log is newline-delimited JSON, optionally gzip-compressed as a
//! whole. A [`LogSource`] hands the aggregator a line-oriented reader with
//! decompression already applied, so the aggregator never needs to know where
//! the bytes came from.

mod bytes;
mod file;

pub use bytes::BytesSource;
pub use file::FileSource;

use std::fmt::Debug;
use std::io::{self, BufRead, BufReader};

use flate2::bufread::GzDecoder;

use crate::error::Result;

/// First two bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Something an event log can be read from.
///
/// # Example
///
/// ```
/// use std::io::BufRead;
/// use pipetimer::{BytesSource, LogSource};
///
/// let source = BytesSource::new(b"{\"Event\":\"SparkListenerLogStart\"}\n".to_vec());
/// let reader = source.open().unwrap();
/// assert_eq!(reader.lines().count(), 1);
/// ```
pub trait LogSource: Send + Debug {
    /// Open a fresh reader positioned at the first line.
    ///
    /// Fails with [`AnalysisError::SourceUnavailable`](crate::AnalysisError)
    /// when the underlying data cannot be opened or read at all.
    fn open(&self) -> Result<Box<dyn BufRead + Send>>;

    /// Human-readable description, used in log messages.
    fn description(&self) -> &str;
}

/// Wrap `reader` in a gzip decoder when forced or when the stream starts
/// with the gzip magic bytes.
pub(crate) fn decompressing<R>(mut reader: R, force_gzip: bool) -> io::Result<Box<dyn BufRead + Send>>
where
    R: BufRead + Send + 'static,
{
    let gzipped = force_gzip || reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if gzipped {
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}
