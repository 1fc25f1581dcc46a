//! In-memory event-log source.

use std::io::{BufRead, Cursor};

use super::{decompressing, LogSource};
use crate::error::Result;

/// An event log already held in memory, plain or gzip-compressed.
///
/// Useful when the log was fetched by another component and never touched
/// the filesystem.
#[derive(Debug, Clone)]
pub struct BytesSource {
    data: Vec<u8>,
    description: String,
}

impl BytesSource {
    pub fn new(data: Vec<u8>) -> Self {
        let description = format!("memory: {} bytes", data.len());
        Self { data, description }
    }

    /// Replace the description used in log messages.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl From<String> for BytesSource {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl From<&str> for BytesSource {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl LogSource for BytesSource {
    fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        Ok(decompressing(Cursor::new(self.data.clone()), false)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
