//! File-based event-log source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{decompressing, LogSource};
use crate::error::{AnalysisError, Result};

/// An event log stored on disk.
///
/// Files ending in `.gz`, or starting with the gzip magic bytes, are
/// decompressed while reading.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn has_gz_extension(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "gz")
    }

    fn unavailable(&self, source: std::io::Error) -> AnalysisError {
        AnalysisError::SourceUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl LogSource for FileSource {
    fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        let file = File::open(&self.path).map_err(|e| self.unavailable(e))?;
        // A directory opens fine on unix and only fails on the first read.
        decompressing(BufReader::new(file), self.has_gz_extension()).map_err(|e| self.unavailable(e))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_support::gzip;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn read_lines(source: &FileSource) -> Vec<String> {
        source.open().unwrap().lines().map(|l| l.unwrap()).collect()
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/eventlog");
        assert_eq!(source.path(), Path::new("/tmp/eventlog"));
        assert_eq!(source.description(), "file: /tmp/eventlog");
    }

    #[test]
    fn test_reads_plain_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"Event":"SparkListenerLogStart"}}"#).unwrap();
        writeln!(file, r#"{{"Event":"SparkListenerJobStart","Job ID":1}}"#).unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(read_lines(&source).len(), 2);
    }

    #[test]
    fn test_reads_gz_extension() {
        let mut file = Builder::new().suffix(".gz").tempfile().unwrap();
        file.write_all(&gzip(b"one\ntwo\nthree\n")).unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(read_lines(&source), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_detects_gzip_without_extension() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&gzip(b"compressed\n")).unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(read_lines(&source), vec!["compressed"]);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let source = FileSource::new("/nonexistent/path/eventlog");
        match source.open() {
            Err(AnalysisError::SourceUnavailable { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path/eventlog"));
            }
            other => panic!("expected SourceUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path());
        assert!(matches!(
            source.open(),
            Err(AnalysisError::SourceUnavailable { .. })
        ));
    }
}
