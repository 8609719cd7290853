
use needletail::errors::ParseErrorKind;
use needletail::parse_fastx_reader;
use needletail::parser::FastxReader;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::errors::{Error, Result};

/// Drops the blank lines in front of the first record, the format sniffing in needletail expects '>' or '@' as the
/// very first byte.
struct SkipLeadingBlankLines<R: Read> {
    inner: R,
    started: bool
}

impl<R: Read> Read for SkipLeadingBlankLines<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.started || buf.is_empty() {
            return self.inner.read(buf);
        }
        loop {
            let bytes_read: usize = self.inner.read(buf)?;
            if bytes_read == 0 {
                return Ok(0);
            }
            if let Some(offset) = buf[..bytes_read].iter().position(|&c| c != b'\n' && c != b'\r') {
                buf.copy_within(offset..bytes_read, 0);
                self.started = true;
                return Ok(bytes_read - offset);
            }
        }
    }
}

/// Parses a FASTA/FASTQ stream, compressed or not.
/// Returns `None` when the stream holds no records at all, which callers treat as an empty run.
/// Blank lines before the first record are skipped for plain text input.
/// # Arguments
/// * `reader` - the raw byte stream
/// # Examples
/// ```rust
/// use fragtrim::fastx_util::open_fastx_reader;
/// assert!(open_fastx_reader("".as_bytes()).unwrap().is_none());
/// let mut fastx_reader = open_fastx_reader("\n\n>r1\nACGT\n".as_bytes()).unwrap().unwrap();
/// let record = fastx_reader.next().unwrap().unwrap();
/// assert_eq!(record.id(), b"r1");
/// ```
pub fn open_fastx_reader<'a, R: Read + Send + 'a>(reader: R) -> Result<Option<Box<dyn FastxReader + 'a>>> {
    let skipping_reader = SkipLeadingBlankLines {
        inner: reader,
        started: false
    };
    match parse_fastx_reader(skipping_reader) {
        Ok(fastx_reader) => Ok(Some(fastx_reader)),
        Err(e) if e.kind == ParseErrorKind::EmptyFile => Ok(None),
        Err(e) => Err(Error::Parse(e.to_string()))
    }
}

/// Opens and parses a FASTA/FASTQ file, see `open_fastx_reader`.
pub fn open_fastx_file<'a, P: AsRef<Path>>(filename: P) -> Result<Option<Box<dyn FastxReader + 'a>>> {
    let file: File = File::open(filename)?;
    open_fastx_reader(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compression, GzBuilder};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn read_ids(data: &[u8]) -> Vec<String> {
        let mut ids: Vec<String> = vec![];
        if let Some(mut fastx_reader) = open_fastx_reader(data).unwrap() {
            while let Some(record) = fastx_reader.next() {
                ids.push(String::from_utf8(record.unwrap().id().to_vec()).unwrap());
            }
        }
        ids
    }

    #[test]
    fn test_empty_input() {
        assert!(read_ids(b"").is_empty());
        //a lone byte cannot hold a record either
        assert!(read_ids(b">").is_empty());
        //blank lines only
        assert!(read_ids(b"\n\r\n\n").is_empty());
    }

    #[test]
    fn test_leading_blank_lines() {
        assert_eq!(read_ids(b"\n\n>r1\nACGT\n>r2\nGG\n"), vec!["r1", "r2"]);
        assert_eq!(read_ids(b"\r\n@q1\nACGT\n+\nIIII\n"), vec!["q1"]);
        assert_eq!(read_ids(b">r1\nACGT\n"), vec!["r1"]);
    }

    #[test]
    fn test_unknown_format() {
        match open_fastx_reader("ACGT\n".as_bytes()) {
            Err(Error::Parse(_)) => {},
            other => panic!("unexpected result: {:?}", other.map(|r| r.is_some()))
        };
    }

    #[test]
    fn test_files() {
        let mut empty_file: NamedTempFile = Builder::new().prefix("empty_").suffix(".fa").tempfile().unwrap();
        empty_file.flush().unwrap();
        assert!(open_fastx_file(empty_file.path()).unwrap().is_none());

        let file: NamedTempFile = Builder::new().prefix("temp_data_").suffix(".fq.gz").tempfile().unwrap();
        let mut gz = GzBuilder::new().write(file, Compression::default());
        gz.write_all(b"@q1\nACGT\n+\nIIII\n").unwrap();
        let file = gz.finish().unwrap();
        let mut fastx_reader = open_fastx_file(file.path()).unwrap().unwrap();
        assert_eq!(fastx_reader.next().unwrap().unwrap().id(), b"q1");

        match open_fastx_file("/nonexistent/reads.fa") {
            Err(Error::Io(_)) => {},
            other => panic!("unexpected result: {:?}", other.map(|r| r.is_some()))
        };
    }
}
