use std::collections::HashMap;
use std::io::{self, Write};

use crate::errors::{Error, Result};
use crate::pipeline::{ExtractionOutcome, ExtractionResult};

/// Builds the annotated header for a fragment, without the leading '>'.
/// # Examples
/// ```rust
/// use fragtrim::fragment_writer::fragment_header;
/// assert_eq!(fragment_header("r1 sample=3", 33), "r1 sample=3 | extracted_33bp_fragment");
/// ```
#[inline]
pub fn fragment_header(label: &str, length: usize) -> String {
    format!("{} | extracted_{}bp_fragment", label, length)
}

/// Writes one FASTA record with the sequence wrapped at `line_width` columns, 0 disables wrapping.
pub fn write_wrapped_record<W: Write>(writer: &mut W, header: &str, seq: &[u8], line_width: usize) -> io::Result<()> {
    writeln!(writer, ">{}", header)?;
    if line_width == 0 {
        writer.write_all(seq)?;
        writer.write_all(b"\n")?;
    } else {
        for line in seq.chunks(line_width) {
            writer.write_all(line)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// This is a writer for extraction results that forces fragments to be written in input order.
/// Results that are not ready to be written are stored until the results before them are written.
/// Results without a fragment still advance the order, they just produce no output.
/// # Examples
/// ```rust
/// use fragtrim::fragment_writer::OrderedFragmentWriter;
/// use fragtrim::pipeline::{ExtractionOutcome, ExtractionResult};
///
/// let mut buffer: Vec<u8> = vec![];
/// {
///     let mut writer = OrderedFragmentWriter::new(&mut buffer, 80);
///     let result_a = ExtractionResult {
///         read_index: 0,
///         label: "a".to_string(),
///         outcome: ExtractionOutcome::Extracted(b"AACCGGTT".to_vec())
///     };
///     let result_b = ExtractionResult {
///         read_index: 1,
///         label: "b".to_string(),
///         outcome: ExtractionOutcome::NoMatch
///     };
///     writer.write_result(result_b).unwrap();
///     writer.write_result(result_a).unwrap();
///     writer.flush().unwrap();
/// }
/// let expected = ">a | extracted_8bp_fragment\nAACCGGTT\n";
/// assert_eq!(expected, String::from_utf8(buffer).unwrap());
/// ```
pub struct OrderedFragmentWriter<W: Write> {
    /// the output sink
    writer: W,
    /// sequence column width
    line_width: usize,
    /// contains results we aren't ready to write yet
    map_store: HashMap<u64, ExtractionResult>,
    /// the index for the next result to write
    current_index: u64,
    /// number of fragments actually written
    fragments_written: u64
}

impl<W: Write> OrderedFragmentWriter<W> {
    /// Creates an `OrderedFragmentWriter` wrapping a buffer.
    /// # Arguments
    /// * `writer` - a buffer implementing `std::io::Write`
    /// * `line_width` - the sequence column width, 0 for single-line sequences
    pub fn new(writer: W, line_width: usize) -> Self {
        OrderedFragmentWriter {
            writer,
            line_width,
            map_store: HashMap::<u64, ExtractionResult>::new(),
            current_index: 0,
            fragments_written: 0
        }
    }

    /// Writes a result to the buffer or stores it if earlier results are still missing.
    /// # Arguments
    /// * `result` - the extraction result for one input record
    pub fn write_result(&mut self, result: ExtractionResult) -> Result<()> {
        if result.read_index < self.current_index {
            return Err(Error::OrderedWrite(format!("read index {} was already written", result.read_index)));
        }
        //the first submission for an index is kept
        if self.map_store.contains_key(&result.read_index) {
            return Err(Error::OrderedWrite(format!("read index {} was submitted twice", result.read_index)));
        }
        self.map_store.insert(result.read_index, result);
        self.drain_map_store()
    }

    fn drain_map_store(&mut self) -> Result<()> {
        while let Some(result) = self.map_store.remove(&self.current_index) {
            if let ExtractionOutcome::Extracted(fragment) = &result.outcome {
                let header: String = fragment_header(&result.label, fragment.len());
                write_wrapped_record(&mut self.writer, &header, fragment, self.line_width)?;
                self.fragments_written += 1;
            }
            self.current_index += 1;
        }
        Ok(())
    }

    /// Returns the number of fragments written so far.
    pub fn fragments_written(&self) -> u64 {
        self.fragments_written
    }

    /// Returns the number of results that are waiting on an earlier index.
    pub fn pending(&self) -> usize {
        self.map_store.len()
    }

    /// Flushes the buffer, call before trying to read anything.
    pub fn flush(&mut self) -> Result<()> {
        self.drain_map_store()?;
        self.writer.flush()?;
        Ok(())
    }
}
