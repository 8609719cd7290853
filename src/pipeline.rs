extern crate log;

use log::info;
use needletail::parser::FastxReader;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, mpsc};
use threadpool::ThreadPool;

use crate::errors::{Error, Result};
use crate::fastx_util::{open_fastx_file, open_fastx_reader};
use crate::fragment_writer::OrderedFragmentWriter;
use crate::params::ExtractionParameters;

/// maximum number of records in flight when running with a worker pool
pub const JOB_SLOTS: u64 = 10000;
/// number of records between progress messages
pub const UPDATE_INTERVAL: u64 = 10000;

/// a struct for storing one input record
#[derive(Clone,Debug)]
pub struct SequenceRecord {
    /// The 0-based position of the record in the input
    pub read_index: u64,
    /// The record label/identifier, everything after the leading '>' or '@'
    pub label: String,
    /// The actual sequence
    pub seq: Vec<u8>
}

/// what happened to a single record
#[derive(Clone,Debug,PartialEq)]
pub enum ExtractionOutcome {
    /// a fragment was found and passed the length bounds
    Extracted(Vec<u8>),
    /// a fragment of this length was found but failed the length bounds
    Filtered(usize),
    /// no start/end marker pairing exists in the record
    NoMatch
}

/// a struct for storing the result for one record
#[derive(Clone,Debug)]
pub struct ExtractionResult {
    /// The index associated with the record
    pub read_index: u64,
    /// The record label/identifier
    pub label: String,
    /// The extracted fragment, if any
    pub outcome: ExtractionOutcome
}

/// Aggregate counters over one run.
#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct ExtractionSummary {
    /// every record read from the input
    pub total_records: u64,
    /// fragments that were written
    pub extracted: u64,
    /// fragments rejected by the length bounds
    pub filtered: u64,
    /// records without any marker pairing
    pub no_match: u64
}

impl ExtractionSummary {
    fn tally(&mut self, outcome: &ExtractionOutcome) {
        self.total_records += 1;
        match outcome {
            ExtractionOutcome::Extracted(_) => self.extracted += 1,
            ExtractionOutcome::Filtered(_) => self.filtered += 1,
            ExtractionOutcome::NoMatch => self.no_match += 1
        };
    }

    /// Returns the percentage of records that produced a written fragment, 0.0 for an empty input.
    /// # Examples
    /// ```rust
    /// use fragtrim::pipeline::ExtractionSummary;
    /// let summary = ExtractionSummary { total_records: 4, extracted: 1, filtered: 1, no_match: 2 };
    /// assert_eq!(summary.success_rate(), 25.0);
    /// assert_eq!(ExtractionSummary::default().success_rate(), 0.0);
    /// ```
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.extracted as f64 / self.total_records as f64 * 100.0
        }
    }
}

/// This will run an extraction "job" on a single record.
/// The length bounds are checked after the search, a fragment that fails them is not replaced by another pairing.
/// # Arguments
/// * `params` - the extraction parameters
/// * `record` - the record to search
/// # Examples
/// ```rust
/// use fragtrim::params::ExtractionParameters;
/// use fragtrim::pipeline::{ExtractionOutcome, SequenceRecord, extraction_job};
/// let record = SequenceRecord {
///     read_index: 0,
///     label: "r1".to_string(),
///     seq: b"NNNTGTACCTGCAGATGAXYZGTGACCGTGTCTTCTNNN".to_vec()
/// };
/// let result = extraction_job(&ExtractionParameters::default(), record);
/// assert_eq!(result.outcome, ExtractionOutcome::Extracted(b"TGTACCTGCAGATGAXYZGTGACCGTGTCTTCT".to_vec()));
/// ```
pub fn extraction_job(params: &ExtractionParameters, record: SequenceRecord) -> ExtractionResult {
    let outcome: ExtractionOutcome = match params.markers.extract(&record.seq, params.allow_overlap) {
        Some(fragment) => {
            if params.bounds.accepts(fragment.len()) {
                ExtractionOutcome::Extracted(fragment.seq.to_vec())
            } else {
                ExtractionOutcome::Filtered(fragment.len())
            }
        },
        None => ExtractionOutcome::NoMatch
    };

    ExtractionResult {
        read_index: record.read_index,
        label: record.label,
        outcome
    }
}

/// Hands a finished result to the writer and updates the counters.
fn receive_result<W: Write>(
    result: ExtractionResult, summary: &mut ExtractionSummary, fragment_writer: &mut OrderedFragmentWriter<W>, verbose: bool
) -> Result<()> {
    summary.tally(&result.outcome);
    if verbose {
        match &result.outcome {
            ExtractionOutcome::Extracted(fragment) => info!("Record #{} \"{}\": extracted {}bp", result.read_index, result.label, fragment.len()),
            ExtractionOutcome::Filtered(length) => info!("Record #{} \"{}\": {}bp fragment outside length bounds", result.read_index, result.label, length),
            ExtractionOutcome::NoMatch => info!("Record #{} \"{}\": no marker pairing", result.read_index, result.label)
        };
    }
    fragment_writer.write_result(result)?;
    if summary.total_records % UPDATE_INTERVAL == 0 {
        info!("Processed {} records, extracted {} fragments...", summary.total_records, summary.extracted);
    }
    Ok(())
}

/// Runs the extraction over every record of a parsed FASTX stream, writing fragments in input order.
/// With `threads > 1` the records are handed to a worker pool and reassembled by the ordered writer, so the output is
/// identical to the single-threaded run.
/// # Arguments
/// * `fastx_reader` - the parsed input stream
/// * `params` - the shared extraction parameters, validate them before calling
/// * `fragment_writer` - where the fragments go
/// * `threads` - the number of worker threads, 0 or 1 runs in the calling thread
pub fn extract_records<'a, W: Write>(
    mut fastx_reader: Box<dyn FastxReader + 'a>, params: Arc<ExtractionParameters>, fragment_writer: &mut OrderedFragmentWriter<W>, threads: usize
) -> Result<ExtractionSummary> {
    let mut summary: ExtractionSummary = ExtractionSummary::default();
    let verbose: bool = params.verbose;
    let mut read_index: u64 = 0;

    if threads <= 1 {
        while let Some(raw_record) = fastx_reader.next() {
            let record = raw_record.map_err(|e| Error::Parse(e.to_string()))?;
            let seq_record: SequenceRecord = SequenceRecord {
                read_index,
                label: String::from_utf8_lossy(record.id()).into_owned(),
                seq: record.seq().into_owned()
            };
            let result: ExtractionResult = extraction_job(&params, seq_record);
            receive_result(result, &mut summary, fragment_writer, verbose)?;
            read_index += 1;
        }
    } else {
        let pool = ThreadPool::new(threads);
        let (tx, rx) = mpsc::channel();

        while let Some(raw_record) = fastx_reader.next() {
            let record = raw_record.map_err(|e| Error::Parse(e.to_string()))?;

            //if we've filled our queue, then we should wait until we get some results back
            if read_index - summary.total_records >= JOB_SLOTS {
                let rx_value: ExtractionResult = rx.recv().map_err(|_| Error::WorkerPool)?;
                receive_result(rx_value, &mut summary, fragment_writer, verbose)?;
            }

            let tx = tx.clone();
            let arc_params = params.clone();
            let seq_record: SequenceRecord = SequenceRecord {
                read_index,
                label: String::from_utf8_lossy(record.id()).into_owned(),
                seq: record.seq().into_owned()
            };
            pool.execute(move|| {
                let result: ExtractionResult = extraction_job(&arc_params, seq_record);
                //the receiver only goes away when the run was aborted
                let _ = tx.send(result);
            });
            read_index += 1;
        }

        //a panicked job drops its sender, so this turns a lost result into an error instead of a hang
        drop(tx);
        while summary.total_records < read_index {
            let rx_value: ExtractionResult = rx.recv().map_err(|_| Error::WorkerPool)?;
            receive_result(rx_value, &mut summary, fragment_writer, verbose)?;
        }
    }

    fragment_writer.flush()?;
    Ok(summary)
}

/// Parses any FASTA/FASTQ byte stream (optionally compressed) and runs the extraction on it.
/// # Examples
/// ```rust
/// use std::sync::Arc;
/// use fragtrim::params::ExtractionParameters;
/// use fragtrim::pipeline::extract_from_reader;
///
/// let input = b">r1\nNNNTGTACCTGCAGATGAXYZGTGACCGTGTCTTCTNNN\n>r2\nNOMATCH\n".to_vec();
/// let mut output: Vec<u8> = vec![];
/// let summary = extract_from_reader(std::io::Cursor::new(input), Arc::new(ExtractionParameters::default()), &mut output, 1).unwrap();
/// assert_eq!(summary.total_records, 2);
/// assert_eq!(summary.extracted, 1);
/// assert_eq!(String::from_utf8(output).unwrap(), ">r1 | extracted_33bp_fragment\nTGTACCTGCAGATGAXYZGTGACCGTGTCTTCT\n");
/// ```
pub fn extract_from_reader<'a, R: Read + Send + 'a, W: Write>(
    reader: R, params: Arc<ExtractionParameters>, writer: W, threads: usize
) -> Result<ExtractionSummary> {
    let fastx_reader = open_fastx_reader(reader)?;
    extract_optional_records(fastx_reader, params, writer, threads)
}

/// Opens a FASTA/FASTQ file (optionally compressed) and runs the extraction on it.
/// # Arguments
/// * `filename` - the input file
/// * `params` - the shared extraction parameters, validate them before calling
/// * `writer` - where the fragments go
/// * `threads` - the number of worker threads
pub fn extract_from_file<P: AsRef<Path>, W: Write>(
    filename: P, params: Arc<ExtractionParameters>, writer: W, threads: usize
) -> Result<ExtractionSummary> {
    let fastx_reader = open_fastx_file(filename)?;
    extract_optional_records(fastx_reader, params, writer, threads)
}

/// An input without any record is an empty run, not an error.
fn extract_optional_records<'a, W: Write>(
    fastx_reader: Option<Box<dyn FastxReader + 'a>>, params: Arc<ExtractionParameters>, writer: W, threads: usize
) -> Result<ExtractionSummary> {
    let mut fragment_writer = OrderedFragmentWriter::new(writer, params.line_width);
    match fastx_reader {
        Some(fastx_reader) => extract_records(fastx_reader, params, &mut fragment_writer, threads),
        None => {
            info!("Input holds no records");
            fragment_writer.flush()?;
            Ok(ExtractionSummary::default())
        }
    }
}
