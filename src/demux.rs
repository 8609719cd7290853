extern crate log;

use bio::io::fastq;
use log::{debug, warn};
use needletail::parser::FastxReader;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::{Error, Result};
use crate::fastx_util::open_fastx_file;
use crate::string_util::flank_barcode;

/// number of bases taken from each end of a read
pub const BARCODE_FLANK: usize = 8;
/// length of a combined barcode
pub const BARCODE_LENGTH: usize = 2 * BARCODE_FLANK;

/// Returns the output filename for the barcode on the given 1-based line.
/// # Examples
/// ```rust
/// use fragtrim::demux::barcode_filename;
/// assert_eq!(barcode_filename(7), "barcode7.fastq");
/// ```
pub fn barcode_filename(line_number: usize) -> String {
    format!("barcode{}.fastq", line_number)
}

/// The barcodes to split on, keyed by the combined 16 bp barcode.
#[derive(Clone,Debug,Default)]
pub struct BarcodeSet {
    /// barcode to the 1-based line it was read from
    barcodes: HashMap<Vec<u8>, usize>,
    /// every line that held a valid barcode, in file order
    line_numbers: Vec<usize>
}

impl BarcodeSet {
    /// Reads one barcode per line. Lines are numbered from 1 and every line counts, including blank or invalid ones,
    /// so barcode numbers always match the line they came from. Lines that are not exactly `BARCODE_LENGTH` long after
    /// trimming are skipped with a warning. If a barcode appears twice, the later line wins.
    /// # Arguments
    /// * `reader` - the barcode list
    /// # Examples
    /// ```rust
    /// use fragtrim::demux::BarcodeSet;
    /// let data = "ATCACGTTCGATGTAT\nshort\nTTAGGCATTGACCTCA\n";
    /// let barcodes = BarcodeSet::from_reader(data.as_bytes()).unwrap();
    /// assert_eq!(barcodes.line_numbers(), &[1, 3]);
    /// assert_eq!(barcodes.get(b"TTAGGCATTGACCTCA"), Some(3));
    /// ```
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut barcode_set = BarcodeSet::default();
        for (idx, line) in reader.lines().enumerate() {
            let line: String = line?;
            let barcode: &str = line.trim();
            let line_number: usize = idx + 1;
            if barcode.len() != BARCODE_LENGTH {
                warn!("Barcode on line {} is not {} bp long, skipping: \"{}\"", line_number, BARCODE_LENGTH, barcode);
                continue;
            }
            if let Some(previous) = barcode_set.barcodes.insert(barcode.as_bytes().to_vec(), line_number) {
                warn!("Barcode on line {} repeats line {}, reads will go to line {}", line_number, previous, line_number);
            }
            barcode_set.line_numbers.push(line_number);
        }
        Ok(barcode_set)
    }

    /// Reads the barcode list from a file.
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let file: File = File::open(filename)?;
        BarcodeSet::from_reader(BufReader::new(file))
    }

    /// Returns the line number for a combined barcode.
    #[inline]
    pub fn get(&self, barcode: &[u8]) -> Option<usize> {
        self.barcodes.get(barcode).copied()
    }

    /// Returns every line that held a valid barcode, duplicates included.
    pub fn line_numbers(&self) -> &[usize] {
        &self.line_numbers
    }

    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }
}

/// Counters for one demultiplexing run.
#[derive(Clone,Debug,Default,PartialEq)]
pub struct DemuxSummary {
    /// every read in the input
    pub total_reads: u64,
    /// reads shorter than `BARCODE_LENGTH`
    pub too_short: u64,
    /// reads whose barcode is not in the set
    pub unassigned: u64,
    /// reads written per barcode line number
    pub assigned: BTreeMap<usize, u64>
}

impl DemuxSummary {
    pub fn total_assigned(&self) -> u64 {
        self.assigned.values().sum()
    }
}

/// Splits FASTQ reads into one writer per barcode.
pub struct Demultiplexer<W: Write> {
    barcodes: BarcodeSet,
    writers: HashMap<usize, fastq::Writer<W>>,
    summary: DemuxSummary
}

impl<W: Write> Demultiplexer<W> {
    /// Creates the demultiplexer.
    /// # Arguments
    /// * `barcodes` - the barcode set
    /// * `outputs` - one sink per barcode line number, lines without a sink drop their reads
    pub fn new(barcodes: BarcodeSet, outputs: HashMap<usize, W>) -> Self {
        let writers: HashMap<usize, fastq::Writer<W>> = outputs.into_iter()
            .map(|(line_number, output)| (line_number, fastq::Writer::new(output)))
            .collect();
        Demultiplexer {
            barcodes,
            writers,
            summary: DemuxSummary::default()
        }
    }

    /// Routes one read, returning the barcode line it was written for.
    /// # Arguments
    /// * `header` - the full header line without the leading '@'
    /// * `seq` - the read sequence
    /// * `qual` - the read qualities
    pub fn process_read(&mut self, header: &str, seq: &[u8], qual: &[u8]) -> Result<Option<usize>> {
        self.summary.total_reads += 1;
        let barcode: Vec<u8> = match flank_barcode(seq, BARCODE_FLANK) {
            Some(bc) => bc,
            None => {
                self.summary.too_short += 1;
                return Ok(None);
            }
        };

        match self.barcodes.get(&barcode) {
            Some(line_number) => {
                if let Some(writer) = self.writers.get_mut(&line_number) {
                    writer.write(header, None, seq, qual)?;
                    *self.summary.assigned.entry(line_number).or_insert(0) += 1;
                    return Ok(Some(line_number));
                }
                self.summary.unassigned += 1;
                Ok(None)
            },
            None => {
                self.summary.unassigned += 1;
                Ok(None)
            }
        }
    }

    /// Routes every record of a parsed FASTQ stream. Records without qualities are rejected.
    pub fn process_records<'a>(&mut self, mut fastx_reader: Box<dyn FastxReader + 'a>) -> Result<()> {
        while let Some(raw_record) = fastx_reader.next() {
            let record = raw_record.map_err(|e| Error::Parse(e.to_string()))?;
            let header: String = String::from_utf8_lossy(record.id()).into_owned();
            let qual: &[u8] = match record.qual() {
                Some(qual) => qual,
                None => return Err(Error::MissingQuality(header))
            };
            let seq = record.seq();
            if let Some(line_number) = self.process_read(&header, &seq, qual)? {
                debug!("\"{}\" -> {}", header, barcode_filename(line_number));
            }
        }
        Ok(())
    }

    /// Flushes every writer and returns the counters.
    pub fn finish(mut self) -> Result<DemuxSummary> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(self.summary)
    }
}

/// Splits a FASTQ file (optionally compressed) into `barcode{N}.fastq` files inside `output_dir`.
/// A file is created for every valid barcode line, even if no read matches it.
/// # Arguments
/// * `barcode_fn` - the barcode list
/// * `fastq_fn` - the reads to split
/// * `output_dir` - an existing directory for the split files
pub fn demultiplex_file<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(barcode_fn: P, fastq_fn: Q, output_dir: R) -> Result<DemuxSummary> {
    let barcodes: BarcodeSet = BarcodeSet::from_file(barcode_fn)?;
    let mut outputs: HashMap<usize, BufWriter<File>> = HashMap::new();
    for &line_number in barcodes.line_numbers() {
        let path = output_dir.as_ref().join(barcode_filename(line_number));
        let file: File = File::create(&path)?;
        outputs.insert(line_number, BufWriter::new(file));
    }

    let mut demultiplexer = Demultiplexer::new(barcodes, outputs);
    if let Some(fastx_reader) = open_fastx_file(fastq_fn)? {
        demultiplexer.process_records(fastx_reader)?;
    }
    demultiplexer.finish()
}

/// Creates the output directory and its parents if they are missing.
pub fn ensure_output_dir<P: AsRef<Path>>(output_dir: P) -> io::Result<()> {
    std::fs::create_dir_all(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{Builder, NamedTempFile};

    const BC1: &str = "ATCACGTTCGATGTAT";
    const BC2: &str = "TTAGGCATTGACCTCA";

    #[test]
    fn test_barcode_lines() {
        let data = format!("{}\n\n  {}  \nACGT\n{}\n", BC1, BC2, BC1);
        let barcodes = BarcodeSet::from_reader(data.as_bytes()).unwrap();
        assert_eq!(barcodes.line_numbers(), &[1, 3, 5]);
        assert_eq!(barcodes.len(), 2);
        //the later duplicate wins
        assert_eq!(barcodes.get(BC1.as_bytes()), Some(5));
        assert_eq!(barcodes.get(BC2.as_bytes()), Some(3));
        assert_eq!(barcodes.get(b"ACGT"), None);
    }

    #[test]
    fn test_process_reads() {
        let data = format!("{}\n{}\n", BC1, BC2);
        let barcodes = BarcodeSet::from_reader(data.as_bytes()).unwrap();
        let mut out_a: Vec<u8> = vec![];
        let mut out_b: Vec<u8> = vec![];
        {
            let mut outputs: HashMap<usize, &mut Vec<u8>> = HashMap::new();
            outputs.insert(1, &mut out_a);
            outputs.insert(2, &mut out_b);
            let mut demultiplexer = Demultiplexer::new(barcodes, outputs);

            //first 8 + last 8 of this read is BC1
            let read_a = "ATCACGTTGGGGGCGATGTAT";
            assert_eq!(demultiplexer.process_read("a1 extra", read_a.as_bytes(), &vec![b'I'; read_a.len()]).unwrap(), Some(1));
            //exactly the barcode
            assert_eq!(demultiplexer.process_read("b1", BC2.as_bytes(), &vec![b'#'; 16]).unwrap(), Some(2));
            //too short
            assert_eq!(demultiplexer.process_read("s1", b"ATCACGTT", b"IIIIIIII").unwrap(), None);
            //unknown
            assert_eq!(demultiplexer.process_read("u1", b"AAAAAAAACCCCCCCC", b"IIIIIIIIIIIIIIII").unwrap(), None);

            let summary = demultiplexer.finish().unwrap();
            assert_eq!(summary.total_reads, 4);
            assert_eq!(summary.too_short, 1);
            assert_eq!(summary.unassigned, 1);
            assert_eq!(summary.total_assigned(), 2);
            assert_eq!(summary.assigned.get(&1), Some(&1));
        }
        assert_eq!(String::from_utf8(out_a).unwrap(), "@a1 extra\nATCACGTTGGGGGCGATGTAT\n+\nIIIIIIIIIIIIIIIIIIIII\n");
        assert_eq!(String::from_utf8(out_b).unwrap(), format!("@b1\n{}\n+\n{}\n", BC2, "#".repeat(16)));
    }

    #[test]
    fn test_demultiplex_file() {
        let mut barcode_file: NamedTempFile = Builder::new().prefix("barcodes_").suffix(".txt").tempfile().unwrap();
        write!(barcode_file, "{}\nbad\n{}\n", BC1, BC2).unwrap();
        barcode_file.flush().unwrap();

        let mut fastq_file: NamedTempFile = Builder::new().prefix("reads_").suffix(".fq").tempfile().unwrap();
        write!(fastq_file, "@r1\n{}\n+\n{}\n@r2\nACGT\n+\nIIII\n@r3\nTTAGGCATAAAATGACCTCA\n+\n{}\n", BC1, "F".repeat(16), "F".repeat(20)).unwrap();
        fastq_file.flush().unwrap();

        let output_dir = Builder::new().prefix("demux_").tempdir().unwrap();
        let summary = demultiplex_file(barcode_file.path(), fastq_file.path(), output_dir.path()).unwrap();
        assert_eq!(summary.total_reads, 3);
        assert_eq!(summary.too_short, 1);
        assert_eq!(summary.total_assigned(), 2);

        let first = fs::read_to_string(output_dir.path().join("barcode1.fastq")).unwrap();
        assert_eq!(first, format!("@r1\n{}\n+\n{}\n", BC1, "F".repeat(16)));
        let third = fs::read_to_string(output_dir.path().join("barcode3.fastq")).unwrap();
        assert_eq!(third, format!("@r3\nTTAGGCATAAAATGACCTCA\n+\n{}\n", "F".repeat(20)));
        assert!(!output_dir.path().join("barcode2.fastq").exists());
    }

    #[test]
    fn test_demultiplex_empty_file() {
        let mut barcode_file: NamedTempFile = Builder::new().prefix("barcodes_").suffix(".txt").tempfile().unwrap();
        write!(barcode_file, "{}\n", BC1).unwrap();
        barcode_file.flush().unwrap();
        let fastq_file: NamedTempFile = Builder::new().prefix("reads_").suffix(".fq").tempfile().unwrap();

        let output_dir = Builder::new().prefix("demux_").tempdir().unwrap();
        let summary = demultiplex_file(barcode_file.path(), fastq_file.path(), output_dir.path()).unwrap();
        assert_eq!(summary, DemuxSummary::default());
        let first = fs::read_to_string(output_dir.path().join("barcode1.fastq")).unwrap();
        assert_eq!(first, "");
    }

    #[test]
    fn test_fasta_rejected() {
        let mut fasta_file: NamedTempFile = Builder::new().prefix("reads_").suffix(".fa").tempfile().unwrap();
        write!(fasta_file, ">r1\n{}\n", BC1).unwrap();
        fasta_file.flush().unwrap();

        let barcodes = BarcodeSet::from_reader(BC1.as_bytes()).unwrap();
        let mut outputs: HashMap<usize, Vec<u8>> = HashMap::new();
        outputs.insert(1, vec![]);
        let mut demultiplexer = Demultiplexer::new(barcodes, outputs);
        let fastx_reader = open_fastx_file(fasta_file.path()).unwrap().unwrap();
        match demultiplexer.process_records(fastx_reader) {
            Err(Error::MissingQuality(header)) => assert_eq!(header, "r1"),
            other => panic!("unexpected result: {:?}", other)
        };
    }
}
