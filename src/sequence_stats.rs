extern crate log;

use log::debug;
use needletail::parser::FastxReader;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::fastx_util::open_fastx_file;
use crate::string_util::{normalize_sequence, truncate_display};

/// number of characters of the top sequence shown in a summary
pub const TOP_SEQUENCE_DISPLAY: usize = 50;

/// Counts identical sequences while remembering the order they were first seen in.
/// # Examples
/// ```rust
/// use fragtrim::sequence_stats::SequenceCounter;
/// let mut counter = SequenceCounter::new();
/// counter.add_sequence(b"acgt");
/// counter.add_sequence(b"GGCC");
/// counter.add_sequence(b"ACGT");
/// let stats = counter.calculate_statistics();
/// assert_eq!(stats[0].sequence, "ACGT");
/// assert_eq!(stats[0].count, 2);
/// ```
#[derive(Clone,Debug,Default)]
pub struct SequenceCounter {
    /// normalized sequence to its position in `entries`
    index: HashMap<Vec<u8>, usize>,
    /// (sequence, count) in first-seen order
    entries: Vec<(Vec<u8>, u64)>,
    /// number of counted sequences
    total_sequences: u64
}

/// one row of the statistics table
#[derive(Clone,Debug,PartialEq)]
pub struct SequenceStat {
    pub sequence: String,
    pub count: u64,
    pub percentage: f64
}

impl SequenceCounter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds one sequence after normalizing it (letters only, uppercase).
    /// Returns false if nothing was left to count.
    /// # Arguments
    /// * `raw_seq` - the sequence as it appears in the file
    pub fn add_sequence(&mut self, raw_seq: &[u8]) -> bool {
        let seq: Vec<u8> = normalize_sequence(raw_seq);
        if seq.is_empty() {
            return false;
        }
        self.total_sequences += 1;
        match self.index.get(&seq) {
            Some(&pos) => {
                self.entries[pos].1 += 1;
            },
            None => {
                self.index.insert(seq.clone(), self.entries.len());
                self.entries.push((seq, 1));
            }
        };
        true
    }

    /// Adds every record of a parsed FASTX stream.
    /// # Arguments
    /// * `fastx_reader` - the parsed input stream
    pub fn add_records<'a>(&mut self, mut fastx_reader: Box<dyn FastxReader + 'a>) -> Result<()> {
        let mut skipped: u64 = 0;
        while let Some(raw_record) = fastx_reader.next() {
            let record = raw_record.map_err(|e| Error::Parse(e.to_string()))?;
            if !self.add_sequence(&record.seq()) {
                skipped += 1;
            }
        }
        debug!("Skipped {} records without sequence letters", skipped);
        Ok(())
    }

    pub fn total_sequences(&self) -> u64 {
        self.total_sequences
    }

    pub fn unique_sequences(&self) -> usize {
        self.entries.len()
    }

    /// Returns one row per distinct sequence, sorted by count descending.
    /// Sequences with the same count stay in first-seen order.
    pub fn calculate_statistics(&self) -> Vec<SequenceStat> {
        let total: f64 = self.total_sequences as f64;
        let mut stats: Vec<SequenceStat> = self.entries.iter()
            .map(|(seq, count)| SequenceStat {
                sequence: String::from_utf8_lossy(seq).into_owned(),
                count: *count,
                percentage: if self.total_sequences > 0 { *count as f64 / total * 100.0 } else { 0.0 }
            })
            .collect();
        //sort_by is stable, which keeps ties in first-seen order
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats
    }
}

/// Counts the sequences of a FASTA/FASTQ file, compressed or not. An empty file gives an empty counter.
pub fn count_file<P: AsRef<Path>>(filename: P) -> Result<SequenceCounter> {
    let mut counter = SequenceCounter::new();
    if let Some(fastx_reader) = open_fastx_file(filename)? {
        counter.add_records(fastx_reader)?;
    }
    Ok(counter)
}

/// the delimited text layouts the table can be written in
#[derive(Clone,Copy,Debug,PartialEq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Txt
}

impl TableFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            TableFormat::Csv => b',',
            TableFormat::Tsv | TableFormat::Txt => b'\t'
        }
    }
}

impl FromStr for TableFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" => Ok(TableFormat::Tsv),
            "txt" => Ok(TableFormat::Txt),
            _ => Err(Error::UnknownTableFormat(s.to_string()))
        }
    }
}

/// Writes the statistics table with a header row and returns the number of data rows written.
/// # Arguments
/// * `stats` - the rows from `SequenceCounter::calculate_statistics`
/// * `writer` - the output sink
/// * `format` - the table layout
/// * `min_percentage` - rows below this percentage are left out, 0.0 keeps everything
/// # Examples
/// ```rust
/// use fragtrim::sequence_stats::{SequenceStat, TableFormat, write_statistics_table};
/// let stats = vec![SequenceStat { sequence: "ACGT".to_string(), count: 3, percentage: 75.0 }];
/// let mut buffer: Vec<u8> = vec![];
/// write_statistics_table(&stats, &mut buffer, TableFormat::Csv, 0.0).unwrap();
/// assert_eq!(String::from_utf8(buffer).unwrap(), "Sequence,Count,Percentage(%)\nACGT,3,75.0000\n");
/// ```
pub fn write_statistics_table<W: Write>(stats: &[SequenceStat], writer: W, format: TableFormat, min_percentage: f64) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv_writer.write_record(&["Sequence", "Count", "Percentage(%)"])?;

    let mut rows: usize = 0;
    for stat in stats.iter() {
        if min_percentage > 0.0 && stat.percentage < min_percentage {
            continue;
        }
        csv_writer.write_record(&[
            stat.sequence.clone(),
            stat.count.to_string(),
            format!("{:.4}", stat.percentage)
        ])?;
        rows += 1;
    }
    csv_writer.flush()?;
    Ok(rows)
}

/// Summary of a statistics run.
#[derive(Clone,Debug,PartialEq)]
pub struct StatsSummary {
    pub total_sequences: u64,
    pub unique_sequences: usize,
    /// percentage of sequences that repeat an earlier one
    pub duplication_rate: f64,
    /// most frequent sequence, shortened for display
    pub top_sequence: String,
    pub top_count: u64,
    pub top_percentage: f64
}

impl StatsSummary {
    /// Builds the summary from a counter and its sorted statistics.
    pub fn new(counter: &SequenceCounter, stats: &[SequenceStat]) -> Self {
        let total_sequences: u64 = counter.total_sequences();
        let unique_sequences: usize = counter.unique_sequences();
        let duplication_rate: f64 = if total_sequences > 0 {
            (1.0 - unique_sequences as f64 / total_sequences as f64) * 100.0
        } else {
            0.0
        };
        let (top_sequence, top_count, top_percentage) = match stats.first() {
            Some(top) => (truncate_display(&top.sequence, TOP_SEQUENCE_DISPLAY), top.count, top.percentage),
            None => (String::new(), 0, 0.0)
        };
        StatsSummary {
            total_sequences,
            unique_sequences,
            duplication_rate,
            top_sequence,
            top_count,
            top_percentage
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "total_sequences": self.total_sequences,
            "unique_sequences": self.unique_sequences,
            "duplication_rate": self.duplication_rate,
            "top_sequence": self.top_sequence,
            "top_count": self.top_count,
            "top_percentage": self.top_percentage
        })
    }

    /// Writes the summary as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.to_json())?;
        Ok(())
    }
}
