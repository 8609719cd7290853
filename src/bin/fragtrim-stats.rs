
extern crate clap;
extern crate env_logger;
extern crate exitcode;
extern crate log;

use clap::{Arg, App, value_t};
use log::{info, error};
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

use fragtrim::errors::Error;
use fragtrim::sequence_stats::{SequenceCounter, SequenceStat, StatsSummary, TableFormat, count_file, write_statistics_table};

const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

fn main() {
    //initialize logging for our benefit later
    env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

    //this is the CLI block, params that get populated appear before
    let input_fn: String;
    let output_fn: String;
    let mut format_str: String = "csv".to_string();
    let mut min_percentage: f64 = 0.0;
    let summary_fn: Option<String>;
    let verbose_mode: bool;

    let matches = App::new("fragtrim-stats")
        .version(VERSION.unwrap_or("?"))
        .about("Counts identical sequences in a FASTA/FASTQ file and writes a frequency table")
        .arg(Arg::with_name("verbose_mode")
            .short("v")
            .long("verbose")
            .help("enable verbose output"))
        .arg(Arg::with_name("format")
            .short("f")
            .long("format")
            .takes_value(true)
            .possible_values(&["csv", "tsv", "txt"])
            .help("table format, txt is tab-separated like tsv (default: csv)"))
        .arg(Arg::with_name("min_percentage")
            .short("p")
            .long("min_percentage")
            .takes_value(true)
            .help("leave out sequences below this percentage (default: 0.0)"))
        .arg(Arg::with_name("summary_json")
            .short("j")
            .long("summary_json")
            .takes_value(true)
            .help("also write the run summary as JSON to this file"))
        .arg(Arg::with_name("INPUT.FX")
            .help("The FASTA/FASTQ file to count, may be gzip/bzip2/xz compressed")
            .required(true)
            .index(1))
        .arg(Arg::with_name("OUTPUT_TABLE")
            .help("The table file to write")
            .required(true)
            .index(2))
        .get_matches();

    //pull out required values
    input_fn = matches.value_of("INPUT.FX").unwrap().to_string();
    output_fn = matches.value_of("OUTPUT_TABLE").unwrap().to_string();

    //now check options
    verbose_mode = matches.is_present("verbose_mode");
    format_str = value_t!(matches.value_of("format"), String).unwrap_or(format_str);
    min_percentage = value_t!(matches.value_of("min_percentage"), f64).unwrap_or(min_percentage);
    summary_fn = matches.value_of("summary_json").map(|s| s.to_string());

    info!("Input parameters (required):");
    info!("\tInput sequences: \"{}\"", input_fn);
    match File::open(&input_fn) {
        Ok(_) => {},
        Err(e) => {
            error!("Failed to open input sequence file: {:?}", e);
            std::process::exit(exitcode::NOINPUT);
        }
    };
    info!("\tOutput table: \"{}\"", output_fn);
    let table_format: TableFormat = match format_str.parse::<TableFormat>() {
        Ok(tf) => tf,
        Err(e) => {
            error!("{}", e);
            std::process::exit(exitcode::USAGE);
        }
    };
    info!("\tformat: {:?}", table_format);
    info!("\tminimum percentage: {}", min_percentage);
    if !(0.0..=100.0).contains(&min_percentage) {
        error!("--min_percentage must be within the range [0, 100]");
        std::process::exit(exitcode::DATAERR);
    }

    let start_time = Instant::now();
    info!("Counting sequences...");
    let counter: SequenceCounter = match count_file(&input_fn) {
        Ok(counter) => counter,
        Err(Error::Parse(e)) => {
            error!("Invalid record while parsing input sequence file: {}", e);
            std::process::exit(exitcode::DATAERR);
        },
        Err(e) => {
            error!("Failed while reading sequences: {}", e);
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Counted {} sequences, {} distinct", counter.total_sequences(), counter.unique_sequences());

    let stats: Vec<SequenceStat> = counter.calculate_statistics();
    let write_file: File = match File::create(&output_fn) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to create output table file: {:?}", e);
            std::process::exit(exitcode::CANTCREAT);
        }
    };
    let rows: usize = match write_statistics_table(&stats, BufWriter::new(write_file), table_format, min_percentage) {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed while writing table: {}", e);
            std::process::exit(exitcode::IOERR);
        }
    };
    if verbose_mode {
        info!("Wrote {} of {} table rows", rows, stats.len());
    }

    let summary: StatsSummary = StatsSummary::new(&counter, &stats);
    if let Some(summary_fn) = summary_fn {
        let summary_file: File = match File::create(&summary_fn) {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to create summary file: {:?}", e);
                std::process::exit(exitcode::CANTCREAT);
            }
        };
        if let Err(e) = summary.write_json(BufWriter::new(summary_file)) {
            error!("Failed while writing summary: {}", e);
            std::process::exit(exitcode::IOERR);
        }
        info!("Summary saved to \"{}\"", summary_fn);
    }

    let elapsed: f64 = start_time.elapsed().as_secs_f64();
    info!("Summary:");
    info!("\ttotal sequences: {}", summary.total_sequences);
    info!("\tdistinct sequences: {}", summary.unique_sequences);
    info!("\tduplication rate: {:.2}%", summary.duplication_rate);
    if summary.unique_sequences > 0 {
        info!("\tmost frequent: {}", summary.top_sequence);
        info!("\t\tcount: {}", summary.top_count);
        info!("\t\tpercentage: {:.4}%", summary.top_percentage);
    }
    info!("\tprocessing time: {:.2} s", elapsed);
    info!("Table saved to \"{}\"", output_fn);
}
