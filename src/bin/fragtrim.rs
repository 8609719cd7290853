
extern crate clap;
extern crate env_logger;
extern crate exitcode;
extern crate log;

use clap::{Arg, App, value_t};
use log::{info, error};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::Instant;

use fragtrim::errors::Error;
use fragtrim::extract::LengthBounds;
use fragtrim::params::{DEFAULT_END_MARKER, DEFAULT_LINE_WIDTH, DEFAULT_START_MARKER, ExtractionParameters, MarkerPair};
use fragtrim::pipeline::{ExtractionSummary, extract_from_file};

const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

fn main() {
    //initialize logging for our benefit later
    env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

    //this is the CLI block, params that get populated appear before
    let input_fn: String;
    let output_fn: String;
    let mut start_marker: String = DEFAULT_START_MARKER.to_string();
    let mut end_marker: String = DEFAULT_END_MARKER.to_string();
    let mut min_length: usize = 0;
    let mut max_length: usize = 0;
    let mut line_width: usize = DEFAULT_LINE_WIDTH;
    let mut threads: usize = 1;
    let allow_overlap: bool;
    let verbose_mode: bool;

    let matches = App::new("fragtrim")
        .version(VERSION.unwrap_or("?"))
        .about("Extracts marker-delimited fragments from FASTA/FASTQ records")
        .arg(Arg::with_name("verbose_mode")
            .short("v")
            .long("verbose")
            .help("enable verbose output"))
        .arg(Arg::with_name("start_marker")
            .short("s")
            .long("start_marker")
            .takes_value(true)
            .help("sequence that opens a fragment (default: TGTACCTGCAGATGA)"))
        .arg(Arg::with_name("end_marker")
            .short("e")
            .long("end_marker")
            .takes_value(true)
            .help("sequence that closes a fragment (default: GTGACCGTGTCTTCT)"))
        .arg(Arg::with_name("min_length")
            .short("m")
            .long("min_length")
            .takes_value(true)
            .help("minimum fragment length, 0 for no limit (default: 0)"))
        .arg(Arg::with_name("max_length")
            .short("M")
            .long("max_length")
            .takes_value(true)
            .help("maximum fragment length, 0 for no limit (default: 0)"))
        .arg(Arg::with_name("allow_overlap")
            .short("o")
            .long("allow_overlap")
            .help("allow the end marker to overlap the start marker"))
        .arg(Arg::with_name("line_width")
            .short("w")
            .long("line_width")
            .takes_value(true)
            .help("sequence line width of the output, 0 for single-line records (default: 80)"))
        .arg(Arg::with_name("threads")
            .short("t")
            .long("threads")
            .takes_value(true)
            .help("number of extraction threads (default: 1)"))
        .arg(Arg::with_name("INPUT.FX")
            .help("The FASTA/FASTQ file to search, may be gzip/bzip2/xz compressed")
            .required(true)
            .index(1))
        .arg(Arg::with_name("OUTPUT.FA")
            .help("The FASTA file to write fragments to")
            .required(true)
            .index(2))
        .get_matches();

    //pull out required values
    input_fn = matches.value_of("INPUT.FX").unwrap().to_string();
    output_fn = matches.value_of("OUTPUT.FA").unwrap().to_string();

    //now check options
    verbose_mode = matches.is_present("verbose_mode");
    allow_overlap = matches.is_present("allow_overlap");
    start_marker = value_t!(matches.value_of("start_marker"), String).unwrap_or(start_marker);
    end_marker = value_t!(matches.value_of("end_marker"), String).unwrap_or(end_marker);
    min_length = value_t!(matches.value_of("min_length"), usize).unwrap_or(min_length);
    max_length = value_t!(matches.value_of("max_length"), usize).unwrap_or(max_length);
    line_width = value_t!(matches.value_of("line_width"), usize).unwrap_or(line_width);
    threads = value_t!(matches.value_of("threads"), usize).unwrap_or(threads);

    info!("Input parameters (required):");
    info!("\tInput reads: \"{}\"", input_fn);
    match File::open(&input_fn) {
        Ok(_) => {},
        Err(e) => {
            error!("Failed to open input reads file: {:?}", e);
            std::process::exit(exitcode::NOINPUT);
        }
    };

    info!("\tOutput fragments: \"{}\"", output_fn);

    info!("Execution Parameters:");
    info!("\tverbose: {}", verbose_mode);
    info!("\tthreads: {}", threads);
    info!("\tline width: {}", line_width);
    info!("Extraction Parameters:");
    info!("\tstart marker: {}", start_marker);
    info!("\tend marker: {}", end_marker);
    let markers: MarkerPair = match MarkerPair::new(&start_marker, &end_marker) {
        Ok(markers) => markers,
        Err(e) => {
            error!("Invalid markers: {}", e);
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!("\tminimum length: {}", if min_length == 0 { "unbounded".to_string() } else { min_length.to_string() });
    info!("\tmaximum length: {}", if max_length == 0 { "unbounded".to_string() } else { max_length.to_string() });
    info!("\tallow overlap: {}", allow_overlap);

    let my_params: ExtractionParameters = ExtractionParameters {
        markers,
        bounds: LengthBounds::new(min_length, max_length),
        allow_overlap,
        line_width,
        verbose: verbose_mode
    };
    if let Err(e) = my_params.validate() {
        error!("Invalid length bounds: {}", e);
        std::process::exit(exitcode::DATAERR);
    }
    let arc_params: Arc<ExtractionParameters> = Arc::new(my_params);

    //the output is created only after the configuration checks pass
    let write_file: File = match File::create(&output_fn) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to create output fragments file: {:?}", e);
            std::process::exit(exitcode::CANTCREAT);
        }
    };

    info!("Starting fragment extraction...");
    let start_time = Instant::now();
    let summary: ExtractionSummary = match extract_from_file(&input_fn, arc_params, BufWriter::new(write_file), threads) {
        Ok(summary) => summary,
        Err(Error::Parse(e)) => {
            error!("Invalid record while parsing input reads file: {}", e);
            std::process::exit(exitcode::DATAERR);
        },
        Err(e) => {
            error!("Failed while extracting fragments: {:?}", e);
            std::process::exit(exitcode::IOERR);
        }
    };
    let elapsed: f64 = start_time.elapsed().as_secs_f64();

    info!("Finished processing {} total records", summary.total_records);
    info!("\tfragments extracted: {}", summary.extracted);
    info!("\tfragments outside length bounds: {}", summary.filtered);
    info!("\trecords without a marker pair: {}", summary.no_match);
    info!("\tsuccess rate: {:.2}%", summary.success_rate());
    info!("\tprocessing time: {:.2} s", elapsed);
    if elapsed > 0.0 {
        info!("\tthroughput: {:.2} records/s", summary.total_records as f64 / elapsed);
    }
    info!("Fragments saved to \"{}\"", output_fn);
}
