
extern crate clap;
extern crate env_logger;
extern crate exitcode;
extern crate log;

use clap::{Arg, App, value_t};
use log::{info, error};
use std::fs::File;

use fragtrim::demux::{DemuxSummary, barcode_filename, demultiplex_file, ensure_output_dir};
use fragtrim::errors::Error;

const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

fn main() {
    //initialize logging for our benefit later
    env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

    //this is the CLI block, params that get populated appear before
    let barcode_fn: String;
    let fastq_fn: String;
    let mut output_dir: String = ".".to_string();

    let matches = App::new("fragtrim-demux")
        .version(VERSION.unwrap_or("?"))
        .about("Splits FASTQ reads by the barcode formed from their first 8 and last 8 bases")
        .arg(Arg::with_name("output_dir")
            .short("o")
            .long("output_dir")
            .takes_value(true)
            .help("directory for the barcode<N>.fastq files (default: .)"))
        .arg(Arg::with_name("BARCODES.TXT")
            .help("One 16 bp barcode per line, the line number names the output file")
            .required(true)
            .index(1))
        .arg(Arg::with_name("INPUT.FQ")
            .help("The FASTQ file to split, may be gzip/bzip2/xz compressed")
            .required(true)
            .index(2))
        .get_matches();

    //pull out required values
    barcode_fn = matches.value_of("BARCODES.TXT").unwrap().to_string();
    fastq_fn = matches.value_of("INPUT.FQ").unwrap().to_string();
    output_dir = value_t!(matches.value_of("output_dir"), String).unwrap_or(output_dir);

    info!("Input parameters (required):");
    info!("\tBarcodes: \"{}\"", barcode_fn);
    match File::open(&barcode_fn) {
        Ok(_) => {},
        Err(e) => {
            error!("Failed to open barcode file: {:?}", e);
            std::process::exit(exitcode::NOINPUT);
        }
    };
    info!("\tInput reads: \"{}\"", fastq_fn);
    match File::open(&fastq_fn) {
        Ok(_) => {},
        Err(e) => {
            error!("Failed to open input reads file: {:?}", e);
            std::process::exit(exitcode::NOINPUT);
        }
    };
    info!("\tOutput directory: \"{}\"", output_dir);
    if let Err(e) = ensure_output_dir(&output_dir) {
        error!("Failed to create output directory: {:?}", e);
        std::process::exit(exitcode::CANTCREAT);
    }

    info!("Starting demultiplexing...");
    let summary: DemuxSummary = match demultiplex_file(&barcode_fn, &fastq_fn, &output_dir) {
        Ok(summary) => summary,
        Err(Error::MissingQuality(header)) => {
            error!("Record \"{}\" has no quality scores, demultiplexing requires FASTQ input", header);
            std::process::exit(exitcode::DATAERR);
        },
        Err(Error::Parse(e)) => {
            error!("Invalid record while parsing input reads file: {}", e);
            std::process::exit(exitcode::DATAERR);
        },
        Err(e) => {
            error!("Failed while demultiplexing: {:?}", e);
            std::process::exit(exitcode::IOERR);
        }
    };

    info!("Finished processing {} total reads", summary.total_reads);
    info!("\treads shorter than the barcode: {}", summary.too_short);
    info!("\treads without a known barcode: {}", summary.unassigned);
    for (line_number, count) in summary.assigned.iter() {
        info!("\t{}: {}", barcode_filename(*line_number), count);
    }
    info!("\ttotal assigned: {}", summary.total_assigned());
}
