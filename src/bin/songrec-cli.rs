use std::path::Path;
use std::process;

use clap::{App, Arg, SubCommand};
use songrec::{Config, Driver, OutputFormat, RecognitionOutput, SongRec};
use songrec::driver::FileOutcome;
use songrec::tags::StripOutcome;

fn main() {
    let matches = App::new("SongRec CLI")
        .version("0.4.3")
        .about("A headless Shazam client: recognize a file, or tag a whole directory")
        .arg(
            Arg::with_name("input_dir")
                .help("Directory of MP3 files to recognize and tag")
                .index(1),
        )
        .arg(
            Arg::with_name("rename")
                .long("rename")
                .help("Rename recognized files to \"Artist - Title.mp3\""),
        )
        .arg(
            Arg::with_name("overwrite")
                .long("overwrite")
                .help("Allow --rename to overwrite an existing file (requires --rename)"),
        )
        .arg(
            Arg::with_name("delay")
                .long("delay")
                .value_name("SECONDS")
                .takes_value(true)
                .default_value("0")
                .help("Base delay, in seconds, for recognition retry backoff"),
        )
        .subcommand(
            SubCommand::with_name("recognize")
                .about("Recognize a single audio file")
                .arg(
                    Arg::with_name("input")
                        .required(true)
                        .help("Input audio file path")
                        .index(1),
                )
                .arg(
                    Arg::with_name("format")
                        .short("f")
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format: simple, json, csv")
                        .takes_value(true)
                        .default_value("simple"),
                )
                .arg(Arg::with_name("quiet").short("q").long("quiet").help("Suppress verbose debug output (default)"))
                .arg(Arg::with_name("verbose").short("v").long("verbose").help("Enable verbose debug output")),
        )
        .subcommand(
            SubCommand::with_name("strip-metadata")
                .about("Remove ID3 tags from every MP3 file under a directory, recursively")
                .arg(
                    Arg::with_name("input_dir")
                        .required(true)
                        .help("Directory to strip metadata from")
                        .index(1),
                ),
        )
        .get_matches();

    if let Some(sub_matches) = matches.subcommand_matches("recognize") {
        run_recognize(sub_matches);
        return;
    }

    if let Some(sub_matches) = matches.subcommand_matches("strip-metadata") {
        run_strip_metadata(sub_matches);
        return;
    }

    run_driver(&matches);
}

fn run_recognize(sub_matches: &clap::ArgMatches) {
    let input_file = sub_matches.value_of("input").unwrap();
    let format_str = sub_matches.value_of("format").unwrap();
    let verbose = sub_matches.is_present("verbose");

    let format = match format_str {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        _ => OutputFormat::Simple,
    };

    let config = Config::default().with_quiet_mode(!verbose);
    let songrec = SongRec::new(config);

    match songrec.recognize_from_file(input_file) {
        Ok(result) => {
            let output = RecognitionOutput::format_result(&result, format);
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_strip_metadata(sub_matches: &clap::ArgMatches) {
    let input_dir = sub_matches.value_of("input_dir").unwrap();
    let input_path = Path::new(input_dir);

    if !input_path.is_dir() {
        eprintln!("'{}' is not a directory", input_dir);
        process::exit(1);
    }

    let outcomes = match songrec::tags::strip_metadata_in_directory(input_path) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    for (path, outcome) in &outcomes {
        let display_path = path.display();
        match outcome {
            StripOutcome::Removed => println!("Metadata removed from: {}", display_path),
            StripOutcome::NoTagPresent => println!("No metadata found in: {}", display_path),
            StripOutcome::SkippedSymlink => eprintln!("Skipping symlinked file: {}", display_path),
            StripOutcome::SkippedOutsideDirectory => eprintln!("Skipping file outside target directory: {}", display_path),
            StripOutcome::Failed(detail) => eprintln!("Error removing metadata from {}: {}", display_path, detail),
        }
    }
}

fn run_driver(matches: &clap::ArgMatches) {
    let rename = matches.is_present("rename");
    let overwrite = matches.is_present("overwrite");

    if overwrite && !rename {
        eprintln!("--overwrite requires --rename");
        process::exit(1);
    }

    let input_dir = match matches.value_of("input_dir") {
        Some(dir) => dir,
        None => {
            eprintln!("Usage: songrec-cli <input_dir> [--rename] [--overwrite] [--delay <seconds>]");
            process::exit(1);
        }
    };

    let input_path = Path::new(input_dir);
    if !input_path.is_dir() {
        eprintln!("'{}' is not a directory", input_dir);
        process::exit(1);
    }

    let delay_secs: f32 = match matches.value_of("delay").unwrap_or("0").parse() {
        Ok(value) => value,
        Err(_) => {
            eprintln!("--delay must be a number of seconds");
            process::exit(1);
        }
    };

    let config = Config::default()
        .with_rename(rename)
        .with_overwrite(overwrite)
        .with_retry_base_delay_secs(delay_secs);

    let driver = Driver::new(config);

    let outcomes = match driver.run(input_path) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if outcomes.is_empty() {
        eprintln!("No MP3 files found in '{}'", input_dir);
        process::exit(1);
    }

    for (path, outcome) in &outcomes {
        let display_path = path.display();
        match outcome {
            FileOutcome::Recognized { title, artist, renamed_to } => match renamed_to {
                Some(new_path) => println!("{}: recognized as \"{}\" by {}, renamed to {}", display_path, title, artist, new_path.display()),
                None => println!("{}: recognized as \"{}\" by {}", display_path, title, artist),
            },
            FileOutcome::NoMatchFound => println!("{}: no match found", display_path),
            FileOutcome::AlreadyTagged => println!("{}: already tagged, skipped", display_path),
            FileOutcome::SkippedSymlink => eprintln!("{}: skipped (symlink)", display_path),
            FileOutcome::SkippedOutsideDirectory => eprintln!("{}: skipped (resolves outside input directory)", display_path),
            FileOutcome::DecodeFailed(detail) => eprintln!("{}: could not decode ({})", display_path, detail),
            FileOutcome::InsufficientAudio => println!("{}: too short to fingerprint", display_path),
            FileOutcome::NetworkFailed(detail) => eprintln!("{}: recognition failed ({})", display_path, detail),
            FileOutcome::TagWriteFailed(detail) => eprintln!("{}: recognized, but failed to write tags ({})", display_path, detail),
        }
    }
}
