// Passport field extraction CLI: prints one JSON record per image

use clap::Parser;
use passport_extract::{
    utils::PassportError, ExtractorConfig, PassportExtractor, Sources,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "passport-extract", version, about = "Extract passport fields from MRZ and visual OCR")]
struct Cli {
    /// Passport image (JPEG, PNG, ...)
    image: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tesseract data directory
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata: Option<PathBuf>,

    /// Language set for every OCR pass, e.g. "kor+eng"
    #[arg(long)]
    lang: Option<String>,

    /// Print the record on a single line
    #[arg(long)]
    compact: bool,

    /// Skip the visual OCR branch
    #[arg(long, conflicts_with = "visual_only")]
    mrz_only: bool,

    /// Skip the MRZ branch
    #[arg(long)]
    visual_only: bool,

    /// Print the raw OCR corpus to stderr
    #[arg(long)]
    dump_corpus: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_config(cli: &Cli) -> Result<ExtractorConfig, PassportError> {
    let mut config = match &cli.config {
        Some(path) => ExtractorConfig::load(path)?,
        None => ExtractorConfig::default(),
    };
    if let Some(dir) = &cli.tessdata {
        config = config.with_tessdata_dir(dir.clone());
    }
    if let Some(lang) = &cli.lang {
        config = config.with_languages(lang);
    }
    config.validate()?;
    Ok(config)
}

fn print_error(err: &PassportError) {
    println!("{}", serde_json::json!({ "error": err.to_string() }));
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            print_error(&err);
            return ExitCode::from(1);
        }
    };

    let sources = if cli.mrz_only {
        Sources::MrzOnly
    } else if cli.visual_only {
        Sources::VisualOnly
    } else {
        Sources::Both
    };

    let extractor = PassportExtractor::with_tesseract(config);
    let extraction = extractor.run(&cli.image, sources);

    if cli.dump_corpus {
        match &extraction.corpus {
            Some(corpus) => eprintln!("{}", corpus.text()),
            None => eprintln!("(no OCR corpus)"),
        }
    }

    match extraction.record.to_json(!cli.compact) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_error(&PassportError::from(err));
            ExitCode::from(1)
        }
    }
}
