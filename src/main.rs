use std::io::{BufReader, BufWriter};
use std::rc::Rc;

use clap::Parser;
use rand::Rng;

use pimo::binder::Binder;
use pimo::cache::{CacheRegistry, dump_cache, load_cache};
use pimo::jsonline::{JsonLineSink, JsonLineSource};
use pimo::pipeline::stages::RepeaterProcessor;
use pimo::pipeline::{Pipeline, SourceFromSlice};
use pimo::value::Record;
use pimo::{config, logging};

/// pimo - A streaming engine for masking private data in JSON lines
#[derive(Parser)]
#[command(name = "pimo")]
#[command(version = "0.1.0")]
#[command(about = "Masks private data contained in JSON lines using a masking configuration")]
struct Cli {
    /// Number of masked outputs to generate for each input
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,

    /// Generate data from a single empty record instead of reading stdin
    #[arg(long)]
    empty_input: bool,

    /// Name and location of the masking configuration file
    #[arg(short, long, default_value = "masking.yml")]
    config: String,

    /// Dump a cache into a file after the run (NAME=PATH, repeatable)
    #[arg(long, value_name = "NAME=PATH", value_parser = parse_name_path)]
    dump_cache: Vec<(String, String)>,

    /// Load a cache from a file before the run (NAME=PATH, repeatable)
    #[arg(long, value_name = "NAME=PATH", value_parser = parse_name_path)]
    load_cache: Vec<(String, String)>,

    /// Base seed for the random masks; drawn from OS entropy when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn parse_name_path(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), path.to_string()))
        }
        _ => Err(format!("'{arg}' is not of the form NAME=PATH")),
    }
}

// Exit codes: 1 configuration/build failure, 2 unknown cache name,
// 3 cache I/O failure, 4 pipeline run failure.
fn main() {
    let cli = Cli::parse();

    logging::init_logging(&cli.log_level);

    let definition = match config::load_definition(&cli.config) {
        Ok(definition) => definition,
        Err(e) => {
            tracing::error!("Failed to load config from '{}': {:#}", cli.config, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config::validate_definition(&definition) {
        tracing::error!("Configuration error: {:#}", e);
        std::process::exit(1);
    }

    let seed = cli
        .seed
        .or(definition.seed)
        .unwrap_or_else(|| rand::rng().random());

    let source: Box<dyn pimo::Source> = if cli.empty_input {
        Box::new(SourceFromSlice::new(vec![Record::new()]))
    } else {
        Box::new(JsonLineSource::new(BufReader::new(std::io::stdin())))
    };

    let pipeline = Pipeline::new(source).process(Box::new(RepeaterProcessor::new(
        cli.repeat as usize,
    )));

    let (pipeline, caches) = match Binder::new(seed).bind(pipeline, &definition) {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!("Failed to build the masking pipeline: {:#}", e);
            std::process::exit(1);
        }
    };

    for (name, path) in &cli.load_cache {
        let Some(cache) = caches.get(name) else {
            tracing::error!("Cache '{}' not found", name);
            std::process::exit(2);
        };
        if let Err(e) = load_cache(name, Rc::clone(cache), path) {
            tracing::error!("{:#}", e);
            std::process::exit(3);
        }
    }

    let sink = JsonLineSink::new(BufWriter::new(std::io::stdout()));
    if let Err(e) = pipeline.sink(Box::new(sink)).run() {
        tracing::error!("Masking failed: {:#}", e);
        std::process::exit(4);
    }

    if let Err(code) = dump_caches(&caches, &cli.dump_cache) {
        std::process::exit(code);
    }
}

fn dump_caches(caches: &CacheRegistry, requests: &[(String, String)]) -> Result<(), i32> {
    for (name, path) in requests {
        let Some(cache) = caches.get(name) else {
            tracing::error!("Cache '{}' not found", name);
            return Err(2);
        };
        if let Err(e) = dump_cache(name, cache, path) {
            tracing::error!("{:#}", e);
            return Err(3);
        }
    }
    Ok(())
}
