use std::env;
use std::fs;
use std::process;
use std::time::Instant;

use log::warn;
use simatch_cli::{
    compare_records, CompareConfig, MatchPolicy, SearchStrategy, DEFAULT_CHECKS,
    DEFAULT_DISTANCE_GATE,
};
use simatch_core::{init_thread_pool, FeatureSetRecord};

fn print_usage() {
    eprintln!("Usage: simatch [OPTIONS] <first.json> <second.json>");
    eprintln!();
    eprintln!("Compare two feature record files and print the outcome as JSON.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <FILE>   load comparison settings from a JSON or TOML file");
    eprintln!("  --profile <NAME>  conservative (default) or standard");
    eprintln!("  --indexed         search through the budgeted vantage-point index");
    eprintln!("  --cross-check     mutual-nearest filtering with the default distance gate");
    eprintln!("  --pretty          pretty-print the JSON outcome");
    eprintln!("  -h, --help        print this help");
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut files: Vec<String> = Vec::new();
    let mut config = CompareConfig::conservative_preset();
    let mut pretty = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a file path")?;
                config = if path.ends_with(".toml") {
                    CompareConfig::load_toml(&path)?
                } else {
                    CompareConfig::load_json(&path)?
                };
            }
            "--profile" => {
                let name = args.next().ok_or("--profile needs a value")?;
                config = match name.as_str() {
                    "conservative" => CompareConfig::conservative_preset(),
                    "standard" => CompareConfig::standard_preset(),
                    other => return Err(format!("unknown profile: {}", other).into()),
                };
            }
            "--indexed" => {
                config.strategy = SearchStrategy::Indexed { checks: DEFAULT_CHECKS };
            }
            "--cross-check" => {
                config.policy =
                    MatchPolicy::CrossCheck { max_distance: Some(DEFAULT_DISTANCE_GATE) };
            }
            "--pretty" => pretty = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other).into());
            }
            other => files.push(other.to_string()),
        }
    }

    if files.len() != 2 {
        print_usage();
        return Err("expected exactly two feature record files".into());
    }

    // Worker pool for the matching stage
    if let Err(e) = init_thread_pool(config.threads) {
        warn!("thread pool already initialized: {}", e);
    }

    // Load both feature records
    let first: FeatureSetRecord = serde_json::from_str(&fs::read_to_string(&files[0])?)?;
    let second: FeatureSetRecord = serde_json::from_str(&fs::read_to_string(&files[1])?)?;

    // Time the comparison
    let t0 = Instant::now();
    let outcome = compare_records(&first, &second, &config)?;
    let elapsed = t0.elapsed();

    let rendered = if pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{}", rendered);
    eprintln!(
        "Compared {} vs {} features in {:.2?}",
        outcome.first_features, outcome.second_features, elapsed
    );
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
