//! Batch training data generation utility
//!
//! Renders procedurally generated trees and writes labeled image patches.
//!
//! Usage:
//!     generate_dataset [OPTIONS] [OUTPUT_DIR]
//!
//! Options:
//!     -c, --config <FILE>     JSON config file (default: built-in defaults)
//!     -m, --mode <MODE>       grid, samples, or recover (default: grid)
//!     -i, --input <FILE>      Node record file for recover mode
//!     -n, --count <N>         Number of trees (overrides config)
//!     --seed <SEED>           RNG seed (overrides config)
//!     --clean                 Remove OUTPUT_DIR before writing
//!     --write-config <FILE>   Write the effective config and exit
//!     -h, --help              Show this help message

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use sylva::config::DatasetConfig;
use sylva::core::logging;
use sylva::dataset::DatasetPipeline;

fn print_help() {
    eprintln!("generate_dataset - Batch training data generation utility");
    eprintln!();
    eprintln!("Usage: generate_dataset [OPTIONS] [OUTPUT_DIR]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <FILE>     JSON config file (default: built-in defaults)");
    eprintln!("    -m, --mode <MODE>       grid, samples, or recover (default: grid)");
    eprintln!("    -i, --input <FILE>      Node record file for recover mode");
    eprintln!("    -n, --count <N>         Number of trees (overrides config)");
    eprintln!("    --seed <SEED>           RNG seed (overrides config)");
    eprintln!("    --clean                 Remove OUTPUT_DIR before writing");
    eprintln!("    --write-config <FILE>   Write the effective config and exit");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    generate_dataset -n 50 ./dataset");
    eprintln!("    generate_dataset -m recover -i predicted.txt ./recovered");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Grid,
    Samples,
    Recover,
}

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    mode: Mode,
    input: Option<PathBuf>,
    count: Option<u32>,
    seed: Option<u64>,
    clean: bool,
    write_config: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

fn next_value<'a>(args: &'a [String], i: &mut usize, name: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", name))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut parsed = Args {
        config: None,
        mode: Mode::Grid,
        input: None,
        count: None,
        seed: None,
        clean: false,
        write_config: None,
        output_dir: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                parsed.config = Some(PathBuf::from(next_value(&args, &mut i, "--config")?));
            }
            "-m" | "--mode" => {
                parsed.mode = match next_value(&args, &mut i, "--mode")?.to_lowercase().as_str() {
                    "grid" => Mode::Grid,
                    "samples" => Mode::Samples,
                    "recover" => Mode::Recover,
                    other => return Err(format!("Unknown mode: {}. Valid modes: grid, samples, recover", other)),
                };
            }
            "-i" | "--input" => {
                parsed.input = Some(PathBuf::from(next_value(&args, &mut i, "--input")?));
            }
            "-n" | "--count" => {
                let value = next_value(&args, &mut i, "--count")?;
                parsed.count = Some(value.parse().map_err(|_| format!("Invalid count: {}", value))?);
            }
            "--seed" => {
                let value = next_value(&args, &mut i, "--seed")?;
                parsed.seed = Some(value.parse().map_err(|_| format!("Invalid seed: {}", value))?);
            }
            "--clean" => parsed.clean = true,
            "--write-config" => {
                parsed.write_config = Some(PathBuf::from(next_value(&args, &mut i, "--write-config")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            path => {
                if parsed.output_dir.is_some() {
                    return Err("Multiple output directories specified".to_string());
                }
                parsed.output_dir = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    if parsed.mode == Mode::Recover && parsed.input.is_none() {
        return Err("recover mode needs --input".to_string());
    }

    Ok(parsed)
}

fn build_config(args: &Args) -> sylva::core::Result<DatasetConfig> {
    let mut config = match &args.config {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::default(),
    };
    if let Some(count) = args.count {
        config.tree_count = count;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config.clean_output |= args.clean;
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> sylva::core::Result<()> {
    let config = build_config(&args)?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    println!("Dataset Generation Utility");
    println!("==========================");
    println!("Mode: {:?}", args.mode);
    println!("Output directory: {}", config.output_dir.display());
    println!("Trees: {}", config.tree_count);
    println!("Seed: {}", config.seed);
    println!();

    let output_dir = config.output_dir.clone();
    let start = Instant::now();
    let mut pipeline = DatasetPipeline::from_config(config)?;

    let report = match (args.mode, &args.input) {
        (Mode::Grid, _) => pipeline.generate_grid_dataset()?,
        (Mode::Samples, _) => pipeline.generate_node_samples()?,
        (Mode::Recover, Some(input)) => {
            let reader = BufReader::new(File::open(input)?);
            pipeline.render_recovered(reader, &output_dir)?
        }
        (Mode::Recover, None) => unreachable!("checked in parse_args"),
    };

    println!();
    println!("Summary:");
    println!("  Images written: {}", report.written);
    println!("  Failed: {}", report.failed);
    println!("  Total time: {:.2}s", start.elapsed().as_secs_f64());
    println!("  Output: {}", output_dir.display());
    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
