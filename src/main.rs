use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};

use md5lab::{
    collision_experiment, duplicate_experiment, md5_reader, speed_experiment, write_csv,
    ExperimentConfig, COLLISIONS_HEADER, DUPLICATES_HEADER, SPEED_HEADER,
};

#[derive(Parser, Debug)]
#[command(name = "md5lab", version, about = "MD5 digests and hashing experiments")]
struct Cli {
    /// Files to digest. `-` or no files reads standard input.
    files: Vec<PathBuf>,

    /// Run the collision, duplicate and speed experiments, writing CSV
    /// results into DIR.
    #[arg(
        long,
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = ".",
        conflicts_with = "files"
    )]
    lab: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_module("md5lab", log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if let Err(e) = run(cli) {
        eprintln!("md5lab: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(out_dir) = &cli.lab {
        return run_lab(out_dir);
    }

    if cli.files.is_empty() {
        print_digest(Path::new("-"))?;
    }
    for path in &cli.files {
        print_digest(path)?;
    }
    Ok(())
}

fn print_digest(path: &Path) -> Result<()> {
    let digest = if path == Path::new("-") {
        md5_reader(io::stdin().lock()).context("failed to read standard input")?
    } else {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        md5_reader(file).with_context(|| format!("failed to read {}", path.display()))?
    };
    println!("{digest}  {}", path.display());
    Ok(())
}

fn run_lab(out_dir: &Path) -> Result<()> {
    let config = ExperimentConfig::default();
    let mut rng = StdRng::from_entropy();

    log::info!("running collision experiment");
    let rows = collision_experiment(&config, &mut rng);
    write_rows(out_dir, "collisions_test.csv", COLLISIONS_HEADER, &rows)?;

    log::info!("running duplicate experiment");
    let rows = duplicate_experiment(&config, &mut rng);
    write_rows(out_dir, "duplicates_test.csv", DUPLICATES_HEADER, &rows)?;

    log::info!("running speed experiment");
    let rows = speed_experiment(&config, &mut rng);
    write_rows(out_dir, "speed_test.csv", SPEED_HEADER, &rows)?;

    Ok(())
}

fn write_rows<T: std::fmt::Display>(
    out_dir: &Path,
    file_name: &str,
    header: &str,
    rows: &[T],
) -> Result<()> {
    let path = out_dir.join(file_name);
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(BufWriter::new(file), header, rows)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Test complete: {}", path.display());
    Ok(())
}
