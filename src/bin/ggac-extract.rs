use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use ggac::config::config_or_default;
use ggac::extract::extract_file;
use ggac::utils::init_logging;

/// Command line interface for `ggac-extract` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "ggac-extract",
    about = "Integrate a gated peak in every angle bin",
)]
pub struct Cli {
    /// Centroid of the gating transition, in keV
    pub gate: i64,

    /// Centroid of the peak to integrate, in keV
    pub peak: i64,

    /// HDF5 file with accumulated distributions
    #[clap(short, long)]
    pub input: PathBuf,

    /// CSV output file
    #[clap(short, long, default_value = "peak_areas.csv")]
    pub output: PathBuf,

    /// TOML configuration file. Standard analysis settings if absent
    #[clap(short, long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Cli::parse();
    let config = config_or_default(args.config.as_deref())?;

    let out = BufWriter::new(File::create(&args.output)
        .map_err(|e| format!("Cannot write {}: {e}", args.output.display()))?);

    info!("Gate {} keV, peak {} keV: writing {}", args.gate, args.peak, args.output.display());
    extract_file(&args.input, args.gate, args.peak, &config.extract, out)
        .map_err(|e| format!("{}: {e}", args.input.display()))?;
    Ok(())
}
