use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use ggac::distributions::DistributionSet;
use ggac::io::hdf5::container::{read_distributions, write_distributions};
use ggac::utils::{init_logging, timing::Progress};

/// Command line interface for `ggac-merge` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "ggac-merge",
    about = "Sum distribution files produced by independent accumulator runs",
)]
pub struct Cli {
    /// HDF5 distribution files to be summed
    #[clap(required = true)]
    pub infiles: Vec<PathBuf>,

    /// HDF5 output file for the sum
    #[clap(short, long)]
    pub out: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Cli::parse();
    let mut progress = Progress::new();

    let mut total: Option<DistributionSet> = None;
    for infile in &args.infiles {
        progress.start(&format!("Reading {}", infile.display()));
        let set = read_distributions(infile)
            .map_err(|e| format!("{}: {e}", infile.display()))?;
        match total.as_mut() {
            Some(total) => total.merge(&set)
                .map_err(|e| format!("{}: {e}", infile.display()))?,
            None => total = Some(set),
        }
        progress.done();
    }

    let total = total.ok_or("No input files")?;
    info!("Merged {} files: {} angle bins", args.infiles.len(), total.n_angle_bins());
    progress.start(&format!("Writing {}", args.out.display()));
    write_distributions(&args.out, &total)?;
    progress.done();
    Ok(())
}
