use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use ggac::accumulate::{Accumulator, job_size};
use ggac::angles::AngleTable;
use ggac::config::config_or_default;
use ggac::detector::Array;
use ggac::distributions::DistributionSet;
use ggac::io::hdf5::{container::write_distributions, hits::{read_events, DEFAULT_DATASET}};
use ggac::utils::{Bounds, group_digits as g, init_logging, timing::Progress};

/// Command line interface for `ggac-accumulate` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "ggac-accumulate",
    about = "Accumulate angle-binned gamma-gamma matrices from hit tables",
)]
pub struct Cli {
    /// HDF5 input files with hit tables
    #[clap(required = true)]
    pub infiles: Vec<PathBuf>,

    /// HDF5 output file for the accumulated distributions
    #[clap(short, long)]
    pub out: PathBuf,

    /// TOML configuration file. Standard analysis settings if absent
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// The dataset location inside the input files
    #[clap(short, long, default_value = DEFAULT_DATASET)]
    pub dataset: String,

    /// Which rows of each input file should be loaded, e.g. `0..100000`
    #[clap(short, long, default_value = "..")]
    pub events: Bounds<usize>,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long, default_value = "4")]
    pub threads: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Cli::parse();
    let config = config_or_default(args.config.as_deref())?;

    // Make sure the output can be written before starting a long computation
    if let Some(dir) = args.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Can't write to {}: {e}", args.out.display()))?;
    }

    let mut progress = Progress::new();
    progress.start("Building angle table");
    let array = Array::new(config.geometry.distance);
    let table = AngleTable::from_positions(&array.positions(), &config.angles);
    progress.done_with_message(&format!("{} angle bins", table.len()));

    let accumulator = Accumulator::new(config, table);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads).build()?;

    // --- Progress bar --------------------------------------------------------------
    let files_bar = ProgressBar::new(args.infiles.len() as u64);
    files_bar.set_style(ProgressStyle::default_bar()
                        .template("Processing file: {msg}\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")?);
    files_bar.tick();

    // --- Process input files -------------------------------------------------------
    let mut total: Option<DistributionSet> = None;
    let mut failed_files = vec![];
    let (mut n_events, mut n_hits, mut n_dropped) = (0, 0, 0);
    for infile in &args.infiles {
        files_bar.set_message(infile.display().to_string());
        match accumulate_file(&accumulator, infile, &args, &array, &pool) {
            Ok((set, stats)) => {
                n_events  += stats.0;
                n_hits    += stats.1;
                n_dropped += stats.2;
                match total.as_mut() {
                    Some(total) => *total += &set,
                    None        => total = Some(set),
                }
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", infile.display());
                failed_files.push(infile.clone());
            }
        }
        files_bar.inc(1);
    }
    files_bar.finish_with_message("<finished processing files>");

    info!("Processed {} events containing {} hits", g(n_events), g(n_hits));
    if n_dropped > 0 {
        warn!("Dropped {} hits in unknown crystals or with non-finite energy or time", g(n_dropped));
    }

    // --- Write distributions -------------------------------------------------------
    let total = total.ok_or("None of the input files could be read")?;
    progress.start(&format!("Writing distributions to {}", args.out.display()));
    write_distributions(&args.out, &total)?;
    progress.done();

    // --- Report any files that failed to be read -----------------------------------
    if !failed_files.is_empty() {
        let n = failed_files.len();
        let plural = if n == 1 { "" } else { "s" };
        warn!("Failed to read {n} file{plural}:");
        for file in failed_files.iter() {
            warn!("  {}", file.display());
        }
    }
    Ok(())
}

fn accumulate_file(
    accumulator: &Accumulator,
    infile: &Path,
    args: &Cli,
    array: &Array,
    pool: &rayon::ThreadPool,
) -> hdf5::Result<(DistributionSet, (usize, usize, usize))> {
    let batch = read_events(infile, &args.dataset, args.events, array)?;
    let job_size = job_size(batch.events.len(), args.threads);
    let set = pool.install(|| accumulator.accumulate(&batch.events, job_size));
    Ok((set, (batch.events.len(), batch.n_hits, batch.n_dropped)))
}
