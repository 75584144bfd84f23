use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use ggac::angles::AngleTable;
use ggac::config::config_or_default;
use ggac::detector::Array;
use ggac::utils::init_logging;

/// Command line interface for `ggac-angles` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "ggac-angles",
    about = "Print the angle bins of the array, with the number of crystal pairs in each",
)]
pub struct Cli {
    /// TOML configuration file. Standard analysis settings if absent
    #[clap(short, long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Cli::parse();
    let config = config_or_default(args.config.as_deref())?;
    let array = Array::new(config.geometry.distance);
    let table = AngleTable::from_positions(&array.positions(), &config.angles);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "index,angle,pairs")?;
    for (index, bin) in table.bins().iter().enumerate() {
        writeln!(out, "{index},{:.4},{}", bin.angle, bin.pairs)?;
    }
    Ok(())
}
