//! Gated peak areas as a function of angle bin

use std::io::Write;
use std::path::Path;

use log::{info, warn};

use crate::config::Extract;
use crate::distributions::{DistributionSet, Key};
use crate::histogram::Matrix;
use crate::io::hdf5::container::DistributionFile;
use crate::{Error, Result};

pub const HEADER: &str = "index,counts,counts_error";

/// Anything from which energy-energy matrices can be fetched by key
pub trait MatrixSource {
    /// The matrix stored under `key`: [`Error::MissingDistribution`] if there
    /// is none.
    fn load_matrix(&self, key: Key) -> Result<Matrix>;
}

impl MatrixSource for DistributionSet {
    fn load_matrix(&self, key: Key) -> Result<Matrix> {
        match self.get(key) {
            Some(distribution) => distribution.clone().into_matrix(key),
            None => Err(Error::MissingDistribution(key.name())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractionRow {
    pub index: usize,
    pub counts: f64,
    pub counts_error: f64,
}

impl std::fmt::Display for ExtractionRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.index, self.counts, self.counts_error)
    }
}

/// Why an angle bin produced no row
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Skip {
    /// Too few entries in the matrix
    Matrix { index: usize, entries: f64 },
    /// Too few entries in the gated projection
    Slice  { index: usize, entries: f64 },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub rows: Vec<ExtractionRow>,
    pub skipped: Vec<Skip>,
}

/// Counts in the peak window of the projection gated on `gate`, or the
/// reason for producing nothing
pub fn peak_area(matrix: &Matrix, index: usize, gate: f64, peak: f64, settings: &Extract) -> std::result::Result<ExtractionRow, Skip> {
    let entries = matrix.entries();
    if entries < settings.min_matrix_entries { return Err(Skip::Matrix { index, entries }) }

    let g = settings.gate_half_width;
    let slice = matrix.projection_y(gate - g, gate + g);
    let entries = slice.entries();
    if entries < settings.min_slice_entries { return Err(Skip::Slice { index, entries }) }

    let p = settings.peak_half_width;
    let counts = slice.integral(peak - p, peak + p);
    Ok(ExtractionRow { index, counts, counts_error: counts.sqrt() })
}

/// Write the peak area table for angle bins `0..settings.indices` to `out`.
///
/// The header is written before anything is read from `source`. A missing
/// matrix aborts the extraction, leaving the rows already written in `out`.
pub fn extract(
    source: &impl MatrixSource,
    gate: i64,
    peak: i64,
    settings: &Extract,
    mut out: impl Write,
) -> Result<Extraction> {
    write_header(&mut out)?;
    extract_rows(source, gate, peak, settings, out)
}

/// As [`extract`], reading matrices from the distribution file at `input`.
///
/// The header is written before `input` is opened, so an unreadable input
/// leaves a table with no rows.
pub fn extract_file(
    input: &Path,
    gate: i64,
    peak: i64,
    settings: &Extract,
    mut out: impl Write,
) -> Result<Extraction> {
    write_header(&mut out)?;
    let source = DistributionFile::open(input)?;
    extract_rows(&source, gate, peak, settings, out)
}

fn write_header(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{HEADER}")?;
    out.flush()?;
    Ok(())
}

fn extract_rows(
    source: &impl MatrixSource,
    gate: i64,
    peak: i64,
    settings: &Extract,
    mut out: impl Write,
) -> Result<Extraction> {
    let mut extraction = Extraction::default();
    for index in 0..settings.indices {
        let matrix = source.load_matrix(Key::AngleBin(index))?;
        match peak_area(&matrix, index, gate as f64, peak as f64, settings) {
            Ok(row) => {
                writeln!(out, "{row}")?;
                out.flush()?;
                extraction.rows.push(row);
            }
            Err(skip) => {
                match skip {
                    Skip::Matrix { entries, .. } => warn!("{}: only {entries} entries, skipping", Key::AngleBin(index)),
                    Skip::Slice  { entries, .. } => warn!("{}: only {entries} entries in gate {gate}, skipping", Key::AngleBin(index)),
                }
                extraction.skipped.push(skip);
            }
        }
    }
    info!("Extracted {} of {} angle bins", extraction.rows.len(), settings.indices);
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::histogram::AxisSpec;
    use float_eq::assert_float_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn config(indices: usize) -> Config {
        let mut config = Config::default();
        config.energy = AxisSpec::new(100, 0.0, 100.0);
        config.extract.indices = indices;
        config
    }

    /// `total` entries in angle bin 0: `in_gate` of them at gate 50, of which
    /// `in_peak` are at peak 30
    fn set(n_angle_bins: usize, total: usize, in_gate: usize, in_peak: usize) -> DistributionSet {
        let mut set = DistributionSet::new(&config(n_angle_bins), n_angle_bins);
        let key = Key::AngleBin(0);
        for _ in 0..in_peak           { set.fill_matrix(key, 50.5, 30.5) }
        for _ in in_peak..in_gate     { set.fill_matrix(key, 50.5, 80.5) }
        for _ in in_gate..total       { set.fill_matrix(key, 10.5, 30.5) }
        set
    }

    fn run(source: &impl MatrixSource, settings: &Extract) -> (Result<Extraction>, String) {
        let mut out = vec![];
        let result = extract(source, 50, 30, settings, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[rstest(/**/ total, expected_rows,
             case( 99, 0),
             case(100, 1),
    )]
    fn matrix_entries_threshold(total: usize, expected_rows: usize) {
        let set = set(1, total, 50, 20);
        let (result, _) = run(&set, &config(1).extract);
        assert_eq!(result.unwrap().rows.len(), expected_rows);
    }

    #[rstest(/**/ in_gate, expected_rows,
             case( 9, 0),
             case(10, 1),
    )]
    fn slice_entries_threshold(in_gate: usize, expected_rows: usize) {
        let set = set(1, 150, in_gate, 5);
        let (result, _) = run(&set, &config(1).extract);
        let extraction = result.unwrap();
        assert_eq!(extraction.rows.len(), expected_rows);
        assert_eq!(extraction.skipped.len(), 1 - expected_rows);
    }

    #[test]
    fn single_populated_angle_bin_gives_single_row() {
        let set = set(3, 150, 50, 20);
        let (result, text) = run(&set, &config(3).extract);
        let extraction = result.unwrap();
        assert_eq!(extraction.rows.len(), 1);
        let row = extraction.rows[0];
        assert_eq!(row.index, 0);
        assert_eq!(row.counts, 20.0);
        assert_float_eq!(row.counts_error, 4.47213595499958, abs <= 1e-12);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("0,20,4.472"));
        assert_eq!(extraction.skipped, vec![
            Skip::Matrix { index: 1, entries: 0.0 },
            Skip::Matrix { index: 2, entries: 0.0 },
        ]);
    }

    #[test]
    fn missing_matrix_aborts_after_earlier_rows() {
        let mut set = DistributionSet::new(&config(5), 5);
        for index in 0..5 {
            for _ in 0..100 { set.fill_matrix(Key::AngleBin(index), 50.5, 30.5) }
        }
        let (result, text) = run(&set, &config(51).extract);
        assert!(matches!(result, Err(Error::MissingDistribution(ref name)) if name == "gammaGamma5"));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], HEADER);
        for (i, line) in lines[1..].iter().enumerate() {
            assert_eq!(*line, format!("{i},100,10"));
        }
    }

    #[test]
    fn absent_or_one_dimensional_distributions_are_not_matrices() {
        let set = DistributionSet::new(&config(1), 1);
        assert!(matches!(set.load_matrix(Key::AngleBin(1)), Err(Error::MissingDistribution(_))));
        assert!(matches!(set.load_matrix(Key::Singles), Err(Error::WrongDimensions { expected: 2, found: 1, .. })));
        assert!(set.load_matrix(Key::AngleBin(0)).is_ok());
    }

    #[test]
    fn peak_window_covers_three_bins() {
        let mut set = DistributionSet::new(&config(1), 1);
        let key = Key::AngleBin(0);
        for _ in 0..100 { set.fill_matrix(key, 49.5, 29.5) }  // gate bin 49, peak bin 29
        for _ in 0..100 { set.fill_matrix(key, 51.5, 31.5) }  // gate bin 51, peak bin 31
        for _ in 0..100 { set.fill_matrix(key, 51.5, 32.5) }  // peak bin 32: outside
        let (result, _) = run(&set, &config(1).extract);
        assert_eq!(result.unwrap().rows[0].counts, 200.0);
    }
}
