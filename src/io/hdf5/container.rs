//! Distribution sets on disk.
//!
//! One group per distribution, named after its [`Key`]. Each group contains
//!
//! + `axes`: a single [`Hdf5Axes`] row describing the binning and the number
//!   of entries
//!
//! + `bins`: one [`Hdf5Bin`] row per non-empty bin (flow bins included), with
//!   axis bin indices as used by [`crate::histogram`].
//!
//! Spectra store `0` in the unused `y` columns.

use std::path::Path;

use log::warn;

use crate::distributions::{Distribution, DistributionSet, Key};
use crate::extract::MatrixSource;
use crate::histogram::{AxisSpec, Matrix, Spectrum};
use crate::{Error, Result};

const AXES: &str = "axes";
const BINS: &str = "bins";
const CHUNK_SIZE: usize = 1 << 12;

#[derive(hdf5::H5Type, Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct Hdf5Axes {
    pub dimensions: u32,
    pub x_bins: u32, pub x_low: f64, pub x_high: f64,
    pub y_bins: u32, pub y_low: f64, pub y_high: f64,
    pub entries: f64,
}

#[derive(hdf5::H5Type, Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct Hdf5Bin {
    pub x: u32,
    pub y: u32,
    pub value: f64,
}

fn axis(bins: u32, low: f64, high: f64) -> AxisSpec { AxisSpec::new(bins as usize, low, high) }

impl Hdf5Axes {
    fn new(x: AxisSpec, y: Option<AxisSpec>, entries: f64) -> Self {
        let y_or_empty = y.unwrap_or(AxisSpec::new(0, 0.0, 0.0));
        Self {
            dimensions: if y.is_some() { 2 } else { 1 },
            x_bins: x.bins as u32,          x_low: x.low,          x_high: x.high,
            y_bins: y_or_empty.bins as u32, y_low: y_or_empty.low, y_high: y_or_empty.high,
            entries,
        }
    }
}

fn to_rows(distribution: &Distribution) -> (Hdf5Axes, Vec<Hdf5Bin>) {
    match distribution {
        Distribution::Spectrum(s) => (
            Hdf5Axes::new(s.axis(), None, s.entries()),
            s.bins().into_iter()
                .map(|(x, value)| Hdf5Bin { x: x as u32, y: 0, value })
                .collect(),
        ),
        Distribution::Matrix(m) => {
            let (x, y) = m.axes();
            (Hdf5Axes::new(x, Some(y), m.entries()),
             m.bins().into_iter()
                 .map(|(x, y, value)| Hdf5Bin { x: x as u32, y: y as u32, value })
                 .collect())
        }
    }
}

fn from_rows(name: &str, axes: Hdf5Axes, bins: Vec<Hdf5Bin>) -> Result<Distribution> {
    let Hdf5Axes { dimensions, x_bins, x_low, x_high, y_bins, y_low, y_high, entries } = axes;
    let x = axis(x_bins, x_low, x_high);
    let y = axis(y_bins, y_low, y_high);
    let usable = |a: AxisSpec| a.bins > 0 && a.low < a.high;
    if !usable(x) || (dimensions == 2 && !usable(y)) {
        return Err(Error::Malformed(format!("`{name}` has an empty or inverted axis")))
    }
    Ok(match dimensions {
        1 => Distribution::Spectrum(Spectrum::from_bins(
            x, entries, bins.into_iter().map(|b| (b.x as usize, b.value)))?),
        2 => Distribution::Matrix(Matrix::from_bins(
            x, y, entries, bins.into_iter().map(|b| (b.x as usize, b.y as usize, b.value)))?),
        n => return Err(Error::Malformed(format!("`{name}` claims to have {n} dimensions"))),
    })
}

/// Write every distribution in `set` to a new file at `path`.
pub fn write_distributions(path: &Path, set: &DistributionSet) -> Result<()> {
    let file = hdf5::File::create(path)?;
    for (key, distribution) in set.iter() {
        let (axes, bins) = to_rows(distribution);
        let group = file.create_group(&key.name())?;
        group.new_dataset_builder()
            .with_data(std::slice::from_ref(&axes))
            .create(AXES)?;
        super::write_table(&group, BINS, &bins, CHUNK_SIZE)?;
    }
    Ok(())
}

/// Read every distribution in the file at `path`. Groups whose names are not
/// distribution names are ignored.
pub fn read_distributions(path: &Path) -> Result<DistributionSet> {
    let file = DistributionFile::open(path)?;
    let mut distributions = vec![];
    for name in file.names()? {
        match Key::from_name(&name) {
            Some(key) => distributions.push((key, file.read(key)?)),
            None      => warn!("{}: ignoring unknown group `{name}`", path.display()),
        }
    }
    DistributionSet::from_distributions(distributions)
}

/// An open distribution file, from which distributions are read one at a time.
pub struct DistributionFile {
    file: hdf5::File,
}

impl DistributionFile {

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self { file: hdf5::File::open(path)? })
    }

    /// Names of all groups in the file
    pub fn names(&self) -> Result<Vec<String>> { Ok(self.file.member_names()?) }

    pub fn contains(&self, key: Key) -> Result<bool> {
        Ok(self.names()?.contains(&key.name()))
    }

    pub fn read(&self, key: Key) -> Result<Distribution> {
        let name = key.name();
        if !self.contains(key)? { return Err(Error::MissingDistribution(name)) }
        let group = self.file.group(&name)?;
        let axes = group.dataset(AXES)?.read_raw::<Hdf5Axes>()?;
        let bins = group.dataset(BINS)?.read_raw::<Hdf5Bin >()?;
        let axes = match axes.as_slice() {
            &[axes] => axes,
            rows    => return Err(Error::Malformed(format!("`{name}/{AXES}` has {} rows, expected 1", rows.len()))),
        };
        let distribution = from_rows(&name, axes, bins)?;
        if distribution.dimensions() != key.dimensions() {
            return Err(Error::WrongDimensions { name, expected: key.dimensions(), found: distribution.dimensions() })
        }
        Ok(distribution)
    }
}

impl MatrixSource for DistributionFile {
    fn load_matrix(&self, key: Key) -> Result<Matrix> {
        self.read(key)?.into_matrix(key)
    }
}
