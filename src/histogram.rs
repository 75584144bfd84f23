//! Count accumulators on uniform axes.
//!
//! Thin wrappers around sparse `ndhistogram` histograms which additionally
//! keep track of the number of fills (entries), and provide the gating and
//! integration operations used by the peak extractor. Both axes carry
//! underflow and overflow bins: axis bin index `0` is the underflow, `bins + 1`
//! the overflow.

use ndhistogram::{axis::{Axis, BinInterval, Uniform}, sparsehistogram, Histogram, SparseHist1D, SparseHist2D};
use serde::Deserialize;

use crate::{Error, Result};

type Hist1D = SparseHist1D<Uniform<f64>,               f64>;
type Hist2D = SparseHist2D<Uniform<f64>, Uniform<f64>, f64>;

/// Binning of one axis: `bins` equal-width bins covering `[low, high)`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AxisSpec {
    pub bins: usize,
    pub low : f64,
    pub high: f64,
}

impl AxisSpec {
    pub fn new(bins: usize, low: f64, high: f64) -> Self { Self { bins, low, high } }

    pub fn width(&self) -> f64 { (self.high - self.low) / self.bins as f64 }

    fn uniform(&self) -> Uniform<f64> { Uniform::new(self.bins, self.low, self.high) }
}

/// A coordinate which falls into the bin described by `interval`.
fn representative(interval: &BinInterval<f64>) -> f64 {
    match *interval {
        BinInterval::Underflow { end }        => end - 1.0,
        BinInterval::Overflow  { start }      => start + 1.0,
        BinInterval::Bin       { start, end } => 0.5 * (start + end),
    }
}

fn index_of(axis: &Uniform<f64>, interval: &BinInterval<f64>) -> Option<usize> {
    axis.index(&representative(interval))
}

/// A coordinate which falls into bin `index` of `axis`.
fn coordinate_of(axis: &Uniform<f64>, index: usize) -> Result<f64> {
    axis.bin(index)
        .map(|interval| representative(&interval))
        .ok_or_else(|| Error::Incompatible(format!(
            "bin index {index} out of range for axis with {} bins", axis.num_bins())))
}

/// Indices of the bins containing `lo` and `hi`, in increasing order.
///
/// `None` if either end is NaN, or if it lies entirely in one of the
/// flow bins.
fn index_range(axis: &Uniform<f64>, lo: f64, hi: f64) -> Option<(usize, usize)> {
    if lo.is_nan() || hi.is_nan() { return None }
    let (a, b) = (axis.index(&lo)?, axis.index(&hi)?);
    let (first, last) = (a.min(b), a.max(b));
    let overflow = axis.num_bins() - 1;
    if last == 0 || first == overflow { return None }
    Some((first, last))
}

// --------------------------------------------------------------------------------
/// One-dimensional accumulator
#[derive(Clone)]
pub struct Spectrum {
    axis: AxisSpec,
    hist: Hist1D,
    entries: f64,
}

impl Spectrum {

    pub fn new(axis: AxisSpec) -> Self {
        Self { axis, hist: sparsehistogram!(axis.uniform(); f64), entries: 0.0 }
    }

    pub fn axis(&self) -> AxisSpec { self.axis }

    /// Add one entry at `x`. NaN belongs to no bin and is ignored.
    pub fn fill(&mut self, x: f64) {
        if x.is_nan() { return }
        self.hist.fill(&x);
        self.entries += 1.0;
    }

    /// Number of fills, including those which landed in the flow bins
    pub fn entries(&self) -> f64 { self.entries }

    /// Sum of all bin contents, including the flow bins
    pub fn sum(&self) -> f64 { self.hist.values().sum() }

    /// Content of the bin containing `x`
    pub fn value(&self, x: f64) -> f64 { self.hist.value(&x).copied().unwrap_or(0.0) }

    /// Sum of the contents of the bins containing `lo` and `hi`, and of all
    /// bins between them.
    pub fn integral(&self, lo: f64, hi: f64) -> f64 {
        let axis = &self.hist.axes().as_tuple().0;
        let Some((first, last)) = index_range(axis, lo, hi) else { return 0.0 };
        self.hist.iter()
            .filter(|item| index_of(axis, &item.bin).map_or(false, |i| first <= i && i <= last))
            .map(|item| *item.value)
            .sum()
    }

    /// Non-empty bins as `(axis bin index, content)`, ordered by index
    pub fn bins(&self) -> Vec<(usize, f64)> {
        let axis = &self.hist.axes().as_tuple().0;
        let mut bins: Vec<_> = self.hist.iter()
            .filter(|item| *item.value != 0.0)
            .filter_map(|item| Some((index_of(axis, &item.bin)?, *item.value)))
            .collect();
        bins.sort_by_key(|&(i, _)| i);
        bins
    }

    /// Rebuild a spectrum from its axis, entries and non-empty bins, as
    /// produced by `axis`, `entries` and `bins`.
    pub fn from_bins(axis: AxisSpec, entries: f64, bins: impl IntoIterator<Item = (usize, f64)>) -> Result<Self> {
        let mut spectrum = Self::new(axis);
        for (i, value) in bins {
            let x = coordinate_of(&spectrum.hist.axes().as_tuple().0, i)?;
            spectrum.hist.fill_with(&x, value);
        }
        spectrum.entries = entries;
        Ok(spectrum)
    }

    /// Add the contents of `other`, bin by bin.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.axis != other.axis {
            return Err(Error::Incompatible(format!("axes differ: {:?} vs {:?}", self.axis, other.axis)))
        }
        for item in other.hist.iter() {
            self.hist.fill_with(&representative(&item.bin), *item.value);
        }
        self.entries += other.entries;
        Ok(())
    }
}

// --------------------------------------------------------------------------------
/// Two-dimensional accumulator
#[derive(Clone)]
pub struct Matrix {
    x: AxisSpec,
    y: AxisSpec,
    hist: Hist2D,
    entries: f64,
}

impl Matrix {

    pub fn new(x: AxisSpec, y: AxisSpec) -> Self {
        Self { x, y, hist: sparsehistogram!(x.uniform(), y.uniform(); f64), entries: 0.0 }
    }

    pub fn axes(&self) -> (AxisSpec, AxisSpec) { (self.x, self.y) }

    /// Add one entry at `(x, y)`. Ignored if either coordinate is NaN.
    pub fn fill(&mut self, x: f64, y: f64) {
        if x.is_nan() || y.is_nan() { return }
        self.hist.fill(&(x, y));
        self.entries += 1.0;
    }

    /// Number of fills, including those which landed in the flow bins
    pub fn entries(&self) -> f64 { self.entries }

    /// Sum of all bin contents, including the flow bins
    pub fn sum(&self) -> f64 { self.hist.values().sum() }

    /// Content of the bin containing `(x, y)`
    pub fn value(&self, x: f64, y: f64) -> f64 { self.hist.value(&(x, y)).copied().unwrap_or(0.0) }

    /// Project onto the second axis, keeping only bins whose first-axis
    /// coordinate lies in the bins containing `x_lo` to `x_hi`.
    ///
    /// The entries of the projection are the sum of its contents.
    pub fn projection_y(&self, x_lo: f64, x_hi: f64) -> Spectrum {
        let mut projection = Spectrum::new(self.y);
        let (x_axis, _) = self.hist.axes().as_tuple();
        if let Some((first, last)) = index_range(x_axis, x_lo, x_hi) {
            for item in self.hist.iter() {
                let (bx, by) = &item.bin;
                if index_of(x_axis, bx).map_or(false, |i| first <= i && i <= last) {
                    projection.hist.fill_with(&representative(by), *item.value);
                }
            }
        }
        projection.entries = projection.sum();
        projection
    }

    /// Project onto the first axis, keeping only bins whose second-axis
    /// coordinate lies in the bins containing `y_lo` to `y_hi`.
    pub fn projection_x(&self, y_lo: f64, y_hi: f64) -> Spectrum {
        let mut projection = Spectrum::new(self.x);
        let (_, y_axis) = self.hist.axes().as_tuple();
        if let Some((first, last)) = index_range(y_axis, y_lo, y_hi) {
            for item in self.hist.iter() {
                let (bx, by) = &item.bin;
                if index_of(y_axis, by).map_or(false, |i| first <= i && i <= last) {
                    projection.hist.fill_with(&representative(bx), *item.value);
                }
            }
        }
        projection.entries = projection.sum();
        projection
    }

    /// Non-empty bins as `(x bin index, y bin index, content)`, ordered by
    /// `x` then `y`
    pub fn bins(&self) -> Vec<(usize, usize, f64)> {
        let (x_axis, y_axis) = self.hist.axes().as_tuple();
        let mut bins: Vec<_> = self.hist.iter()
            .filter(|item| *item.value != 0.0)
            .filter_map(|item| {
                let (bx, by) = &item.bin;
                Some((index_of(x_axis, bx)?, index_of(y_axis, by)?, *item.value))
            })
            .collect();
        bins.sort_by_key(|&(i, j, _)| (i, j));
        bins
    }

    /// Rebuild a matrix from its axes, entries and non-empty bins, as produced
    /// by `axes`, `entries` and `bins`.
    pub fn from_bins(
        x: AxisSpec,
        y: AxisSpec,
        entries: f64,
        bins: impl IntoIterator<Item = (usize, usize, f64)>
    ) -> Result<Self> {
        let mut matrix = Self::new(x, y);
        for (i, j, value) in bins {
            let (x_axis, y_axis) = matrix.hist.axes().as_tuple();
            let coordinate = (coordinate_of(x_axis, i)?, coordinate_of(y_axis, j)?);
            matrix.hist.fill_with(&coordinate, value);
        }
        matrix.entries = entries;
        Ok(matrix)
    }

    /// Add the contents of `other`, bin by bin.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.axes() != other.axes() {
            return Err(Error::Incompatible(format!("axes differ: {:?} vs {:?}", self.axes(), other.axes())))
        }
        for item in other.hist.iter() {
            let (bx, by) = &item.bin;
            self.hist.fill_with(&(representative(bx), representative(by)), *item.value);
        }
        self.entries += other.entries;
        Ok(())
    }
}
