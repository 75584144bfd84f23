//! Classification of hit pairs into discrete angle bins.

use std::collections::BTreeMap;
use ordered_float::OrderedFloat;

use geometry::Vector;
use units::{Angle, degree, degree_};

use crate::config::Angles;

/// One achievable opening angle between two detector elements
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleBin {
    /// Opening angle in degrees
    pub angle: f64,
    /// Number of ordered element pairs sharing this angle
    pub pairs: usize,
}

/// Sorted table of achievable pair angles.
///
/// Index `i` of the table is the angle bin index used to name the
/// corresponding energy-energy matrix.
#[derive(Clone, Debug)]
pub struct AngleTable {
    bins: Vec<AngleBin>,
    index: BTreeMap<OrderedFloat<f64>, usize>,
    lookup_offset: f64,
}

impl AngleTable {

    /// Table of the distinct angles between all ordered pairs of distinct
    /// `positions`. Angles within `settings.merge_tolerance` of an angle
    /// already in the table are counted as that angle.
    pub fn from_positions(positions: &[Vector], settings: &Angles) -> Self {
        let mut bins: Vec<AngleBin> = vec![];
        for (a, pa) in positions.iter().enumerate() {
            for (b, pb) in positions.iter().enumerate() {
                if a == b { continue }
                let angle = degree_(pa.angle(pb));
                match bins.iter_mut().find(|bin| (bin.angle - angle).abs() < settings.merge_tolerance) {
                    Some(bin) => bin.pairs += 1,
                    None      => bins.push(AngleBin { angle, pairs: 1 }),
                }
            }
        }
        Self::from_bins(bins, settings.lookup_offset)
    }

    /// Table containing exactly the given angles (in degrees), each with one
    /// pair.
    pub fn from_angles(angles: impl IntoIterator<Item = f64>, lookup_offset: f64) -> Self {
        let bins = angles.into_iter().map(|angle| AngleBin { angle, pairs: 1 }).collect();
        Self::from_bins(bins, lookup_offset)
    }

    fn from_bins(mut bins: Vec<AngleBin>, lookup_offset: f64) -> Self {
        bins.sort_by_key(|bin| OrderedFloat(bin.angle));
        let index = bins.iter()
            .enumerate()
            .map(|(i, bin)| (OrderedFloat(bin.angle), i))
            .collect();
        Self { bins, index, lookup_offset }
    }

    /// Angle bin index of a pair with opening angle `angle`.
    ///
    /// The first tabulated angle which is not smaller than `angle` minus the
    /// lookup offset. `None` if there is no such angle, or if `angle` is
    /// negative or NaN.
    pub fn lookup(&self, angle: Angle) -> Option<usize> {
        let angle = degree_(angle);
        if angle.is_nan() || angle < 0.0 { return None }
        self.index
            .range(OrderedFloat(angle - self.lookup_offset)..)
            .next()
            .map(|(_, &i)| i)
    }

    pub fn len(&self) -> usize { self.bins.len() }

    pub fn is_empty(&self) -> bool { self.bins.is_empty() }

    pub fn bins(&self) -> &[AngleBin] { &self.bins }

    /// Tabulated angle of bin `index`
    pub fn angle(&self, index: usize) -> Option<Angle> {
        self.bins.get(index).map(|bin| degree(bin.angle))
    }
}


#[cfg(test)]
mod test_lookup {
    use super::*;
    use rstest::rstest;

    const OFFSET: f64 = 0.0005;

    fn table() -> AngleTable { AngleTable::from_angles([60.0, 15.0, 30.0, 30.001], OFFSET) }

    #[test]
    fn table_is_sorted() {
        let angles: Vec<_> = table().bins().iter().map(|b| b.angle).collect();
        assert_eq!(angles, vec![15.0, 30.0, 30.001, 60.0]);
    }

    #[rstest(/**/   angle  , expected,
             // Exactly on a tabulated angle: that angle's own index
             case(15.0     , Some(0)),
             case(30.0     , Some(1)),
             case(30.001   , Some(2)),
             case(60.0     , Some(3)),
             // Within the offset below the next entry: the next entry
             case(29.9996  , Some(1)),
             case(30.0004  , Some(1)),
             // Strictly between entries, beyond the offset: next higher entry,
             // even when the lower one is numerically closer
             case(16.0     , Some(1)),
             case(30.0006  , Some(2)),
             case(31.0     , Some(3)),
             // Below the whole table: first entry
             case( 1.0     , Some(0)),
             // Above the whole table, beyond the offset: no match
             case(60.0004  , Some(3)),
             case(60.0006  , None   ),
             case(180.0    , None   ),
             // Invalid angles
             case(-1.0     , None   ),
             case(f64::NAN , None   ),
    )]
    fn lower_bound_with_offset(angle: f64, expected: Option<usize>) {
        assert_eq!(table().lookup(degree(angle)), expected);
    }
}
