//! The named set of accumulators filled by the correlation accumulator and
//! read by the peak extractor.
//!
//! Distributions are addressed by [`Key`]; the string names only matter at
//! the storage boundary (see [`Key::name`] and [`Key::from_name`]).

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Config;
use crate::histogram::{AxisSpec, Matrix, Spectrum};
use crate::{Error, Result};

/// Identity of one distribution in a [`DistributionSet`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Prompt energy-energy matrix for one angle bin
    AngleBin(usize),
    /// Prompt energy-energy matrix, summed over all angles
    GammaGamma,
    /// Array numbers of all hit pairs
    HitPattern,
    /// Singles energy spectrum
    Singles,
    /// `|dt|` of all hit pairs
    Timing,
}

const GAMMA_GAMMA: &str = "gammaGamma";
const HIT_PATTERN: &str = "gammaGammaHP";
const SINGLES    : &str = "gammaEnergy";
const TIMING     : &str = "gammaGammaTiming";

impl Key {

    pub fn name(&self) -> String {
        match self {
            Key::AngleBin(i) => format!("{GAMMA_GAMMA}{i}"),
            Key::GammaGamma  => GAMMA_GAMMA.into(),
            Key::HitPattern  => HIT_PATTERN.into(),
            Key::Singles     => SINGLES    .into(),
            Key::Timing      => TIMING     .into(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            GAMMA_GAMMA => Key::GammaGamma,
            HIT_PATTERN => Key::HitPattern,
            SINGLES     => Key::Singles,
            TIMING      => Key::Timing,
            _ => {
                let digits = name.strip_prefix(GAMMA_GAMMA)?;
                // Reject `gammaGamma+1`, `gammaGamma01` and friends, so that
                // `from_name` and `name` are inverses
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) { return None }
                if digits.len() > 1 && digits.starts_with('0') { return None }
                Key::AngleBin(digits.parse().ok()?)
            }
        })
    }

    /// Number of axes of the distribution stored under this key
    pub fn dimensions(&self) -> usize {
        match self {
            Key::Singles | Key::Timing => 1,
            _                          => 2,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name()) }
}

// --------------------------------------------------------------------------------
/// A 1-D or 2-D accumulator
#[derive(Clone)]
pub enum Distribution {
    Spectrum(Spectrum),
    Matrix(Matrix),
}

impl Distribution {

    pub fn dimensions(&self) -> usize {
        match self {
            Distribution::Spectrum(_) => 1,
            Distribution::Matrix  (_) => 2,
        }
    }

    pub fn entries(&self) -> f64 {
        match self {
            Distribution::Spectrum(s) => s.entries(),
            Distribution::Matrix  (m) => m.entries(),
        }
    }

    pub fn merge(&mut self, other: &Self) -> Result<()> {
        match (self, other) {
            (Distribution::Spectrum(a), Distribution::Spectrum(b)) => a.merge(b),
            (Distribution::Matrix  (a), Distribution::Matrix  (b)) => a.merge(b),
            (a, b) => Err(Error::Incompatible(format!(
                "cannot add {}-D distribution to {}-D distribution", b.dimensions(), a.dimensions()))),
        }
    }

    /// The matrix stored under `key`, or a schema error
    pub fn into_matrix(self, key: Key) -> Result<Matrix> {
        match self {
            Distribution::Matrix(m) => Ok(m),
            other => Err(Error::WrongDimensions { name: key.name(), expected: 2, found: other.dimensions() }),
        }
    }
}

// --------------------------------------------------------------------------------
/// Accumulators for one processing slot, or the merged result of many.
///
/// The set of keys is decided at construction and never changes afterwards;
/// only bin contents do.
#[derive(Clone)]
pub struct DistributionSet {
    distributions: BTreeMap<Key, Distribution>,
}

impl DistributionSet {

    /// Empty accumulators for `n_angle_bins` angle bins, binned as described
    /// by `config`.
    pub fn new(config: &Config, n_angle_bins: usize) -> Self {
        let energy = config.energy;
        let matrix   = |x: AxisSpec, y: AxisSpec| Distribution::Matrix  (Matrix  ::new(x, y));
        let spectrum = |x: AxisSpec|              Distribution::Spectrum(Spectrum::new(x));

        let mut distributions = BTreeMap::new();
        for i in 0..n_angle_bins {
            distributions.insert(Key::AngleBin(i), matrix(energy, energy));
        }
        distributions.insert(Key::GammaGamma, matrix(energy, energy));
        distributions.insert(Key::HitPattern, matrix(config.hit_pattern, config.hit_pattern));
        distributions.insert(Key::Singles   , spectrum(energy));
        distributions.insert(Key::Timing    , spectrum(config.timing.axis));
        Self { distributions }
    }

    /// Assemble a set from distributions read back from storage.
    pub fn from_distributions(distributions: impl IntoIterator<Item = (Key, Distribution)>) -> Result<Self> {
        let mut set = BTreeMap::new();
        for (key, distribution) in distributions {
            if key.dimensions() != distribution.dimensions() {
                return Err(Error::WrongDimensions {
                    name: key.name(), expected: key.dimensions(), found: distribution.dimensions()
                })
            }
            set.insert(key, distribution);
        }
        Ok(Self { distributions: set })
    }

    pub fn get(&self, key: Key) -> Option<&Distribution> { self.distributions.get(&key) }

    pub fn matrix(&self, key: Key) -> Option<&Matrix> {
        match self.distributions.get(&key)? {
            Distribution::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn spectrum(&self, key: Key) -> Option<&Spectrum> {
        match self.distributions.get(&key)? {
            Distribution::Spectrum(s) => Some(s),
            _ => None,
        }
    }

    /// Add one count at `(x, y)` to the matrix stored under `key`; no-op if
    /// there is no such matrix.
    pub fn fill_matrix(&mut self, key: Key, x: f64, y: f64) {
        if let Some(Distribution::Matrix(m)) = self.distributions.get_mut(&key) { m.fill(x, y) }
    }

    /// Add one count at `x` to the spectrum stored under `key`; no-op if there
    /// is no such spectrum.
    pub fn fill_spectrum(&mut self, key: Key, x: f64) {
        if let Some(Distribution::Spectrum(s)) = self.distributions.get_mut(&key) { s.fill(x) }
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ { self.distributions.keys().copied() }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &Distribution)> + '_ {
        self.distributions.iter().map(|(k, d)| (*k, d))
    }

    /// Number of angle-bin matrices in the set
    pub fn n_angle_bins(&self) -> usize {
        self.keys().filter(|k| matches!(k, Key::AngleBin(_))).count()
    }

    /// Add `other` into `self`, bin by bin. Both sets must contain the same
    /// keys, with identically binned distributions.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if !self.keys().eq(other.keys()) {
            let names = |s: &Self| s.keys().map(|k| k.name()).collect::<Vec<_>>();
            return Err(Error::Incompatible(format!(
                "different distribution names: {:?} vs {:?}", names(self), names(other))))
        }
        for (key, theirs) in other.distributions.iter() {
            if let Some(ours) = self.distributions.get_mut(key) {
                ours.merge(theirs)
                    .map_err(|e| Error::Incompatible(format!("{key}: {e}")))?;
            }
        }
        Ok(())
    }

    /// Sum of many sets, in whatever order they arrive. `None` if there are no
    /// sets at all.
    pub fn merge_all(sets: impl IntoIterator<Item = Self>) -> Result<Option<Self>> {
        let mut sets = sets.into_iter();
        let Some(mut total) = sets.next() else { return Ok(None) };
        for set in sets { total.merge(&set)?; }
        Ok(Some(total))
    }
}

impl std::ops::AddAssign<&DistributionSet> for DistributionSet {
    /// Panics if the sets do not share a layout: use [`DistributionSet::merge`]
    /// for sets of unknown provenance.
    fn add_assign(&mut self, rhs: &Self) {
        if let Err(e) = self.merge(rhs) { panic!("Adding incompatible distribution sets: {e}") }
    }
}


#[cfg(test)]
mod test_key {
    use super::*;
    use rstest::rstest;

    #[rstest(/**/ key                 , name              ,
             case(Key::AngleBin(0)    , "gammaGamma0"     ),
             case(Key::AngleBin(51)   , "gammaGamma51"    ),
             case(Key::GammaGamma     , "gammaGamma"      ),
             case(Key::HitPattern     , "gammaGammaHP"    ),
             case(Key::Singles        , "gammaEnergy"     ),
             case(Key::Timing         , "gammaGammaTiming"),
    )]
    fn names_are_stable(key: Key, name: &str) {
        assert_eq!(key.name(), name);
        assert_eq!(Key::from_name(name), Some(key));
    }

    #[rstest(name,
             case("gammaGamma01"),
             case("gammaGamma+1"),
             case("gammaGamma-1"),
             case("gammaGammaX"),
             case("betaGamma3"),
             case(""),
    )]
    fn foreign_names_are_not_keys(name: &str) {
        assert_eq!(Key::from_name(name), None);
    }
}

#[cfg(test)]
mod test_distribution_set {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.energy = AxisSpec::new(100, 0.0, 100.0);
        config
    }

    #[test]
    fn new_set_has_fixed_layout() {
        let config = small_config();
        let set = DistributionSet::new(&config, 3);
        let names: Vec<_> = set.keys().map(|k| k.name()).collect();
        assert_eq!(names, vec!["gammaGamma0", "gammaGamma1", "gammaGamma2",
                               "gammaGamma", "gammaGammaHP", "gammaEnergy", "gammaGammaTiming"]);
        assert_eq!(set.n_angle_bins(), 3);
        assert_eq!(set.matrix(Key::HitPattern).unwrap().axes(), (config.hit_pattern, config.hit_pattern));
        assert_eq!(set.spectrum(Key::Timing).unwrap().axis(), config.timing.axis);
        assert!(set.matrix(Key::Singles).is_none());
        assert!(set.spectrum(Key::GammaGamma).is_none());
    }

    #[test]
    fn filling_unknown_key_does_nothing() {
        let mut set = DistributionSet::new(&small_config(), 1);
        set.fill_matrix(Key::AngleBin(7), 1.0, 1.0);
        set.fill_spectrum(Key::GammaGamma, 1.0);
        assert!(set.iter().all(|(_, d)| d.entries() == 0.0));
    }

    #[test]
    fn merge_requires_same_names() {
        let config = small_config();
        let mut a = DistributionSet::new(&config, 2);
        let b = DistributionSet::new(&config, 3);
        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn merge_requires_same_binning() {
        let config = small_config();
        let mut a = DistributionSet::new(&config, 2);
        let b = DistributionSet::new(&Config::default(), 2);
        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn merge_all_sums_everything() -> Result<()> {
        let config = small_config();
        let sets = (0..4).map(|n| {
            let mut set = DistributionSet::new(&config, 1);
            set.fill_matrix(Key::AngleBin(0), 5.0, n as f64);
            set.fill_spectrum(Key::Singles, 5.0);
            set
        });
        let total = DistributionSet::merge_all(sets)?.unwrap();
        assert_eq!(total.matrix(Key::AngleBin(0)).unwrap().entries(), 4.0);
        assert_eq!(total.spectrum(Key::Singles).unwrap().value(5.0), 4.0);
        assert!(DistributionSet::merge_all(vec![])?.is_none());
        Ok(())
    }

    #[test]
    fn dimensions_must_match_key() {
        let config = small_config();
        let wrong = vec![(Key::Singles, Distribution::Matrix(Matrix::new(config.energy, config.energy)))];
        assert!(DistributionSet::from_distributions(wrong).is_err());
    }
}
